//! `AVCaptureSession` graph: screen input, optional device input, and a
//! video data output delivering frames on a private serial queue.

use std::ffi::c_void;
use std::ptr;

use cocoa::base::{id, nil, NO, YES};
use cocoa::foundation::{NSPoint, NSRect, NSSize};
use core_foundation::base::TCFType;
use core_foundation::dictionary::CFDictionary;
use core_foundation::number::CFNumber;
use core_foundation::string::CFString;
use objc::rc::{autoreleasepool, StrongPtr};
use objc::runtime::BOOL;
use objc::{class, msg_send, sel, sel_impl};

use screen_capture_core::{AudioDevice, CaptureGraph, DisplayInfo, FrameSink, ScreenInputSettings};

use crate::audio_devices::device_with_unique_id;
use crate::delegate::{detach_context, new_delegate, DelegateContext};
use crate::displays::find_display;
use crate::ffi::*;
use crate::foundation::describe_error;

const FRAME_QUEUE_LABEL: &std::ffi::CStr = c"screen-capture.frames";

pub struct AvCaptureGraph {
    session: StrongPtr,
    screen_input: Option<StrongPtr>,
    audio_input: Option<StrongPtr>,
    output: Option<StrongPtr>,
    delegate: StrongPtr,
    context: Box<DelegateContext>,
    queue: DispatchQueue,
}

// SAFETY: AVCaptureSession and its inputs/outputs are documented as usable
// from any thread; the graph is only ever driven by one owner at a time, and
// the dispatch queue handle is a retained, thread-safe libdispatch object.
unsafe impl Send for AvCaptureGraph {}

impl AvCaptureGraph {
    pub(crate) fn new() -> Result<Self, String> {
        unsafe {
            let session: id = msg_send![class!(AVCaptureSession), new];
            if session == nil {
                return Err("failed to create AVCaptureSession".into());
            }
            let session = StrongPtr::new(session);

            let queue = dispatch_queue_create(FRAME_QUEUE_LABEL.as_ptr(), ptr::null_mut());
            if queue.is_null() {
                return Err("failed to create frame delivery queue".into());
            }

            let context = Box::new(DelegateContext::new());
            let delegate = match new_delegate(&*context) {
                Ok(delegate) => StrongPtr::new(delegate),
                Err(reason) => {
                    dispatch_release(queue);
                    return Err(reason);
                }
            };

            Ok(Self {
                session,
                screen_input: None,
                audio_input: None,
                output: None,
                delegate,
                context,
                queue,
            })
        }
    }

    unsafe fn add_input(&self, input: id) -> Result<(), String> {
        let can_add: BOOL = msg_send![*self.session, canAddInput: input];
        if can_add == NO {
            return Err("session refused input".into());
        }
        let _: () = msg_send![*self.session, addInput: input];
        Ok(())
    }
}

impl CaptureGraph for AvCaptureGraph {
    fn create_screen_input(
        &mut self,
        display_id: u32,
        settings: &ScreenInputSettings,
    ) -> Result<DisplayInfo, String> {
        let display = find_display(display_id)
            .ok_or_else(|| format!("display {} is not active", display_id))?;

        unsafe {
            let input: id = msg_send![class!(AVCaptureScreenInput), alloc];
            let input: id = msg_send![input, initWithDisplayID: display_id];
            if input == nil {
                return Err(format!("AVCaptureScreenInput rejected display {}", display_id));
            }
            let input = StrongPtr::new(input);

            let interval = settings.min_frame_interval;
            let _: () = msg_send![*input, setMinFrameDuration: CMTime::new(interval.value, interval.timescale)];

            if let Some(crop) = settings.crop_rect {
                let rect = NSRect::new(NSPoint::new(crop.x, crop.y), NSSize::new(crop.width, crop.height));
                let _: () = msg_send![*input, setCropRect: rect];
            }

            let captures_cursor = if settings.captures_cursor { YES } else { NO };
            let captures_clicks = if settings.captures_mouse_clicks { YES } else { NO };
            let _: () = msg_send![*input, setCapturesCursor: captures_cursor];
            let _: () = msg_send![*input, setCapturesMouseClicks: captures_clicks];

            self.screen_input = Some(input);
        }

        Ok(display)
    }

    fn attach_audio_input(&mut self, device: &AudioDevice) -> Result<(), String> {
        autoreleasepool(|| unsafe {
            let av_device = device_with_unique_id(&device.id)
                .ok_or_else(|| format!("audio device {} is no longer available", device.id))?;

            let mut error: id = nil;
            let input: id = msg_send![class!(AVCaptureDeviceInput),
                deviceInputWithDevice: av_device
                error: &mut error as *mut id];
            if input == nil {
                return Err(describe_error(error));
            }

            self.add_input(input)?;
            self.audio_input = Some(StrongPtr::retain(input));
            log::info!("Attached audio input: {}", device.name);
            Ok(())
        })
    }

    fn attach_screen_input(&mut self) -> Result<(), String> {
        let input = self
            .screen_input
            .as_ref()
            .map(|input| **input)
            .ok_or_else(|| "screen input was not created".to_string())?;
        unsafe { self.add_input(input) }
    }

    fn attach_frame_output(&mut self) -> Result<(), String> {
        unsafe {
            let output: id = msg_send![class!(AVCaptureVideoDataOutput), new];
            if output == nil {
                return Err("failed to create AVCaptureVideoDataOutput".into());
            }
            let output = StrongPtr::new(output);

            // Ask for packed BGRA so every buffer has a single plane.
            let settings = CFDictionary::from_CFType_pairs(&[(
                CFString::wrap_under_get_rule(kCVPixelBufferPixelFormatTypeKey),
                CFNumber::from(kCVPixelFormatType_32BGRA as i32),
            )]);
            let _: () = msg_send![*output, setVideoSettings: settings.as_concrete_TypeRef() as id];
            let _: () = msg_send![*output, setAlwaysDiscardsLateVideoFrames: YES];

            let can_add: BOOL = msg_send![*self.session, canAddOutput: *output];
            if can_add == NO {
                return Err("session refused video data output".into());
            }
            let _: () = msg_send![*self.session, addOutput: *output];
            self.output = Some(output);
        }
        Ok(())
    }

    fn start_running(&mut self, sink: FrameSink) -> Result<(), String> {
        let output = self
            .output
            .as_ref()
            .map(|output| **output)
            .ok_or_else(|| "frame output was not attached".to_string())?;

        self.context.set_sink(Some(sink));
        unsafe {
            let _: () = msg_send![output, setSampleBufferDelegate: *self.delegate queue: self.queue];
            let _: () = msg_send![*self.session, startRunning];
        }

        if !self.is_running() {
            self.context.set_sink(None);
            return Err("AVCaptureSession did not start running".into());
        }
        log::info!("AVCaptureSession running");
        Ok(())
    }

    fn stop_running(&mut self) {
        unsafe {
            let _: () = msg_send![*self.session, stopRunning];
        }
        self.context.set_sink(None);
        log::info!("AVCaptureSession stopped");
    }

    fn is_running(&self) -> bool {
        let running: BOOL = unsafe { msg_send![*self.session, isRunning] };
        running != NO
    }
}

extern "C" fn drain(_context: *mut c_void) {}

impl Drop for AvCaptureGraph {
    fn drop(&mut self) {
        if self.is_running() {
            self.stop_running();
        }
        unsafe {
            if let Some(output) = &self.output {
                let _: () = msg_send![**output, setSampleBufferDelegate: nil queue: ptr::null_mut::<c_void>()];
            }
            // No new callbacks are scheduled once the delegate is unset; wait
            // out any already queued before touching the ivar they read.
            dispatch_sync_f(self.queue, ptr::null_mut(), drain);
            detach_context(*self.delegate);
            dispatch_release(self.queue);
        }
    }
}
