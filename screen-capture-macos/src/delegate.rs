//! Objective-C sample buffer delegate that forwards frames to a `FrameSink`.

use std::ffi::c_void;
use std::sync::Once;

use cocoa::base::id;
use objc::declare::ClassDecl;
use objc::runtime::{Class, Object, Sel};
use objc::{class, msg_send, sel, sel_impl};
use parking_lot::Mutex;

use screen_capture_core::FrameSink;

use crate::ffi::CMSampleBufferGetPresentationTimeStamp;
use crate::pixel_buffer::CvPixelBuffer;

const DELEGATE_CLASS: &str = "SCKFrameDelegate";
const CONTEXT_IVAR: &str = "_sckContext";

/// Rust state reachable from the delegate object through its context ivar.
///
/// Owned (boxed) by the capture graph, which outlives the delegate's
/// registration on the output.
pub(crate) struct DelegateContext {
    sink: Mutex<Option<FrameSink>>,
}

impl DelegateContext {
    pub(crate) fn new() -> Self {
        Self {
            sink: Mutex::new(None),
        }
    }

    pub(crate) fn set_sink(&self, sink: Option<FrameSink>) {
        *self.sink.lock() = sink;
    }

    fn current_sink(&self) -> Option<FrameSink> {
        self.sink.lock().clone()
    }
}

fn delegate_class() -> Option<&'static Class> {
    static REGISTER: Once = Once::new();

    REGISTER.call_once(|| {
        let mut decl = match ClassDecl::new(DELEGATE_CLASS, class!(NSObject)) {
            Some(decl) => decl,
            // Already registered by another copy of this library.
            None => return,
        };
        decl.add_ivar::<*mut c_void>(CONTEXT_IVAR);

        unsafe {
            decl.add_method(
                sel!(captureOutput:didOutputSampleBuffer:fromConnection:),
                did_output_sample_buffer as extern "C" fn(&Object, Sel, id, id, id),
            );
        }
        decl.register();
    });

    Class::get(DELEGATE_CLASS)
}

/// Create a delegate object bound to `context`. Returned at +1.
///
/// # Safety
/// `context` must stay valid until [`detach_context`] has been called on the
/// returned object.
pub(crate) unsafe fn new_delegate(context: *const DelegateContext) -> Result<id, String> {
    let class = delegate_class().ok_or_else(|| format!("failed to register {}", DELEGATE_CLASS))?;
    let delegate: id = msg_send![class, new];
    if delegate.is_null() {
        return Err(format!("failed to create {}", DELEGATE_CLASS));
    }
    (*delegate).set_ivar::<*mut c_void>(CONTEXT_IVAR, context as *mut c_void);
    Ok(delegate)
}

/// Unbind the delegate from its context. Later callbacks become no-ops.
///
/// # Safety
/// No callback may be running on the delegate queue: the ivar is written
/// without synchronization. Unset the output's delegate and drain its queue
/// first.
pub(crate) unsafe fn detach_context(delegate: id) {
    (*delegate).set_ivar::<*mut c_void>(CONTEXT_IVAR, std::ptr::null_mut());
}

extern "C" fn did_output_sample_buffer(
    this: &Object,
    _cmd: Sel,
    _output: id,
    sample_buffer: id,
    _connection: id,
) {
    let context = unsafe { *this.get_ivar::<*mut c_void>(CONTEXT_IVAR) } as *const DelegateContext;
    if context.is_null() {
        return;
    }
    // SAFETY: the graph keeps the context alive until it has detached it and
    // drained the delegate queue.
    let Some(sink) = (unsafe { &*context }).current_sink() else {
        return;
    };

    let sample_buffer = sample_buffer as *mut c_void;
    if sample_buffer.is_null() {
        sink.deliver::<CvPixelBuffer>(None, Default::default());
        return;
    }

    unsafe {
        let timestamp = CMSampleBufferGetPresentationTimeStamp(sample_buffer).to_duration();
        let buffer = CvPixelBuffer::from_sample_buffer(sample_buffer);
        sink.deliver(buffer.as_ref(), timestamp);
    }
}
