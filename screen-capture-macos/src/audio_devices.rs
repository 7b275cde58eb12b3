//! Audio capture device enumeration via `AVCaptureDevice`.

use cocoa::base::{id, nil};
use objc::rc::autoreleasepool;
use objc::runtime::{BOOL, NO};
use objc::{class, msg_send, sel, sel_impl};

use screen_capture_core::{AudioDevice, CaptureError, MediaType, TransportType};

use crate::ffi::{AVMediaTypeAudio, AVMediaTypeMuxed, AVMediaTypeVideo};
use crate::foundation::{nsstring, nsstring_to_string};

/// All devices that advertise the audio media type.
pub fn list_audio_devices() -> Result<Vec<AudioDevice>, CaptureError> {
    autoreleasepool(|| unsafe {
        let devices: id = msg_send![class!(AVCaptureDevice), devicesWithMediaType: AVMediaTypeAudio];
        if devices == nil {
            return Ok(Vec::new());
        }

        let default_id = default_device_id();
        let count: usize = msg_send![devices, count];
        let mut result = Vec::with_capacity(count);

        for i in 0..count {
            let device: id = msg_send![devices, objectAtIndex: i];
            if device == nil {
                continue;
            }
            let mut info = describe_device(device);
            info.is_default = default_id.as_deref() == Some(info.id.as_str());
            result.push(info);
        }

        Ok(result)
    })
}

/// The system default audio input, if any.
pub fn default_audio_device() -> Option<AudioDevice> {
    autoreleasepool(|| unsafe {
        let device: id =
            msg_send![class!(AVCaptureDevice), defaultDeviceWithMediaType: AVMediaTypeAudio];
        if device == nil {
            return None;
        }
        let mut info = describe_device(device);
        info.is_default = true;
        Some(info)
    })
}

/// Look up a device by unique ID. The result is autoreleased.
pub(crate) unsafe fn device_with_unique_id(unique_id: &str) -> Option<id> {
    let unique_id = nsstring(unique_id);
    let device: id = msg_send![class!(AVCaptureDevice), deviceWithUniqueID: *unique_id];
    if device == nil {
        None
    } else {
        Some(device)
    }
}

unsafe fn default_device_id() -> Option<String> {
    let device: id = msg_send![class!(AVCaptureDevice), defaultDeviceWithMediaType: AVMediaTypeAudio];
    if device == nil {
        return None;
    }
    let unique_id: id = msg_send![device, uniqueID];
    Some(nsstring_to_string(unique_id))
}

unsafe fn describe_device(device: id) -> AudioDevice {
    let unique_id: id = msg_send![device, uniqueID];
    let name: id = msg_send![device, localizedName];

    let mut media_types = Vec::new();
    for (media_type, av_media_type) in [
        (MediaType::Audio, AVMediaTypeAudio),
        (MediaType::Video, AVMediaTypeVideo),
        (MediaType::Muxed, AVMediaTypeMuxed),
    ] {
        let has: BOOL = msg_send![device, hasMediaType: av_media_type];
        if has != NO {
            media_types.push(media_type);
        }
    }

    let transport: i32 = msg_send![device, transportType];

    AudioDevice {
        id: nsstring_to_string(unique_id),
        name: nsstring_to_string(name),
        media_types,
        is_default: false,
        transport_type: Some(transport_type_from_code(transport as u32)),
    }
}

/// Map a CoreAudio `kAudioDeviceTransportType*` four-character code.
pub fn transport_type_from_code(code: u32) -> TransportType {
    match &code.to_be_bytes() {
        b"bltn" => TransportType::BuiltIn,
        b"blue" => TransportType::Bluetooth,
        b"blea" => TransportType::BluetoothLE,
        b"usb " => TransportType::Usb,
        b"virt" => TransportType::Virtual,
        b"grup" | b"aggr" => TransportType::Aggregate,
        _ => TransportType::Unknown,
    }
}
