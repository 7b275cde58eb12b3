//! Small helpers for Foundation objects.

use std::ffi::{c_char, CStr};

use cocoa::base::{id, nil};
use cocoa::foundation::NSString;
use objc::rc::StrongPtr;
use objc::{msg_send, sel, sel_impl};

/// Copy an `NSString` into a Rust `String`. Empty for nil.
pub unsafe fn nsstring_to_string(string: id) -> String {
    if string == nil {
        return String::new();
    }
    let utf8: *const c_char = msg_send![string, UTF8String];
    if utf8.is_null() {
        return String::new();
    }
    CStr::from_ptr(utf8).to_string_lossy().into_owned()
}

/// An owned `NSString` holding `value`.
pub unsafe fn nsstring(value: &str) -> StrongPtr {
    StrongPtr::new(NSString::alloc(nil).init_str(value))
}

/// `localizedDescription` of an `NSError`, or a fallback for nil.
pub unsafe fn describe_error(error: id) -> String {
    if error == nil {
        return "unknown error".into();
    }
    let description: id = msg_send![error, localizedDescription];
    nsstring_to_string(description)
}
