//! Display enumeration via CoreGraphics.

use core_graphics::display::{CGDirectDisplayID, CGDisplay};

use screen_capture_core::{CaptureError, DisplayInfo};

fn display_info(id: CGDirectDisplayID, main_id: CGDirectDisplayID) -> DisplayInfo {
    let display = CGDisplay::new(id);
    DisplayInfo {
        id,
        width: display.pixels_wide() as u32,
        height: display.pixels_high() as u32,
        is_main: id == main_id,
    }
}

/// All active displays, main display first.
pub fn list_displays() -> Result<Vec<DisplayInfo>, CaptureError> {
    let ids = CGDisplay::active_displays()
        .map_err(|e| CaptureError::Backend(format!("CGGetActiveDisplayList failed: {}", e)))?;
    let main_id = CGDisplay::main().id;

    let mut displays: Vec<DisplayInfo> = ids.into_iter().map(|id| display_info(id, main_id)).collect();
    displays.sort_by_key(|d| !d.is_main);
    Ok(displays)
}

pub fn main_display() -> Option<DisplayInfo> {
    let main = CGDisplay::main();
    if !main.is_active() {
        return None;
    }
    Some(display_info(main.id, main.id))
}

/// Info for an active display, or `None` if `id` is not an active display.
pub fn find_display(id: CGDirectDisplayID) -> Option<DisplayInfo> {
    let ids = CGDisplay::active_displays().ok()?;
    if !ids.contains(&id) {
        return None;
    }
    Some(display_info(id, CGDisplay::main().id))
}
