pub mod event_hub;
pub mod screen_capture;
