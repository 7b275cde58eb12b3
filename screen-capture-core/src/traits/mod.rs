pub mod capture_backend;
pub mod capture_handler;
pub mod pixel_buffer;
