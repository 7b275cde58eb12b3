pub mod frame_copy;
pub mod frame_sink;
