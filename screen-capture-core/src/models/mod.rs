pub mod config;
pub mod devices;
pub mod error;
pub mod event;
pub mod frame;
pub mod geometry;
pub mod state;
pub mod summary;
