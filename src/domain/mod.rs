// Domain layer - Points and the buffers that hold them
pub mod error;
pub mod point;
pub mod point_buffer;
