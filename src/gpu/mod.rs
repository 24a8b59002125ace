pub mod buffer;
pub mod device;
pub mod pipeline;
pub mod recorder;
pub mod vertex_array;
pub mod wgpu_backend;
