pub mod binding;
pub mod buffer_layout;
pub mod element;

pub use binding::{AttributeBinding, PER_INSTANCE, PER_VERTEX, generate_bindings};
pub use buffer_layout::{BufferLayout, compute_offsets, compute_stride};
pub use element::{ElementKind, LayoutElement, ScalarType};
