//! Stride: vertex buffer layouts and attribute bindings
//!
//! This crate turns a declarative list of vertex attributes into the binding
//! calls a graphics backend needs, and composes vertex buffers into vertex
//! arrays on top of that.
//!
//! # Layouts
//!
//! A [`BufferLayout`] is built once from [`LayoutElement`]s and owned by the
//! buffer it describes. It computes the stride of the buffer and the byte
//! offset of every element. Three arrangements are covered:
//!
//! - interleaved records, where offsets accumulate,
//! - deinterleaved regions in one buffer, started by an explicit
//!   [`LayoutElement::at`] offset, which stop the stride accumulation,
//! - packed host structs, whose field offsets are passed through with
//!   [`LayoutElement::relative`] (typically from `std::mem::offset_of!`).
//!
//! ```
//! use stride::{BufferLayout, ElementKind, LayoutElement};
//!
//! let layout = BufferLayout::new([
//!         LayoutElement::new(ElementKind::Float3, "position"),
//!         LayoutElement::new(ElementKind::Float3, "color").at(72),
//! ]);
//!
//! assert_eq!(layout.stride(), 12);
//! assert_eq!(layout.elements()[1].offset(), 72);
//! ```
//!
//! # Bindings
//!
//! [`generate_bindings`] walks a layout and emits one [`AttributeBinding`]
//! per attribute slot. Matrices take one slot per column and always advance
//! per instance. The slot counter is passed in and handed back, so every
//! buffer of one vertex array draws from the same numbering.
//!
//! # Vertex arrays and backends
//!
//! [`gpu::vertex_array::VertexArray`] owns that counter and forwards each
//! binding to a [`gpu::vertex_array::VertexArrayBackend`]:
//!
//! - [`gpu::recorder::CommandRecorder`] keeps the calls for inspection,
//! - [`gpu::wgpu_backend::WgpuVertexState`] turns them into
//!   `wgpu::VertexBufferLayout`s and binds the buffers into a render pass.
//!
//! # Logging, errors, and configuration
//!
//! - Logging goes through `log`; the binary initialises `env_logger`, so set
//!   `RUST_LOG=debug` to see every binding.
//! - Fallible operations return `anyhow::Result`. Misusing a layout (for
//!   example attaching a buffer with no elements) panics.
//! - The binary reads `stride.toml` (or `$STRIDE_CONFIG`), see
//!   [`config::Config`].

pub mod config;
pub mod gpu;
pub mod layout;
pub mod scenes;
pub mod utils;

pub use layout::{
        AttributeBinding, BufferLayout, ElementKind, LayoutElement, ScalarType, compute_offsets,
        compute_stride, generate_bindings,
};

use crate::config::Config;
use crate::gpu::device::HeadlessGpu;
use crate::gpu::recorder::CommandRecorder;
use crate::gpu::wgpu_backend::WgpuVertexState;
use crate::scenes::Scene;

/// Built-in scenes selected by the config, followed by its declared layouts.
pub fn scenes(config: &Config) -> Vec<Scene>
{
        config.scenes
                .iter()
                .map(|kind| Scene::build(*kind))
                .chain(config.layouts.iter().map(Scene::from_config))
                .collect()
}

/// Assembles every configured scene and reports its bindings.
///
/// With `gpu_validation` set, the scenes are also uploaded to a headless
/// device, translated to `wgpu` vertex state and drawn once through a
/// pipeline built from it.
///
/// # Returns
///
/// - `Ok(())` when every step ran. Scenes that cannot be expressed in `wgpu`
///   are logged, not returned as errors.
/// - An error if a scene fails to assemble or no device is available.
pub fn run() -> anyhow::Result<()>
{
        utils::bootstrap::config_logging();

        let config = utils::bootstrap::create_config();

        utils::bootstrap::show_start_message(&config);

        for scene in scenes(&config)
        {
                let name = scene.name.clone();

                let vao = scene.assemble(CommandRecorder::new())?;

                log::info!(
                        "{name}: {} buffer(s), {} slot(s)",
                        vao.vertex_buffers().len(),
                        vao.next_slot()
                );

                if config.dump_bindings
                {
                        println!("{}", utils::report::binding_dump(&name, &vao));
                }
        }

        if config.gpu_validation
        {
                validate_on_gpu(&config)?;
        }

        Ok(())
}

fn validate_on_gpu(config: &Config) -> anyhow::Result<()>
{
        let gpu = HeadlessGpu::request()?;

        let mut drawn = 0;
        let all = scenes(config);
        let total = all.len();

        for mut scene in all
        {
                let name = scene.name.clone();

                scene.upload(&gpu.device, &gpu.queue);

                let slots = match scene
                        .assemble(WgpuVertexState::new())
                        .and_then(|vao| gpu.draw_vertex_array(&vao))
                {
                        Ok(slots) => slots,
                        Err(e) =>
                        {
                                log::warn!("{name}: not drawable with wgpu: {e:#}");
                                continue;
                        }
                };

                if config.dump_bindings
                {
                        println!("{}", utils::report::slot_summary(&name, &slots));
                }

                drawn += 1;
        }

        log::info!("{drawn} of {total} scene(s) drawn through a wgpu pipeline");

        Ok(())
}
