//! Minimal render pipeline built around a vertex array's `wgpu` slots.
//!
//! The vertex shader declares one input per slot with the type its format
//! produces, so pipeline creation checks the vertex state the same way a
//! real renderer's pipeline would.

use std::fmt::Write;

use crate::gpu::buffer::UniformBuffer;
use crate::gpu::wgpu_backend::WgpuVertexSlot;

pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// WGSL type a vertex input of `format` has to be declared as.
pub fn vertex_input_type(format: wgpu::VertexFormat) -> anyhow::Result<&'static str>
{
        use wgpu::VertexFormat as F;

        let ty = match format
        {
                F::Float32 => "f32",
                F::Float32x2 | F::Unorm8x2 | F::Snorm8x2 => "vec2<f32>",
                F::Float32x3 => "vec3<f32>",
                F::Float32x4 | F::Unorm8x4 | F::Snorm8x4 => "vec4<f32>",

                F::Sint32 => "i32",
                F::Sint32x2 | F::Sint8x2 => "vec2<i32>",
                F::Sint32x3 => "vec3<i32>",
                F::Sint32x4 | F::Sint8x4 => "vec4<i32>",

                F::Uint32 => "u32",
                F::Uint32x2 | F::Uint8x2 => "vec2<u32>",
                F::Uint32x3 => "vec3<u32>",
                F::Uint32x4 | F::Uint8x4 => "vec4<u32>",

                other => anyhow::bail!("No WGSL input type for {other:?}"),
        };

        Ok(ty)
}

/// Shader reading every slot and writing the tint uniform at `tint_binding`.
pub fn shader_source(
        slots: &[WgpuVertexSlot],
        tint_binding: u32,
) -> anyhow::Result<String>
{
        let mut inputs = Vec::with_capacity(slots.len());

        for slot in slots
        {
                let location = slot.attribute.shader_location;

                inputs.push(format!(
                        "@location({location}) a{location}: {}",
                        vertex_input_type(slot.attribute.format)?
                ));
        }

        let mut source = String::new();

        writeln!(source, "@group(0) @binding({tint_binding}) var<uniform> tint: vec4<f32>;")?;
        writeln!(source)?;
        writeln!(source, "@vertex")?;
        writeln!(source, "fn vs_main({}) -> @builtin(position) vec4<f32> {{", inputs.join(", "))?;
        writeln!(source, "    return vec4<f32>(0.0, 0.0, 0.0, 1.0);")?;
        writeln!(source, "}}")?;
        writeln!(source)?;
        writeln!(source, "@fragment")?;
        writeln!(source, "fn fs_main() -> @location(0) vec4<f32> {{")?;
        writeln!(source, "    return tint;")?;
        writeln!(source, "}}")?;

        Ok(source)
}

/// Render pipeline whose vertex state is exactly a vertex array's slots.
#[derive(Debug)]
pub struct VertexPipeline
{
        pub render_pipeline: wgpu::RenderPipeline,
        pub bind_group: wgpu::BindGroup,
}

impl VertexPipeline
{
        pub fn new(
                device: &wgpu::Device,
                slots: &[WgpuVertexSlot],
                tint: &UniformBuffer,
        ) -> anyhow::Result<Self>
        {
                let source = shader_source(slots, tint.binding())?;

                let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                        label: Some("Vertex Array Shader"),
                        source: wgpu::ShaderSource::Wgsl(source.into()),
                });

                let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                        label: Some("Tint Bind Group Layout"),
                        entries: &[tint.layout_entry(wgpu::ShaderStages::FRAGMENT)],
                });

                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                        label: Some("Tint Bind Group"),
                        layout: &bind_group_layout,
                        entries: &[tint.bind_group_entry()],
                });

                let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                        label: Some("Vertex Array Pipeline Layout"),
                        bind_group_layouts: &[&bind_group_layout],
                        push_constant_ranges: &[],
                });

                let buffers: Vec<wgpu::VertexBufferLayout<'_>> = slots.iter().map(WgpuVertexSlot::layout).collect();

                let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                        label: Some("Vertex Array Pipeline"),
                        layout: Some(&layout),
                        vertex: wgpu::VertexState {
                                module: &shader,
                                entry_point: Some("vs_main"),
                                buffers: &buffers,
                                compilation_options: wgpu::PipelineCompilationOptions::default(),
                        },
                        fragment: Some(wgpu::FragmentState {
                                module: &shader,
                                entry_point: Some("fs_main"),
                                targets: &[Some(wgpu::ColorTargetState {
                                        format: TARGET_FORMAT,
                                        blend: None,
                                        write_mask: wgpu::ColorWrites::ALL,
                                })],
                                compilation_options: wgpu::PipelineCompilationOptions::default(),
                        }),
                        primitive: wgpu::PrimitiveState::default(),
                        depth_stencil: None,
                        multisample: wgpu::MultisampleState::default(),
                        multiview: None,
                        cache: None,
                });

                Ok(Self {
                        render_pipeline,
                        bind_group,
                })
        }
}
