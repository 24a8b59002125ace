//! Ready-made vertex setups.
//!
//! Each scene is a set of vertex buffers (and optionally an index buffer)
//! covering one way of arranging vertex data: interleaved, split across
//! buffers, deinterleaved inside one buffer, packed host structs, and
//! per-instance matrices. Scenes can also be declared in the config file.

pub mod data;

use std::mem::offset_of;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::gpu::buffer::{IndexBuffer, VertexBuffer};
use crate::gpu::vertex_array::{VertexArray, VertexArrayBackend};
use crate::layout::{BufferLayout, ElementKind, LayoutElement};

use self::data::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind
{
        HelloTriangle,
        Diamond,
        Square,
        PackedTriangle,
        TexturedQuad,
        InstancedQuads,
}

impl SceneKind
{
        pub const ALL: [SceneKind; 6] = [
                SceneKind::HelloTriangle,
                SceneKind::Diamond,
                SceneKind::Square,
                SceneKind::PackedTriangle,
                SceneKind::TexturedQuad,
                SceneKind::InstancedQuads,
        ];
}

/// Buffers making up one vertex array, before assembly.
#[derive(Debug)]
pub struct Scene
{
        pub name: String,

        /// Buffers in attach order, with their instancing flag.
        pub vertex_buffers: Vec<(VertexBuffer, bool)>,

        pub index_buffer: Option<IndexBuffer>,
}

impl Scene
{
        pub fn new(name: impl Into<String>) -> Self
        {
                Self {
                        name: name.into(),
                        vertex_buffers: Vec::new(),
                        index_buffer: None,
                }
        }

        pub fn with_vertex_buffer(
                mut self,
                vbo: VertexBuffer,
                instanced: bool,
        ) -> Self
        {
                self.vertex_buffers.push((vbo, instanced));
                self
        }

        pub fn with_index_buffer(
                mut self,
                ibo: IndexBuffer,
        ) -> Self
        {
                self.index_buffer = Some(ibo);
                self
        }

        pub fn build(kind: SceneKind) -> Self
        {
                match kind
                {
                        SceneKind::HelloTriangle => Self::new("hello_triangle").with_vertex_buffer(
                                VertexBuffer::new(
                                        "triangle",
                                        HELLO_TRIANGLE,
                                        BufferLayout::new([
                                                LayoutElement::new(ElementKind::Float3, "position"),
                                                LayoutElement::new(ElementKind::Float3, "color"),
                                        ]),
                                ),
                                false,
                        ),

                        // One buffer per attribute.
                        SceneKind::Diamond => Self::new("diamond")
                                .with_vertex_buffer(
                                        VertexBuffer::new(
                                                "diamond positions",
                                                DIAMOND_POSITIONS,
                                                BufferLayout::new([LayoutElement::new(ElementKind::Float3, "position")]),
                                        ),
                                        false,
                                )
                                .with_vertex_buffer(
                                        VertexBuffer::new(
                                                "diamond colors",
                                                DIAMOND_COLORS,
                                                BufferLayout::new([LayoutElement::new(ElementKind::Float3, "color")]),
                                        ),
                                        false,
                                ),

                        SceneKind::Square => Self::new("square").with_vertex_buffer(
                                VertexBuffer::new(
                                        "square",
                                        SQUARE,
                                        BufferLayout::new([
                                                LayoutElement::new(ElementKind::Float3, "position"),
                                                LayoutElement::new(ElementKind::Float3, "color").at(SQUARE_COLOR_OFFSET),
                                        ]),
                                ),
                                false,
                        ),

                        SceneKind::PackedTriangle => Self::new("packed_triangle").with_vertex_buffer(
                                VertexBuffer::new(
                                        "packed triangle",
                                        PACKED_TRIANGLE,
                                        BufferLayout::new([
                                                LayoutElement::new(ElementKind::Float3, "position"),
                                                LayoutElement::new(ElementKind::UInt8x3, "color")
                                                        .relative(offset_of!(PackedVertex, color) as u32)
                                                        .normalized(),
                                        ]),
                                ),
                                false,
                        ),

                        SceneKind::TexturedQuad => Self::new("textured_quad")
                                .with_vertex_buffer(
                                        VertexBuffer::new(
                                                "quad",
                                                TEXTURED_QUAD,
                                                BufferLayout::new([
                                                        LayoutElement::new(ElementKind::Float2, "position"),
                                                        LayoutElement::new(ElementKind::Float3, "color")
                                                                .relative(offset_of!(TexturedVertex, color) as u32),
                                                        LayoutElement::new(ElementKind::Float2, "tex_coords")
                                                                .relative(offset_of!(TexturedVertex, tex_coords) as u32),
                                                ]),
                                        ),
                                        false,
                                )
                                .with_index_buffer(IndexBuffer::new("quad indices", QUAD_INDICES)),

                        SceneKind::InstancedQuads => Self::new("instanced_quads")
                                .with_vertex_buffer(
                                        VertexBuffer::new(
                                                "quad corners",
                                                QUAD_CORNERS,
                                                BufferLayout::new([LayoutElement::new(ElementKind::Float2, "corner")]),
                                        ),
                                        false,
                                )
                                .with_vertex_buffer(
                                        VertexBuffer::new(
                                                "instances",
                                                &instance_grid(4, 4),
                                                BufferLayout::new([
                                                        LayoutElement::new(ElementKind::Mat4, "model"),
                                                        LayoutElement::new(ElementKind::Float4, "tint"),
                                                ]),
                                        ),
                                        true,
                                )
                                .with_index_buffer(IndexBuffer::new("quad indices", QUAD_INDICES)),
                }
        }

        /// Scene with one zero-filled buffer shaped by a config-declared layout.
        pub fn from_config(config: &LayoutConfig) -> Self
        {
                let layout: BufferLayout = config.elements.iter().map(|e| e.to_element()).collect();

                let size = layout.stride() as usize * config.vertex_count as usize;

                Self::new(config.name.clone()).with_vertex_buffer(
                        VertexBuffer::with_capacity(config.name.clone(), size, layout),
                        config.instanced,
                )
        }

        pub fn upload(
                &mut self,
                device: &wgpu::Device,
                queue: &wgpu::Queue,
        )
        {
                for (vbo, _) in self.vertex_buffers.iter_mut()
                {
                        vbo.upload(device, queue);
                }

                if let Some(ibo) = self.index_buffer.as_mut()
                {
                        ibo.upload(device);
                }
        }

        /// Attaches every buffer to a fresh vertex array on `backend`.
        pub fn assemble<B: VertexArrayBackend>(
                self,
                backend: B,
        ) -> anyhow::Result<VertexArray<B>>
        {
                let mut vao = VertexArray::new(backend);

                for (vbo, instanced) in self.vertex_buffers
                {
                        vao.add_vertex_buffer(Arc::new(vbo), instanced)?;
                }

                if let Some(ibo) = self.index_buffer
                {
                        vao.set_index_buffer(Arc::new(ibo))?;
                }

                Ok(vao)
        }
}

#[cfg(test)]
mod tests
{
        use super::*;
        use crate::gpu::recorder::CommandRecorder;

        #[test]
        fn packed_vertex_has_no_padding()
        {
                assert_eq!(size_of::<PackedVertex>(), 15);
                assert_eq!(offset_of!(PackedVertex, color), 12);
        }

        #[test]
        fn every_scene_assembles()
        {
                for kind in SceneKind::ALL
                {
                        let vao = Scene::build(kind).assemble(CommandRecorder::new()).unwrap();

                        assert!(vao.next_slot() > 0, "{kind:?} bound no slots");
                }
        }

        #[test]
        fn instanced_scene_uses_matrix_slots()
        {
                let vao = Scene::build(SceneKind::InstancedQuads)
                        .assemble(CommandRecorder::new())
                        .unwrap();

                // corner, four model columns, tint
                assert_eq!(vao.next_slot(), 6);
                assert_eq!(vao.bindings()[1].stride, 80);
                assert!(vao.bindings()[1..].iter().all(|b| b.divisor == 1));
                assert_eq!(vao.bindings()[5].byte_offset, 64);
                assert_eq!(vao.vertex_buffers()[1].size(), 16 * 80);
        }

        #[test]
        fn textured_quad_matches_host_struct()
        {
                let scene = Scene::build(SceneKind::TexturedQuad);
                let layout = scene.vertex_buffers[0].0.layout();

                assert_eq!(layout.stride() as usize, size_of::<TexturedVertex>());
                assert_eq!(
                        layout.iter().map(|e| e.offset()).collect::<Vec<_>>(),
                        vec![0, 8, 20]
                );
        }
}
