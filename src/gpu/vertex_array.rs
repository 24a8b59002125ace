use std::sync::Arc;

use anyhow::Context;

use crate::gpu::buffer::{BufferHandle, IndexBuffer, VertexBuffer};
use crate::layout::{AttributeBinding, ScalarType, generate_bindings};

/// Binding calls a rendering context has to offer a vertex array.
///
/// Attribute slots and buffer binding indices share one numbering: slot `n`
/// always fetches from binding index `n`.
pub trait VertexArrayBackend
{
        /// Called for every binding of a buffer before any call for that
        /// buffer is issued. An error here leaves the backend untouched.
        fn check_binding(
                &self,
                _binding: &AttributeBinding,
        ) -> anyhow::Result<()>
        {
                Ok(())
        }

        /// Attaches `buffer` to a binding index.
        fn bind_vertex_buffer(
                &mut self,
                binding_index: u32,
                buffer: BufferHandle,
                offset: u32,
                stride: u32,
        ) -> anyhow::Result<()>;

        fn enable_attribute(
                &mut self,
                slot: u32,
        ) -> anyhow::Result<()>;

        /// Describes how a slot reads its data. `relative_offset` is counted
        /// from the start of the buffer binding the slot fetches from.
        fn attribute_format(
                &mut self,
                slot: u32,
                component_count: u32,
                scalar_type: ScalarType,
                normalized: bool,
                relative_offset: u32,
        ) -> anyhow::Result<()>;

        fn attribute_binding(
                &mut self,
                slot: u32,
                binding_index: u32,
        ) -> anyhow::Result<()>;

        fn binding_divisor(
                &mut self,
                binding_index: u32,
                divisor: u32,
        ) -> anyhow::Result<()>;

        fn element_buffer(
                &mut self,
                buffer: BufferHandle,
        ) -> anyhow::Result<()>;
}

/// Composes vertex buffers into one set of attribute slots.
///
/// Slots are numbered across every buffer added, in the order the buffers
/// are added, and are never reused.
#[derive(Debug)]
pub struct VertexArray<B: VertexArrayBackend>
{
        backend: B,

        vertex_buffers: Vec<Arc<VertexBuffer>>,
        index_buffer: Option<Arc<IndexBuffer>>,

        bindings: Vec<AttributeBinding>,
        next_slot: u32,
}

impl<B: VertexArrayBackend> VertexArray<B>
{
        pub fn new(backend: B) -> Self
        {
                Self {
                        backend,
                        vertex_buffers: Vec::new(),
                        index_buffer: None,
                        bindings: Vec::new(),
                        next_slot: 0,
                }
        }

        /// Wires every attribute of `vbo` to the next free slots.
        ///
        /// With `instanced` set, the buffer's attributes advance once per
        /// instance instead of once per vertex.
        ///
        /// # Panics
        /// If the buffer has no layout elements.
        pub fn add_vertex_buffer(
                &mut self,
                vbo: Arc<VertexBuffer>,
                instanced: bool,
        ) -> anyhow::Result<()>
        {
                assert!(
                        !vbo.layout().is_empty(),
                        "Vertex buffer '{}' has no layout",
                        vbo.label()
                );

                let (bindings, next_slot) =
                        generate_bindings(vbo.layout(), vbo.handle(), self.next_slot, instanced);

                for binding in &bindings
                {
                        self.backend
                                .check_binding(binding)
                                .with_context(|| format!("Vertex buffer '{}' rejected", vbo.label()))?;
                }

                for binding in &bindings
                {
                        self.specify_attribute(binding)?;
                }

                log::debug!(
                        "Vertex buffer '{}' bound to slots {}..{}",
                        vbo.label(),
                        self.next_slot,
                        next_slot
                );

                self.bindings.extend(bindings);
                self.next_slot = next_slot;
                self.vertex_buffers.push(vbo);

                Ok(())
        }

        fn specify_attribute(
                &mut self,
                binding: &AttributeBinding,
        ) -> anyhow::Result<()>
        {
                let slot = binding.slot_index;

                log::debug!(
                        "slot {slot}: buffer {} stride {} {}x{:?}{} @ {} divisor {}",
                        binding.buffer,
                        binding.stride,
                        binding.component_count,
                        binding.scalar_type,
                        if binding.normalized { " (normalized)" } else { "" },
                        binding.byte_offset,
                        binding.divisor
                );

                self.backend
                        .bind_vertex_buffer(slot, binding.buffer, 0, binding.stride)?;

                self.backend.enable_attribute(slot)?;

                self.backend.attribute_format(
                        slot,
                        binding.component_count,
                        binding.scalar_type,
                        binding.normalized,
                        binding.byte_offset,
                )?;

                self.backend.attribute_binding(slot, slot)?;

                self.backend.binding_divisor(slot, binding.divisor)
        }

        pub fn set_index_buffer(
                &mut self,
                ibo: Arc<IndexBuffer>,
        ) -> anyhow::Result<()>
        {
                self.backend.element_buffer(ibo.handle())?;

                self.index_buffer = Some(ibo);

                Ok(())
        }

        pub fn vertex_buffers(&self) -> &[Arc<VertexBuffer>]
        {
                &self.vertex_buffers
        }

        pub fn index_buffer(&self) -> Option<&Arc<IndexBuffer>>
        {
                self.index_buffer.as_ref()
        }

        pub fn bindings(&self) -> &[AttributeBinding]
        {
                &self.bindings
        }

        /// First slot the next added buffer will use.
        pub fn next_slot(&self) -> u32
        {
                self.next_slot
        }

        pub fn backend(&self) -> &B
        {
                &self.backend
        }

        pub fn into_backend(self) -> B
        {
                self.backend
        }
}

#[cfg(test)]
mod tests
{
        use super::*;
        use crate::gpu::recorder::{BindCommand, CommandRecorder};
        use crate::layout::{BufferLayout, ElementKind, LayoutElement};

        fn vbo(elements: Vec<LayoutElement>) -> Arc<VertexBuffer>
        {
                Arc::new(VertexBuffer::with_capacity("test", 64, BufferLayout::new(elements)))
        }

        #[test]
        fn issues_calls_in_order()
        {
                let buffer = vbo(vec![LayoutElement::new(ElementKind::Float2, "uv")]);
                let handle = buffer.handle();

                let mut vao = VertexArray::new(CommandRecorder::new());

                vao.add_vertex_buffer(buffer, true).unwrap();

                assert_eq!(
                        vao.backend().commands(),
                        &[
                                BindCommand::BindVertexBuffer {
                                        binding_index: 0,
                                        buffer: handle,
                                        offset: 0,
                                        stride: 8,
                                },
                                BindCommand::EnableAttribute { slot: 0 },
                                BindCommand::AttributeFormat {
                                        slot: 0,
                                        component_count: 2,
                                        scalar_type: ScalarType::Float,
                                        normalized: false,
                                        relative_offset: 0,
                                },
                                BindCommand::AttributeBinding {
                                        slot: 0,
                                        binding_index: 0,
                                },
                                BindCommand::BindingDivisor {
                                        binding_index: 0,
                                        divisor: 1,
                                },
                        ]
                );
        }

        #[test]
        fn slots_continue_across_buffers()
        {
                let mut vao = VertexArray::new(CommandRecorder::new());

                vao.add_vertex_buffer(vbo(vec![LayoutElement::new(ElementKind::Mat4, "model")]), true)
                        .unwrap();
                vao.add_vertex_buffer(vbo(vec![LayoutElement::new(ElementKind::Float3, "position")]), false)
                        .unwrap();

                assert_eq!(vao.next_slot(), 5);
                assert_eq!(vao.vertex_buffers().len(), 2);
                assert_eq!(vao.bindings()[4].slot_index, 4);
                assert_eq!(vao.bindings()[4].divisor, 0);
        }

        #[test]
        fn index_buffer_is_forwarded()
        {
                let ibo = Arc::new(IndexBuffer::new("indices", &[0, 1, 2]));
                let handle = ibo.handle();

                let mut vao = VertexArray::new(CommandRecorder::new());

                vao.set_index_buffer(ibo).unwrap();

                assert_eq!(vao.backend().commands(), &[BindCommand::ElementBuffer { buffer: handle }]);
                assert_eq!(vao.index_buffer().map(|i| i.index_count()), Some(3));
        }

        #[test]
        #[should_panic(expected = "has no layout")]
        fn empty_layout_is_rejected()
        {
                let mut vao = VertexArray::new(CommandRecorder::new());

                let _ = vao.add_vertex_buffer(vbo(Vec::new()), false);
        }
}
