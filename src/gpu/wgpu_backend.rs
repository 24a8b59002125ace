//! Translation of attribute bindings into `wgpu` vertex state.
//!
//! `wgpu` has no separate "attribute format" and "buffer binding" objects:
//! a pipeline takes one [`wgpu::VertexBufferLayout`] per vertex buffer slot,
//! and a render pass binds one buffer slice per slot. Every attribute slot
//! therefore becomes its own `wgpu` buffer slot. The attribute's byte offset
//! is moved into the start of the buffer slice, which lets deinterleaved
//! regions sit past the stride of the first region.

use std::collections::BTreeMap;

use anyhow::Context;

use crate::gpu::buffer::BufferHandle;
use crate::gpu::vertex_array::{VertexArray, VertexArrayBackend};
use crate::layout::{AttributeBinding, PER_INSTANCE, PER_VERTEX, ScalarType};

/// Required alignment of strides and buffer offsets.
pub const VERTEX_ALIGNMENT: u32 = 4;

/// Vertex format for a slot description, if `wgpu` has one.
///
/// 8-bit data must come in pairs or quads, and 32-bit integers cannot be
/// normalized. Floats ignore `normalized`.
pub fn vertex_format(
        component_count: u32,
        scalar_type: ScalarType,
        normalized: bool,
) -> Option<wgpu::VertexFormat>
{
        use wgpu::VertexFormat as F;

        let format = match (scalar_type, normalized, component_count)
        {
                (ScalarType::Float, _, 1) => F::Float32,
                (ScalarType::Float, _, 2) => F::Float32x2,
                (ScalarType::Float, _, 3) => F::Float32x3,
                (ScalarType::Float, _, 4) => F::Float32x4,

                (ScalarType::Int, false, 1) => F::Sint32,
                (ScalarType::Int, false, 2) => F::Sint32x2,
                (ScalarType::Int, false, 3) => F::Sint32x3,
                (ScalarType::Int, false, 4) => F::Sint32x4,

                (ScalarType::UnsignedInt, false, 1) => F::Uint32,
                (ScalarType::UnsignedInt, false, 2) => F::Uint32x2,
                (ScalarType::UnsignedInt, false, 3) => F::Uint32x3,
                (ScalarType::UnsignedInt, false, 4) => F::Uint32x4,

                (ScalarType::UnsignedByte, false, 2) => F::Uint8x2,
                (ScalarType::UnsignedByte, false, 4) => F::Uint8x4,
                (ScalarType::UnsignedByte, true, 2) => F::Unorm8x2,
                (ScalarType::UnsignedByte, true, 4) => F::Unorm8x4,

                (ScalarType::Byte, false, 2) => F::Sint8x2,
                (ScalarType::Byte, false, 4) => F::Sint8x4,
                (ScalarType::Byte, true, 2) => F::Snorm8x2,
                (ScalarType::Byte, true, 4) => F::Snorm8x4,

                _ => return None,
        };

        Some(format)
}

fn check_stride(
        stride: u32,
        buffer: BufferHandle,
) -> anyhow::Result<()>
{
        if stride % VERTEX_ALIGNMENT != 0
        {
                anyhow::bail!("Stride {stride} of buffer {buffer} is not a multiple of {VERTEX_ALIGNMENT}");
        }

        Ok(())
}

fn check_offset(
        slot: u32,
        offset: u32,
) -> anyhow::Result<()>
{
        if offset % VERTEX_ALIGNMENT != 0
        {
                anyhow::bail!("Offset {offset} of slot {slot} is not a multiple of {VERTEX_ALIGNMENT}");
        }

        Ok(())
}

fn check_divisor(divisor: u32) -> anyhow::Result<()>
{
        if divisor > PER_INSTANCE
        {
                anyhow::bail!("wgpu only steps per vertex or per instance, got divisor {divisor}");
        }

        Ok(())
}

fn slot_format(
        slot: u32,
        component_count: u32,
        scalar_type: ScalarType,
        normalized: bool,
) -> anyhow::Result<wgpu::VertexFormat>
{
        vertex_format(component_count, scalar_type, normalized).with_context(|| {
                format!(
                        "No wgpu vertex format for {component_count} x {scalar_type:?}{} (slot {slot})",
                        if normalized { " normalized" } else { "" }
                )
        })
}

/// A non-zero stride must hold the whole attribute, which sits at offset 0
/// of its slot.
fn check_fits_stride(
        slot: u32,
        format: wgpu::VertexFormat,
        stride: u32,
) -> anyhow::Result<()>
{
        if stride != 0 && format.size() > stride as wgpu::BufferAddress
        {
                anyhow::bail!(
                        "Slot {slot} reads {format:?} ({} bytes), wider than its stride of {stride}",
                        format.size()
                );
        }

        Ok(())
}

#[derive(Debug, Clone, Copy, Default)]
struct Binding
{
        buffer: Option<BufferHandle>,
        offset: u32,
        stride: u32,
        divisor: u32,
}

#[derive(Debug, Clone, Copy)]
struct Attribute
{
        enabled: bool,
        format: Option<wgpu::VertexFormat>,
        relative_offset: u32,
        binding_index: u32,
}

impl Attribute
{
        fn new(slot: u32) -> Self
        {
                Self {
                        enabled: false,
                        format: None,
                        relative_offset: 0,
                        binding_index: slot,
                }
        }
}

/// A fully described `wgpu` vertex buffer slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WgpuVertexSlot
{
        pub buffer: BufferHandle,

        /// Start of the buffer slice to bind.
        pub offset: wgpu::BufferAddress,

        pub array_stride: wgpu::BufferAddress,
        pub step_mode: wgpu::VertexStepMode,

        /// Always at offset 0 within the slice.
        pub attribute: wgpu::VertexAttribute,
}

impl WgpuVertexSlot
{
        pub fn layout(&self) -> wgpu::VertexBufferLayout<'_>
        {
                wgpu::VertexBufferLayout {
                        array_stride: self.array_stride,
                        step_mode: self.step_mode,
                        attributes: std::slice::from_ref(&self.attribute),
                }
        }
}

/// [`VertexArrayBackend`] collecting `wgpu` vertex state.
#[derive(Debug, Default)]
pub struct WgpuVertexState
{
        bindings: BTreeMap<u32, Binding>,
        attributes: BTreeMap<u32, Attribute>,
        element_buffer: Option<BufferHandle>,
}

impl WgpuVertexState
{
        pub fn new() -> Self
        {
                Self::default()
        }

        /// Every enabled slot in slot order. The position in the returned
        /// list is the `wgpu` buffer slot to bind it to.
        pub fn slots(&self) -> anyhow::Result<Vec<WgpuVertexSlot>>
        {
                self.attributes
                        .iter()
                        .filter(|(_, attribute)| attribute.enabled)
                        .map(|(slot, attribute)| -> anyhow::Result<WgpuVertexSlot> {
                                let format = attribute
                                        .format
                                        .with_context(|| format!("Attribute slot {slot} has no format"))?;

                                let binding = self
                                        .bindings
                                        .get(&attribute.binding_index)
                                        .copied()
                                        .unwrap_or_default();

                                let buffer = binding.buffer.with_context(|| {
                                        format!(
                                                "Attribute slot {slot} reads binding {} which has no buffer",
                                                attribute.binding_index
                                        )
                                })?;

                                check_fits_stride(*slot, format, binding.stride)?;

                                let step_mode = match binding.divisor
                                {
                                        PER_VERTEX => wgpu::VertexStepMode::Vertex,
                                        PER_INSTANCE => wgpu::VertexStepMode::Instance,
                                        other => anyhow::bail!("Unsupported divisor {other} on binding {}", attribute.binding_index),
                                };

                                let offset = binding
                                        .offset
                                        .checked_add(attribute.relative_offset)
                                        .with_context(|| {
                                                format!(
                                                        "Attribute slot {slot} at {} past binding offset {} overflows u32",
                                                        attribute.relative_offset, binding.offset
                                                )
                                        })?;

                                Ok(WgpuVertexSlot {
                                        buffer,
                                        offset: offset as wgpu::BufferAddress,
                                        array_stride: binding.stride as wgpu::BufferAddress,
                                        step_mode,
                                        attribute: wgpu::VertexAttribute {
                                                format,
                                                offset: 0,
                                                shader_location: *slot,
                                        },
                                })
                        })
                        .collect()
        }

        pub fn index_buffer(&self) -> Option<BufferHandle>
        {
                self.element_buffer
        }
}

impl VertexArrayBackend for WgpuVertexState
{
        fn check_binding(
                &self,
                binding: &AttributeBinding,
        ) -> anyhow::Result<()>
        {
                let slot = binding.slot_index;

                check_stride(binding.stride, binding.buffer)?;
                check_offset(slot, binding.byte_offset)?;
                check_divisor(binding.divisor)?;

                let format = slot_format(
                        slot,
                        binding.component_count,
                        binding.scalar_type,
                        binding.normalized,
                )?;

                check_fits_stride(slot, format, binding.stride)
        }

        fn bind_vertex_buffer(
                &mut self,
                binding_index: u32,
                buffer: BufferHandle,
                offset: u32,
                stride: u32,
        ) -> anyhow::Result<()>
        {
                check_stride(stride, buffer)?;

                let binding = self.bindings.entry(binding_index).or_default();

                binding.buffer = Some(buffer);
                binding.offset = offset;
                binding.stride = stride;

                Ok(())
        }

        fn enable_attribute(
                &mut self,
                slot: u32,
        ) -> anyhow::Result<()>
        {
                self.attributes
                        .entry(slot)
                        .or_insert_with(|| Attribute::new(slot))
                        .enabled = true;

                Ok(())
        }

        fn attribute_format(
                &mut self,
                slot: u32,
                component_count: u32,
                scalar_type: ScalarType,
                normalized: bool,
                relative_offset: u32,
        ) -> anyhow::Result<()>
        {
                let format = slot_format(slot, component_count, scalar_type, normalized)?;

                check_offset(slot, relative_offset)?;

                let attribute = self
                        .attributes
                        .entry(slot)
                        .or_insert_with(|| Attribute::new(slot));

                attribute.format = Some(format);
                attribute.relative_offset = relative_offset;

                Ok(())
        }

        fn attribute_binding(
                &mut self,
                slot: u32,
                binding_index: u32,
        ) -> anyhow::Result<()>
        {
                self.attributes
                        .entry(slot)
                        .or_insert_with(|| Attribute::new(slot))
                        .binding_index = binding_index;

                Ok(())
        }

        fn binding_divisor(
                &mut self,
                binding_index: u32,
                divisor: u32,
        ) -> anyhow::Result<()>
        {
                check_divisor(divisor)?;

                self.bindings.entry(binding_index).or_default().divisor = divisor;

                Ok(())
        }

        fn element_buffer(
                &mut self,
                buffer: BufferHandle,
        ) -> anyhow::Result<()>
        {
                self.element_buffer = Some(buffer);

                Ok(())
        }
}

impl VertexArray<WgpuVertexState>
{
        /// Binds every slot's buffer slice, and the index buffer if any.
        ///
        /// Buffers must have been uploaded before being added.
        pub fn bind(
                &self,
                pass: &mut wgpu::RenderPass<'_>,
        ) -> anyhow::Result<()>
        {
                for (index, slot) in self.backend().slots()?.iter().enumerate()
                {
                        let vbo = self
                                .vertex_buffers()
                                .iter()
                                .find(|vbo| vbo.handle() == slot.buffer)
                                .with_context(|| format!("Buffer {} is not part of this vertex array", slot.buffer))?;

                        pass.set_vertex_buffer(index as u32, vbo.gpu_buffer()?.slice(slot.offset..));
                }

                if let Some(ibo) = self.index_buffer()
                {
                        pass.set_index_buffer(ibo.gpu_buffer()?.slice(..), ibo.index_format());
                }

                Ok(())
        }
}

#[cfg(test)]
mod tests
{
        use std::sync::Arc;

        use super::*;
        use crate::gpu::buffer::VertexBuffer;
        use crate::layout::{BufferLayout, ElementKind, LayoutElement};

        fn vertex_array(
                elements: Vec<LayoutElement>,
                instanced: bool,
        ) -> anyhow::Result<VertexArray<WgpuVertexState>>
        {
                let vbo = VertexBuffer::with_capacity("test", 256, BufferLayout::new(elements));

                let mut vao = VertexArray::new(WgpuVertexState::new());

                vao.add_vertex_buffer(Arc::new(vbo), instanced)?;

                Ok(vao)
        }

        #[test]
        fn interleaved_offsets_become_slice_offsets()
        {
                let vao = vertex_array(
                        vec![
                                LayoutElement::new(ElementKind::Float3, "position"),
                                LayoutElement::new(ElementKind::Float3, "color"),
                        ],
                        false,
                )
                .unwrap();

                let slots = vao.backend().slots().unwrap();

                assert_eq!(slots.len(), 2);
                assert_eq!(slots[1].offset, 12);
                assert_eq!(slots[1].array_stride, 24);
                assert_eq!(slots[1].step_mode, wgpu::VertexStepMode::Vertex);
                assert_eq!(slots[1].attribute.shader_location, 1);
                assert_eq!(slots[1].attribute.format, wgpu::VertexFormat::Float32x3);

                let layout = slots[1].layout();

                assert_eq!(layout.attributes.len(), 1);
                assert_eq!(layout.attributes[0].offset, 0);
        }

        #[test]
        fn deinterleaved_region_starts_past_stride()
        {
                let vao = vertex_array(
                        vec![
                                LayoutElement::new(ElementKind::Float3, "position"),
                                LayoutElement::new(ElementKind::Float3, "color").at(72),
                        ],
                        false,
                )
                .unwrap();

                let slots = vao.backend().slots().unwrap();

                assert_eq!(slots[1].offset, 72);
                assert_eq!(slots[1].array_stride, 12);
        }

        #[test]
        fn matrix_columns_step_per_instance()
        {
                let vao = vertex_array(vec![LayoutElement::new(ElementKind::Mat4, "model")], false).unwrap();

                let slots = vao.backend().slots().unwrap();

                assert_eq!(slots.len(), 4);
                assert!(slots
                        .iter()
                        .all(|s| s.step_mode == wgpu::VertexStepMode::Instance
                                && s.attribute.format == wgpu::VertexFormat::Float32x4));
                assert_eq!(
                        slots.iter().map(|s| s.offset).collect::<Vec<_>>(),
                        vec![0, 16, 32, 48]
                );
        }

        #[test]
        fn packed_u8_colors_are_rejected()
        {
                let err = vertex_array(
                        vec![
                                LayoutElement::new(ElementKind::Float3, "position"),
                                LayoutElement::new(ElementKind::UInt8x3, "color")
                                        .relative(12)
                                        .normalized(),
                        ],
                        false,
                )
                .unwrap_err();

                assert!(format!("{err:#}").contains("Stride 15"));
        }

        #[test]
        fn formats_without_wgpu_equivalent()
        {
                assert_eq!(vertex_format(3, ScalarType::UnsignedByte, true), None);
                assert_eq!(vertex_format(2, ScalarType::Int, true), None);
                assert_eq!(
                        vertex_format(2, ScalarType::UnsignedByte, true),
                        Some(wgpu::VertexFormat::Unorm8x2)
                );
                assert_eq!(vertex_format(1, ScalarType::Byte, false), None);
                assert_eq!(vertex_format(4, ScalarType::Byte, true), Some(wgpu::VertexFormat::Snorm8x4));
                assert_eq!(vertex_format(3, ScalarType::Float, true), Some(wgpu::VertexFormat::Float32x3));
        }

        #[test]
        fn unsupported_format_fails_assembly()
        {
                let err = vertex_array(
                        vec![
                                LayoutElement::new(ElementKind::Int2, "ids").normalized(),
                                LayoutElement::new(ElementKind::Float2, "uv"),
                        ],
                        false,
                )
                .unwrap_err();

                assert!(format!("{err:#}").contains("No wgpu vertex format"));
        }

        #[test]
        fn index_buffer_is_remembered()
        {
                let mut vao = vertex_array(vec![LayoutElement::new(ElementKind::Float2, "corner")], false).unwrap();

                let ibo = Arc::new(crate::gpu::buffer::IndexBuffer::new("indices", &[0, 1, 2]));
                let handle = ibo.handle();

                vao.set_index_buffer(ibo).unwrap();

                assert_eq!(vao.backend().index_buffer(), Some(handle));
        }

        #[test]
        fn divisors_above_one_are_rejected()
        {
                let mut state = WgpuVertexState::new();

                assert!(state.binding_divisor(0, 2).is_err());
                assert!(state.binding_divisor(0, 1).is_ok());
        }

        #[test]
        fn enabled_slot_without_buffer_fails()
        {
                let mut state = WgpuVertexState::new();

                state.enable_attribute(0).unwrap();
                state.attribute_format(0, 2, ScalarType::Float, false, 0).unwrap();

                let err = state.slots().unwrap_err();

                assert!(err.to_string().contains("has no buffer"));
        }

        #[test]
        fn rejected_buffer_leaves_no_partial_slots()
        {
                let mut vao = VertexArray::new(WgpuVertexState::new());

                let rejected = VertexBuffer::with_capacity(
                        "rejected",
                        64,
                        BufferLayout::new([
                                LayoutElement::new(ElementKind::Float2, "uv"),
                                LayoutElement::new(ElementKind::Int2, "ids").normalized(),
                        ]),
                );
                let accepted = VertexBuffer::with_capacity(
                        "accepted",
                        64,
                        BufferLayout::new([LayoutElement::new(ElementKind::Float3, "position")]),
                );

                assert!(vao.add_vertex_buffer(Arc::new(rejected), false).is_err());
                assert_eq!(vao.next_slot(), 0);
                assert!(vao.bindings().is_empty());

                vao.add_vertex_buffer(Arc::new(accepted), false).unwrap();

                let slots = vao.backend().slots().unwrap();

                assert_eq!(slots.len(), vao.bindings().len());
                assert_eq!(slots[0].attribute.shader_location, vao.bindings()[0].slot_index);
                assert_eq!(slots[0].buffer, vao.vertex_buffers()[0].handle());
                assert_eq!(slots[0].attribute.format, wgpu::VertexFormat::Float32x3);
        }

        #[test]
        fn attribute_wider_than_stride_is_rejected()
        {
                let err = vertex_array(
                        vec![
                                LayoutElement::new(ElementKind::Float2, "position"),
                                LayoutElement::new(ElementKind::Float4, "color").at(48),
                        ],
                        false,
                )
                .unwrap_err();

                assert!(format!("{err:#}").contains("wider than its stride of 8"));
        }

        #[test]
        fn slots_check_attribute_against_stride()
        {
                let mut state = WgpuVertexState::new();

                state.bind_vertex_buffer(0, BufferHandle(3), 0, 8).unwrap();
                state.enable_attribute(0).unwrap();
                state.attribute_format(0, 4, ScalarType::Float, false, 0).unwrap();
                state.attribute_binding(0, 0).unwrap();

                let err = state.slots().unwrap_err();

                assert!(err.to_string().contains("wider than its stride"));
        }

        #[test]
        fn four_wide_unsigned_ints_map_to_uint32x4()
        {
                let kind = ElementKind::UInt4;

                assert_eq!(
                        vertex_format(kind.component_count(), kind.scalar_type(), false),
                        Some(wgpu::VertexFormat::Uint32x4)
                );

                let vao = vertex_array(vec![LayoutElement::new(kind, "flags")], true).unwrap();
                let slots = vao.backend().slots().unwrap();

                assert_eq!(slots[0].array_stride, 16);
                assert_eq!(slots[0].step_mode, wgpu::VertexStepMode::Instance);
        }
}
