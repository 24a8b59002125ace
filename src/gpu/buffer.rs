use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::Context;
use wgpu::util::{BufferInitDescriptor, DeviceExt};

use crate::layout::BufferLayout;

static NEXT_HANDLE: AtomicU32 = AtomicU32::new(1);

/// Process-unique identifier of a data buffer.
///
/// Backends key their slots on it; the GPU object itself stays inside the
/// owning [`VertexBuffer`] or [`IndexBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferHandle(pub u32);

impl BufferHandle
{
        pub fn next() -> Self
        {
                Self(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
        }
}

impl fmt::Display for BufferHandle
{
        fn fmt(
                &self,
                f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result
        {
                write!(f, "#{}", self.0)
        }
}

/// Vertex data plus the layout describing it.
///
/// The CPU copy is kept so the buffer can be (re)uploaded; the `wgpu`
/// buffer is released when this value is dropped.
#[derive(Debug)]
pub struct VertexBuffer
{
        handle: BufferHandle,
        label: String,

        // CPU-Side data
        data: Vec<u8>,
        layout: BufferLayout,

        // GPU-Side data
        gpu_buffer: Option<wgpu::Buffer>,

        /// Bytes changed since the last upload.
        dirty: Option<Range<usize>>,
}

impl VertexBuffer
{
        /// Creates a buffer holding `data`, expected to stay mostly static.
        pub fn new<T: bytemuck::Pod>(
                label: impl Into<String>,
                data: &[T],
                layout: BufferLayout,
        ) -> Self
        {
                Self::from_bytes(label, bytemuck::cast_slice(data).to_vec(), layout)
        }

        /// Creates a zero-filled buffer of `size` bytes, to be filled with
        /// [`update_data`](Self::update_data) later.
        pub fn with_capacity(
                label: impl Into<String>,
                size: usize,
                layout: BufferLayout,
        ) -> Self
        {
                Self::from_bytes(label, vec![0; size], layout)
        }

        fn from_bytes(
                label: impl Into<String>,
                data: Vec<u8>,
                layout: BufferLayout,
        ) -> Self
        {
                let handle = BufferHandle::next();
                let label = label.into();

                log::debug!(
                        "Vertex buffer {handle} '{label}': {} bytes, stride {}",
                        data.len(),
                        layout.stride()
                );

                Self {
                        handle,
                        label,
                        data,
                        layout,
                        gpu_buffer: None,
                        dirty: None,
                }
        }

        pub fn handle(&self) -> BufferHandle
        {
                self.handle
        }

        pub fn label(&self) -> &str
        {
                &self.label
        }

        pub fn layout(&self) -> &BufferLayout
        {
                &self.layout
        }

        /// Size of the data store in bytes.
        pub fn size(&self) -> u64
        {
                self.data.len() as u64
        }

        pub fn data(&self) -> &[u8]
        {
                &self.data
        }

        /// Overwrites part of the data store starting at `offset` bytes.
        ///
        /// The store is never reallocated, so writes past its end fail.
        pub fn update_data<T: bytemuck::Pod>(
                &mut self,
                data: &[T],
                offset: usize,
        ) -> anyhow::Result<()>
        {
                let bytes: &[u8] = bytemuck::cast_slice(data);

                let end = offset
                        .checked_add(bytes.len())
                        .filter(|end| *end <= self.data.len())
                        .with_context(|| {
                                format!(
                                        "Update of {} bytes at offset {offset} overflows buffer '{}' ({} bytes)",
                                        bytes.len(),
                                        self.label,
                                        self.data.len()
                                )
                        })?;

                self.data[offset..end].copy_from_slice(bytes);

                self.dirty = Some(match self.dirty.take()
                {
                        Some(dirty) => dirty.start.min(offset)..dirty.end.max(end),
                        None => offset..end,
                });

                Ok(())
        }

        pub fn needs_upload(&self) -> bool
        {
                self.gpu_buffer.is_none() || self.dirty.is_some()
        }

        /// Creates the GPU buffer on first call. Later calls write the bytes
        /// changed by [`update_data`](Self::update_data) into the same buffer.
        pub fn upload(
                &mut self,
                device: &wgpu::Device,
                queue: &wgpu::Queue,
        )
        {
                let dirty = self.dirty.take();

                if self.gpu_buffer.is_none()
                {
                        self.gpu_buffer = Some(device.create_buffer_init(&BufferInitDescriptor {
                                label: Some(&self.label),
                                contents: &self.data,
                                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                        }));

                        return;
                }

                if let (Some(buffer), Some(dirty)) = (&self.gpu_buffer, dirty)
                {
                        let (offset, bytes) = aligned_write(&self.data, dirty);

                        log::trace!("Vertex buffer '{}': writing {} bytes at {offset}", self.label, bytes.len());

                        queue.write_buffer(buffer, offset, &bytes);
                }
        }

        pub fn gpu_buffer(&self) -> anyhow::Result<&wgpu::Buffer>
        {
                self.gpu_buffer
                        .as_ref()
                        .ok_or_else(|| anyhow::anyhow!("Vertex buffer '{}' not uploaded", self.label))
        }
}

/// Widens `range` to the copy alignment `wgpu` requires, zero-padding past
/// the end of `data`. The GPU buffer is padded the same way on creation.
fn aligned_write(
        data: &[u8],
        range: Range<usize>,
) -> (wgpu::BufferAddress, Vec<u8>)
{
        let align = wgpu::COPY_BUFFER_ALIGNMENT as usize;

        let start = range.start / align * align;
        let end = range.end.div_ceil(align) * align;

        let mut bytes = data[start..end.min(data.len())].to_vec();
        bytes.resize(end - start, 0);

        (start as wgpu::BufferAddress, bytes)
}

/// 32-bit index data for indexed draws.
#[derive(Debug)]
pub struct IndexBuffer
{
        handle: BufferHandle,
        label: String,
        indices: Vec<u32>,
        gpu_buffer: Option<wgpu::Buffer>,
}

impl IndexBuffer
{
        pub fn new(
                label: impl Into<String>,
                indices: &[u32],
        ) -> Self
        {
                Self {
                        handle: BufferHandle::next(),
                        label: label.into(),
                        indices: indices.to_vec(),
                        gpu_buffer: None,
                }
        }

        pub fn handle(&self) -> BufferHandle
        {
                self.handle
        }

        pub fn index_count(&self) -> u32
        {
                self.indices.len() as u32
        }

        pub fn index_format(&self) -> wgpu::IndexFormat
        {
                wgpu::IndexFormat::Uint32
        }

        pub fn upload(
                &mut self,
                device: &wgpu::Device,
        )
        {
                if self.gpu_buffer.is_some()
                {
                        return;
                }

                self.gpu_buffer = Some(device.create_buffer_init(&BufferInitDescriptor {
                        label: Some(&self.label),
                        contents: bytemuck::cast_slice(&self.indices),
                        usage: wgpu::BufferUsages::INDEX,
                }));
        }

        pub fn gpu_buffer(&self) -> anyhow::Result<&wgpu::Buffer>
        {
                self.gpu_buffer
                        .as_ref()
                        .ok_or_else(|| anyhow::anyhow!("Index buffer '{}' not uploaded", self.label))
        }
}

/// Fixed-size shader constants behind one binding point.
///
/// Storage is allocated once at creation and never resized. Writes go
/// straight to the GPU through the queue.
#[derive(Debug)]
pub struct UniformBuffer
{
        label: String,
        binding: u32,
        size: u64,
        gpu_buffer: wgpu::Buffer,
}

impl UniformBuffer
{
        pub fn new(
                device: &wgpu::Device,
                label: impl Into<String>,
                size: u64,
                binding: u32,
        ) -> Self
        {
                let label = label.into();

                let gpu_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some(&label),
                        size,
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                });

                log::debug!("Uniform buffer '{label}': {size} bytes at binding {binding}");

                Self {
                        label,
                        binding,
                        size,
                        gpu_buffer,
                }
        }

        pub fn binding(&self) -> u32
        {
                self.binding
        }

        pub fn size(&self) -> u64
        {
                self.size
        }

        /// Writes `data` at `offset` bytes into the buffer.
        pub fn set_data<T: bytemuck::Pod>(
                &self,
                queue: &wgpu::Queue,
                data: &[T],
                offset: u64,
        ) -> anyhow::Result<()>
        {
                let bytes: &[u8] = bytemuck::cast_slice(data);

                check_uniform_write(&self.label, self.size, offset, bytes.len() as u64)?;

                queue.write_buffer(&self.gpu_buffer, offset, bytes);

                Ok(())
        }

        pub fn layout_entry(
                &self,
                visibility: wgpu::ShaderStages,
        ) -> wgpu::BindGroupLayoutEntry
        {
                wgpu::BindGroupLayoutEntry {
                        binding: self.binding,
                        visibility,
                        ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: wgpu::BufferSize::new(self.size),
                        },
                        count: None,
                }
        }

        pub fn bind_group_entry(&self) -> wgpu::BindGroupEntry<'_>
        {
                wgpu::BindGroupEntry {
                        binding: self.binding,
                        resource: self.gpu_buffer.as_entire_binding(),
                }
        }
}

fn check_uniform_write(
        label: &str,
        size: u64,
        offset: u64,
        len: u64,
) -> anyhow::Result<()>
{
        let align = wgpu::COPY_BUFFER_ALIGNMENT;

        if offset % align != 0 || len % align != 0
        {
                anyhow::bail!(
                        "Uniform write of {len} bytes at offset {offset} to '{label}' is not aligned to {align}"
                );
        }

        offset.checked_add(len)
                .filter(|end| *end <= size)
                .with_context(|| {
                        format!("Uniform write of {len} bytes at offset {offset} overflows '{label}' ({size} bytes)")
                })?;

        Ok(())
}

#[cfg(test)]
mod tests
{
        use super::*;
        use crate::layout::{ElementKind, LayoutElement};

        fn layout() -> BufferLayout
        {
                BufferLayout::new([LayoutElement::new(ElementKind::Float3, "position")])
        }

        #[test]
        fn handles_are_unique()
        {
                let a = VertexBuffer::with_capacity("a", 12, layout());
                let b = VertexBuffer::with_capacity("b", 12, layout());
                let i = IndexBuffer::new("i", &[0, 1, 2]);

                assert_ne!(a.handle(), b.handle());
                assert_ne!(a.handle(), i.handle());
        }

        #[test]
        fn size_counts_bytes()
        {
                let positions: [f32; 9] = [0.0; 9];

                let vbo = VertexBuffer::new("triangle", &positions, layout());

                assert_eq!(vbo.size(), 36);
                assert_eq!(vbo.layout().stride(), 12);
                assert!(vbo.needs_upload());
                assert!(vbo.gpu_buffer().is_err());
        }

        #[test]
        fn update_writes_in_place()
        {
                let mut vbo = VertexBuffer::with_capacity("dynamic", 8, layout());

                vbo.update_data(&[0xAAu8, 0xBB], 6).unwrap();

                assert_eq!(vbo.data(), &[0, 0, 0, 0, 0, 0, 0xAA, 0xBB]);
        }

        #[test]
        fn update_past_end_fails()
        {
                let mut vbo = VertexBuffer::with_capacity("dynamic", 8, layout());

                let err = vbo.update_data(&[1.0f32, 2.0], 4).unwrap_err();

                assert!(err.to_string().contains("overflows"));
                assert_eq!(vbo.data(), &[0; 8]);
        }

        #[test]
        fn updates_merge_into_one_dirty_range()
        {
                let mut vbo = VertexBuffer::with_capacity("dynamic", 32, layout());

                vbo.update_data(&[1.0f32], 20).unwrap();
                vbo.update_data(&[2.0f32], 4).unwrap();

                assert_eq!(vbo.dirty, Some(4..24));
                assert!(vbo.needs_upload());
        }

        #[test]
        fn writes_are_widened_to_copy_alignment()
        {
                let data: Vec<u8> = (1..=15).collect();

                let (offset, bytes) = aligned_write(&data, 5..7);

                assert_eq!(offset, 4);
                assert_eq!(bytes, vec![5, 6, 7, 8]);

                // Tail of a 15-byte packed buffer.
                let (offset, bytes) = aligned_write(&data, 13..15);

                assert_eq!(offset, 12);
                assert_eq!(bytes, vec![13, 14, 15, 0]);
        }

        #[test]
        fn uniform_writes_stay_inside_storage()
        {
                assert!(check_uniform_write("tint", 16, 0, 16).is_ok());
                assert!(check_uniform_write("tint", 16, 8, 8).is_ok());

                let err = check_uniform_write("tint", 16, 8, 16).unwrap_err();

                assert!(err.to_string().contains("overflows 'tint'"));
        }

        #[test]
        fn uniform_writes_must_be_aligned()
        {
                let err = check_uniform_write("tint", 16, 2, 4).unwrap_err();

                assert!(err.to_string().contains("not aligned"));
                assert!(check_uniform_write("tint", 16, 4, 3).is_err());
        }

        #[test]
        fn index_count_matches_input()
        {
                let ibo = IndexBuffer::new("quad", &[0, 1, 2, 2, 3, 0]);

                assert_eq!(ibo.index_count(), 6);
                assert_eq!(ibo.index_format(), wgpu::IndexFormat::Uint32);
        }
}
