use crate::gpu::buffer::UniformBuffer;
use crate::gpu::pipeline::{TARGET_FORMAT, VertexPipeline};
use crate::gpu::vertex_array::VertexArray;
use crate::gpu::wgpu_backend::{WgpuVertexSlot, WgpuVertexState};

/// Device and queue without a window or surface.
#[derive(Debug)]
pub struct HeadlessGpu
{
        pub adapter: wgpu::Adapter,

        /// The GPU device handle used to create buffers.
        pub device: wgpu::Device,

        pub queue: wgpu::Queue,
}

impl HeadlessGpu
{
        /// Blocks until an adapter and device are available.
        pub fn request() -> anyhow::Result<Self>
        {
                pollster::block_on(Self::request_async())
        }

        pub async fn request_async() -> anyhow::Result<Self>
        {
                let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                        backends: wgpu::Backends::PRIMARY | wgpu::Backends::GL,
                        ..Default::default()
                });

                let adapter = instance
                        .request_adapter(&wgpu::RequestAdapterOptions {
                                power_preference: wgpu::PowerPreference::LowPower,

                                // Nothing is presented.
                                compatible_surface: None,

                                force_fallback_adapter: false,
                        })
                        .await
                        .map_err(|e| anyhow::anyhow!(e))?;

                log::info!("Adapter: {}", adapter.get_info().name);

                let (device, queue) = adapter
                        .request_device(&wgpu::DeviceDescriptor {
                                label: Some("Headless Device"),
                                required_features: wgpu::Features::empty(),
                                required_limits: wgpu::Limits::downlevel_defaults(),
                                memory_hints: Default::default(),
                                trace: wgpu::Trace::Off,
                        })
                        .await?;

                Ok(Self {
                        adapter,
                        device,
                        queue,
                })
        }

        /// Most vertex buffer slots a pipeline may use on this device.
        pub fn max_vertex_buffers(&self) -> u32
        {
                self.device.limits().max_vertex_buffers
        }

        /// Builds a pipeline from the vertex array's slots and draws one
        /// vertex with it into an offscreen target.
        ///
        /// # Returns
        ///
        /// - The slots used, once the device accepted pipeline and draw.
        /// - An error if the slots cannot be built, exceed the device limit,
        ///   or `wgpu` reports a validation error.
        pub fn draw_vertex_array(
                &self,
                vao: &VertexArray<WgpuVertexState>,
        ) -> anyhow::Result<Vec<WgpuVertexSlot>>
        {
                let slots = vao.backend().slots()?;

                if slots.len() as u32 > self.max_vertex_buffers()
                {
                        anyhow::bail!(
                                "Needs {} vertex buffer slots, device allows {}",
                                slots.len(),
                                self.max_vertex_buffers()
                        );
                }

                self.device.push_error_scope(wgpu::ErrorFilter::Validation);

                let drawn = self.encode_draw(vao, &slots);

                let error = pollster::block_on(self.device.pop_error_scope());

                drawn?;

                if let Some(error) = error
                {
                        anyhow::bail!("wgpu rejected the vertex state: {error}");
                }

                Ok(slots)
        }

        fn encode_draw(
                &self,
                vao: &VertexArray<WgpuVertexState>,
                slots: &[WgpuVertexSlot],
        ) -> anyhow::Result<()>
        {
                let tint = UniformBuffer::new(&self.device, "Tint", 16, 0);

                tint.set_data(&self.queue, &[1.0f32, 0.5, 0.0, 1.0], 0)?;

                let pipeline = VertexPipeline::new(&self.device, slots, &tint)?;

                let target = self.device.create_texture(&wgpu::TextureDescriptor {
                        label: Some("Offscreen Target"),
                        size: wgpu::Extent3d {
                                width: 1,
                                height: 1,
                                depth_or_array_layers: 1,
                        },
                        mip_level_count: 1,
                        sample_count: 1,
                        dimension: wgpu::TextureDimension::D2,
                        format: TARGET_FORMAT,
                        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                        view_formats: &[],
                });

                let view = target.create_view(&wgpu::TextureViewDescriptor::default());

                let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                        label: Some("Vertex Array Encoder"),
                });

                {
                        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                                label: Some("Vertex Array Pass"),
                                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                                        view: &view,
                                        resolve_target: None,
                                        ops: wgpu::Operations {
                                                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                                                store: wgpu::StoreOp::Store,
                                        },
                                })],
                                depth_stencil_attachment: None,
                                occlusion_query_set: None,
                                timestamp_writes: None,
                        });

                        render_pass.set_pipeline(&pipeline.render_pipeline);
                        render_pass.set_bind_group(0, &pipeline.bind_group, &[]);

                        vao.bind(&mut render_pass)?;

                        match vao.index_buffer()
                        {
                                Some(_) => render_pass.draw_indexed(0..1, 0, 0..1),
                                None => render_pass.draw(0..1, 0..1),
                        }
                }

                self.queue.submit(std::iter::once(encoder.finish()));

                Ok(())
        }
}
