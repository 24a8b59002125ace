use std::fmt;

use crate::gpu::buffer::BufferHandle;
use crate::gpu::vertex_array::VertexArrayBackend;
use crate::layout::ScalarType;

/// One call made on a [`VertexArrayBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindCommand
{
        BindVertexBuffer
        {
                binding_index: u32,
                buffer: BufferHandle,
                offset: u32,
                stride: u32,
        },
        EnableAttribute
        {
                slot: u32,
        },
        AttributeFormat
        {
                slot: u32,
                component_count: u32,
                scalar_type: ScalarType,
                normalized: bool,
                relative_offset: u32,
        },
        AttributeBinding
        {
                slot: u32,
                binding_index: u32,
        },
        BindingDivisor
        {
                binding_index: u32,
                divisor: u32,
        },
        ElementBuffer
        {
                buffer: BufferHandle,
        },
}

impl fmt::Display for BindCommand
{
        fn fmt(
                &self,
                f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result
        {
                match *self
                {
                        BindCommand::BindVertexBuffer {
                                binding_index,
                                buffer,
                                offset,
                                stride,
                        } => write!(
                                f,
                                "VertexArrayVertexBuffer({binding_index}, {buffer}, {offset}, {stride})"
                        ),
                        BindCommand::EnableAttribute { slot } => write!(f, "EnableVertexArrayAttrib({slot})"),
                        BindCommand::AttributeFormat {
                                slot,
                                component_count,
                                scalar_type,
                                normalized,
                                relative_offset,
                        } => write!(
                                f,
                                "VertexArrayAttribFormat({slot}, {component_count}, {:#06x}, {normalized}, {relative_offset})",
                                scalar_type.gl_enum()
                        ),
                        BindCommand::AttributeBinding {
                                slot,
                                binding_index,
                        } => write!(f, "VertexArrayAttribBinding({slot}, {binding_index})"),
                        BindCommand::BindingDivisor {
                                binding_index,
                                divisor,
                        } => write!(f, "VertexArrayBindingDivisor({binding_index}, {divisor})"),
                        BindCommand::ElementBuffer { buffer } => write!(f, "VertexArrayElementBuffer({buffer})"),
                }
        }
}

/// Backend that only remembers what it was asked to do.
#[derive(Debug, Default, Clone)]
pub struct CommandRecorder
{
        commands: Vec<BindCommand>,
}

impl CommandRecorder
{
        pub fn new() -> Self
        {
                Self {
                        commands: Vec::new(),
                }
        }

        pub fn commands(&self) -> &[BindCommand]
        {
                &self.commands
        }
}

impl VertexArrayBackend for CommandRecorder
{
        fn bind_vertex_buffer(
                &mut self,
                binding_index: u32,
                buffer: BufferHandle,
                offset: u32,
                stride: u32,
        ) -> anyhow::Result<()>
        {
                self.commands.push(BindCommand::BindVertexBuffer {
                        binding_index,
                        buffer,
                        offset,
                        stride,
                });

                Ok(())
        }

        fn enable_attribute(
                &mut self,
                slot: u32,
        ) -> anyhow::Result<()>
        {
                self.commands.push(BindCommand::EnableAttribute { slot });

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
                self.commands.push(BindCommand::AttributeFormat {
                        slot,
                        component_count,
                        scalar_type,
                        normalized,
                        relative_offset,
                });

                Ok(())
        }

        fn attribute_binding(
                &mut self,
                slot: u32,
                binding_index: u32,
        ) -> anyhow::Result<()>
        {
                self.commands.push(BindCommand::AttributeBinding {
                        slot,
                        binding_index,
                });

                Ok(())
        }

        fn binding_divisor(
                &mut self,
                binding_index: u32,
                divisor: u32,
        ) -> anyhow::Result<()>
        {
                self.commands.push(BindCommand::BindingDivisor {
                        binding_index,
                        divisor,
                });

                Ok(())
        }

        fn element_buffer(
                &mut self,
                buffer: BufferHandle,
        ) -> anyhow::Result<()>
        {
                self.commands.push(BindCommand::ElementBuffer { buffer });

                Ok(())
        }
}

#[cfg(test)]
mod tests
{
        use super::*;

        #[test]
        fn formats_like_gl_calls()
        {
                let command = BindCommand::AttributeFormat {
                        slot: 1,
                        component_count: 3,
                        scalar_type: ScalarType::UnsignedByte,
                        normalized: true,
                        relative_offset: 12,
                };

                assert_eq!(command.to_string(), "VertexArrayAttribFormat(1, 3, 0x1401, true, 12)");

                let command = BindCommand::BindVertexBuffer {
                        binding_index: 0,
                        buffer: BufferHandle(4),
                        offset: 0,
                        stride: 24,
                };

                assert_eq!(command.to_string(), "VertexArrayVertexBuffer(0, #4, 0, 24)");
        }
}
