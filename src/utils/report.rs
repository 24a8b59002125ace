use colored::*;

use crate::gpu::recorder::{BindCommand, CommandRecorder};
use crate::gpu::vertex_array::VertexArray;
use crate::gpu::wgpu_backend::WgpuVertexSlot;

/// Colour of a command in the dump, by what it touches.
fn paint(command: &BindCommand) -> ColoredString
{
        let text = command.to_string();

        match command
        {
                BindCommand::BindVertexBuffer { .. } => text.cyan(),
                BindCommand::EnableAttribute { .. } => text.green(),
                BindCommand::AttributeFormat { .. } => text.yellow(),
                BindCommand::AttributeBinding { .. } => text.blue(),
                BindCommand::BindingDivisor { divisor, .. } if *divisor > 0 => text.magenta(),
                BindCommand::BindingDivisor { .. } => text.white(),
                BindCommand::ElementBuffer { .. } => text.bright_red(),
        }
}

/// Every call made while assembling `vao`, one per line.
pub fn binding_dump(
        scene: &str,
        vao: &VertexArray<CommandRecorder>,
) -> String
{
        let mut lines = vec![format!(
                "{} ({} buffer(s), {} slot(s))",
                scene.bold(),
                vao.vertex_buffers().len(),
                vao.next_slot()
        )];

        lines.extend(
                vao.backend()
                        .commands()
                        .iter()
                        .map(|command| format!("    {}", paint(command))),
        );

        lines.join("\n")
}

/// The `wgpu` buffer slots of a scene, one per line.
pub fn slot_summary(
        scene: &str,
        slots: &[WgpuVertexSlot],
) -> String
{
        let mut lines = vec![format!("{} -> {} wgpu slot(s)", scene.bold(), slots.len())];

        lines.extend(slots.iter().enumerate().map(|(index, slot)| {
                format!(
                        "    [{index}] buffer {} +{} stride {} {:?} {:?} @location({})",
                        slot.buffer,
                        slot.offset,
                        slot.array_stride,
                        slot.step_mode,
                        slot.attribute.format,
                        slot.attribute.shader_location
                )
        }));

        lines.join("\n")
}
