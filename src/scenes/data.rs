//! Geometry used by the built-in scenes.

/// Interleaved position + colour, three floats each.
pub const HELLO_TRIANGLE: &[f32] = &[
        0.5, -0.5, 0.0, 1.0, 0.0, 0.0, // left
        -0.5, -0.5, 0.0, 0.0, 1.0, 0.0, // right
        0.0, 0.5, 0.0, 0.0, 0.0, 1.0, // top
];

pub const DIAMOND_POSITIONS: &[f32] = &[
        -0.5, 0.5, 0.6, -0.5, 0.75, 0.6, -0.75, 0.5, 0.6, //
        -0.5, 0.5, 0.6, -0.25, 0.5, 0.6, -0.5, 0.75, 0.6, //
        -0.5, 0.5, 0.6, -0.25, 0.5, 0.6, -0.5, 0.25, 0.6, //
        -0.5, 0.5, 0.6, -0.5, 0.25, 0.6, -0.75, 0.5, 0.6, //
];

pub const DIAMOND_COLORS: &[f32] = &[1.0; 36];

/// Six positions followed by six colours, in one buffer.
pub const SQUARE: &[f32] = &[
        // Positions
        0.0, 0.25, 0.5, //
        0.5, 0.25, 0.5, //
        0.5, 0.75, 0.5, //
        0.0, 0.25, 0.5, //
        0.5, 0.75, 0.5, //
        0.0, 0.75, 0.5, //
        // Colors
        0.7, 0.0, 0.0, //
        0.7, 0.0, 0.0, //
        0.7, 0.0, 0.0, //
        0.7, 0.0, 0.0, //
        0.7, 0.0, 0.0, //
        0.7, 0.0, 0.0, //
];

/// Byte offset of the colour region in [`SQUARE`].
pub const SQUARE_COLOR_OFFSET: u32 = (size_of::<f32>() * 3 * 6) as u32;

/// Tightly packed, so the colour sits right after the position.
#[repr(C, packed)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PackedVertex
{
        pub position: [f32; 3],
        pub color: [u8; 3],
}

pub const PACKED_TRIANGLE: &[PackedVertex] = &[
        PackedVertex {
                position: [-0.25, -0.5, 0.5],
                color: [255, 0, 0],
        },
        PackedVertex {
                position: [0.25, -0.5, 0.5],
                color: [0, 255, 0],
        },
        PackedVertex {
                position: [0.0, 0.0, 0.5],
                color: [0, 0, 255],
        },
];

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TexturedVertex
{
        pub position: [f32; 2],
        pub color: [f32; 3],
        pub tex_coords: [f32; 2],
}

pub const TEXTURED_QUAD: &[TexturedVertex] = &[
        TexturedVertex {
                position: [-0.5, -0.5],
                color: [1.0, 0.0, 0.0],
                tex_coords: [0.0, 0.0],
        }, // bottom left
        TexturedVertex {
                position: [0.5, -0.5],
                color: [0.0, 1.0, 0.0],
                tex_coords: [1.0, 0.0],
        }, // bottom right
        TexturedVertex {
                position: [0.5, 0.5],
                color: [0.0, 0.0, 1.0],
                tex_coords: [1.0, 1.0],
        }, // top right
        TexturedVertex {
                position: [-0.5, 0.5],
                color: [1.0, 1.0, 1.0],
                tex_coords: [0.0, 1.0],
        }, // top left
];

pub const QUAD_INDICES: &[u32] = &[0, 1, 2, 2, 3, 0];

/// Unit quad corners for the instanced scene.
pub const QUAD_CORNERS: &[[f32; 2]] = &[[-0.5, -0.5], [0.5, -0.5], [0.5, 0.5], [-0.5, 0.5]];

/// Per-instance data: a model matrix followed by a tint.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceData
{
        pub model: [[f32; 4]; 4],
        pub color: [f32; 4],
}

impl InstanceData
{
        pub fn new(
                position: cgmath::Vector3<f32>,
                scale: f32,
                color: [f32; 4],
        ) -> Self
        {
                let model = cgmath::Matrix4::from_translation(position) * cgmath::Matrix4::from_scale(scale);

                Self {
                        model: model.into(),
                        color,
                }
        }
}

/// A `columns` × `rows` grid of small quads covering clip space.
pub fn instance_grid(
        columns: u32,
        rows: u32,
) -> Vec<InstanceData>
{
        let step_x = 2.0 / columns as f32;
        let step_y = 2.0 / rows as f32;

        (0..rows)
                .flat_map(|row| (0..columns).map(move |column| (row, column)))
                .map(|(row, column)| {
                        let x = -1.0 + step_x * (column as f32 + 0.5);
                        let y = -1.0 + step_y * (row as f32 + 0.5);

                        let shade = (row * columns + column) as f32 / (rows * columns) as f32;

                        InstanceData::new(
                                cgmath::Vector3::new(x, y, 0.0),
                                step_x.min(step_y) * 0.8,
                                [shade, 1.0 - shade, 0.5, 1.0],
                        )
                })
                .collect()
}
