use crate::gpu::buffer::BufferHandle;
use crate::layout::buffer_layout::BufferLayout;
use crate::layout::element::{ElementKind, ScalarType};

pub const PER_VERTEX: u32 = 0;
pub const PER_INSTANCE: u32 = 1;

/// One attribute slot wired to a buffer, ready to hand to a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeBinding
{
        pub slot_index: u32,
        pub buffer: BufferHandle,
        pub stride: u32,
        pub component_count: u32,
        pub scalar_type: ScalarType,
        pub normalized: bool,
        pub byte_offset: u32,
        pub divisor: u32,
}

/// Translates a layout into attribute bindings, starting at `starting_slot`.
///
/// Scalar and vector elements take one slot each. Matrix elements take one
/// slot per column and always advance per instance, since a slot holds at
/// most four components. Returns the bindings and the next free slot, which
/// the caller carries into the next buffer of the same vertex array.
///
/// # Panics
/// If a matrix column offset does not fit in a `u32`.
pub fn generate_bindings(
        layout: &BufferLayout,
        buffer: BufferHandle,
        starting_slot: u32,
        instanced: bool,
) -> (Vec<AttributeBinding>, u32)
{
        let divisor = if instanced { PER_INSTANCE } else { PER_VERTEX };

        let mut slot_index = starting_slot;
        let mut bindings = Vec::with_capacity(layout.elements().len());

        for element in layout
        {
                let kind = element.kind;

                let binding = AttributeBinding {
                        slot_index,
                        buffer,
                        stride: layout.stride(),
                        component_count: kind.component_count(),
                        scalar_type: kind.scalar_type(),
                        normalized: element.normalized,
                        byte_offset: element.offset(),
                        divisor,
                };

                match kind
                {
                        ElementKind::Mat3 | ElementKind::Mat4 =>
                        {
                                for column in 0..kind.component_count()
                                {
                                        let byte_offset = element
                                                .offset()
                                                .checked_add(column * kind.column_size())
                                                .unwrap_or_else(|| {
                                                        panic!(
                                                                "Column {column} of '{}' at offset {} overflows u32",
                                                                element.name,
                                                                element.offset()
                                                        )
                                                });

                                        bindings.push(AttributeBinding {
                                                slot_index,
                                                byte_offset,
                                                divisor: PER_INSTANCE,
                                                ..binding
                                        });

                                        slot_index += 1;
                                }
                        }
                        _ =>
                        {
                                bindings.push(binding);

                                slot_index += 1;
                        }
                }
        }

        (bindings, slot_index)
}

#[cfg(test)]
mod tests
{
        use super::*;
        use crate::layout::element::LayoutElement;

        #[test]
        fn vectors_take_one_slot_each()
        {
                let layout = BufferLayout::new([
                        LayoutElement::new(ElementKind::Float3, "position"),
                        LayoutElement::new(ElementKind::UInt8x3, "color")
                                .relative(12)
                                .normalized(),
                ]);

                let (bindings, next) = generate_bindings(&layout, BufferHandle(7), 0, false);

                assert_eq!(next, 2);
                assert_eq!(bindings.len(), 2);

                assert_eq!(bindings[1].slot_index, 1);
                assert_eq!(bindings[1].buffer, BufferHandle(7));
                assert_eq!(bindings[1].stride, 15);
                assert_eq!(bindings[1].component_count, 3);
                assert_eq!(bindings[1].scalar_type, ScalarType::UnsignedByte);
                assert!(bindings[1].normalized);
                assert_eq!(bindings[1].byte_offset, 12);
                assert_eq!(bindings[1].divisor, PER_VERTEX);
        }

        #[test]
        fn instanced_buffers_advance_per_instance()
        {
                let layout = BufferLayout::new([LayoutElement::new(ElementKind::Float2, "offset")]);

                let (bindings, next) = generate_bindings(&layout, BufferHandle(1), 3, true);

                assert_eq!(next, 4);
                assert_eq!(bindings[0].slot_index, 3);
                assert_eq!(bindings[0].divisor, PER_INSTANCE);
        }

        #[test]
        fn mat3_expands_into_three_columns()
        {
                let layout = BufferLayout::new([
                        LayoutElement::new(ElementKind::Float, "weight"),
                        LayoutElement::new(ElementKind::Mat3, "normal_matrix"),
                ]);

                let (bindings, next) = generate_bindings(&layout, BufferHandle(2), 0, false);

                assert_eq!(next, 4);

                let columns: Vec<(u32, u32, u32, u32)> = bindings[1..]
                        .iter()
                        .map(|b| (b.slot_index, b.byte_offset, b.component_count, b.divisor))
                        .collect();

                assert_eq!(columns, vec![(1, 4, 3, 1), (2, 16, 3, 1), (3, 28, 3, 1)]);
                assert_eq!(bindings[0].divisor, PER_VERTEX);
                assert!(bindings.iter().all(|b| b.stride == 40));
        }

        #[test]
        fn empty_layout_keeps_slot()
        {
                let (bindings, next) = generate_bindings(&BufferLayout::default(), BufferHandle(0), 5, false);

                assert!(bindings.is_empty());
                assert_eq!(next, 5);
        }

        #[test]
        #[should_panic(expected = "of 'model' at offset 4294967275 overflows")]
        fn matrix_column_offset_overflow_names_the_element()
        {
                let layout = BufferLayout::new([LayoutElement::new(ElementKind::Mat4, "model").at(u32::MAX - 20)]);

                let _ = generate_bindings(&layout, BufferHandle(1), 0, true);
        }
}
