use crate::layout::element::LayoutElement;

/// Format of one data buffer: its attributes in declaration order and the
/// byte distance between consecutive records.
///
/// A layout supports three ways of arranging data without separate APIs:
///
/// - interleaved: every attribute packed back to back inside one record,
/// - deinterleaved: independent attribute arrays concatenated in one buffer,
///   where each later array is declared with [`LayoutElement::at`],
/// - packed host structures: fields declared with
///   [`LayoutElement::relative`] at the offset the host struct puts them.
///
/// The layout is immutable once built and is owned by its buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferLayout
{
        elements: Vec<LayoutElement>,
        stride: u32,
}

impl BufferLayout
{
        pub fn new(elements: impl IntoIterator<Item = LayoutElement>) -> Self
        {
                let mut elements: Vec<LayoutElement> = elements.into_iter().collect();

                let stride = compute_stride(&elements);

                let offsets = compute_offsets(&elements, stride);

                for (element, offset) in elements.iter_mut().zip(offsets)
                {
                        element.offset = offset;
                }

                log::debug!(
                        "Buffer layout: {} element(s), stride {} bytes",
                        elements.len(),
                        stride
                );

                Self {
                        elements,
                        stride,
                }
        }

        /// Bytes between the start of consecutive records.
        pub fn stride(&self) -> u32
        {
                self.stride
        }

        pub fn elements(&self) -> &[LayoutElement]
        {
                &self.elements
        }

        pub fn is_empty(&self) -> bool
        {
                self.elements.is_empty()
        }

        pub fn iter(&self) -> std::slice::Iter<'_, LayoutElement>
        {
                self.elements.iter()
        }
}

impl<'a> IntoIterator for &'a BufferLayout
{
        type Item = &'a LayoutElement;
        type IntoIter = std::slice::Iter<'a, LayoutElement>;

        fn into_iter(self) -> Self::IntoIter
        {
                self.elements.iter()
        }
}

impl FromIterator<LayoutElement> for BufferLayout
{
        fn from_iter<I: IntoIterator<Item = LayoutElement>>(iter: I) -> Self
        {
                Self::new(iter)
        }
}

/// Stride of the first, interleaved region of a buffer.
///
/// The first element always counts. Accumulation stops at the first later
/// element with an explicit absolute offset: it and everything after it live
/// in a separate region of the buffer.
///
/// # Panics
/// If the stride does not fit in a `u32`.
pub fn compute_stride(elements: &[LayoutElement]) -> u32
{
        let mut stride: u32 = 0;

        for (index, element) in elements.iter().enumerate()
        {
                if index > 0 && element.absolute_offset.is_some()
                {
                        break;
                }

                stride = stride.checked_add(element.size()).unwrap_or_else(|| {
                        panic!("Stride overflows u32 at element '{}'", element.name)
                });
        }

        stride
}

/// Absolute byte offset of every element, in declaration order.
///
/// An explicit absolute offset wins, then an explicit structure-relative
/// offset (used verbatim), otherwise the element takes the running
/// interleaved offset and advances it by its own size.
///
/// `stride` does not change the result; it is taken so callers cannot
/// resolve offsets before the stride is known.
pub fn compute_offsets(
        elements: &[LayoutElement],
        _stride: u32,
) -> Vec<u32>
{
        let mut running: u32 = 0;

        elements.iter()
                .map(|element| match (element.absolute_offset, element.relative_offset)
                {
                        (Some(absolute), _) => absolute,
                        (None, Some(relative)) => relative,
                        (None, None) =>
                        {
                                let offset = running;
                                running = running.checked_add(element.size()).unwrap_or_else(|| {
                                        panic!("Offset of element '{}' overflows u32", element.name)
                                });
                                offset
                        }
                })
                .collect()
}

#[cfg(test)]
mod tests
{
        use super::*;
        use crate::layout::element::ElementKind;

        fn offsets(layout: &BufferLayout) -> Vec<u32>
        {
                layout.iter().map(|e| e.offset()).collect()
        }

        #[test]
        fn empty_layout_has_zero_stride()
        {
                let layout = BufferLayout::new(Vec::new());

                assert_eq!(layout.stride(), 0);
                assert!(layout.is_empty());
        }

        #[test]
        fn interleaved_offsets_accumulate()
        {
                let layout = BufferLayout::new([
                        LayoutElement::new(ElementKind::Float3, "position"),
                        LayoutElement::new(ElementKind::Float2, "uv"),
                        LayoutElement::new(ElementKind::Float4, "color"),
                ]);

                assert_eq!(layout.stride(), 36);
                assert_eq!(offsets(&layout), vec![0, 12, 20]);
        }

        #[test]
        fn explicit_offset_on_first_element_still_counts()
        {
                let layout = BufferLayout::new([
                        LayoutElement::new(ElementKind::Float3, "position").at(0),
                        LayoutElement::new(ElementKind::Float3, "normal"),
                ]);

                assert_eq!(layout.stride(), 24);
                assert_eq!(offsets(&layout), vec![0, 0]);
        }

        #[test]
        fn deinterleaved_region_stops_stride()
        {
                let layout = BufferLayout::new([
                        LayoutElement::new(ElementKind::Float3, "position"),
                        LayoutElement::new(ElementKind::Float3, "color").at(72),
                        LayoutElement::new(ElementKind::Float2, "uv"),
                ]);

                assert_eq!(layout.stride(), 12);
                // The trailing element has no offset of its own and keeps
                // following the interleaved counter.
                assert_eq!(offsets(&layout), vec![0, 72, 12]);
        }

        #[test]
        fn relative_offsets_pass_through()
        {
                // struct { pos: [f32; 2], color: [f32; 3], uv: [f32; 2] }
                let layout = BufferLayout::new([
                        LayoutElement::new(ElementKind::Float2, "position"),
                        LayoutElement::new(ElementKind::Float3, "color").relative(8),
                        LayoutElement::new(ElementKind::Float2, "uv").relative(20),
                ]);

                assert_eq!(layout.stride(), 28);
                assert_eq!(offsets(&layout), vec![0, 8, 20]);
        }

        #[test]
        fn relative_zero_on_later_member_is_honoured()
        {
                // The host struct puts `color` first, but the shader wants
                // position declared first.
                let layout = BufferLayout::new([
                        LayoutElement::new(ElementKind::Float3, "position").relative(4),
                        LayoutElement::new(ElementKind::UInt8x3, "color").relative(0),
                ]);

                assert_eq!(offsets(&layout), vec![4, 0]);
        }

        #[test]
        fn relative_members_do_not_advance_the_counter()
        {
                let layout = BufferLayout::new([
                        LayoutElement::new(ElementKind::Float3, "position"),
                        LayoutElement::new(ElementKind::Float3, "normal").relative(12),
                        LayoutElement::new(ElementKind::Float2, "uv"),
                ]);

                assert_eq!(offsets(&layout), vec![0, 12, 12]);
        }

        #[test]
        fn explicit_zero_on_later_element_stops_stride()
        {
                let layout = BufferLayout::new([
                        LayoutElement::new(ElementKind::Float3, "position"),
                        LayoutElement::new(ElementKind::Float3, "color").at(0),
                ]);

                assert_eq!(layout.stride(), 12);
                assert_eq!(offsets(&layout), vec![0, 0]);
        }

        #[test]
        fn collects_from_iterator()
        {
                let layout: BufferLayout = [ElementKind::Float, ElementKind::Int2]
                        .into_iter()
                        .map(|kind| LayoutElement::new(kind, kind.name()))
                        .collect();

                assert_eq!(layout.stride(), 12);
                assert_eq!(offsets(&layout), vec![0, 4]);
        }
}
