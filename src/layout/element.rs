use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const FLOAT_BYTES: u32 = size_of::<f32>() as u32;
pub const INT32_BYTES: u32 = size_of::<i32>() as u32;
pub const UINT8_BYTES: u32 = size_of::<u8>() as u32;

/// Data type of a single vertex attribute.
///
/// The set is closed: every lookup below is an exhaustive `match`, so a kind
/// without a size, component count or scalar type cannot exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ElementKind
{
        Bool,
        UInt8,
        UInt8x2,
        UInt8x3,
        Int,
        Int2,
        Int3,
        Int4,
        UInt,
        UInt2,
        UInt3,
        UInt4,
        Float,
        Float2,
        Float3,
        Float4,
        Mat3,
        Mat4,
}

/// Scalar type the backend reads a component as.
///
/// Discriminants are the OpenGL enum values, which is what most backends
/// and debuggers print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ScalarType
{
        Byte = 0x1400,
        UnsignedByte = 0x1401,
        Int = 0x1404,
        UnsignedInt = 0x1405,
        Float = 0x1406,
}

impl ScalarType
{
        pub fn gl_enum(self) -> u32
        {
                self as u32
        }
}

impl ElementKind
{
        pub const ALL: [ElementKind; 18] = [
                ElementKind::Bool,
                ElementKind::UInt8,
                ElementKind::UInt8x2,
                ElementKind::UInt8x3,
                ElementKind::Int,
                ElementKind::Int2,
                ElementKind::Int3,
                ElementKind::Int4,
                ElementKind::UInt,
                ElementKind::UInt2,
                ElementKind::UInt3,
                ElementKind::UInt4,
                ElementKind::Float,
                ElementKind::Float2,
                ElementKind::Float3,
                ElementKind::Float4,
                ElementKind::Mat3,
                ElementKind::Mat4,
        ];

        /// Size in bytes of one value of this kind.
        pub const fn byte_size(self) -> u32
        {
                match self
                {
                        ElementKind::Float => FLOAT_BYTES,
                        ElementKind::Float2 => FLOAT_BYTES * 2,
                        ElementKind::Float3 => FLOAT_BYTES * 3,
                        ElementKind::Float4 => FLOAT_BYTES * 4,
                        ElementKind::Mat3 => FLOAT_BYTES * 3 * 3,
                        ElementKind::Mat4 => FLOAT_BYTES * 4 * 4,
                        ElementKind::Int => INT32_BYTES,
                        ElementKind::Int2 => INT32_BYTES * 2,
                        ElementKind::Int3 => INT32_BYTES * 3,
                        ElementKind::Int4 => INT32_BYTES * 4,
                        ElementKind::UInt => INT32_BYTES,
                        ElementKind::UInt2 => INT32_BYTES * 2,
                        ElementKind::UInt3 => INT32_BYTES * 3,
                        ElementKind::UInt4 => INT32_BYTES * 4,
                        ElementKind::UInt8 => UINT8_BYTES,
                        ElementKind::UInt8x2 => UINT8_BYTES * 2,
                        ElementKind::UInt8x3 => UINT8_BYTES * 3,
                        ElementKind::Bool => UINT8_BYTES,
                }
        }

        /// Number of components bound per attribute slot.
        ///
        /// Matrices report their column count, since each column is bound
        /// as its own vector attribute.
        pub const fn component_count(self) -> u32
        {
                match self
                {
                        ElementKind::Float | ElementKind::Int | ElementKind::UInt => 1,
                        ElementKind::UInt8 | ElementKind::Bool => 1,
                        ElementKind::Float2 | ElementKind::Int2 | ElementKind::UInt2 => 2,
                        ElementKind::UInt8x2 => 2,
                        ElementKind::Float3 | ElementKind::Int3 | ElementKind::UInt3 => 3,
                        ElementKind::UInt8x3 => 3,
                        ElementKind::Float4 | ElementKind::Int4 | ElementKind::UInt4 => 4,
                        ElementKind::Mat3 => 3,
                        ElementKind::Mat4 => 4,
                }
        }

        pub const fn scalar_type(self) -> ScalarType
        {
                match self
                {
                        ElementKind::Float
                        | ElementKind::Float2
                        | ElementKind::Float3
                        | ElementKind::Float4
                        | ElementKind::Mat3
                        | ElementKind::Mat4 => ScalarType::Float,
                        ElementKind::Int | ElementKind::Int2 | ElementKind::Int3 | ElementKind::Int4 =>
                        {
                                ScalarType::Int
                        }
                        ElementKind::UInt | ElementKind::UInt2 | ElementKind::UInt3 | ElementKind::UInt4 =>
                        {
                                ScalarType::UnsignedInt
                        }
                        ElementKind::UInt8 | ElementKind::UInt8x2 | ElementKind::UInt8x3 =>
                        {
                                ScalarType::UnsignedByte
                        }
                        ElementKind::Bool => ScalarType::Byte,
                }
        }

        pub const fn is_matrix(self) -> bool
        {
                matches!(self, ElementKind::Mat3 | ElementKind::Mat4)
        }

        /// Byte size of one matrix column, or of the whole value otherwise.
        pub const fn column_size(self) -> u32
        {
                match self
                {
                        ElementKind::Mat3 => FLOAT_BYTES * 3,
                        ElementKind::Mat4 => FLOAT_BYTES * 4,
                        other => other.byte_size(),
                }
        }

        pub const fn name(self) -> &'static str
        {
                match self
                {
                        ElementKind::Bool => "Bool",
                        ElementKind::UInt8 => "UInt8",
                        ElementKind::UInt8x2 => "UInt8x2",
                        ElementKind::UInt8x3 => "UInt8x3",
                        ElementKind::Int => "Int",
                        ElementKind::Int2 => "Int2",
                        ElementKind::Int3 => "Int3",
                        ElementKind::Int4 => "Int4",
                        ElementKind::UInt => "UInt",
                        ElementKind::UInt2 => "UInt2",
                        ElementKind::UInt3 => "UInt3",
                        ElementKind::UInt4 => "UInt4",
                        ElementKind::Float => "Float",
                        ElementKind::Float2 => "Float2",
                        ElementKind::Float3 => "Float3",
                        ElementKind::Float4 => "Float4",
                        ElementKind::Mat3 => "Mat3",
                        ElementKind::Mat4 => "Mat4",
                }
        }
}

impl fmt::Display for ElementKind
{
        fn fmt(
                &self,
                f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result
        {
                f.write_str(self.name())
        }
}

impl FromStr for ElementKind
{
        type Err = anyhow::Error;

        fn from_str(s: &str) -> anyhow::Result<Self>
        {
                ElementKind::ALL
                        .iter()
                        .copied()
                        .find(|kind| kind.name().eq_ignore_ascii_case(s))
                        .ok_or_else(|| anyhow::anyhow!("Unknown buffer element data type: {s}"))
        }
}

impl TryFrom<String> for ElementKind
{
        type Error = anyhow::Error;

        fn try_from(value: String) -> anyhow::Result<Self>
        {
                value.parse()
        }
}

impl From<ElementKind> for String
{
        fn from(kind: ElementKind) -> Self
        {
                kind.name().to_string()
        }
}

/// One attribute declared in a [`BufferLayout`](super::BufferLayout).
///
/// `absolute_offset` and `relative_offset` are `None` when the engine should
/// infer the position. `Some(0)` is an explicit zero and is honoured as such.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutElement
{
        pub kind: ElementKind,

        /// Self-description only, never read by the engine.
        pub name: String,

        /// Byte offset from the start of the buffer. On any element but the
        /// first it starts a deinterleaved region.
        pub absolute_offset: Option<u32>,

        /// Offset of this field inside a packed host structure, passed
        /// through verbatim.
        pub relative_offset: Option<u32>,

        /// Integers are read as floats in [0,1] (unsigned) or [-1,1] (signed).
        pub normalized: bool,

        /// Resolved byte offset, filled in by [`BufferLayout::new`](super::BufferLayout::new).
        pub(crate) offset: u32,
}

impl LayoutElement
{
        pub fn new(
                kind: ElementKind,
                name: impl Into<String>,
        ) -> Self
        {
                Self {
                        kind,
                        name: name.into(),
                        absolute_offset: None,
                        relative_offset: None,
                        normalized: false,
                        offset: 0,
                }
        }

        /// Places the element at an explicit byte offset in the buffer.
        pub fn at(
                mut self,
                offset: u32,
        ) -> Self
        {
                self.absolute_offset = Some(offset);
                self
        }

        /// Marks the element as a member of a packed host structure.
        pub fn relative(
                mut self,
                offset: u32,
        ) -> Self
        {
                self.relative_offset = Some(offset);
                self
        }

        pub fn normalized(mut self) -> Self
        {
                self.normalized = true;
                self
        }

        pub fn size(&self) -> u32
        {
                self.kind.byte_size()
        }

        pub fn component_count(&self) -> u32
        {
                self.kind.component_count()
        }

        /// Byte offset of the element, as resolved by its layout.
        pub fn offset(&self) -> u32
        {
                self.offset
        }
}
