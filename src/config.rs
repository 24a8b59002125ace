use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::layout::{ElementKind, LayoutElement};
use crate::scenes::SceneKind;

pub const DEFAULT_CONFIG_FILE: &str = "stride.toml";
pub const CONFIG_ENV_VAR: &str = "STRIDE_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
        pub show_start_message: bool,

        /// Print every binding call made while assembling vertex arrays.
        pub dump_bindings: bool,

        /// Upload the buffers to a headless device and check the `wgpu`
        /// translation of every vertex array.
        pub gpu_validation: bool,

        pub scenes: Vec<SceneKind>,

        /// Extra layouts declared in the config file.
        pub layouts: Vec<LayoutConfig>,
}

impl Default for Config
{
        fn default() -> Self
        {
                Self {
                        show_start_message: true,
                        dump_bindings: true,
                        gpu_validation: false,
                        scenes: SceneKind::ALL.to_vec(),
                        layouts: Vec::new(),
                }
        }
}

impl Config
{
        /// Path of the config file: `$STRIDE_CONFIG`, or `stride.toml` in
        /// the working directory.
        pub fn path() -> PathBuf
        {
                std::env::var_os(CONFIG_ENV_VAR)
                        .map(PathBuf::from)
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
        }

        pub fn from_file() -> anyhow::Result<Self>
        {
                let path = Self::path();

                let text = std::fs::read_to_string(&path)
                        .with_context(|| format!("Reading {}", path.display()))?;

                Self::from_toml(&text).with_context(|| format!("Parsing {}", path.display()))
        }

        pub fn from_toml(text: &str) -> anyhow::Result<Self>
        {
                Ok(toml::from_str(text)?)
        }
}

/// A named buffer layout declared in TOML:
///
/// ```toml
/// [[layouts]]
/// name = "particles"
/// instanced = true
/// vertex_count = 64
/// elements = [
///     { kind = "Float3", name = "center" },
///     { kind = "UInt8x2", name = "flags", relative_offset = 12 },
/// ]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig
{
        pub name: String,

        #[serde(default)]
        pub instanced: bool,

        /// Number of records to allocate for the buffer.
        #[serde(default = "default_vertex_count")]
        pub vertex_count: u32,

        pub elements: Vec<ElementConfig>,
}

fn default_vertex_count() -> u32
{
        1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementConfig
{
        pub kind: ElementKind,

        #[serde(default)]
        pub name: String,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub offset: Option<u32>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub relative_offset: Option<u32>,

        #[serde(default)]
        pub normalized: bool,
}

impl ElementConfig
{
        pub fn to_element(&self) -> LayoutElement
        {
                let mut element = LayoutElement::new(self.kind, self.name.clone());

                element.absolute_offset = self.offset;
                element.relative_offset = self.relative_offset;
                element.normalized = self.normalized;

                element
        }
}
