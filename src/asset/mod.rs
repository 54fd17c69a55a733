//! Character asset pipeline: glTF parsing plus asynchronous loading with the
//! results handed back to the frame loop over a channel.

pub mod gltf;
pub mod loader;

pub use gltf::parse_character;
pub use loader::{AssetLoader, LoadedAsset};

use crate::model::{Clip, MorphTarget};
use crate::utils::Vertex;

/// The built-in asset catalogue, one `.glb` per entry.
pub const CATALOGUE: [&str; 5] = [
    "Standing Taunt Battlecry",
    "Pain Gesture",
    "Samba Dancing",
    "Standing Torch Light Torch",
    "Jump Push Up",
];

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to parse glTF: {0}")]
    Gltf(#[from] ::gltf::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("asset `{0}` has no mesh geometry")]
    NoGeometry(String),

    #[error("fetch failed: {0}")]
    Fetch(String),
}

/// Decoded RGBA8 base-color image.
#[derive(Debug, Clone)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// CPU-side character data, ready for GPU upload on the frame thread.
pub struct ParsedCharacter {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub base_color: [f32; 4],
    pub texture: Option<TextureData>,
    pub clips: Vec<Clip>,
    pub morph_targets: Vec<MorphTarget>,
}
