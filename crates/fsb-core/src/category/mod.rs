//! Categories: the registry of storage directories and per-file resolution.

mod registry;
mod resolver;

pub use registry::{Category, CategoryRegistry, FALLBACK_DIR};
pub use resolver::{parse_caption, CaptionDirective, CategoryResolver, Resolution, ResolutionSource};

pub const DOCUMENT: &str = "document";
pub const IMAGE: &str = "image";
pub const VIDEO: &str = "video";
pub const AUDIO: &str = "audio";
pub const OTHER: &str = "other";
