//! Persistence: scene documents on disk.
//!
//! # Invariants
//! - Document ids are 1-based and unique within a file.
//! - Loading replaces the whole scene; saved local transforms are restored
//!   verbatim after the hierarchy is re-linked.
//! - Only format version `"1.0"` is read or written.

mod document;
mod store;
mod timestamp;

pub use document::{
    ComponentsRecord, EntityRecord, MeshRendererRecord, SceneDocument, SceneMetadata,
    TransformRecord, VisibleRecord, FORMAT_VERSION,
};
pub use store::{PersistError, load_scene, read_metadata, save_scene, validate_scene_file};
pub use timestamp::{format_rfc3339, now_rfc3339};

pub fn crate_info() -> &'static str {
    "keystone-persist v0.1.0"
}
