//! Entity registry and component storage.
//!
//! Entities are `{id, generation}` handles recycled through a FIFO free list.
//! Components live in one ordered store per concrete type; a type-erased
//! registry lets the scene strip an entity from every store without knowing
//! which kinds exist.
//!
//! # Invariants
//! - Generations only ever increase for a given id (modulo wrap).
//! - Stores do no liveness checks; whoever owns the registry gates access.
//! - Store iteration order is deterministic but carries no meaning.

pub mod components;
mod registry;
mod storage;

pub use components::{Aabb, MeshHandle, MeshRenderer, Name, Selected, Transform, Visible};
pub use registry::EntityRegistry;
pub use storage::{Component, ComponentStorage, ErasedStorage, Storages};

pub fn crate_info() -> &'static str {
    "keystone-ecs v0.1.0"
}
