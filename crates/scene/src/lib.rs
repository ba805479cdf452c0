//! Scene: the authority over entity lifecycle, components and hierarchy.
//!
//! # Invariants
//! - Every mutation goes through [`Scene`]; invalid entities are inert.
//! - `c ∈ children(parent(c))` whenever `parent(c)` is valid.
//! - The parent graph is acyclic.
//! - World matrices are a derived view; [`TransformCache`] never owns entity
//!   lifetime and learns about changes through Transform hooks.

pub mod config;
mod hooks;
mod scene;
pub mod systems;
mod transform_cache;

pub use config::{ReparentMode, SceneConfig};
pub use hooks::TransformEvent;
pub use scene::Scene;
pub use systems::{System, SystemManager, TransformSystem};
pub use transform_cache::{CacheStats, TransformCache};

pub fn crate_info() -> &'static str {
    "keystone-scene v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use keystone_ecs::Transform;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("scene"));
    }

    /// Build a two-level hierarchy, move the root, then destroy it.
    #[test]
    fn end_to_end_parent_move_destroy() {
        let mut scene = Scene::new();
        let mut cache = TransformCache::attach(&mut scene);

        let e1 = scene.create_entity("E1");
        scene.add_component(e1, Transform::from_xyz(0.0, 0.0, 0.0));
        let e2 = scene.create_entity("E2");
        scene.add_component(e2, Transform::from_xyz(1.0, 0.0, 0.0));

        assert!(scene.set_parent(e2, e1));
        assert!(
            cache
                .world_translation(&scene, e2)
                .abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-5)
        );

        if let Some(t) = scene.get_component_mut::<Transform>(e1) {
            t.set_position(Vec3::new(10.0, 0.0, 0.0));
        }
        cache.mark_dirty(&scene, e1);
        assert!(
            cache
                .world_translation(&scene, e2)
                .abs_diff_eq(Vec3::new(11.0, 0.0, 0.0), 1e-5)
        );

        assert!(scene.destroy_entity(e1));
        assert!(!scene.is_valid(e1));
        assert!(!scene.is_valid(e2));
        assert_eq!(cache.get_world_transform(&scene, e2), glam::Mat4::IDENTITY);
    }
}
