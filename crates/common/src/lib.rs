//! Shared types for the keystone scene runtime.
//!
//! # Invariants
//! - `Entity` is a plain value: copying a handle never extends any lifetime.
//! - Id 0 is reserved; no live entity is ever handed out with it.

pub mod math;
mod types;

pub use glam::{EulerRot, Mat4, Quat, Vec3, Vec4};
pub use types::Entity;

pub fn crate_info() -> &'static str {
    "keystone-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
