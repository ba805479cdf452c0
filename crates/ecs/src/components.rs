//! Built-in component kinds used by the editor.

use glam::{Mat4, Vec3, Vec4};
use keystone_common::math::compose_trs;
use serde::{Deserialize, Serialize};
use std::cell::Cell;

/// Local position, Euler rotation (radians) and scale.
///
/// The local matrix is computed lazily and cached until one of the TRS
/// fields changes through a setter or [`Transform::mark_dirty`] is called.
/// Writing the public fields directly requires a `mark_dirty` afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
    #[serde(skip)]
    local_matrix: Cell<Mat4>,
    #[serde(skip, default = "dirty")]
    local_dirty: Cell<bool>,
}

fn dirty() -> Cell<bool> {
    Cell::new(true)
}

impl Transform {
    pub fn new(position: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
            local_matrix: Cell::new(Mat4::IDENTITY),
            local_dirty: dirty(),
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self::new(position, Vec3::ZERO, Vec3::ONE)
    }

    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self::from_position(Vec3::new(x, y, z))
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.mark_dirty();
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
        self.mark_dirty();
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.mark_dirty();
    }

    /// `T * Rz * Ry * Rx * S`, recomputed only when dirty.
    pub fn local_matrix(&self) -> Mat4 {
        if self.local_dirty.get() {
            self.local_matrix
                .set(compose_trs(self.position, self.rotation, self.scale));
            self.local_dirty.set(false);
        }
        self.local_matrix.get()
    }

    pub fn mark_dirty(&self) {
        self.local_dirty.set(true);
    }

    pub fn is_dirty(&self) -> bool {
        self.local_dirty.get()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::ZERO, Vec3::ONE)
    }
}

impl PartialEq for Transform {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
            && self.rotation == other.rotation
            && self.scale == other.scale
    }
}

/// Display name shown in the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Name {
    fn default() -> Self {
        Self("Unnamed".into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visible {
    pub visible: bool,
    pub cast_shadows: bool,
    pub receive_shadows: bool,
}

impl Default for Visible {
    fn default() -> Self {
        Self {
            visible: true,
            cast_shadows: true,
            receive_shadows: true,
        }
    }
}

/// A handle referencing a mesh asset. 0 means unresolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeshHandle(pub u32);

/// Axis-aligned bounds in local space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            min: Vec3::ZERO,
            max: Vec3::ZERO,
        }
    }
}

/// Renderable mesh reference. GPU resources are owned by the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshRenderer {
    pub mesh: MeshHandle,
    /// Asset path; preferred over `mesh` when persisting.
    pub mesh_path: Option<String>,
    pub bounds: Aabb,
    pub lod_bias: f32,
}

impl MeshRenderer {
    pub fn new(mesh: MeshHandle) -> Self {
        Self {
            mesh,
            ..Self::default()
        }
    }

    pub fn from_path(path: impl Into<String>) -> Self {
        Self {
            mesh_path: Some(path.into()),
            ..Self::default()
        }
    }
}

/// Editor selection state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Selected {
    /// The primary selection drives gizmo operations.
    pub is_primary: bool,
    /// Caller-supplied timestamp (seconds) of when the selection happened.
    pub selection_time: f32,
    pub highlight_color: Vec4,
}

impl Selected {
    pub const DEFAULT_HIGHLIGHT: Vec4 = Vec4::new(1.0, 0.6, 0.0, 1.0);

    pub fn new(is_primary: bool, selection_time: f32) -> Self {
        Self {
            is_primary,
            selection_time,
            highlight_color: Self::DEFAULT_HIGHLIGHT,
        }
    }
}

impl Default for Selected {
    fn default() -> Self {
        Self::new(false, 0.0)
    }
}
