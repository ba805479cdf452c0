use glam::Vec3;
use keystone_common::Entity;
use keystone_ecs::{MeshHandle, MeshRenderer, Name, Transform, Visible};
use keystone_scene::Scene;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::store::PersistError;

/// The only document version this crate reads and writes.
pub const FORMAT_VERSION: &str = "1.0";

/// Descriptive header of a scene file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneMetadata {
    pub name: String,
    /// RFC 3339 UTC; empty until first saved.
    pub created: String,
    pub modified: String,
    pub author: String,
}

impl Default for SceneMetadata {
    fn default() -> Self {
        Self {
            name: "Untitled Scene".into(),
            created: String::new(),
            modified: String::new(),
            author: "Keystone Editor".into(),
        }
    }
}

impl SceneMetadata {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformRecord {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for TransformRecord {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl From<&Transform> for TransformRecord {
    fn from(t: &Transform) -> Self {
        Self {
            position: t.position,
            rotation: t.rotation,
            scale: t.scale,
        }
    }
}

impl From<TransformRecord> for Transform {
    fn from(r: TransformRecord) -> Self {
        Transform::new(r.position, r.rotation, r.scale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VisibleRecord {
    pub visible: bool,
    pub cast_shadows: bool,
    pub receive_shadows: bool,
}

impl Default for VisibleRecord {
    fn default() -> Self {
        Visible::default().into()
    }
}

impl From<Visible> for VisibleRecord {
    fn from(v: Visible) -> Self {
        Self {
            visible: v.visible,
            cast_shadows: v.cast_shadows,
            receive_shadows: v.receive_shadows,
        }
    }
}

impl From<VisibleRecord> for Visible {
    fn from(r: VisibleRecord) -> Self {
        Self {
            visible: r.visible,
            cast_shadows: r.cast_shadows,
            receive_shadows: r.receive_shadows,
        }
    }
}

/// A mesh is referenced by asset path when one is known, otherwise by handle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MeshRendererRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh_handle: Option<u32>,
    pub lod_bias: f32,
}

impl From<&MeshRenderer> for MeshRendererRecord {
    fn from(m: &MeshRenderer) -> Self {
        match m.mesh_path.as_deref().filter(|path| !path.is_empty()) {
            Some(path) => Self {
                mesh_path: Some(path.to_owned()),
                mesh_handle: None,
                lod_bias: m.lod_bias,
            },
            None => Self {
                mesh_path: None,
                mesh_handle: Some(m.mesh.0),
                lod_bias: m.lod_bias,
            },
        }
    }
}

impl From<&MeshRendererRecord> for MeshRenderer {
    fn from(r: &MeshRendererRecord) -> Self {
        let mut mesh = match (&r.mesh_path, r.mesh_handle) {
            (Some(path), _) => MeshRenderer::from_path(path.clone()),
            (None, Some(handle)) => MeshRenderer::new(MeshHandle(handle)),
            (None, None) => MeshRenderer::default(),
        };
        mesh.lod_bias = r.lod_bias;
        mesh
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComponentsRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<VisibleRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh_renderer: Option<MeshRendererRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// 1-based, unique within the document.
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub parent: Option<u32>,
    #[serde(default)]
    pub components: ComponentsRecord,
}

/// A whole scene as it appears on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    pub version: String,
    #[serde(default)]
    pub metadata: SceneMetadata,
    pub entities: Vec<EntityRecord>,
}

impl SceneDocument {
    /// Snapshot `scene`. Ids follow live-entity order starting at 1.
    pub fn capture(scene: &Scene, metadata: SceneMetadata) -> Self {
        let ids: HashMap<Entity, u32> = scene.entities().zip(1..).collect();

        let entities = scene
            .entities()
            .zip(1..)
            .map(|(entity, id)| EntityRecord {
                id,
                name: scene.get_component::<Name>(entity).map(|n| n.0.clone()),
                parent: ids.get(&scene.parent(entity)).copied(),
                components: ComponentsRecord {
                    transform: scene.get_component::<Transform>(entity).map(TransformRecord::from),
                    visible: scene
                        .get_component::<Visible>(entity)
                        .map(|v| VisibleRecord::from(*v)),
                    mesh_renderer: scene
                        .get_component::<MeshRenderer>(entity)
                        .map(MeshRendererRecord::from),
                },
            })
            .collect();

        Self {
            version: FORMAT_VERSION.to_owned(),
            metadata,
            entities,
        }
    }

    /// Fail on duplicate ids, which would make parent references ambiguous.
    pub fn check_ids(&self) -> Result<(), PersistError> {
        let mut seen = HashSet::with_capacity(self.entities.len());
        for record in &self.entities {
            if !seen.insert(record.id) {
                return Err(PersistError::InvalidHierarchy(format!(
                    "duplicate entity id {}",
                    record.id
                )));
            }
        }
        Ok(())
    }

    /// Replace the contents of `scene` with this document.
    ///
    /// Returns the created entities in document order. Parent references to
    /// unknown ids, and links the scene refuses (cycles, self-parenting), are
    /// skipped with a warning.
    pub fn apply(&self, scene: &mut Scene) -> Result<Vec<Entity>, PersistError> {
        if self.version != FORMAT_VERSION {
            return Err(PersistError::UnsupportedVersion(self.version.clone()));
        }
        self.check_ids()?;

        scene.clear();

        let mut created = Vec::with_capacity(self.entities.len());
        let mut by_id = HashMap::with_capacity(self.entities.len());
        for record in &self.entities {
            let entity = self.spawn(scene, record);
            by_id.insert(record.id, entity);
            created.push(entity);
        }

        for (record, &entity) in self.entities.iter().zip(&created) {
            let Some(parent_id) = record.parent else {
                continue;
            };
            let Some(&parent) = by_id.get(&parent_id) else {
                tracing::warn!(
                    id = record.id,
                    parent = parent_id,
                    "unknown parent id; left at root"
                );
                continue;
            };
            if !scene.set_parent(entity, parent) {
                tracing::warn!(id = record.id, parent = parent_id, "parent link rejected");
                continue;
            }
            // Re-linking preserved world space; the file stores locals.
            if let Some(saved) = record.components.transform {
                scene.modify_component::<Transform, _>(entity, |t| {
                    t.position = saved.position;
                    t.rotation = saved.rotation;
                    t.scale = saved.scale;
                });
            }
        }

        tracing::debug!(entities = created.len(), "applied scene document");
        Ok(created)
    }

    fn spawn(&self, scene: &mut Scene, record: &EntityRecord) -> Entity {
        let entity = scene.create_entity("");
        if let Some(name) = &record.name {
            scene.add_component(entity, Name::new(name.clone()));
        }

        let components = &record.components;
        if let Some(transform) = components.transform {
            scene.add_component(entity, Transform::from(transform));
        }
        match components.visible {
            Some(visible) => scene.add_component(entity, Visible::from(visible)),
            None => scene.remove_component::<Visible>(entity),
        };
        if let Some(mesh) = &components.mesh_renderer {
            scene.add_component(entity, MeshRenderer::from(mesh));
        }
        entity
    }
}
