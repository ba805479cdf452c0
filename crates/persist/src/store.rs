//! Reading and writing scene files.
//!
//! A file is a single pretty-printed JSON [`SceneDocument`]. The header is
//! checked by hand before the typed decode so that a missing `version` or
//! `entities` is reported as such rather than as a generic JSON error.

use keystone_scene::Scene;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::document::{FORMAT_VERSION, SceneDocument, SceneMetadata};
use crate::timestamp::now_rfc3339;

/// Errors from scene file operations.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("scene file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("unsupported scene version {0:?}, expected \"1.0\"")]
    UnsupportedVersion(String),
    #[error("missing or invalid field `{0}`")]
    MissingField(&'static str),
    #[error("invalid hierarchy: {0}")]
    InvalidHierarchy(String),
}

/// Write `scene` to `path`. `created` is stamped when empty and `modified`
/// always is; the stamped metadata is returned.
pub fn save_scene(
    scene: &Scene,
    path: impl AsRef<Path>,
    metadata: &SceneMetadata,
) -> Result<SceneMetadata, PersistError> {
    let path = path.as_ref();
    let now = now_rfc3339();
    let mut metadata = metadata.clone();
    if metadata.created.is_empty() {
        metadata.created = now.clone();
    }
    metadata.modified = now;

    let document = SceneDocument::capture(scene, metadata);
    let json = serde_json::to_string_pretty(&document)?;
    std::fs::write(path, json)?;

    tracing::info!(path = %path.display(), entities = document.entities.len(), "saved scene");
    Ok(document.metadata)
}

/// Replace the contents of `scene` with the file at `path`.
pub fn load_scene(
    scene: &mut Scene,
    path: impl AsRef<Path>,
) -> Result<SceneMetadata, PersistError> {
    let path = path.as_ref();
    let document = read_document(path)?;
    let created = document.apply(scene)?;
    tracing::info!(path = %path.display(), entities = created.len(), "loaded scene");
    Ok(document.metadata)
}

/// Header only. Missing metadata fields fall back to their defaults.
pub fn read_metadata(path: impl AsRef<Path>) -> Result<SceneMetadata, PersistError> {
    let mut root = read_json(path.as_ref())?;
    match root.get_mut("metadata").map(Value::take) {
        Some(metadata) => Ok(serde_json::from_value(metadata)?),
        None => Ok(SceneMetadata::default()),
    }
}

/// Check that the file at `path` could be loaded, without touching a scene.
/// Returns the number of entity records.
pub fn validate_scene_file(path: impl AsRef<Path>) -> Result<usize, PersistError> {
    let document = read_document(path.as_ref())?;
    document.check_ids()?;
    Ok(document.entities.len())
}

fn read_document(path: &Path) -> Result<SceneDocument, PersistError> {
    let root = read_json(path)?;

    let version = root
        .get("version")
        .and_then(Value::as_str)
        .ok_or(PersistError::MissingField("version"))?;
    if version != FORMAT_VERSION {
        return Err(PersistError::UnsupportedVersion(version.to_owned()));
    }
    if !root.get("entities").is_some_and(Value::is_array) {
        return Err(PersistError::MissingField("entities"));
    }

    Ok(serde_json::from_value(root)?)
}

fn read_json(path: &Path) -> Result<Value, PersistError> {
    if !path.exists() {
        return Err(PersistError::FileNotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use keystone_ecs::{MeshRenderer, Name, Transform, Visible};

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn save_and_load_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("level.scene.json");

        let mut scene = Scene::new();
        let root = scene.create_entity("Root");
        scene.add_component(
            root,
            Transform::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, 1.0, 0.0), Vec3::splat(1.5)),
        );
        scene.add_component(root, MeshRenderer::from_path("meshes/tower.glb"));
        let child = scene.create_entity("Child");
        scene.add_component(child, Transform::from_xyz(1.0, 0.0, -1.0));
        scene.set_parent(child, root);
        let child_local = scene.get_component::<Transform>(child).cloned().unwrap();

        let saved = save_scene(&scene, &path, &SceneMetadata::named("Level")).unwrap();
        assert!(!saved.created.is_empty());
        assert_eq!(saved.created, saved.modified);

        let mut loaded = Scene::new();
        let meta = load_scene(&mut loaded, &path).unwrap();
        assert_eq!(meta, saved);
        assert_eq!(loaded.entity_count(), 2);

        let root2 = loaded.find_entity_by_name("Root");
        let child2 = loaded.find_entity_by_name("Child");
        assert_eq!(loaded.parent(child2), root2);
        assert_eq!(loaded.children(root2), &[child2]);
        assert_eq!(loaded.get_component::<Transform>(child2), Some(&child_local));
        assert_eq!(
            loaded.get_component::<MeshRenderer>(root2).and_then(|m| m.mesh_path.clone()),
            Some("meshes/tower.glb".to_owned())
        );
        assert!(loaded.has_component::<Visible>(child2));
        assert!(
            loaded
                .compute_world_matrix(child2)
                .abs_diff_eq(scene.compute_world_matrix(child), 1e-4)
        );
    }

    #[test]
    fn save_keeps_existing_created_stamp() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.json");
        let metadata = SceneMetadata {
            created: "2020-01-01T00:00:00Z".into(),
            ..SceneMetadata::default()
        };
        let saved = save_scene(&Scene::new(), &path, &metadata).unwrap();
        assert_eq!(saved.created, "2020-01-01T00:00:00Z");
        assert_ne!(saved.modified, saved.created);
        assert_eq!(read_metadata(&path).unwrap(), saved);
    }

    #[test]
    fn missing_file_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nope.json");
        assert!(matches!(
            load_scene(&mut Scene::new(), &path),
            Err(PersistError::FileNotFound(p)) if p == path
        ));
        assert!(matches!(read_metadata(&path), Err(PersistError::FileNotFound(_))));
        assert!(matches!(validate_scene_file(&path), Err(PersistError::FileNotFound(_))));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(&tmp, "bad.json", "{ \"version\": ");
        assert!(matches!(validate_scene_file(&path), Err(PersistError::Json(_))));
    }

    #[test]
    fn header_checks() {
        let tmp = tempfile::tempdir().unwrap();
        let no_version = write(&tmp, "v.json", r#"{ "entities": [] }"#);
        let wrong_version = write(&tmp, "w.json", r#"{ "version": "2.0", "entities": [] }"#);
        let no_entities = write(&tmp, "e.json", r#"{ "version": "1.0" }"#);

        assert!(matches!(
            validate_scene_file(&no_version),
            Err(PersistError::MissingField("version"))
        ));
        assert!(matches!(
            validate_scene_file(&wrong_version),
            Err(PersistError::UnsupportedVersion(v)) if v == "2.0"
        ));
        assert!(matches!(
            validate_scene_file(&no_entities),
            Err(PersistError::MissingField("entities"))
        ));
    }

    #[test]
    fn failed_load_leaves_scene_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(&tmp, "w.json", r#"{ "version": "0.9", "entities": [] }"#);
        let mut scene = Scene::new();
        scene.create_entity("Survivor");
        assert!(load_scene(&mut scene, &path).is_err());
        assert_ne!(scene.find_entity_by_name("Survivor"), keystone_common::Entity::INVALID);
    }

    #[test]
    fn validate_counts_entities_and_rejects_duplicates() {
        let tmp = tempfile::tempdir().unwrap();
        let ok = write(
            &tmp,
            "ok.json",
            r#"{ "version": "1.0", "entities": [ { "id": 1 }, { "id": 2, "parent": 1 } ] }"#,
        );
        let dup = write(
            &tmp,
            "dup.json",
            r#"{ "version": "1.0", "entities": [ { "id": 1 }, { "id": 1 } ] }"#,
        );
        assert_eq!(validate_scene_file(&ok).unwrap(), 2);
        assert!(matches!(validate_scene_file(&dup), Err(PersistError::InvalidHierarchy(_))));
    }

    #[test]
    fn lenient_fields_take_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(
            &tmp,
            "lenient.json",
            r#"{
                "version": "1.0",
                "metadata": { "name": "Sparse" },
                "entities": [
                    { "id": 5, "name": "Box", "components": {
                        "transform": { "position": [1, 2, 3] },
                        "visible": { "castShadows": false }
                    } }
                ]
            }"#,
        );
        let meta = read_metadata(&path).unwrap();
        assert_eq!(meta.name, "Sparse");
        assert_eq!(meta.author, SceneMetadata::default().author);

        let mut scene = Scene::new();
        load_scene(&mut scene, &path).unwrap();
        let e = scene.find_entity_by_name("Box");
        assert_eq!(scene.get_component::<Name>(e), Some(&Name::new("Box")));
        assert_eq!(
            scene.get_component::<Transform>(e),
            Some(&Transform::from_xyz(1.0, 2.0, 3.0))
        );
        assert_eq!(
            scene.get_component::<Visible>(e).copied(),
            Some(Visible {
                visible: true,
                cast_shadows: false,
                receive_shadows: true,
            })
        );
    }

    #[test]
    fn metadata_defaults_when_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(&tmp, "m.json", r#"{ "version": "1.0", "entities": [] }"#);
        assert_eq!(read_metadata(&path).unwrap(), SceneMetadata::default());
    }
}
