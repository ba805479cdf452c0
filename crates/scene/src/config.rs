use serde::{Deserialize, Serialize};

/// How much of a child's local transform is re-derived when it is moved to a
/// new parent and both carry a Transform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReparentMode {
    /// Only the translation is re-derived; rotation and scale stay as they
    /// were, so the world position is kept but a rotated or scaled parent
    /// changes the child's world orientation.
    PreserveTranslation,
    /// Full TRS decomposition of `inverse(parent_world) * child_world`.
    /// Shear cannot be represented and is lost.
    #[default]
    PreserveWorld,
}

/// Scene-wide behaviour switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    /// `create_entity` skips the Name component for this placeholder.
    pub default_entity_name: String,
    pub reparent: ReparentMode,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            default_entity_name: "Entity".into(),
            reparent: ReparentMode::default(),
        }
    }
}
