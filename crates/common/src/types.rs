use serde::{Deserialize, Serialize};
use std::fmt;

/// Generation-tagged handle identifying a logical object in a scene.
///
/// Two handles are equal only when both `id` and `generation` match, so a
/// handle captured before its entity was destroyed never aliases the entity
/// that later reuses the same id.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity {
    pub id: u32,
    pub generation: u32,
}

impl Entity {
    /// The "no entity" sentinel. Never valid in any registry.
    pub const INVALID: Entity = Entity::new(0, 0);

    pub const fn new(id: u32, generation: u32) -> Self {
        Self { id, generation }
    }

    /// True for the id-0 sentinel. Says nothing about liveness; ask the
    /// registry for that.
    pub const fn is_null(&self) -> bool {
        self.id == 0
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}:{})", self.id, self.generation)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("<none>")
        } else {
            write!(f, "#{}v{}", self.id, self.generation)
        }
    }
}
