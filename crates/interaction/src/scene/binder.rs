use serde::{Deserialize, Serialize};

/// Weak handle to an externally-owned overlap shape. The scene that owns the
/// shape decides what binding means; the core only toggles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollisionHandle(pub u64);

/// Weak handle to an externally-owned highlightable visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HighlightHandle(pub u64);

/// Overlap/trace response channel. An interactor only qualifies against an
/// interactable on the same channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseChannel(pub u16);

/// Interactor type tag, matched against an interactable's ignored classes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeTag(pub String);

impl TypeTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InteractionKey(pub String);

impl InteractionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl Default for InteractionKey {
    fn default() -> Self {
        Self::new("E")
    }
}

/// Side-effect seam toward the external scene. All methods are idempotent
/// and return nothing; the core calls them exactly at the transition points.
pub trait SceneBinder {
    fn bind_collision(&mut self, target: CollisionHandle);
    fn unbind_collision(&mut self, target: CollisionHandle);
    fn bind_highlight(&mut self, target: HighlightHandle);
    fn unbind_highlight(&mut self, target: HighlightHandle);
}

/// Binder that drops every call; the default for worlds without a scene.
#[derive(Debug, Default)]
pub struct NullBinder;

impl SceneBinder for NullBinder {
    fn bind_collision(&mut self, _target: CollisionHandle) {}
    fn unbind_collision(&mut self, _target: CollisionHandle) {}
    fn bind_highlight(&mut self, _target: HighlightHandle) {}
    fn unbind_highlight(&mut self, _target: HighlightHandle) {}
}
