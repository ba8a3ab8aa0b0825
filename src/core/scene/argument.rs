//=========================================================================
// Scene Argument
//=========================================================================
//
// Immutable value handed to a transition: the target scene, scenes to
// preload next to it, a cache hint for the loader and an optional
// scene-specific payload.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

//=== Internal Dependencies ===============================================

use super::SceneKey;

//=== SceneArgument =======================================================

/// Describes where a transition goes and what the target scene receives.
///
/// # Example
///
/// ```rust
/// # use aetheric_scene::prelude::*;
/// # #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// # enum GameScene { Battle, Hud }
/// # impl SceneKey for GameScene {}
/// struct BattleSetup { stage: u32 }
///
/// let argument = SceneArgument::new(GameScene::Battle)
///     .with_preload([GameScene::Hud])
///     .with_payload(BattleSetup { stage: 3 });
///
/// assert_eq!(argument.payload::<BattleSetup>().map(|s| s.stage), Some(3));
/// ```
#[derive(Clone)]
pub struct SceneArgument<K: SceneKey> {
    identifier: Option<K>,
    preload: Vec<K>,
    cache: bool,
    payload: Option<Arc<dyn Any + Send + Sync>>,
}

impl<K: SceneKey> SceneArgument<K> {
    pub fn new(identifier: K) -> Self {
        Self {
            identifier: Some(identifier),
            preload: Vec::new(),
            cache: false,
            payload: None,
        }
    }

    /// An argument without target, e.g. for boot content that was not
    /// loaded through an identifier.
    pub fn unnamed() -> Self {
        Self {
            identifier: None,
            preload: Vec::new(),
            cache: false,
            payload: None,
        }
    }

    pub fn with_preload(mut self, scenes: impl IntoIterator<Item = K>) -> Self {
        self.preload.extend(scenes);
        self
    }

    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_payload<T: Any + Send + Sync>(mut self, payload: T) -> Self {
        self.payload = Some(Arc::new(payload));
        self
    }

    //--- Accessors --------------------------------------------------------

    pub fn identifier(&self) -> Option<K> {
        self.identifier
    }

    /// Scenes appended additively once the target is loaded.
    pub fn preload(&self) -> &[K] {
        &self.preload
    }

    /// Cache hint forwarded to the content loader.
    pub fn is_cached(&self) -> bool {
        self.cache
    }

    /// Borrows the payload if it has type `T`.
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref()?.downcast_ref::<T>()
    }

    /// Concrete type of the payload, if any.
    pub fn payload_type(&self) -> Option<TypeId> {
        self.payload.as_deref().map(|payload| payload.type_id())
    }
}

impl<K: SceneKey> fmt::Debug for SceneArgument<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneArgument")
            .field("identifier", &self.identifier)
            .field("preload", &self.preload)
            .field("cache", &self.cache)
            .field("payload", &self.payload.is_some())
            .finish()
    }
}

//=========================================================================
// Tests
//=========================================================================
