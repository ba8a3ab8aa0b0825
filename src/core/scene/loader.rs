//=========================================================================
// Content Loader
//=========================================================================
//
// Narrow interface to the engine's content loading.
//
// How an identifier maps to storage is the loader's business; the
// orchestrator only asks for a unit and receives its node content.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use super::{LoadMode, SceneKey};
use crate::core::error::LoadError;
use crate::core::node::{UnitContent, UnitId};
use crate::core::task::Task;

//=== LoadRequest =========================================================

/// Parameters of one load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRequest<K: SceneKey> {
    pub identifier: K,
    pub mode: LoadMode,
    pub cache: bool,
}

//=== ContentLoader Trait =================================================

/// Asynchronously loads and unloads content units.
pub trait ContentLoader<K: SceneKey> {
    /// Starts loading a unit. The task yields the unit's node content.
    fn load_unit(&mut self, request: &LoadRequest<K>) -> Task<Result<UnitContent<K>, LoadError>>;

    /// Starts unloading a unit that was mounted from this loader.
    fn unload_unit(&mut self, unit: UnitId, identifier: Option<K>) -> Task<Result<(), LoadError>>;

    /// Releases resources no longer referenced by any unit.
    ///
    /// Called between Prepare and Wait. Best effort.
    fn release_unused(&mut self) {}
}
