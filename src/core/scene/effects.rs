//=========================================================================
// Transition Effects
//=========================================================================
//
// Application hooks that wrap every transition (fades, save data).
//
//=========================================================================

//=== Internal Dependencies ===============================================

use super::{SceneArgument, SceneInstance, SceneKey};
use crate::core::task::Task;

//=== TransitionEffects Trait =============================================

/// Hooks run around the scene pipeline.
///
/// `transition_start` is awaited before Leave, `transition_finish` after
/// the wait barrier drains. Both default to finishing immediately.
pub trait TransitionEffects<K: SceneKey> {
    fn transition_start(&mut self, _target: &SceneArgument<K>) -> Task<()> {
        Task::done()
    }

    fn transition_finish(&mut self, _target: &SceneArgument<K>) -> Task<()> {
        Task::done()
    }

    /// Persists external save state once the leaving scene has left.
    fn persist_state(&mut self, _leaving: &SceneInstance<K>) {}
}

//=== NoEffects ===========================================================

/// Effects that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEffects;

impl<K: SceneKey> TransitionEffects<K> for NoEffects {}
