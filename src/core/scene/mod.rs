//=========================================================================
// Scene System
//=========================================================================
//
// Scene transition orchestration and its collaborators.
//
// Architecture:
//   SceneTransitionOrchestrator
//     ├─ current: SceneInstance            (Single mode foreground)
//     ├─ additive: Vec<SceneInstance>      (layered content)
//     ├─ history: History                  (navigation arguments)
//     ├─ barrier: WaitBarrier              (external wait tokens)
//     ├─ unique: UniqueComponentRegistry   (cross-scene singletons)
//     ├─ diagnostics: TransitionDiagnostics
//     └─ events: SceneEvents               (one stream per hook point)
//
// Flow (one transition, driven by update()):
//   TransitionStart → Leave → Load → OnLoadScene hooks → Activate
//     → (one tick) → Prepare → Cleanup → Wait → TransitionFinish → Enter
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::TypeId;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

//=== Internal Dependencies ===============================================

use crate::core::error::HookError;
use crate::core::task::HookTask;

//=== Module Declarations =================================================

mod argument;
mod builder;
mod diagnostics;
mod effects;
mod events;
mod history;
mod hook_sequence;
mod instance;
mod loader;
mod orchestrator;
mod transition_queue;
mod unique;
mod wait_barrier;

#[cfg(test)]
pub(crate) mod testing;

//=== Public API ==========================================================

pub use argument::SceneArgument;
pub use builder::OrchestratorBuilder;
pub use diagnostics::{DiagnosticPhase, TransitionDiagnostics, TransitionReport};
pub use effects::{NoEffects, TransitionEffects};
pub use events::{EventStream, LoadFailure, SceneEvents};
pub use history::History;
pub use instance::{LoadMode, SceneInstance};
pub use loader::{ContentLoader, LoadRequest};
pub use orchestrator::{SceneTransitionOrchestrator, TransitionPhase};
pub use transition_queue::{TransitionQueue, TransitionRequest};
pub use unique::{DuplicatedAction, UniqueComponentRegistry, UniqueDeclaration};
pub use wait_barrier::{WaitBarrier, WaitHandler};

//=== Scene Key Trait =====================================================

/// Marker trait for scene identifiers.
///
/// Scene keys name loadable content units. Typically implemented by
/// game-specific enums.
pub trait SceneKey: Clone + Copy + Eq + Hash + Debug + Send + Sync + 'static {}

//=== Scene Lifecycle Trait ===============================================

/// Lifecycle hooks of a scene's root object.
///
/// Exactly one node of a content unit is expected to carry this
/// capability; units without one (boot content) simply skip the hooks.
/// Every hook has a default implementation.
///
/// ```rust
/// # use aetheric_scene::prelude::*;
/// # #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// # enum GameScene { Title }
/// # impl SceneKey for GameScene {}
/// struct TitleScene;
///
/// impl SceneLifecycle<GameScene> for TitleScene {
///     fn enter(
///         &mut self,
///         is_back: bool,
///         _ctx: &mut SceneContext<'_, GameScene>,
///     ) -> Result<(), HookError> {
///         if !is_back {
///             // play intro
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait SceneLifecycle<K: SceneKey>: Send {
    /// Payload type this scene accepts through [`SceneArgument::payload`].
    ///
    /// `None` accepts any argument.
    fn argument_type(&self) -> Option<TypeId> {
        None
    }

    /// Receives the argument the scene was loaded with.
    fn set_argument(&mut self, _argument: Arc<SceneArgument<K>>) {}

    /// Called once the scene becomes current, before Prepare.
    fn initialize(&mut self, _ctx: &mut SceneContext<'_, K>) {}

    /// Loads whatever the scene needs before it is shown.
    fn prepare(&mut self, _is_back: bool, _ctx: &mut SceneContext<'_, K>) -> HookTask {
        HookTask::ok()
    }

    /// Called when the scene is shown. Runs synchronously.
    fn enter(&mut self, _is_back: bool, _ctx: &mut SceneContext<'_, K>) -> Result<(), HookError> {
        Ok(())
    }

    /// Called before the scene is replaced.
    fn leave(&mut self, _ctx: &mut SceneContext<'_, K>) -> HookTask {
        HookTask::ok()
    }

    /// Called by [`SceneTransitionOrchestrator::reload_current`].
    fn reload(&mut self, _ctx: &mut SceneContext<'_, K>) {}
}

//=== Scene Event Handler Trait ===========================================

/// Load/unload hooks for ordinary nodes inside a content unit.
///
/// Handlers of one unit run one after another in depth-first node order.
pub trait SceneEventHandler<K: SceneKey>: Send {
    fn on_load_scene(&mut self, _ctx: &mut SceneContext<'_, K>) -> HookTask {
        HookTask::ok()
    }

    fn on_unload_scene(&mut self, _ctx: &mut SceneContext<'_, K>) -> HookTask {
        HookTask::ok()
    }
}

//=== Scene Context =======================================================

/// What hooks may do to the orchestrator while it is calling them.
///
/// Requests are queued and applied after the hook returns; a request
/// issued from `enter` is accepted because the transition is already
/// finished by then.
pub struct SceneContext<'a, K: SceneKey> {
    requests: &'a mut TransitionQueue<K>,
    barrier: &'a mut WaitBarrier,
}

impl<'a, K: SceneKey> SceneContext<'a, K> {
    pub(crate) fn new(requests: &'a mut TransitionQueue<K>, barrier: &'a mut WaitBarrier) -> Self {
        Self { requests, barrier }
    }

    /// Queues a request for the orchestrator.
    pub fn request(&mut self, request: TransitionRequest<K>) {
        self.requests.push(request);
    }

    /// Queues a transition that records history.
    pub fn transition(&mut self, argument: SceneArgument<K>) {
        self.request(TransitionRequest::Transition {
            argument,
            register_history: true,
        });
    }

    /// Queues a transition back to the previous history entry.
    pub fn transition_back(&mut self) {
        self.request(TransitionRequest::Back);
    }

    /// Holds the in-flight transition at its Wait phase until the
    /// returned handler is disposed.
    pub fn begin_wait(&mut self) -> WaitHandler {
        self.barrier.begin_wait()
    }
}
