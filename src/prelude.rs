//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use aetheric_scene::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Orchestration
pub use crate::core::scene::{
    OrchestratorBuilder, SceneTransitionOrchestrator, TransitionPhase,
};

// Scene contracts
pub use crate::core::scene::{
    ContentLoader, LoadMode, LoadRequest, SceneArgument, SceneContext, SceneEventHandler,
    SceneInstance, SceneKey, SceneLifecycle, TransitionEffects,
};

// Collaborators
pub use crate::core::scene::{DuplicatedAction, WaitHandler};

// Nodes
pub use crate::core::node::{ComponentKind, NodeBlueprint, NodeId, NodeWorld, UnitContent, UnitId};

// Tasks and errors
pub use crate::core::error::{HookError, HookPhase, LoadError, SceneError};
pub use crate::core::task::{HookTask, Task, TaskCompleter, TaskPoll};
