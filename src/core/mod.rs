//=========================================================================
// Core Systems
//=========================================================================
//
// Everything the scene orchestrator owns or talks to.
//
// Architecture:
//   scene::SceneTransitionOrchestrator
//     ├─ node::NodeWorld            (node activation API, unit bookkeeping)
//     ├─ scene::ContentLoader       (external, returns task::Task)
//     ├─ scene::UniqueComponentRegistry
//     ├─ scene::WaitBarrier
//     ├─ scene::History
//     └─ scene::TransitionDiagnostics
//
//=========================================================================

//=== Module Declarations =================================================

pub mod error;
pub mod node;
pub mod scene;
pub mod task;
