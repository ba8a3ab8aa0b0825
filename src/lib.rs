//=========================================================================
// Aetheric Scene — Library Root
//
// This crate defines the scene transition layer of the Aetheric Engine.
//
// Responsibilities:
// - Drive the Leave → Load → Prepare → Wait → Enter transition pipeline
// - Track the current scene, additive scenes and navigation history
// - Keep at most one live instance of each declared unique component
// - Let external systems hold a transition open through wait tokens
//
// Typical usage:
// ```no_run
// use aetheric_scene::prelude::*;
// # #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
// # enum GameScene { Title }
// # impl SceneKey for GameScene {}
// # fn loader() -> impl ContentLoader<GameScene> + 'static { unimplemented!() }
//
// let mut scenes = OrchestratorBuilder::<GameScene>::new().build(loader());
// scenes.transition(SceneArgument::new(GameScene::Title));
//
// loop {
//     scenes.update().expect("scene hook failed");
// }
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` contains the orchestrator and all of its collaborators (nodes,
// tasks, wait barrier, unique components, diagnostics, history).
//
pub mod core;

//--- Convenience ---------------------------------------------------------
//
// `prelude` re-exports the types most applications need.
//
pub mod prelude;

//--- Public Exports ------------------------------------------------------
//
// Re-exports the orchestrator and its builder so users can simply
// `use aetheric_scene::SceneTransitionOrchestrator;`.
//
pub use crate::core::scene::{OrchestratorBuilder, SceneTransitionOrchestrator};
