//=========================================================================
// Orchestrator Builder
//=========================================================================
//
// Fluent configuration for a SceneTransitionOrchestrator.
//
// Architecture:
//   OrchestratorBuilder ──build(loader)──> SceneTransitionOrchestrator
//       │
//       ├─ with_unique() / with_suspended_unique()
//       ├─ with_effects()
//       ├─ with_diagnostics()
//       └─ with_history_capacity()
//
//=========================================================================

//=== External Dependencies ===============================================

use log::info;

//=== Internal Dependencies ===============================================

use super::{
    ContentLoader, DuplicatedAction, History, NoEffects, SceneKey, SceneTransitionOrchestrator,
    TransitionEffects, UniqueComponentRegistry, UniqueDeclaration,
};
use crate::core::node::{ComponentKind, NodeWorld};

//=== OrchestratorBuilder =================================================

/// Builder for configuring and constructing a
/// [`SceneTransitionOrchestrator`].
///
/// # Default Values
///
/// - **Unique components**: none
/// - **Effects**: [`NoEffects`]
/// - **Diagnostics**: enabled
/// - **History capacity**: unbounded
///
/// # Examples
///
/// ```rust
/// use aetheric_scene::prelude::*;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum GameScene { Field }
/// impl SceneKey for GameScene {}
///
/// struct Loader;
///
/// impl ContentLoader<GameScene> for Loader {
///     fn load_unit(
///         &mut self,
///         _request: &LoadRequest<GameScene>,
///     ) -> Task<Result<UnitContent<GameScene>, LoadError>> {
///         Task::ready(Ok(UnitContent::new()))
///     }
///
///     fn unload_unit(
///         &mut self,
///         _unit: UnitId,
///         _identifier: Option<GameScene>,
///     ) -> Task<Result<(), LoadError>> {
///         Task::ready(Ok(()))
///     }
/// }
///
/// const AUDIO_LISTENER: ComponentKind = ComponentKind::new("audio-listener");
///
/// let mut scenes = OrchestratorBuilder::new()
///     .with_unique(AUDIO_LISTENER, DuplicatedAction::DisableComponent)
///     .with_history_capacity(32)
///     .build(Loader);
///
/// scenes.transition(SceneArgument::new(GameScene::Field));
/// scenes.update().unwrap();
/// ```
pub struct OrchestratorBuilder<K: SceneKey> {
    uniques: Vec<UniqueDeclaration>,
    effects: Option<Box<dyn TransitionEffects<K>>>,
    diagnostics: bool,
    history_capacity: Option<usize>,
}

impl<K: SceneKey> OrchestratorBuilder<K> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            uniques: Vec::new(),
            effects: None,
            diagnostics: true,
            history_capacity: None,
        }
    }

    /// Declares a component kind that may have only one live instance.
    ///
    /// Declaring the same kind again replaces the earlier declaration.
    pub fn with_unique(self, kind: ComponentKind, action: DuplicatedAction) -> Self {
        self.declare(UniqueDeclaration {
            kind,
            action,
            require_suspend: false,
        })
    }

    /// Like [`with_unique`](Self::with_unique), and the captured instance
    /// is also disabled while content loads.
    pub fn with_suspended_unique(self, kind: ComponentKind, action: DuplicatedAction) -> Self {
        self.declare(UniqueDeclaration {
            kind,
            action,
            require_suspend: true,
        })
    }

    fn declare(mut self, declaration: UniqueDeclaration) -> Self {
        self.uniques.retain(|existing| existing.kind != declaration.kind);
        self.uniques.push(declaration);
        self
    }

    /// Sets the hooks run around every transition (fades, save data).
    pub fn with_effects(mut self, effects: impl TransitionEffects<K> + 'static) -> Self {
        self.effects = Some(Box::new(effects));
        self
    }

    /// Enables or disables per-phase timing reports.
    ///
    /// Default: enabled
    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }

    /// Caps the number of history entries, dropping the oldest first.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "History capacity must be positive");
        self.history_capacity = Some(capacity);
        self
    }

    /// Builds the orchestrator around the given content loader.
    pub fn build(self, loader: impl ContentLoader<K> + 'static) -> SceneTransitionOrchestrator<K> {
        info!(
            "Building scene orchestrator (uniques: {}, diagnostics: {}, history: {:?})",
            self.uniques.len(),
            self.diagnostics,
            self.history_capacity
        );

        let mut world = NodeWorld::new();
        let unique = UniqueComponentRegistry::new(self.uniques, &mut world);
        let history = match self.history_capacity {
            Some(capacity) => History::with_capacity_limit(capacity),
            None => History::new(),
        };
        let effects = self.effects.unwrap_or_else(|| Box::new(NoEffects));

        SceneTransitionOrchestrator::assemble(
            world,
            Box::new(loader),
            effects,
            history,
            unique,
            self.diagnostics,
        )
    }
}

impl<K: SceneKey> Default for OrchestratorBuilder<K> {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scene::testing::{
        booted, settle, Recorder, ScriptedLoader, TestScene, LISTENER,
    };
    use crate::core::scene::{SceneArgument, SceneInstance};
    use crate::core::task::Task;

    //=====================================================================
    // Builder Tests
    //=====================================================================

    #[test]
    fn builder_defaults() {
        let builder = OrchestratorBuilder::<TestScene>::new();
        assert!(builder.uniques.is_empty());
        assert!(builder.effects.is_none());
        assert!(builder.diagnostics);
        assert_eq!(builder.history_capacity, None);
    }

    #[test]
    fn redeclaring_unique_replaces_it() {
        let builder = OrchestratorBuilder::<TestScene>::new()
            .with_unique(LISTENER, DuplicatedAction::DisableNode)
            .with_suspended_unique(LISTENER, DuplicatedAction::DestroyNode);

        assert_eq!(builder.uniques.len(), 1);
        assert_eq!(builder.uniques[0].action, DuplicatedAction::DestroyNode);
        assert!(builder.uniques[0].require_suspend);
    }

    #[test]
    #[should_panic(expected = "History capacity must be positive")]
    fn builder_with_history_capacity_panics_on_zero() {
        OrchestratorBuilder::<TestScene>::new().with_history_capacity(0);
    }

    #[test]
    fn build_creates_unique_container() {
        let (loader, _control) = ScriptedLoader::new();
        let orchestrator = OrchestratorBuilder::<TestScene>::new()
            .with_unique(LISTENER, DuplicatedAction::DisableComponent)
            .build(loader);

        let container = orchestrator.unique_components().container();
        assert!(orchestrator.world().is_alive(container));
        assert_eq!(orchestrator.unique_components().declarations().len(), 1);
        assert!(orchestrator.current().is_none());
    }

    #[test]
    fn history_capacity_is_applied() {
        let mut harness = booted(OrchestratorBuilder::new().with_history_capacity(2));

        for key in [TestScene::B, TestScene::C, TestScene::D] {
            harness.orchestrator.transition(SceneArgument::new(key));
            settle(&mut harness.orchestrator).unwrap();
        }

        assert_eq!(
            harness.orchestrator.history().identifiers(),
            vec![Some(TestScene::C), Some(TestScene::D)]
        );
    }

    //=====================================================================
    // Effects Tests
    //=====================================================================

    struct Fades {
        recorder: Recorder,
    }

    impl TransitionEffects<TestScene> for Fades {
        fn transition_start(&mut self, target: &SceneArgument<TestScene>) -> Task<()> {
            self.recorder.push(format!("fade-out:{:?}", target.identifier()));
            Task::done()
        }

        fn transition_finish(&mut self, target: &SceneArgument<TestScene>) -> Task<()> {
            self.recorder.push(format!("fade-in:{:?}", target.identifier()));
            Task::done()
        }

        fn persist_state(&mut self, leaving: &SceneInstance<TestScene>) {
            self.recorder.push(format!("save:{:?}", leaving.identifier()));
        }
    }

    #[test]
    fn effects_wrap_the_pipeline() {
        let effects_log = Recorder::new();
        let mut harness = booted(OrchestratorBuilder::new().with_effects(Fades {
            recorder: effects_log.clone(),
        }));

        harness.orchestrator.transition(SceneArgument::new(TestScene::B));
        settle(&mut harness.orchestrator).unwrap();

        assert_eq!(
            effects_log.log(),
            vec!["fade-out:Some(B)", "save:Some(A)", "fade-in:Some(B)"]
        );
    }
}
