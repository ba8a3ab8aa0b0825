//=========================================================================
// Test Support
//=========================================================================
//
// Scripted collaborators shared by the scene unit tests.
//
//   Recorder         log of every hook call, plus knobs to hold or fail
//                    hooks
//   RecordingScene   SceneLifecycle that writes "<name>:<hook>" entries
//   RecordingHandler SceneEventHandler that writes "<name>:load|unload"
//   ScriptedLoader   ContentLoader backed by per-key factories; can hold
//                    loads until the test completes them
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::TypeId;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

//=== Internal Dependencies ===============================================

use super::{
    ContentLoader, LoadRequest, OrchestratorBuilder, SceneArgument, SceneContext,
    SceneEventHandler, SceneKey, SceneLifecycle, SceneTransitionOrchestrator, TransitionRequest,
};
use crate::core::error::{HookError, LoadError, SceneError};
use crate::core::node::{ComponentKind, NodeBlueprint, UnitContent, UnitId};
use crate::core::task::{HookTask, Task, TaskCompleter};

//=== Keys ================================================================

#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub(crate) enum TestScene {
    A,
    B,
    C,
    D,
}

impl SceneKey for TestScene {}

pub(crate) const LISTENER: ComponentKind = ComponentKind::new("listener");

//=== Recorder ============================================================

#[derive(Default)]
pub(crate) struct RecorderState {
    pub log: Vec<String>,
    pub held: Vec<TaskCompleter<Result<(), HookError>>>,
    pub hold_prepare: bool,
    pub hold_handlers: bool,
    pub fail_prepare: bool,
    pub enter_requests: Vec<TransitionRequest<TestScene>>,
}

/// Shared hook log. Clones write to the same log.
#[derive(Clone, Default)]
pub(crate) struct Recorder {
    state: Arc<Mutex<RecorderState>>,
}

impl Recorder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap()
    }

    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut RecorderState) -> R) -> R {
        f(&mut self.lock())
    }

    pub(crate) fn push(&self, entry: impl Into<String>) {
        self.lock().log.push(entry.into());
    }

    pub(crate) fn log(&self) -> Vec<String> {
        self.lock().log.clone()
    }

    pub(crate) fn contains(&self, entry: &str) -> bool {
        self.lock().log.iter().any(|e| e == entry)
    }

    pub(crate) fn position(&self, entry: &str) -> Option<usize> {
        self.lock().log.iter().position(|e| e == entry)
    }

    pub(crate) fn clear(&self) {
        self.lock().log.clear();
    }

    /// Completes every held hook successfully.
    pub(crate) fn release_held(&self) {
        let held = std::mem::take(&mut self.lock().held);
        for completer in held {
            completer.complete(Ok(()));
        }
    }

    fn hold(&self) -> HookTask {
        let (task, completer) = Task::pending();
        self.lock().held.push(completer);
        task
    }
}

//=== RecordingScene ======================================================

pub(crate) struct RecordingScene {
    name: &'static str,
    recorder: Recorder,
    accepts: Option<TypeId>,
}

impl RecordingScene {
    pub(crate) fn new(name: &'static str, recorder: &Recorder) -> Self {
        Self {
            name,
            recorder: recorder.clone(),
            accepts: None,
        }
    }

    pub(crate) fn accepting<T: 'static>(mut self) -> Self {
        self.accepts = Some(TypeId::of::<T>());
        self
    }

    fn entry(&self, hook: &str, is_back: bool) -> String {
        if is_back {
            format!("{}:{}(back)", self.name, hook)
        } else {
            format!("{}:{}", self.name, hook)
        }
    }
}

impl SceneLifecycle<TestScene> for RecordingScene {
    fn argument_type(&self) -> Option<TypeId> {
        self.accepts
    }

    fn set_argument(&mut self, _argument: Arc<SceneArgument<TestScene>>) {
        self.recorder.push(format!("{}:argument", self.name));
    }

    fn initialize(&mut self, _ctx: &mut SceneContext<'_, TestScene>) {
        self.recorder.push(format!("{}:initialize", self.name));
    }

    fn prepare(&mut self, is_back: bool, _ctx: &mut SceneContext<'_, TestScene>) -> HookTask {
        self.recorder.push(self.entry("prepare", is_back));
        let (fail, hold) = self.recorder.with(|state| (state.fail_prepare, state.hold_prepare));
        if fail {
            HookTask::failed(HookError::new("prepare failed"))
        } else if hold {
            self.recorder.hold()
        } else {
            HookTask::ok()
        }
    }

    fn enter(
        &mut self,
        is_back: bool,
        ctx: &mut SceneContext<'_, TestScene>,
    ) -> Result<(), HookError> {
        self.recorder.push(self.entry("enter", is_back));
        let requests = self.recorder.with(|state| std::mem::take(&mut state.enter_requests));
        for request in requests {
            ctx.request(request);
        }
        Ok(())
    }

    fn leave(&mut self, _ctx: &mut SceneContext<'_, TestScene>) -> HookTask {
        self.recorder.push(format!("{}:leave", self.name));
        HookTask::ok()
    }

    fn reload(&mut self, _ctx: &mut SceneContext<'_, TestScene>) {
        self.recorder.push(format!("{}:reload", self.name));
    }
}

//=== RecordingHandler ====================================================

pub(crate) struct RecordingHandler {
    name: String,
    recorder: Recorder,
}

impl RecordingHandler {
    pub(crate) fn new(name: impl Into<String>, recorder: &Recorder) -> Self {
        Self {
            name: name.into(),
            recorder: recorder.clone(),
        }
    }

    fn record(&self, hook: &str) -> HookTask {
        self.recorder.push(format!("{}:{}", self.name, hook));
        if self.recorder.with(|state| state.hold_handlers) {
            self.recorder.hold()
        } else {
            HookTask::ok()
        }
    }
}

impl SceneEventHandler<TestScene> for RecordingHandler {
    fn on_load_scene(&mut self, _ctx: &mut SceneContext<'_, TestScene>) -> HookTask {
        self.record("load")
    }

    fn on_unload_scene(&mut self, _ctx: &mut SceneContext<'_, TestScene>) -> HookTask {
        self.record("unload")
    }
}

//=== Content =============================================================

/// A scene root named "<name> Root" with a child "<name> Listener" that
/// carries the listener component and a recording handler.
pub(crate) fn scene_content(name: &'static str, recorder: &Recorder) -> UnitContent<TestScene> {
    scene_content_with(RecordingScene::new(name, recorder), name, recorder)
}

pub(crate) fn scene_content_with(
    scene: RecordingScene,
    name: &'static str,
    recorder: &Recorder,
) -> UnitContent<TestScene> {
    UnitContent::new().with_root(
        NodeBlueprint::new(format!("{name} Root"))
            .with_lifecycle(scene)
            .with_child(
                NodeBlueprint::new(format!("{name} Listener"))
                    .with_component(LISTENER)
                    .with_event_handler(RecordingHandler::new(
                        format!("{name} Listener"),
                        recorder,
                    )),
            ),
    )
}

//=== ScriptedLoader ======================================================

type Factory = Box<dyn Fn() -> UnitContent<TestScene> + Send>;
type LoadCompleter = TaskCompleter<Result<UnitContent<TestScene>, LoadError>>;

#[derive(Default)]
struct LoaderState {
    factories: HashMap<TestScene, Factory>,
    hold: bool,
    pending: VecDeque<(TestScene, LoadCompleter)>,
    requests: Vec<LoadRequest<TestScene>>,
    unloads: Vec<Option<TestScene>>,
    fail_unload: bool,
    released: usize,
}

impl LoaderState {
    fn build(&self, identifier: TestScene) -> Result<UnitContent<TestScene>, LoadError> {
        self.factories
            .get(&identifier)
            .map(|factory| factory())
            .ok_or_else(|| LoadError::NotFound(format!("{:?}", identifier)))
    }
}

pub(crate) struct ScriptedLoader {
    state: Arc<Mutex<LoaderState>>,
}

/// Test-side handle of a [`ScriptedLoader`].
#[derive(Clone)]
pub(crate) struct LoaderControl {
    state: Arc<Mutex<LoaderState>>,
}

impl ScriptedLoader {
    pub(crate) fn new() -> (Self, LoaderControl) {
        let state = Arc::new(Mutex::new(LoaderState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            LoaderControl { state },
        )
    }
}

impl ContentLoader<TestScene> for ScriptedLoader {
    fn load_unit(
        &mut self,
        request: &LoadRequest<TestScene>,
    ) -> Task<Result<UnitContent<TestScene>, LoadError>> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(*request);

        if state.hold {
            let (task, completer) = Task::pending();
            state.pending.push_back((request.identifier, completer));
            task
        } else {
            Task::ready(state.build(request.identifier))
        }
    }

    fn unload_unit(
        &mut self,
        _unit: UnitId,
        identifier: Option<TestScene>,
    ) -> Task<Result<(), LoadError>> {
        let mut state = self.state.lock().unwrap();
        state.unloads.push(identifier);

        if state.fail_unload {
            Task::ready(Err(LoadError::Failed("unload refused".to_string())))
        } else {
            Task::ready(Ok(()))
        }
    }

    fn release_unused(&mut self) {
        self.state.lock().unwrap().released += 1;
    }
}

impl LoaderControl {
    fn lock(&self) -> MutexGuard<'_, LoaderState> {
        self.state.lock().unwrap()
    }

    pub(crate) fn register(
        &self,
        identifier: TestScene,
        factory: impl Fn() -> UnitContent<TestScene> + Send + 'static,
    ) {
        self.lock().factories.insert(identifier, Box::new(factory));
    }

    /// Holds every subsequent load until completed by the test.
    pub(crate) fn set_hold(&self, hold: bool) {
        self.lock().hold = hold;
    }

    pub(crate) fn set_fail_unload(&self, fail: bool) {
        self.lock().fail_unload = fail;
    }

    /// Completes the oldest held load from its factory.
    pub(crate) fn complete_next(&self) -> bool {
        let mut state = self.lock();
        let Some((identifier, completer)) = state.pending.pop_front() else {
            return false;
        };
        completer.complete(state.build(identifier));
        true
    }

    /// Fails the oldest held load.
    pub(crate) fn fail_next(&self, error: LoadError) -> bool {
        match self.lock().pending.pop_front() {
            Some((_, completer)) => {
                completer.complete(Err(error));
                true
            }
            None => false,
        }
    }

    /// Number of held loads whose task is still awaited.
    pub(crate) fn awaited(&self) -> usize {
        self.lock()
            .pending
            .iter()
            .filter(|(_, completer)| !completer.is_cancelled())
            .count()
    }

    pub(crate) fn requests(&self) -> Vec<LoadRequest<TestScene>> {
        self.lock().requests.clone()
    }

    pub(crate) fn unloads(&self) -> Vec<Option<TestScene>> {
        self.lock().unloads.clone()
    }

    pub(crate) fn released(&self) -> usize {
        self.lock().released
    }
}

//=== Harness =============================================================

pub(crate) struct Harness {
    pub orchestrator: SceneTransitionOrchestrator<TestScene>,
    pub recorder: Recorder,
    pub loader: LoaderControl,
}

/// Builds an orchestrator whose loader knows A to D and boots with A as
/// the current scene. The hook log starts empty.
pub(crate) fn booted(builder: OrchestratorBuilder<TestScene>) -> Harness {
    let recorder = Recorder::new();
    let (loader, control) = ScriptedLoader::new();

    for (key, name) in [
        (TestScene::A, "A"),
        (TestScene::B, "B"),
        (TestScene::C, "C"),
        (TestScene::D, "D"),
    ] {
        let recorder = recorder.clone();
        control.register(key, move || scene_content(name, &recorder));
    }

    let mut orchestrator = builder.build(loader);
    orchestrator
        .register_current_scene(SceneArgument::new(TestScene::A), scene_content("A", &recorder));
    recorder.clear();

    Harness {
        orchestrator,
        recorder,
        loader: control,
    }
}

/// Updates until nothing is pending, or gives up after a fixed number of
/// ticks when something external holds the pipeline.
pub(crate) fn settle(
    orchestrator: &mut SceneTransitionOrchestrator<TestScene>,
) -> Result<(), SceneError> {
    for _ in 0..32 {
        orchestrator.update()?;
        if !orchestrator.has_pending_operations() {
            break;
        }
    }
    Ok(())
}
