//=========================================================================
// Scene Transition Orchestrator
//=========================================================================
//
// Drives scene transitions and additive scene loads.
//
// Architecture:
//   host loop ── update() ──┬─> drive_additive_ops()   (append / remove)
//                           ├─> drive_transition()     (pipeline steps)
//                           └─> process_requests()     (queued by hooks)
//
// Transition pipeline (one InFlight, stepped by advance()):
//   Begin → TransitionStart → Leave → BeginLoad → Load → LoadHooks
//     → Preload → Activate → Yield ┆ BeginPrepare → Prepare → Wait
//     → Finish ┆ Enter
//
// Each step either moves on immediately or suspends on a pending task,
// the wait barrier or the one-tick yield. Enter runs after the in-flight
// state is cleared, so requests issued from Enter start a new transition.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::Arc;

use log::{debug, error, info, warn};

//=== Internal Dependencies ===============================================

use super::hook_sequence::HookSequence;
use super::{
    ContentLoader, DiagnosticPhase, History, LoadFailure, LoadMode, LoadRequest, SceneArgument,
    SceneContext, SceneEvents, SceneInstance, SceneKey, SceneLifecycle, TransitionDiagnostics,
    TransitionEffects, TransitionQueue, TransitionReport, TransitionRequest,
    UniqueComponentRegistry, WaitBarrier, WaitHandler,
};
use crate::core::error::{HookPhase, LoadError, SceneError};
use crate::core::node::{NodeId, NodeWorld, UnitContent};
use crate::core::task::{HookTask, Task, TaskCompleter, TaskPoll};

//=== TransitionPhase =====================================================

/// Coarse state of the transition pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransitionPhase {
    #[default]
    Idle,
    LeavingCurrent,
    LoadingNext,
    Preparing,
    Waiting,
    Entering,
}

//=== In-Flight State =====================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryUpdate {
    Push,
    ReplaceCurrent,
    Back,
}

struct InFlight<K: SceneKey> {
    argument: Arc<SceneArgument<K>>,
    is_back: bool,
    history: HistoryUpdate,
    step: Step<K>,
}

enum Step<K: SceneKey> {
    Begin,
    TransitionStart(Task<()>),
    Leave(HookTask),
    BeginLoad,
    Load(Task<Result<UnitContent<K>, LoadError>>),
    LoadHooks {
        instance: SceneInstance<K>,
        hooks: HookSequence,
    },
    Preload {
        instance: SceneInstance<K>,
        pending: Vec<Task<Result<SceneInstance<K>, SceneError>>>,
    },
    Activate(SceneInstance<K>),
    Yield,
    BeginPrepare,
    Prepare(HookTask),
    Wait,
    Finish(Task<()>),
}

enum Flow {
    Suspend,
    Finished,
    Aborted,
}

//=== Additive Operations =================================================

enum AdditiveOp<K: SceneKey> {
    Append {
        argument: Arc<SceneArgument<K>>,
        stage: AppendStage<K>,
        completer: TaskCompleter<Result<SceneInstance<K>, SceneError>>,
    },
    Remove {
        instance: SceneInstance<K>,
        stage: RemoveStage,
        completer: TaskCompleter<Result<(), SceneError>>,
    },
}

enum AppendStage<K: SceneKey> {
    Load(Task<Result<UnitContent<K>, LoadError>>),
    Hooks {
        instance: SceneInstance<K>,
        hooks: HookSequence,
    },
}

enum RemoveStage {
    Hooks(HookSequence),
    Unload(Task<Result<(), LoadError>>),
}

//=== SceneTransitionOrchestrator =========================================

/// Owns the loaded scenes and runs every transition between them.
///
/// Create one with [`OrchestratorBuilder`](super::OrchestratorBuilder) and
/// call [`update`](Self::update) once per host tick.
pub struct SceneTransitionOrchestrator<K: SceneKey> {
    world: NodeWorld<K>,
    loader: Box<dyn ContentLoader<K>>,
    effects: Box<dyn TransitionEffects<K>>,

    current: Option<SceneInstance<K>>,
    additive: Vec<SceneInstance<K>>,
    history: History<K>,

    barrier: WaitBarrier,
    unique: UniqueComponentRegistry,
    diagnostics: Option<TransitionDiagnostics>,
    last_report: Option<TransitionReport>,
    events: SceneEvents<K>,
    requests: TransitionQueue<K>,

    phase: TransitionPhase,
    in_flight: Option<InFlight<K>>,
    additive_ops: Vec<AdditiveOp<K>>,
}

impl<K: SceneKey> SceneTransitionOrchestrator<K> {
    //--- Construction -----------------------------------------------------

    pub(crate) fn assemble(
        world: NodeWorld<K>,
        loader: Box<dyn ContentLoader<K>>,
        effects: Box<dyn TransitionEffects<K>>,
        history: History<K>,
        unique: UniqueComponentRegistry,
        diagnostics: bool,
    ) -> Self {
        Self {
            world,
            loader,
            effects,
            current: None,
            additive: Vec::new(),
            history,
            barrier: WaitBarrier::new(),
            unique,
            diagnostics: diagnostics.then(TransitionDiagnostics::new),
            last_report: None,
            events: SceneEvents::new(),
            requests: TransitionQueue::new(),
            phase: TransitionPhase::Idle,
            in_flight: None,
            additive_ops: Vec::new(),
        }
    }

    /// Mounts content that is already present at boot as the current
    /// scene.
    ///
    /// Unique components are captured, the argument becomes the first
    /// history entry and the scene receives its argument and `initialize`.
    /// Prepare and Enter are not run.
    pub fn register_current_scene(
        &mut self,
        argument: SceneArgument<K>,
        content: UnitContent<K>,
    ) -> SceneInstance<K> {
        let argument = Arc::new(argument);
        let unit = self.world.mount(content);
        self.unique.capture(&mut self.world, unit);

        let instance =
            SceneInstance::capture(&self.world, argument.identifier(), unit, LoadMode::Single);
        self.history.push(Arc::clone(&argument));
        self.current = Some(instance.clone());
        self.deliver_argument(instance.root(), &argument);

        info!("Registered {:?} as the current scene", argument.identifier());
        instance
    }

    //--- Queries ----------------------------------------------------------

    pub fn current(&self) -> Option<&SceneInstance<K>> {
        self.current.as_ref()
    }

    pub fn additive_scenes(&self) -> &[SceneInstance<K>] {
        &self.additive
    }

    pub fn history(&self) -> &History<K> {
        &self.history
    }

    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    /// Argument of the in-flight transition. `None` while idle and while
    /// Enter runs.
    pub fn transition_target(&self) -> Option<&SceneArgument<K>> {
        self.in_flight.as_ref().map(|flight| flight.argument.as_ref())
    }

    pub fn is_transitioning(&self) -> bool {
        self.in_flight.is_some()
    }

    /// True while a transition, an additive operation or a queued request
    /// still needs `update` calls.
    pub fn has_pending_operations(&self) -> bool {
        self.in_flight.is_some() || !self.additive_ops.is_empty() || !self.requests.is_empty()
    }

    pub fn world(&self) -> &NodeWorld<K> {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut NodeWorld<K> {
        &mut self.world
    }

    /// Event streams, for subscribing.
    pub fn events_mut(&mut self) -> &mut SceneEvents<K> {
        &mut self.events
    }

    pub fn unique_components(&self) -> &UniqueComponentRegistry {
        &self.unique
    }

    /// Report of the last completed transition, if diagnostics are on.
    pub fn last_report(&self) -> Option<&TransitionReport> {
        self.last_report.as_ref()
    }

    //--- Transitions ------------------------------------------------------

    /// Starts a transition that records history. See
    /// [`transition_with`](Self::transition_with).
    pub fn transition(&mut self, argument: SceneArgument<K>) -> bool {
        self.transition_with(argument, true)
    }

    /// Starts a transition to the argument's scene.
    ///
    /// With `register_history == false` the entry of the scene being left
    /// is replaced instead of kept. The pipeline runs on subsequent
    /// `update` calls.
    ///
    /// Returns false, and does nothing, if the argument has no identifier
    /// or another transition is in flight.
    pub fn transition_with(&mut self, argument: SceneArgument<K>, register_history: bool) -> bool {
        if argument.identifier().is_none() {
            warn!("Ignoring transition without a scene identifier");
            return false;
        }
        if let Some(target) = self.transition_target() {
            warn!(
                "Ignoring transition to {:?}, already transitioning to {:?}",
                argument.identifier(),
                target.identifier()
            );
            return false;
        }

        let history = if register_history {
            HistoryUpdate::Push
        } else {
            HistoryUpdate::ReplaceCurrent
        };
        self.start(Arc::new(argument), false, history);
        true
    }

    /// Abandons any in-flight transition and starts a new one.
    ///
    /// Work the abandoned transition already did is kept. Wait tokens stay
    /// live; use [`cancel_all_transition_wait`](Self::cancel_all_transition_wait)
    /// to drop them.
    pub fn force_transition(&mut self, argument: SceneArgument<K>) -> bool {
        if argument.identifier().is_none() {
            warn!("Ignoring forced transition without a scene identifier");
            return false;
        }

        if let Some(flight) = self.in_flight.take() {
            if matches!(flight.step, Step::Load(_)) {
                self.unique.resume(&mut self.world);
            }
            info!(
                "Abandoned transition to {:?} for {:?}",
                flight.argument.identifier(),
                argument.identifier()
            );
        }

        self.start(Arc::new(argument), false, HistoryUpdate::Push);
        true
    }

    /// Transitions to the history entry before the current one.
    pub fn transition_back(&mut self) -> bool {
        if self.is_transitioning() {
            warn!("Ignoring back transition while transitioning");
            return false;
        }
        let Some(previous) = self.history.previous().cloned() else {
            warn!("Ignoring back transition, no previous scene in history");
            return false;
        };
        if previous.identifier().is_none() {
            warn!("Ignoring back transition, previous entry has no identifier");
            return false;
        }

        self.start(previous, true, HistoryUpdate::Back);
        true
    }

    /// Keeps only the current history entry.
    pub fn clear_transition_history(&mut self) {
        self.history.clear_to_current();
        debug!("Transition history cleared");
    }

    /// Calls the current scene's `reload` hook.
    pub fn reload_current(&mut self) -> bool {
        let Some(root) = self.current.as_ref().and_then(|current| current.root()) else {
            return false;
        };
        self.with_scene(root, |scene, ctx| scene.reload(ctx)).is_some()
    }

    fn start(&mut self, argument: Arc<SceneArgument<K>>, is_back: bool, history: HistoryUpdate) {
        debug!(
            "Transition to {:?} requested (back: {})",
            argument.identifier(),
            is_back
        );
        self.phase = TransitionPhase::LeavingCurrent;
        self.in_flight = Some(InFlight {
            argument,
            is_back,
            history,
            step: Step::Begin,
        });
    }

    //--- Wait Barrier -----------------------------------------------------

    /// Holds the in-flight, or next, transition at its Wait phase until
    /// the handler is disposed.
    pub fn begin_wait(&mut self) -> WaitHandler {
        self.barrier.begin_wait()
    }

    pub fn finish_wait(&mut self, handler: WaitHandler) {
        self.barrier.finish_wait(handler);
    }

    pub fn cancel_all_transition_wait(&mut self) {
        self.barrier.cancel_all();
    }

    /// Number of live wait tokens.
    ///
    /// Takes `&mut self` because tokens disposed on other threads are only
    /// counted once their releases are drained from the barrier's channel,
    /// which this call does.
    pub fn pending_waits(&mut self) -> usize {
        self.barrier.pending()
    }

    //--- Additive Scenes --------------------------------------------------

    /// Loads a scene next to the current one.
    ///
    /// Lifecycle hooks of the appended scene are not run; its node event
    /// handlers are.
    pub fn append(
        &mut self,
        argument: SceneArgument<K>,
    ) -> Task<Result<SceneInstance<K>, SceneError>> {
        let Some(identifier) = argument.identifier() else {
            warn!("Ignoring append without a scene identifier");
            return Task::ready(Err(SceneError::Load(LoadError::NotFound(
                "scene argument without identifier".to_string(),
            ))));
        };

        let argument = Arc::new(argument);
        self.events.on_load_scene.publish(Arc::clone(&argument));
        self.unique.suspend(&mut self.world);

        let load = self.loader.load_unit(&LoadRequest {
            identifier,
            mode: LoadMode::Additive,
            cache: argument.is_cached(),
        });
        let (task, completer) = Task::pending();
        self.additive_ops.push(AdditiveOp::Append {
            argument,
            stage: AppendStage::Load(load),
            completer,
        });

        debug!("Appending {:?}", identifier);
        task
    }

    pub fn append_scene(&mut self, identifier: K) -> Task<Result<SceneInstance<K>, SceneError>> {
        self.append(SceneArgument::new(identifier))
    }

    /// Unloads an additive scene after its node unload hooks finish.
    ///
    /// Single-mode instances and instances not currently loaded as
    /// additive scenes are rejected.
    pub fn remove(
        &mut self,
        instance: &SceneInstance<K>,
    ) -> Result<Task<Result<(), SceneError>>, SceneError> {
        if instance.mode() == LoadMode::Single {
            error!(
                "Cannot remove {:?}: only additive scenes can be removed",
                instance.identifier()
            );
            return Err(SceneError::NotAdditive);
        }

        let loaded = self.additive.iter().any(|scene| scene.unit() == instance.unit());
        let removing = self.additive_ops.iter().any(|op| match op {
            AdditiveOp::Remove { instance: other, .. } => other.unit() == instance.unit(),
            AdditiveOp::Append { .. } => false,
        });
        if !loaded || removing {
            error!("Cannot remove {:?}: scene is not loaded", instance.identifier());
            return Err(SceneError::UnknownInstance);
        }

        self.events.on_unload_scene.publish(instance.clone());
        let hooks = HookSequence::new(&self.world, instance.unit(), HookPhase::UnloadScene);
        let (task, completer) = Task::pending();
        self.additive_ops.push(AdditiveOp::Remove {
            instance: instance.clone(),
            stage: RemoveStage::Hooks(hooks),
            completer,
        });

        debug!("Removing {:?}", instance.identifier());
        Ok(task)
    }

    //--- Update -----------------------------------------------------------

    /// Advances every pending operation. Call once per host tick.
    ///
    /// A failing scene hook aborts the in-flight transition and its error
    /// is returned here. Load failures abort quietly and are published on
    /// the load-error stream instead.
    pub fn update(&mut self) -> Result<(), SceneError> {
        self.drive_additive_ops();
        let result = self.drive_transition();
        self.process_requests();
        result
    }

    fn process_requests(&mut self) {
        for request in self.requests.take() {
            match request {
                TransitionRequest::Transition {
                    argument,
                    register_history,
                } => {
                    self.transition_with(argument, register_history);
                }
                TransitionRequest::Force(argument) => {
                    self.force_transition(argument);
                }
                TransitionRequest::Back => {
                    self.transition_back();
                }
                TransitionRequest::ClearHistory => self.clear_transition_history(),
            }
        }
    }

    //--- Transition Pipeline ----------------------------------------------

    fn drive_transition(&mut self) -> Result<(), SceneError> {
        while let Some(mut flight) = self.in_flight.take() {
            match self.advance(&mut flight) {
                Ok(Flow::Suspend) => {
                    self.in_flight = Some(flight);
                    return Ok(());
                }
                Ok(Flow::Finished) => {
                    self.enter(flight)?;
                    self.process_requests();
                }
                Ok(Flow::Aborted) => {
                    self.phase = TransitionPhase::Idle;
                }
                Err(e) => {
                    self.phase = TransitionPhase::Idle;
                    error!("Transition to {:?} aborted: {}", flight.argument.identifier(), e);
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    fn advance(&mut self, flight: &mut InFlight<K>) -> Result<Flow, SceneError> {
        loop {
            let step = std::mem::replace(&mut flight.step, Step::Begin);

            flight.step = match step {
                Step::Begin => {
                    self.timing(|d| d.begin_transition());
                    Step::TransitionStart(self.effects.transition_start(&flight.argument))
                }

                Step::TransitionStart(mut task) => match task.poll() {
                    TaskPoll::Pending => {
                        flight.step = Step::TransitionStart(task);
                        return Ok(Flow::Suspend);
                    }
                    TaskPoll::Ready(()) => self.begin_leave(),
                    TaskPoll::Abandoned => {
                        return Err(SceneError::HookAbandoned(HookPhase::TransitionStart));
                    }
                },

                Step::Leave(mut task) => match poll_hook(&mut task, HookPhase::Leave) {
                    None => {
                        flight.step = Step::Leave(task);
                        return Ok(Flow::Suspend);
                    }
                    Some(result) => {
                        result?;
                        self.finish_leave();
                        Step::BeginLoad
                    }
                },

                Step::BeginLoad => self.begin_load(flight),

                Step::Load(mut task) => match task.poll() {
                    TaskPoll::Pending => {
                        flight.step = Step::Load(task);
                        return Ok(Flow::Suspend);
                    }
                    TaskPoll::Ready(Ok(content)) => self.mount_single(flight, content),
                    TaskPoll::Ready(Err(e)) => {
                        self.abort_load(flight, e);
                        return Ok(Flow::Aborted);
                    }
                    TaskPoll::Abandoned => {
                        self.abort_load(flight, LoadError::Abandoned);
                        return Ok(Flow::Aborted);
                    }
                },

                Step::LoadHooks { instance, mut hooks } => {
                    let mut ctx = SceneContext::new(&mut self.requests, &mut self.barrier);
                    match hooks.poll(&mut self.world, &mut ctx) {
                        TaskPoll::Pending => {
                            flight.step = Step::LoadHooks { instance, hooks };
                            return Ok(Flow::Suspend);
                        }
                        TaskPoll::Ready(result) => {
                            result?;
                            self.begin_preload(flight, instance)
                        }
                        TaskPoll::Abandoned => {
                            return Err(SceneError::HookAbandoned(HookPhase::LoadScene));
                        }
                    }
                }

                Step::Preload { instance, mut pending } => {
                    self.drive_additive_ops();
                    pending.retain_mut(|task| match task.poll() {
                        TaskPoll::Pending => true,
                        TaskPoll::Ready(Ok(_)) => false,
                        TaskPoll::Ready(Err(e)) => {
                            warn!("Preload failed: {}", e);
                            false
                        }
                        TaskPoll::Abandoned => false,
                    });
                    if !pending.is_empty() {
                        flight.step = Step::Preload { instance, pending };
                        return Ok(Flow::Suspend);
                    }
                    Step::Activate(instance)
                }

                Step::Activate(instance) => {
                    self.activate(flight, instance);
                    Step::Yield
                }

                Step::Yield => {
                    flight.step = Step::BeginPrepare;
                    return Ok(Flow::Suspend);
                }

                Step::BeginPrepare => self.begin_prepare(flight),

                Step::Prepare(mut task) => match poll_hook(&mut task, HookPhase::Prepare) {
                    None => {
                        flight.step = Step::Prepare(task);
                        return Ok(Flow::Suspend);
                    }
                    Some(result) => {
                        result?;
                        self.finish_prepare(flight);
                        Step::Wait
                    }
                },

                Step::Wait => {
                    if !self.barrier.is_empty() {
                        flight.step = Step::Wait;
                        return Ok(Flow::Suspend);
                    }
                    Step::Finish(self.effects.transition_finish(&flight.argument))
                }

                Step::Finish(mut task) => match task.poll() {
                    TaskPoll::Pending => {
                        flight.step = Step::Finish(task);
                        return Ok(Flow::Suspend);
                    }
                    TaskPoll::Ready(()) => return Ok(Flow::Finished),
                    TaskPoll::Abandoned => {
                        return Err(SceneError::HookAbandoned(HookPhase::TransitionFinish));
                    }
                },
            };
        }
    }

    fn begin_leave(&mut self) -> Step<K> {
        let Some(current) = self.current.clone().filter(|c| c.is_valid(&self.world)) else {
            return Step::BeginLoad;
        };

        self.events.on_leave.publish(current.clone());
        self.timing(|d| d.begin(DiagnosticPhase::Leave));

        let task = current
            .root()
            .and_then(|root| self.with_scene(root, |scene, ctx| scene.leave(ctx)))
            .unwrap_or_else(HookTask::ok);
        Step::Leave(task)
    }

    fn finish_leave(&mut self) {
        if let Some(current) = self.current.clone() {
            self.effects.persist_state(&current);
            self.events.on_leave_complete.publish(current);
        }
        self.timing(|d| d.end(DiagnosticPhase::Leave));
    }

    fn begin_load(&mut self, flight: &InFlight<K>) -> Step<K> {
        let Some(identifier) = flight.argument.identifier() else {
            return Step::Load(Task::ready(Err(LoadError::NotFound(
                "scene argument without identifier".to_string(),
            ))));
        };

        self.phase = TransitionPhase::LoadingNext;
        self.timing(|d| d.begin(DiagnosticPhase::Load));
        self.unique.suspend(&mut self.world);
        self.events.on_load_scene.publish(Arc::clone(&flight.argument));

        debug!("Loading {:?}", identifier);
        Step::Load(self.loader.load_unit(&LoadRequest {
            identifier,
            mode: LoadMode::Single,
            cache: flight.argument.is_cached(),
        }))
    }

    fn mount_single(&mut self, flight: &InFlight<K>, content: UnitContent<K>) -> Step<K> {
        let unit = self.world.mount(content);

        self.additive.clear();
        for other in self.world.units() {
            if other != unit {
                self.world.release_unit(other);
            }
        }

        let resolved = self.unique.capture(&mut self.world, unit);
        if resolved > 0 {
            debug!("Resolved {} duplicate unique components", resolved);
        }

        let instance = SceneInstance::capture(
            &self.world,
            flight.argument.identifier(),
            unit,
            LoadMode::Single,
        );
        instance.disable(&mut self.world);
        self.unique.resume(&mut self.world);
        self.events.on_load_scene_complete.publish(instance.clone());

        let hooks = HookSequence::new(&self.world, unit, HookPhase::LoadScene);
        Step::LoadHooks { instance, hooks }
    }

    fn abort_load(&mut self, flight: &InFlight<K>, error: LoadError) {
        self.unique.resume(&mut self.world);
        self.timing(|d| d.end(DiagnosticPhase::Load));
        self.report_load_error(flight.argument.identifier(), error);
    }

    fn begin_preload(&mut self, flight: &InFlight<K>, instance: SceneInstance<K>) -> Step<K> {
        if flight.argument.preload().is_empty() {
            return Step::Activate(instance);
        }

        let pending = flight
            .argument
            .preload()
            .iter()
            .map(|&identifier| self.append_scene(identifier))
            .collect();
        Step::Preload { instance, pending }
    }

    fn activate(&mut self, flight: &InFlight<K>, instance: SceneInstance<K>) {
        instance.enable(&mut self.world);
        self.timing(|d| d.end(DiagnosticPhase::Load));

        match flight.history {
            HistoryUpdate::Push => self.history.push(Arc::clone(&flight.argument)),
            HistoryUpdate::ReplaceCurrent => {
                self.history.pop();
                self.history.push(Arc::clone(&flight.argument));
            }
            HistoryUpdate::Back => {
                self.history.pop();
            }
        }

        let root = instance.root();
        self.current = Some(instance);
        self.deliver_argument(root, &flight.argument);
    }

    fn begin_prepare(&mut self, flight: &InFlight<K>) -> Step<K> {
        self.phase = TransitionPhase::Preparing;
        self.events.on_prepare.publish(Arc::clone(&flight.argument));
        self.timing(|d| d.begin(DiagnosticPhase::Prepare));

        let is_back = flight.is_back;
        let task = self
            .current_root()
            .and_then(|root| self.with_scene(root, |scene, ctx| scene.prepare(is_back, ctx)))
            .unwrap_or_else(HookTask::ok);
        Step::Prepare(task)
    }

    fn finish_prepare(&mut self, flight: &InFlight<K>) {
        self.events.on_prepare_complete.publish(Arc::clone(&flight.argument));
        self.timing(|d| d.end(DiagnosticPhase::Prepare));
        self.loader.release_unused();
        self.phase = TransitionPhase::Waiting;
    }

    fn enter(&mut self, flight: InFlight<K>) -> Result<(), SceneError> {
        self.phase = TransitionPhase::Entering;
        self.events.on_enter.publish(Arc::clone(&flight.argument));

        let is_back = flight.is_back;
        let entered = self
            .current_root()
            .and_then(|root| self.with_scene(root, |scene, ctx| scene.enter(is_back, ctx)))
            .unwrap_or(Ok(()));
        if let Err(source) = entered {
            self.phase = TransitionPhase::Idle;
            error!("Enter of {:?} failed: {}", flight.argument.identifier(), source);
            return Err(SceneError::Hook {
                phase: HookPhase::Enter,
                source,
            });
        }

        self.events.on_enter_complete.publish(Arc::clone(&flight.argument));
        self.phase = TransitionPhase::Idle;

        let scene = flight
            .argument
            .identifier()
            .map(|identifier| format!("{:?}", identifier))
            .unwrap_or_default();
        if let Some(report) = self.diagnostics.as_mut().and_then(|d| d.finish(scene.as_str())) {
            info!("{}", report);
            self.last_report = Some(report);
        } else {
            info!("Transition to {} complete", scene);
        }
        Ok(())
    }

    //--- Additive Pipeline ------------------------------------------------

    fn drive_additive_ops(&mut self) {
        let ops = std::mem::take(&mut self.additive_ops);
        let mut still_pending = Vec::with_capacity(ops.len());

        for op in ops {
            if let Some(op) = self.poll_op(op) {
                still_pending.push(op);
            }
        }

        still_pending.append(&mut self.additive_ops);
        self.additive_ops = still_pending;
    }

    /// Steps one operation. Returns it back while it is still pending.
    fn poll_op(&mut self, op: AdditiveOp<K>) -> Option<AdditiveOp<K>> {
        match op {
            AdditiveOp::Append {
                argument,
                stage,
                completer,
            } => self.poll_append(argument, stage, completer),
            AdditiveOp::Remove {
                instance,
                stage,
                completer,
            } => self.poll_remove(instance, stage, completer),
        }
    }

    fn poll_append(
        &mut self,
        argument: Arc<SceneArgument<K>>,
        mut stage: AppendStage<K>,
        completer: TaskCompleter<Result<SceneInstance<K>, SceneError>>,
    ) -> Option<AdditiveOp<K>> {
        loop {
            stage = match stage {
                AppendStage::Load(mut task) => match task.poll() {
                    TaskPoll::Pending => {
                        return Some(AdditiveOp::Append {
                            argument,
                            stage: AppendStage::Load(task),
                            completer,
                        });
                    }
                    TaskPoll::Ready(Ok(content)) => {
                        let unit = self.world.mount(content);
                        self.unique.capture(&mut self.world, unit);
                        let instance = SceneInstance::capture(
                            &self.world,
                            argument.identifier(),
                            unit,
                            LoadMode::Additive,
                        );
                        self.unique.resume(&mut self.world);

                        self.additive.push(instance.clone());
                        self.events.on_load_scene_complete.publish(instance.clone());

                        let hooks = HookSequence::new(&self.world, unit, HookPhase::LoadScene);
                        AppendStage::Hooks { instance, hooks }
                    }
                    TaskPoll::Ready(Err(e)) => {
                        self.fail_append(&argument, e, completer);
                        return None;
                    }
                    TaskPoll::Abandoned => {
                        self.fail_append(&argument, LoadError::Abandoned, completer);
                        return None;
                    }
                },

                AppendStage::Hooks { instance, mut hooks } => {
                    let mut ctx = SceneContext::new(&mut self.requests, &mut self.barrier);
                    match hooks.poll(&mut self.world, &mut ctx) {
                        TaskPoll::Pending => {
                            return Some(AdditiveOp::Append {
                                argument,
                                stage: AppendStage::Hooks { instance, hooks },
                                completer,
                            });
                        }
                        TaskPoll::Ready(Ok(())) => {
                            debug!("Appended {:?}", instance.identifier());
                            completer.complete(Ok(instance));
                            return None;
                        }
                        TaskPoll::Ready(Err(e)) => {
                            self.discard_append(&instance, e, completer);
                            return None;
                        }
                        TaskPoll::Abandoned => {
                            let e = SceneError::HookAbandoned(HookPhase::LoadScene);
                            self.discard_append(&instance, e, completer);
                            return None;
                        }
                    }
                }
            };
        }
    }

    /// Undoes an append whose load hooks failed. The unit is released
    /// without running unload hooks.
    fn discard_append(
        &mut self,
        instance: &SceneInstance<K>,
        error: SceneError,
        completer: TaskCompleter<Result<SceneInstance<K>, SceneError>>,
    ) {
        self.additive.retain(|loaded| loaded.unit() != instance.unit());
        self.world.release_unit(instance.unit());
        self.report_load_error(instance.identifier(), LoadError::Failed(error.to_string()));
        completer.complete(Err(error));
    }

    fn fail_append(
        &mut self,
        argument: &SceneArgument<K>,
        error: LoadError,
        completer: TaskCompleter<Result<SceneInstance<K>, SceneError>>,
    ) {
        self.unique.resume(&mut self.world);
        self.report_load_error(argument.identifier(), error.clone());
        completer.complete(Err(SceneError::Load(error)));
    }

    fn poll_remove(
        &mut self,
        instance: SceneInstance<K>,
        mut stage: RemoveStage,
        completer: TaskCompleter<Result<(), SceneError>>,
    ) -> Option<AdditiveOp<K>> {
        loop {
            stage = match stage {
                RemoveStage::Hooks(mut hooks) => {
                    let mut ctx = SceneContext::new(&mut self.requests, &mut self.barrier);
                    match hooks.poll(&mut self.world, &mut ctx) {
                        TaskPoll::Pending => {
                            return Some(AdditiveOp::Remove {
                                instance,
                                stage: RemoveStage::Hooks(hooks),
                                completer,
                            });
                        }
                        TaskPoll::Ready(Ok(())) => RemoveStage::Unload(
                            self.loader.unload_unit(instance.unit(), instance.identifier()),
                        ),
                        TaskPoll::Ready(Err(e)) => {
                            error!("Unload hooks of {:?} failed: {}", instance.identifier(), e);
                            completer.complete(Err(e));
                            return None;
                        }
                        TaskPoll::Abandoned => {
                            let e = SceneError::HookAbandoned(HookPhase::UnloadScene);
                            completer.complete(Err(e));
                            return None;
                        }
                    }
                }

                RemoveStage::Unload(mut task) => {
                    let result = match task.poll() {
                        TaskPoll::Pending => {
                            return Some(AdditiveOp::Remove {
                                instance,
                                stage: RemoveStage::Unload(task),
                                completer,
                            });
                        }
                        TaskPoll::Ready(result) => result,
                        TaskPoll::Abandoned => Err(LoadError::Abandoned),
                    };

                    match result {
                        Ok(()) => {
                            self.world.release_unit(instance.unit());
                            self.additive.retain(|scene| scene.unit() != instance.unit());
                            self.events.on_unload_scene_complete.publish(instance.clone());
                            debug!("Removed {:?}", instance.identifier());
                            completer.complete(Ok(()));
                        }
                        Err(e) => {
                            error!("Unloading {:?} failed: {}", instance.identifier(), e);
                            self.events.on_unload_error.publish(LoadFailure {
                                identifier: instance.identifier(),
                                error: e.clone(),
                            });
                            completer.complete(Err(SceneError::Unload(e)));
                        }
                    }
                    return None;
                }
            };
        }
    }

    //--- Helpers ----------------------------------------------------------

    fn current_root(&self) -> Option<NodeId> {
        self.current.as_ref().and_then(|current| current.root())
    }

    /// Runs `f` against a scene root's lifecycle object with a context
    /// borrowed from the orchestrator. `None` if the node has none.
    fn with_scene<R>(
        &mut self,
        root: NodeId,
        f: impl FnOnce(&mut (dyn SceneLifecycle<K> + 'static), &mut SceneContext<'_, K>) -> R,
    ) -> Option<R> {
        let scene = self.world.lifecycle_mut(root)?;
        let mut ctx = SceneContext::new(&mut self.requests, &mut self.barrier);
        Some(f(scene, &mut ctx))
    }

    fn deliver_argument(&mut self, root: Option<NodeId>, argument: &Arc<SceneArgument<K>>) {
        let Some(root) = root else {
            return;
        };

        let payload = argument.payload_type();
        self.with_scene(root, |scene, ctx| {
            match scene.argument_type() {
                Some(expected) if Some(expected) != payload => {
                    warn!(
                        "Scene {:?} does not accept the argument payload, skipping set_argument",
                        argument.identifier()
                    );
                }
                _ => scene.set_argument(Arc::clone(argument)),
            }
            scene.initialize(ctx);
        });
    }

    fn report_load_error(&mut self, identifier: Option<K>, error: LoadError) {
        error!("Loading {:?} failed: {}", identifier, error);
        self.events.on_load_error.publish(LoadFailure { identifier, error });
    }

    fn timing(&mut self, f: impl FnOnce(&mut TransitionDiagnostics)) {
        if let Some(diagnostics) = self.diagnostics.as_mut() {
            f(diagnostics);
        }
    }
}

fn poll_hook(task: &mut HookTask, phase: HookPhase) -> Option<Result<(), SceneError>> {
    match task.poll() {
        TaskPoll::Pending => None,
        TaskPoll::Ready(result) => {
            Some(result.map_err(|source| SceneError::Hook { phase, source }))
        }
        TaskPoll::Abandoned => Some(Err(SceneError::HookAbandoned(phase))),
    }
}

//=========================================================================
// Tests
//=========================================================================
