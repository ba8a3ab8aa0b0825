//=========================================================================
// Hook Sequence
//=========================================================================
//
// Runs the load or unload hooks of one unit's event handlers, one after
// another in depth-first node order.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::VecDeque;

//=== Internal Dependencies ===============================================

use super::{SceneContext, SceneKey};
use crate::core::error::{HookPhase, SceneError};
use crate::core::node::{NodeId, NodeWorld, UnitId};
use crate::core::task::{HookTask, TaskPoll};

//=== HookSequence ========================================================

pub(crate) struct HookSequence {
    phase: HookPhase,
    queue: VecDeque<NodeId>,
    current: Option<HookTask>,
}

impl HookSequence {
    /// Snapshots the unit's handler nodes. `phase` is either
    /// `LoadScene` or `UnloadScene`.
    pub(crate) fn new<K: SceneKey>(world: &NodeWorld<K>, unit: UnitId, phase: HookPhase) -> Self {
        Self {
            phase,
            queue: world.event_handler_nodes(unit).into(),
            current: None,
        }
    }

    /// Advances through the handlers until one is pending or all are done.
    ///
    /// Nodes destroyed since the snapshot are skipped.
    pub(crate) fn poll<K: SceneKey>(
        &mut self,
        world: &mut NodeWorld<K>,
        ctx: &mut SceneContext<'_, K>,
    ) -> TaskPoll<Result<(), SceneError>> {
        loop {
            if let Some(task) = self.current.as_mut() {
                match task.poll() {
                    TaskPoll::Pending => return TaskPoll::Pending,
                    TaskPoll::Ready(Ok(())) => self.current = None,
                    TaskPoll::Ready(Err(source)) => {
                        self.current = None;
                        return TaskPoll::Ready(Err(SceneError::Hook {
                            phase: self.phase,
                            source,
                        }));
                    }
                    TaskPoll::Abandoned => {
                        self.current = None;
                        return TaskPoll::Ready(Err(SceneError::HookAbandoned(self.phase)));
                    }
                }
            }

            let Some(node) = self.queue.pop_front() else {
                return TaskPoll::Ready(Ok(()));
            };
            let Some(handler) = world.event_handler_mut(node) else {
                continue;
            };

            self.current = Some(match self.phase {
                HookPhase::UnloadScene => handler.on_unload_scene(ctx),
                _ => handler.on_load_scene(ctx),
            });
        }
    }
}

//=========================================================================
// Tests
//=========================================================================
