//=========================================================================
// Transition Queue
//=========================================================================
//
// Queue for transition requests issued by scene hooks.
//
// Hooks cannot reach the orchestrator while it is calling them, so they
// queue requests here. The orchestrator applies the queue right after
// Enter and at the end of every update.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use super::{SceneArgument, SceneKey};

//=== Transition Request ==================================================

/// A deferred call into the orchestrator.
#[derive(Debug, Clone)]
pub enum TransitionRequest<K: SceneKey> {
    /// Equivalent of `transition_with(argument, register_history)`.
    Transition {
        argument: SceneArgument<K>,
        register_history: bool,
    },

    /// Equivalent of `force_transition(argument)`.
    Force(SceneArgument<K>),

    /// Equivalent of `transition_back()`.
    Back,

    /// Equivalent of `clear_transition_history()`.
    ClearHistory,
}

//=== Transition Queue ====================================================

/// FIFO of pending [`TransitionRequest`]s.
pub struct TransitionQueue<K: SceneKey> {
    queue: Vec<TransitionRequest<K>>,
}

impl<K: SceneKey> TransitionQueue<K> {
    /// Creates a new empty transition queue.
    pub fn new() -> Self {
        Self { queue: Vec::new() }
    }

    /// Queues a request to be applied by the orchestrator.
    pub fn push(&mut self, request: TransitionRequest<K>) {
        self.queue.push(request);
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns the number of queued requests.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Takes all requests from the queue, leaving it empty.
    pub fn take(&mut self) -> Vec<TransitionRequest<K>> {
        std::mem::take(&mut self.queue)
    }
}

impl<K: SceneKey> Default for TransitionQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Tests
//=========================================================================
