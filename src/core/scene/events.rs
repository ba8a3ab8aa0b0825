//=========================================================================
// Scene Events
//=========================================================================
//
// Publish/subscribe streams, one per lifecycle point.
//
// Architecture:
//   orchestrator ── publish(T) ──> EventStream<T>
//                                     ├─> Sender<T> ──> Receiver<T> (subscriber 1)
//                                     └─> Sender<T> ──> Receiver<T> (subscriber N)
//
// Every stream exists from the moment the orchestrator is built.
// Subscribers unsubscribe by dropping their receiver; the stream prunes
// disconnected senders on the next publish.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};

//=== Internal Dependencies ===============================================

use super::{SceneArgument, SceneInstance, SceneKey};
use crate::core::error::LoadError;

//=== EventStream =========================================================

/// Broadcasts clones of each published value to every subscriber.
pub struct EventStream<T: Clone> {
    subscribers: Vec<Sender<T>>,
}

impl<T: Clone> EventStream<T> {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Registers a subscriber. Values published from now on are queued
    /// on the returned receiver.
    pub fn subscribe(&mut self) -> Receiver<T> {
        let (sender, receiver) = unbounded();
        self.subscribers.push(sender);
        receiver
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub(crate) fn publish(&mut self, value: T) {
        self.subscribers
            .retain(|subscriber| subscriber.send(value.clone()).is_ok());
    }
}

impl<T: Clone> Default for EventStream<T> {
    fn default() -> Self {
        Self::new()
    }
}

//=== LoadFailure =========================================================

/// Payload of the load and unload error streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure<K: SceneKey> {
    pub identifier: Option<K>,
    pub error: LoadError,
}

//=== SceneEvents =========================================================

/// All lifecycle event streams of an orchestrator.
pub struct SceneEvents<K: SceneKey> {
    pub on_prepare: EventStream<Arc<SceneArgument<K>>>,
    pub on_prepare_complete: EventStream<Arc<SceneArgument<K>>>,
    pub on_enter: EventStream<Arc<SceneArgument<K>>>,
    pub on_enter_complete: EventStream<Arc<SceneArgument<K>>>,
    pub on_leave: EventStream<SceneInstance<K>>,
    pub on_leave_complete: EventStream<SceneInstance<K>>,
    pub on_load_scene: EventStream<Arc<SceneArgument<K>>>,
    pub on_load_scene_complete: EventStream<SceneInstance<K>>,
    pub on_load_error: EventStream<LoadFailure<K>>,
    pub on_unload_scene: EventStream<SceneInstance<K>>,
    pub on_unload_scene_complete: EventStream<SceneInstance<K>>,
    pub on_unload_error: EventStream<LoadFailure<K>>,
}

impl<K: SceneKey> SceneEvents<K> {
    pub fn new() -> Self {
        Self {
            on_prepare: EventStream::new(),
            on_prepare_complete: EventStream::new(),
            on_enter: EventStream::new(),
            on_enter_complete: EventStream::new(),
            on_leave: EventStream::new(),
            on_leave_complete: EventStream::new(),
            on_load_scene: EventStream::new(),
            on_load_scene_complete: EventStream::new(),
            on_load_error: EventStream::new(),
            on_unload_scene: EventStream::new(),
            on_unload_scene_complete: EventStream::new(),
            on_unload_error: EventStream::new(),
        }
    }
}

impl<K: SceneKey> Default for SceneEvents<K> {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Tests
//=========================================================================
