//=========================================================================
// Wait Barrier
//=========================================================================
//
// Gate that holds a transition at its Wait phase.
//
// Architecture:
//   begin_wait() ──> WaitHandler { id, release: Sender<u64> }
//                        │
//   dispose()/drop ──────┘──> channel ──> drain ──> live.remove(id)
//
// Handlers may be moved to other systems (or threads) and released from
// there; the barrier only learns about releases when it drains the
// channel.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashSet;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::debug;

//=== WaitHandler =========================================================

/// Token that blocks transition completion until disposed.
///
/// Disposing is idempotent, and dropping an undisposed handler disposes
/// it.
#[derive(Debug)]
pub struct WaitHandler {
    id: u64,
    release: Sender<u64>,
    disposed: bool,
}

impl WaitHandler {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Releases the hold on the transition.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        let _ = self.release.send(self.id);
    }
}

impl Drop for WaitHandler {
    fn drop(&mut self) {
        self.dispose();
    }
}

//=== WaitBarrier =========================================================

/// Registry of live wait tokens.
pub struct WaitBarrier {
    live: HashSet<u64>,
    next_id: u64,
    release_tx: Sender<u64>,
    release_rx: Receiver<u64>,
}

impl WaitBarrier {
    pub fn new() -> Self {
        let (release_tx, release_rx) = unbounded();
        Self {
            live: HashSet::new(),
            next_id: 1,
            release_tx,
            release_rx,
        }
    }

    /// Issues a new token.
    pub fn begin_wait(&mut self) -> WaitHandler {
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id);
        debug!("Wait handler {} issued", id);

        WaitHandler {
            id,
            release: self.release_tx.clone(),
            disposed: false,
        }
    }

    /// Disposes a token.
    pub fn finish_wait(&mut self, mut handler: WaitHandler) {
        handler.dispose();
        self.drain_releases();
    }

    /// Forgets every live token. Tokens disposed later are ignored.
    pub fn cancel_all(&mut self) {
        self.drain_releases();
        if !self.live.is_empty() {
            debug!("Cancelled {} pending wait handlers", self.live.len());
        }
        self.live.clear();
    }

    /// True when no token is live.
    pub fn is_empty(&mut self) -> bool {
        self.drain_releases();
        self.live.is_empty()
    }

    /// Number of live tokens, after draining pending releases.
    pub fn pending(&mut self) -> usize {
        self.drain_releases();
        self.live.len()
    }

    fn drain_releases(&mut self) {
        for id in self.release_rx.try_iter() {
            if self.live.remove(&id) {
                debug!("Wait handler {} released", id);
            }
        }
    }
}

impl Default for WaitBarrier {
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

    #[test]
    fn new_barrier_is_empty() {
        let mut barrier = WaitBarrier::new();
        assert!(barrier.is_empty());
    }

    #[test]
    fn handler_blocks_until_disposed() {
        let mut barrier = WaitBarrier::new();
        let mut handler = barrier.begin_wait();

        assert!(!barrier.is_empty());

        handler.dispose();

        assert!(barrier.is_empty());
    }

    #[test]
    fn double_dispose_releases_once() {
        let mut barrier = WaitBarrier::new();
        let mut first = barrier.begin_wait();
        let _second = barrier.begin_wait();

        first.dispose();
        first.dispose();

        assert_eq!(barrier.pending(), 1);
    }

    #[test]
    fn drop_disposes_handler() {
        let mut barrier = WaitBarrier::new();
        let handler = barrier.begin_wait();

        drop(handler);

        assert!(barrier.is_empty());
    }

    #[test]
    fn finish_wait_releases_handler() {
        let mut barrier = WaitBarrier::new();
        let handler = barrier.begin_wait();
        let other = barrier.begin_wait();
        assert_ne!(handler.id(), other.id());

        barrier.finish_wait(handler);

        assert_eq!(barrier.pending(), 1);
    }

    #[test]
    fn cancel_all_empties_and_ignores_late_release() {
        let mut barrier = WaitBarrier::new();
        let mut stale = barrier.begin_wait();

        barrier.cancel_all();
        assert!(barrier.is_empty());

        let _fresh = barrier.begin_wait();
        stale.dispose();

        assert_eq!(barrier.pending(), 1);
    }

    #[test]
    fn handler_released_from_other_thread() {
        let mut barrier = WaitBarrier::new();
        let mut handler = barrier.begin_wait();

        std::thread::spawn(move || handler.dispose())
            .join()
            .unwrap();

        assert!(barrier.is_empty());
    }
}
