//=========================================================================
// Transition History
//=========================================================================
//
// Ordered list of the arguments that produced each visited scene.
//
// The last entry always belongs to the current scene. Back navigation
// re-issues the entry before it.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::Arc;

//=== Internal Dependencies ===============================================

use super::{SceneArgument, SceneKey};

//=== History =============================================================

/// Navigation history of scene arguments.
pub struct History<K: SceneKey> {
    entries: Vec<Arc<SceneArgument<K>>>,
    capacity: Option<usize>,
}

impl<K: SceneKey> History<K> {
    /// Creates an unbounded history.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            capacity: None,
        }
    }

    /// Creates a history that keeps at most `capacity` entries, dropping
    /// the oldest first.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_capacity_limit(capacity: usize) -> Self {
        assert!(capacity > 0, "History capacity must be positive");
        Self {
            entries: Vec::new(),
            capacity: Some(capacity),
        }
    }

    //--- Mutation ---------------------------------------------------------

    pub fn push(&mut self, argument: Arc<SceneArgument<K>>) {
        self.entries.push(argument);

        if let Some(capacity) = self.capacity {
            if self.entries.len() > capacity {
                let overflow = self.entries.len() - capacity;
                self.entries.drain(..overflow);
            }
        }
    }

    pub fn pop(&mut self) -> Option<Arc<SceneArgument<K>>> {
        self.entries.pop()
    }

    /// Drops everything but the current entry.
    pub fn clear_to_current(&mut self) {
        if self.entries.len() > 1 {
            let keep_from = self.entries.len() - 1;
            self.entries.drain(..keep_from);
        }
    }

    //--- Queries ----------------------------------------------------------

    /// Entry of the current scene.
    pub fn current(&self) -> Option<&Arc<SceneArgument<K>>> {
        self.entries.last()
    }

    /// Entry a back navigation would return to.
    pub fn previous(&self) -> Option<&Arc<SceneArgument<K>>> {
        self.entries.len().checked_sub(2).map(|index| &self.entries[index])
    }

    pub fn entries(&self) -> &[Arc<SceneArgument<K>>] {
        &self.entries
    }

    /// Identifiers of all entries, oldest first.
    pub fn identifiers(&self) -> Vec<Option<K>> {
        self.entries.iter().map(|entry| entry.identifier()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: SceneKey> Default for History<K> {
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

    #[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
    enum TestScene {
        A,
        B,
        C,
    }

    impl SceneKey for TestScene {}

    fn entry(key: TestScene) -> Arc<SceneArgument<TestScene>> {
        Arc::new(SceneArgument::new(key))
    }

    #[test]
    fn previous_is_second_to_last() {
        let mut history = History::new();
        assert!(history.previous().is_none());

        history.push(entry(TestScene::A));
        assert!(history.previous().is_none());

        history.push(entry(TestScene::B));
        assert_eq!(history.previous().and_then(|e| e.identifier()), Some(TestScene::A));
        assert_eq!(history.current().and_then(|e| e.identifier()), Some(TestScene::B));
    }

    #[test]
    fn clear_to_current_keeps_last_entry() {
        let mut history = History::new();
        history.push(entry(TestScene::A));
        history.push(entry(TestScene::B));
        history.push(entry(TestScene::C));

        history.clear_to_current();

        assert_eq!(history.identifiers(), vec![Some(TestScene::C)]);
    }

    #[test]
    fn clear_to_current_on_empty_history() {
        let mut history = History::<TestScene>::new();
        history.clear_to_current();
        assert!(history.is_empty());
    }

    #[test]
    fn capacity_drops_oldest_entries() {
        let mut history = History::with_capacity_limit(2);
        history.push(entry(TestScene::A));
        history.push(entry(TestScene::B));
        history.push(entry(TestScene::C));

        assert_eq!(history.identifiers(), vec![Some(TestScene::B), Some(TestScene::C)]);
    }

    #[test]
    #[should_panic(expected = "History capacity must be positive")]
    fn zero_capacity_panics() {
        History::<TestScene>::with_capacity_limit(0);
    }
}
