use std::collections::VecDeque;

/// Default number of snapshots retained
pub const DEFAULT_LIMIT: usize = 50;

/// Linear undo/redo history over snapshots of a value.
///
/// Holds between 1 and `limit` snapshots; `cursor` always indexes one of
/// them and that snapshot is the current value. Recording a new value after
/// an undo discards the redo branch. When the history is full the oldest
/// snapshot is dropped and can no longer be reached by undo.
#[derive(Debug, Clone)]
pub struct History<T> {
    snapshots: VecDeque<T>,
    cursor: usize,
    limit: usize,
}

impl<T> History<T> {
    /// Start a history whose only snapshot is `initial`
    pub fn new(initial: T) -> Self {
        Self::with_limit(initial, DEFAULT_LIMIT)
    }

    /// Start a history retaining at most `limit` snapshots (minimum 1)
    pub fn with_limit(initial: T, limit: usize) -> Self {
        let mut snapshots = VecDeque::new();
        snapshots.push_back(initial);
        History {
            snapshots,
            cursor: 0,
            limit: limit.max(1),
        }
    }

    /// Rebuild a history from stored snapshots and cursor.
    ///
    /// Returns `None` when there are no snapshots. An out-of-range cursor is
    /// clamped to the newest snapshot; snapshots beyond `limit` are dropped
    /// from the front.
    pub fn from_parts(snapshots: Vec<T>, cursor: usize, limit: usize) -> Option<Self> {
        if snapshots.is_empty() {
            return None;
        }
        let limit = limit.max(1);
        let mut snapshots: VecDeque<T> = snapshots.into();
        let mut cursor = cursor.min(snapshots.len() - 1);
        while snapshots.len() > limit {
            snapshots.pop_front();
            cursor = cursor.saturating_sub(1);
        }
        Some(History {
            snapshots,
            cursor,
            limit,
        })
    }

    /// Split into `(snapshots, cursor)` for storage
    pub fn into_parts(self) -> (Vec<T>, usize) {
        (self.snapshots.into(), self.cursor)
    }

    /// The current value
    pub fn current(&self) -> &T {
        &self.snapshots[self.cursor]
    }

    /// Record `value` as the new current state
    pub fn set(&mut self, value: T) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push_back(value);
        if self.snapshots.len() > self.limit {
            self.snapshots.pop_front();
        } else {
            self.cursor += 1;
        }
    }

    /// Record the result of applying `f` to the current value
    pub fn update(&mut self, f: impl FnOnce(&T) -> T) {
        let next = f(self.current());
        self.set(next);
    }

    /// Step back one snapshot. Returns false at the oldest snapshot.
    pub fn undo(&mut self) -> bool {
        if self.can_undo() {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    /// Step forward one snapshot. Returns false at the newest snapshot.
    pub fn redo(&mut self) -> bool {
        if self.can_redo() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of retained snapshots
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false; a history holds at least one snapshot
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Snapshots oldest first
    pub fn snapshots(&self) -> impl Iterator<Item = &T> {
        self.snapshots.iter()
    }
}
