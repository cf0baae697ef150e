use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;
use core::ops::Range;

use crate::{ChangeBatch, ChangeOp};

/// Called with the collection and the batch describing the mutation that produced it.
pub type ChangeListener<T> = Arc<dyn Fn(&[Arc<T>], &ChangeBatch) + Send + Sync>;

/// A backing collection that records a [`ChangeBatch`] for its own mutations.
///
/// Without a listener, ops accumulate until [`ObservedList::take_changes`] hands them over.
/// With one, every top-level mutation (or every [`ObservedList::batch_update`]) is delivered
/// as one batch right away.
pub struct ObservedList<T> {
    items: Vec<Arc<T>>,
    pending: ChangeBatch,
    listener: Option<ChangeListener<T>>,
    batch_depth: usize,
}

impl<T> ObservedList<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            pending: ChangeBatch::new(),
            listener: None,
            batch_depth: 0,
        }
    }

    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        let mut list = Self::new();
        list.items = items.into_iter().map(Arc::new).collect();
        list
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Arc<T>] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&Arc<T>> {
        self.items.get(index)
    }

    pub fn set_listener(&mut self, listener: Option<ChangeListener<T>>) {
        self.listener = listener;
    }

    /// Ops recorded since the last call, as one batch.
    pub fn take_changes(&mut self) -> ChangeBatch {
        core::mem::take(&mut self.pending)
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Groups several mutations into a single batch.
    pub fn batch_update(&mut self, f: impl FnOnce(&mut Self)) {
        self.batch_depth = self.batch_depth.saturating_add(1);
        f(self);
        debug_assert!(self.batch_depth > 0, "batch_depth underflow");
        self.batch_depth = self.batch_depth.saturating_sub(1);
        if self.batch_depth == 0 {
            self.flush();
        }
    }

    pub fn push(&mut self, item: impl Into<Arc<T>>) -> Arc<T> {
        let index = self.items.len();
        self.insert(index, item)
    }

    pub fn insert(&mut self, index: usize, item: impl Into<Arc<T>>) -> Arc<T> {
        let item = item.into();
        self.items.insert(index, Arc::clone(&item));
        self.record(ChangeOp::added(index, index + 1));
        item
    }

    pub fn insert_many(&mut self, index: usize, items: impl IntoIterator<Item = T>) {
        let before = self.items.len();
        let tail = self.items.split_off(index);
        self.items.extend(items.into_iter().map(Arc::new));
        let added = self.items.len() - index;
        self.items.extend(tail);
        debug_assert_eq!(self.items.len(), before + added);
        if added > 0 {
            self.record(ChangeOp::added(index, index + added));
        }
    }

    pub fn remove(&mut self, index: usize) -> Arc<T> {
        let item = self.items.remove(index);
        self.record(ChangeOp::removed(index, 1));
        item
    }

    pub fn remove_range(&mut self, range: Range<usize>) -> Vec<Arc<T>> {
        let start = range.start;
        let removed: Vec<_> = self.items.drain(range).collect();
        if !removed.is_empty() {
            self.record(ChangeOp::removed(start, removed.len()));
        }
        removed
    }

    /// Replaces the item at `index`, returning the previous one.
    pub fn set(&mut self, index: usize, item: impl Into<Arc<T>>) -> Arc<T> {
        let old = core::mem::replace(&mut self.items[index], item.into());
        self.record(ChangeOp::replaced(index, index + 1, 1));
        old
    }

    /// Replaces the items in `range` with `items`, returning the removed ones.
    pub fn replace(
        &mut self,
        range: Range<usize>,
        items: impl IntoIterator<Item = T>,
    ) -> Vec<Arc<T>> {
        let start = range.start;
        let before = self.items.len();
        let removed: Vec<_> = self
            .items
            .splice(range, items.into_iter().map(Arc::new))
            .collect();
        let added = self.items.len() - (before - removed.len());
        if added > 0 || !removed.is_empty() {
            self.record(ChangeOp::replaced(start, start + added, removed.len()));
        }
        removed
    }

    pub fn swap(&mut self, a: usize, b: usize) {
        self.items.swap(a, b);
        if a != b {
            self.record(ChangeOp::permuted(a.min(b), a.max(b) + 1));
        }
    }

    pub fn sort_by(&mut self, mut compare: impl FnMut(&T, &T) -> Ordering) {
        self.items.sort_by(|a, b| compare(&**a, &**b));
        if self.items.len() > 1 {
            self.record(ChangeOp::permuted(0, self.items.len()));
        }
    }

    pub fn clear(&mut self) {
        let len = self.items.len();
        self.items.clear();
        if len > 0 {
            self.record(ChangeOp::removed(0, len));
        }
    }

    fn record(&mut self, op: ChangeOp) {
        vtrace!(?op, len = self.items.len(), "list change recorded");
        self.pending.push(op);
        if self.batch_depth == 0 {
            self.flush();
        }
    }

    fn flush(&mut self) {
        let Some(listener) = self.listener.clone() else {
            return;
        };
        if self.pending.is_empty() {
            return;
        }
        let batch = core::mem::take(&mut self.pending);
        listener(&self.items, &batch);
    }
}

impl<T> Default for ObservedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for ObservedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_items(iter)
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservedList")
            .field("items", &self.items)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}
