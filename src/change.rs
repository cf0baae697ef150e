//! List-mutation payloads and their decomposition against a materialized range.
//!
//! A [`ChangeBatch`] carries the ops of one user-level mutation in the order they happened.
//! Indices follow sequential semantics: every op refers to the collection as left by the
//! previous op of the same batch.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use core::ops::Range;

use crate::{Error, IndexRange};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChangeKind {
    /// Items were inserted at `from..to`.
    Add,
    /// `removed_count` items were removed starting at `from`.
    Remove,
    /// `removed_count` items starting at `from` were replaced by the items now at `from..to`.
    Replace,
    /// The items at `from..to` were reordered.
    Permute,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChangeOp {
    pub kind: ChangeKind,
    pub from: usize,
    /// Exclusive end of the affected span in the collection after this op.
    pub to: usize,
    pub removed_count: usize,
}

impl ChangeOp {
    pub fn added(from: usize, to: usize) -> Self {
        Self {
            kind: ChangeKind::Add,
            from,
            to,
            removed_count: 0,
        }
    }

    pub fn removed(from: usize, count: usize) -> Self {
        Self {
            kind: ChangeKind::Remove,
            from,
            to: from,
            removed_count: count,
        }
    }

    pub fn replaced(from: usize, to: usize, removed_count: usize) -> Self {
        Self {
            kind: ChangeKind::Replace,
            from,
            to,
            removed_count,
        }
    }

    pub fn permuted(from: usize, to: usize) -> Self {
        Self {
            kind: ChangeKind::Permute,
            from,
            to,
            removed_count: 0,
        }
    }

    pub fn added_count(&self) -> usize {
        match self.kind {
            ChangeKind::Add | ChangeKind::Replace => self.to.saturating_sub(self.from),
            ChangeKind::Remove | ChangeKind::Permute => 0,
        }
    }

    pub fn removed_total(&self) -> usize {
        match self.kind {
            ChangeKind::Remove | ChangeKind::Replace => self.removed_count,
            ChangeKind::Add | ChangeKind::Permute => 0,
        }
    }

    fn fits(&self, len: usize) -> bool {
        match self.kind {
            ChangeKind::Add => self.from <= self.to && self.from <= len,
            ChangeKind::Remove | ChangeKind::Replace => {
                self.from <= self.to
                    && self
                        .from
                        .checked_add(self.removed_count)
                        .is_some_and(|end| end <= len)
            }
            ChangeKind::Permute => self.from <= self.to && self.to <= len,
        }
    }
}

/// The ops of one user-level mutation, in the order they happened.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChangeBatch {
    ops: Vec<ChangeOp>,
}

impl ChangeBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: ChangeOp) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[ChangeOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, ChangeOp> {
        self.ops.iter()
    }

    /// Checks every op against the running length and the final length against `new_len`.
    pub fn validate(&self, old_len: usize, new_len: usize) -> Result<(), Error> {
        let mut len = old_len;
        for op in &self.ops {
            if !op.fits(len) {
                return Err(Error::InvalidChange { op: *op, len });
            }
            len = len - op.removed_total() + op.added_count();
        }
        if len != new_len {
            return Err(Error::LengthMismatch {
                expected: len,
                actual: new_len,
            });
        }
        Ok(())
    }
}

impl FromIterator<ChangeOp> for ChangeBatch {
    fn from_iter<I: IntoIterator<Item = ChangeOp>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

impl Extend<ChangeOp> for ChangeBatch {
    fn extend<I: IntoIterator<Item = ChangeOp>>(&mut self, iter: I) {
        self.ops.extend(iter);
    }
}

impl<'a> IntoIterator for &'a ChangeBatch {
    type Item = &'a ChangeOp;
    type IntoIter = core::slice::Iter<'a, ChangeOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    At(usize),
    Removed,
    Replaced,
    Permuted,
}

/// Where each previously materialized index ended up after a batch.
///
/// Every old index is classified exactly once, so an index hit by a replace and then by an
/// overlapping remove is never counted twice.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Decomposition {
    moved: BTreeMap<usize, usize>,
    removed: BTreeSet<usize>,
    replaced: BTreeSet<usize>,
    permuted: BTreeSet<usize>,
    added: BTreeSet<usize>,
    affects_window: bool,
}

impl Decomposition {
    /// Replays `batch` over the indices of `old`, scoping inserted positions to `new`.
    pub fn of(batch: &ChangeBatch, old: IndexRange, new: IndexRange) -> Self {
        let window_max = match (old.is_valid(), new.is_valid()) {
            (true, true) => Some(old.max().max(new.max())),
            (true, false) => Some(old.max()),
            (false, true) => Some(new.max()),
            (false, false) => None,
        };
        let affects_window = window_max.is_some_and(|max| batch.iter().any(|op| op.from <= max));

        let mut slots: Vec<(usize, Slot)> =
            old.iter().map(|index| (index, Slot::At(index))).collect();
        // Inserted positions are kept as spans so a large insert costs one entry.
        let mut added: Vec<Range<usize>> = Vec::new();

        for op in batch {
            let from = op.from;
            match op.kind {
                ChangeKind::Add => {
                    let n = op.added_count();
                    for (_, slot) in slots.iter_mut() {
                        if let Slot::At(pos) = slot {
                            if *pos >= from {
                                *pos += n;
                            }
                        }
                    }
                    open_spans(&mut added, from, n);
                    added.push(from..op.to);
                }
                ChangeKind::Remove => {
                    let end = from + op.removed_count;
                    for (_, slot) in slots.iter_mut() {
                        if let Slot::At(pos) = *slot {
                            if pos >= end {
                                *slot = Slot::At(pos - op.removed_count);
                            } else if pos >= from {
                                *slot = Slot::Removed;
                            }
                        }
                    }
                    cut_spans(&mut added, from, end, 0);
                }
                ChangeKind::Replace => {
                    let inserted = op.added_count();
                    let end = from + op.removed_count;
                    let overlap = from + inserted.min(op.removed_count);
                    for (_, slot) in slots.iter_mut() {
                        if let Slot::At(pos) = *slot {
                            if pos >= end {
                                *slot = Slot::At(pos - op.removed_count + inserted);
                            } else if pos >= overlap {
                                *slot = Slot::Removed;
                            } else if pos >= from {
                                *slot = Slot::Replaced;
                            }
                        }
                    }
                    cut_spans(&mut added, from, end, inserted);
                    added.push(overlap..op.to);
                }
                ChangeKind::Permute => {
                    for (_, slot) in slots.iter_mut() {
                        if let Slot::At(pos) = *slot {
                            if pos >= from && pos < op.to {
                                *slot = Slot::Permuted;
                            }
                        }
                    }
                    // Positions of items inserted earlier in the batch are lost here.
                    cut_spans(&mut added, from, op.to, op.to.saturating_sub(from));
                }
            }
        }

        let mut out = Self {
            affects_window,
            ..Self::default()
        };
        for (index, slot) in slots {
            match slot {
                Slot::At(pos) => {
                    out.moved.insert(index, pos);
                }
                Slot::Removed => {
                    out.removed.insert(index);
                }
                Slot::Replaced => {
                    out.replaced.insert(index);
                }
                Slot::Permuted => {
                    out.permuted.insert(index);
                }
            }
        }
        if new.is_valid() {
            let window = new.min()..new.max().saturating_add(1);
            for span in added {
                out.added
                    .extend(span.start.max(window.start)..span.end.min(window.end));
            }
        }
        out
    }

    /// Old index to new index for every materialized item that survived in place or shifted.
    pub fn moved(&self) -> &BTreeMap<usize, usize> {
        &self.moved
    }

    /// Old indices whose items were removed.
    pub fn removed(&self) -> &BTreeSet<usize> {
        &self.removed
    }

    /// Old indices whose items were replaced by new ones at the same position.
    pub fn replaced(&self) -> &BTreeSet<usize> {
        &self.replaced
    }

    /// Old indices inside a permuted span; their new position is only known by identity.
    pub fn permuted(&self) -> &BTreeSet<usize> {
        &self.permuted
    }

    /// New indices, inside the new range, that hold inserted items.
    pub fn added(&self) -> &BTreeSet<usize> {
        &self.added
    }

    /// Whether any op touches an index at or before the end of the old or new range.
    ///
    /// When it does not, the items inside the window are untouched and a plain geometry pass
    /// is enough.
    pub fn affects_window(&self) -> bool {
        self.affects_window
    }
}

/// Moves every span position at or after `at` up by `n`, splitting a span that straddles `at`.
fn open_spans(spans: &mut Vec<Range<usize>>, at: usize, n: usize) {
    let mut out = Vec::with_capacity(spans.len() + 1);
    for span in spans.drain(..) {
        if span.start >= at {
            out.push(span.start + n..span.end + n);
        } else if span.end > at {
            out.push(span.start..at);
            out.push(at + n..span.end + n);
        } else {
            out.push(span);
        }
    }
    *spans = out;
}

/// Drops `from..end` from the spans and moves positions at or after `end` so that `end` lands
/// on `from + inserted`.
fn cut_spans(spans: &mut Vec<Range<usize>>, from: usize, end: usize, inserted: usize) {
    let end = end.max(from);
    let removed = end - from;
    let mut out = Vec::with_capacity(spans.len() + 1);
    for span in spans.drain(..) {
        let head = span.start..span.end.min(from);
        let tail = span.start.max(end)..span.end;
        if !head.is_empty() {
            out.push(head);
        }
        if !tail.is_empty() {
            out.push(tail.start - removed + inserted..tail.end - removed + inserted);
        }
    }
    *spans = out;
}
