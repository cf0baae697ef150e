use alloc::collections::{BTreeMap, BTreeSet};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::change::Decomposition;
use crate::{Cell, CellCache, CellFactory, ChangeBatch, Error, IndexItemCellMap, IndexRange};

/// What triggered a reconciliation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UpdateKind {
    /// Scroll offset, viewport extent or item extent changed.
    #[default]
    Geometry,
    BufferSize,
    CellFactory,
    /// The backing collection was mutated in place.
    Items,
    /// The backing collection was replaced by another one.
    CollectionSwap,
}

/// Outcome of one reconciliation pass.
///
/// Indices in `common`, `shifted.1`, `created` and `reused` refer to the new collection;
/// `shifted.0` and `released` refer to the previous one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub kind: UpdateKind,
    pub previous: IndexRange,
    pub range: IndexRange,
    /// The target range matched the current one and nothing was done.
    pub skipped: bool,
    /// Cells kept for the same item. Their index was refreshed only if it moved.
    pub common: Vec<usize>,
    /// Cells that left their old index and were reassigned to another item directly.
    pub shifted: Vec<(usize, usize)>,
    /// Cells built by the factory.
    pub created: Vec<usize>,
    /// Cells withdrawn from the cache.
    pub reused: Vec<usize>,
    /// Cells handed to the cache.
    pub released: Vec<usize>,
    /// Cells disposed during this pass, by cache overflow or factory change.
    pub disposed: usize,
}

impl Reconciliation {
    /// Whether the set of live cells changed. When `false`, repositioning the existing cells
    /// is enough.
    pub fn cells_changed(&self) -> bool {
        !self.created.is_empty()
            || !self.reused.is_empty()
            || !self.released.is_empty()
            || self.disposed > 0
    }

    /// Number of cells that received a new item.
    pub fn assigned(&self) -> usize {
        self.shifted.len() + self.created.len() + self.reused.len()
    }
}

/// Keeps the cells of one viewport in step with its target range and backing collection.
///
/// Owns the [`IndexItemCellMap`] of materialized cells and the [`CellCache`] of idle ones.
/// Every pass builds a fresh map and commits it in a single assignment, so the previous
/// state is never observed half-updated.
pub struct ChangeReconciler<T, C> {
    map: IndexItemCellMap<T, C>,
    cache: CellCache<T, C>,
    factory: CellFactory<T, C>,
    range: IndexRange,
    count: usize,
}

impl<T, C: Cell<T>> ChangeReconciler<T, C> {
    pub fn new(factory: CellFactory<T, C>, cache_capacity: usize) -> Self {
        Self {
            map: IndexItemCellMap::new(),
            cache: CellCache::new(cache_capacity).with_cell_factory(Arc::clone(&factory)),
            factory,
            range: IndexRange::INVALID,
            count: 0,
        }
    }

    pub fn range(&self) -> IndexRange {
        self.range
    }

    /// Collection length seen by the last pass.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn map(&self) -> &IndexItemCellMap<T, C> {
        &self.map
    }

    pub fn cache(&self) -> &CellCache<T, C> {
        &self.cache
    }

    pub fn cell(&self, index: usize) -> Option<&C> {
        self.map.get(index)
    }

    pub fn cell_mut(&mut self, index: usize) -> Option<&mut C> {
        self.map.get_mut(index)
    }

    pub fn cells(&self) -> impl Iterator<Item = (usize, &C)> + '_ {
        self.map.iter()
    }

    pub fn cell_factory(&self) -> &CellFactory<T, C> {
        &self.factory
    }

    /// Returns how many cached cells were disposed.
    pub fn set_cache_capacity(&mut self, capacity: usize) -> usize {
        self.cache.set_capacity(capacity)
    }

    pub fn populate_cache(&mut self) -> Result<usize, Error> {
        self.cache.populate()
    }

    /// Swaps the factory and rebuilds every cell with it.
    ///
    /// Cells built by the previous factory, live or cached, are disposed.
    pub fn set_cell_factory(
        &mut self,
        factory: CellFactory<T, C>,
        items: &[Arc<T>],
        target: IndexRange,
    ) -> Result<Reconciliation, Error> {
        self.cache.set_cell_factory(Some(Arc::clone(&factory)));
        self.factory = factory;
        self.reconcile(UpdateKind::CellFactory, items, target, None)
    }

    /// Brings the materialized cells in line with `target` over `items`.
    ///
    /// `batch` describes how `items` was derived from the collection of the previous pass and
    /// is only consulted for [`UpdateKind::Items`]. It is validated before anything changes.
    pub fn reconcile(
        &mut self,
        kind: UpdateKind,
        items: &[Arc<T>],
        target: IndexRange,
        batch: Option<&ChangeBatch>,
    ) -> Result<Reconciliation, Error> {
        if let Some(batch) = batch {
            batch.validate(self.count, items.len())?;
        }
        let target = match items.len().checked_sub(1) {
            Some(last) => target.intersection(&IndexRange::new(0, last)),
            None => IndexRange::INVALID,
        };

        let disposed_before = self.cache.disposed_total();
        let mut out = Reconciliation {
            kind,
            previous: self.range,
            range: target,
            ..Reconciliation::default()
        };

        if kind == UpdateKind::CellFactory {
            for (_, mut cell) in self.map.drain() {
                cell.dispose();
                out.disposed += 1;
            }
            self.cache.clear();
        }

        if target.is_empty() {
            self.release_all(&mut out);
        } else {
            match kind {
                UpdateKind::Geometry | UpdateKind::BufferSize => {
                    if target == self.range && self.map.len() == target.len() {
                        vtrace!(?kind, ?target, "range unchanged, skipping");
                        out.skipped = true;
                        return Ok(out);
                    }
                    self.move_reuse_create(items, target, &mut out);
                }
                UpdateKind::Items => match batch {
                    Some(batch) => {
                        let decomposition = Decomposition::of(batch, self.range, target);
                        if decomposition.affects_window() {
                            self.remap(items, target, Some(&decomposition), &mut out);
                        } else {
                            self.move_reuse_create(items, target, &mut out);
                        }
                    }
                    None => self.remap(items, target, None, &mut out),
                },
                UpdateKind::CellFactory => {
                    let mut next = IndexItemCellMap::new();
                    let needed = target.iter().collect();
                    self.fill(items, needed, BTreeMap::new(), &mut next, &mut out);
                    self.map = next;
                }
                UpdateKind::CollectionSwap => {
                    let leftovers = self.map.drain();
                    let mut next = IndexItemCellMap::new();
                    let needed = target.iter().collect();
                    self.fill(items, needed, leftovers, &mut next, &mut out);
                    self.map = next;
                }
            }
        }

        self.range = target;
        self.count = items.len();
        out.disposed += (self.cache.disposed_total() - disposed_before) as usize;
        debug_assert!(self.map.is_valid(), "cell map out of sync after reconciliation");
        vdebug!(
            ?kind,
            range = ?out.range,
            common = out.common.len(),
            shifted = out.shifted.len(),
            created = out.created.len(),
            reused = out.reused.len(),
            released = out.released.len(),
            disposed = out.disposed,
            "reconciled"
        );
        Ok(out)
    }

    /// Disposes every live and cached cell.
    pub fn dispose_all(&mut self) -> usize {
        let mut disposed = 0usize;
        for (_, mut cell) in self.map.drain() {
            cell.dispose();
            disposed += 1;
        }
        disposed += self.cache.clear();
        self.range = IndexRange::INVALID;
        disposed
    }

    /// Index-based pass: cells inside both ranges stay untouched, the rest are recycled.
    fn move_reuse_create(
        &mut self,
        items: &[Arc<T>],
        target: IndexRange,
        out: &mut Reconciliation,
    ) {
        let mut old = core::mem::take(&mut self.map);
        let mut next = IndexItemCellMap::new();
        for (index, cell) in old.take_range(target) {
            next.put(index, Arc::clone(&items[index]), cell);
            out.common.push(index);
        }
        let needed = target.iter().filter(|index| !next.contains_index(*index)).collect();
        self.fill(items, needed, old.into_cells(), &mut next, out);
        self.map = next;
    }

    /// Item-based pass: cells follow their items to wherever the mutation moved them.
    fn remap(
        &mut self,
        items: &[Arc<T>],
        target: IndexRange,
        decomposition: Option<&Decomposition>,
        out: &mut Reconciliation,
    ) {
        let old = core::mem::take(&mut self.map);
        let mut claims: BTreeMap<usize, usize> = BTreeMap::new();
        let mut claimed: BTreeSet<usize> = BTreeSet::new();

        let none = BTreeSet::new();
        let inserted = decomposition.map_or(&none, Decomposition::added);
        if let Some(decomposition) = decomposition {
            vtrace!(
                moved = decomposition.moved().len(),
                removed = decomposition.removed().len(),
                replaced = decomposition.replaced().len(),
                permuted = decomposition.permuted().len(),
                added = decomposition.added().len(),
                "change batch decomposed"
            );
            for (&from, &to) in decomposition.moved() {
                if !target.contains(to) {
                    continue;
                }
                if old.contains_pair(&items[to], from) {
                    claims.insert(to, from);
                    claimed.insert(from);
                } else {
                    vwarn!(from, to, "change batch disagrees with the materialized items");
                }
            }
        }
        // Permuted spans, and anything the batch could not place, are matched by identity.
        // Inserted items have no cell yet.
        for index in target.iter() {
            if claims.contains_key(&index) || inserted.contains(&index) {
                continue;
            }
            if let Some(from) = old
                .indices_of(&items[index])
                .find(|from| !claimed.contains(from))
            {
                claims.insert(index, from);
                claimed.insert(from);
            }
        }

        let mut cells = old.into_cells();
        let mut next = IndexItemCellMap::new();
        let mut needed = Vec::new();
        for index in target.iter() {
            let kept = claims
                .get(&index)
                .and_then(|from| cells.remove(from).map(|cell| (*from, cell)));
            match kept {
                Some((from, mut cell)) => {
                    if from != index {
                        cell.update_index(index);
                    }
                    next.put(index, Arc::clone(&items[index]), cell);
                    out.common.push(index);
                }
                None => needed.push(index),
            }
        }
        self.fill(items, needed, cells, &mut next, out);
        self.map = next;
    }

    /// Assigns a cell to every `needed` index: leftover cells first, lowest old index first,
    /// then the cache, then the factory. Leftovers that find no taker go to the cache.
    fn fill(
        &mut self,
        items: &[Arc<T>],
        needed: Vec<usize>,
        leftovers: BTreeMap<usize, C>,
        next: &mut IndexItemCellMap<T, C>,
        out: &mut Reconciliation,
    ) {
        let mut leftovers = leftovers.into_iter();
        for index in needed {
            let item = &items[index];
            let cell = if let Some((from, mut cell)) = leftovers.next() {
                cell.update_index(index);
                cell.update_item(item);
                out.shifted.push((from, index));
                cell
            } else if let Some(mut cell) = self.cache.take() {
                cell.update_index(index);
                cell.update_item(item);
                out.reused.push(index);
                cell
            } else {
                let mut cell = (self.factory)(Some(item));
                cell.update_index(index);
                out.created.push(index);
                cell
            };
            next.put(index, Arc::clone(item), cell);
        }
        for (from, cell) in leftovers {
            self.cache.cache_one(cell);
            out.released.push(from);
        }
    }

    fn release_all(&mut self, out: &mut Reconciliation) {
        for (index, cell) in self.map.drain() {
            self.cache.cache_one(cell);
            out.released.push(index);
        }
    }
}

impl<T, C> fmt::Debug for ChangeReconciler<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeReconciler")
            .field("range", &self.range)
            .field("count", &self.count)
            .field("map", &self.map)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
