use alloc::collections::VecDeque;
use alloc::sync::Arc;
use core::fmt;

use crate::{Cell, CellFactory, Error};

/// A bounded FIFO of unassigned cells.
///
/// Cells enter through [`CellCache::cache`] and leave through [`CellCache::take`], oldest
/// first. When full, admitting a cell evicts and disposes the oldest one. A capacity of `0`
/// disables caching: every admitted cell is disposed immediately.
pub struct CellCache<T, C> {
    queue: VecDeque<C>,
    capacity: usize,
    factory: Option<CellFactory<T, C>>,
    disposed: u64,
}

impl<T, C: Cell<T>> CellCache<T, C> {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            capacity,
            factory: None,
            disposed: 0,
        }
    }

    pub fn with_cell_factory(mut self, factory: CellFactory<T, C>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn cell_factory(&self) -> Option<&CellFactory<T, C>> {
        self.factory.as_ref()
    }

    pub fn set_cell_factory(&mut self, factory: Option<CellFactory<T, C>>) {
        self.factory = factory;
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total number of cells this cache has disposed so far.
    pub fn disposed_total(&self) -> u64 {
        self.disposed
    }

    pub fn iter(&self) -> impl Iterator<Item = &C> + '_ {
        self.queue.iter()
    }

    /// Fills the cache up to capacity with empty cells built by the factory.
    ///
    /// Returns how many cells were built.
    pub fn populate(&mut self) -> Result<usize, Error> {
        let factory = self
            .factory
            .as_ref()
            .map(Arc::clone)
            .ok_or(Error::MissingCellFactory)?;
        let mut built = 0usize;
        while self.queue.len() < self.capacity {
            let mut cell = factory(None);
            cell.on_cache();
            self.queue.push_back(cell);
            built += 1;
        }
        vdebug!(built, len = self.queue.len(), "cache populated");
        Ok(built)
    }

    /// Admits `cells`, returning how many were actually queued.
    pub fn cache(&mut self, cells: impl IntoIterator<Item = C>) -> usize {
        cells
            .into_iter()
            .map(|cell| self.cache_one(cell))
            .filter(|admitted| *admitted)
            .count()
    }

    /// Admits a single cell. Returns `false` when caching is disabled and the cell was
    /// disposed instead.
    pub fn cache_one(&mut self, mut cell: C) -> bool {
        if self.capacity == 0 {
            self.dispose(&mut cell);
            return false;
        }
        if self.queue.len() >= self.capacity {
            if let Some(mut oldest) = self.queue.pop_front() {
                self.dispose(&mut oldest);
            }
        }
        cell.on_cache();
        self.queue.push_back(cell);
        true
    }

    /// Withdraws the oldest cached cell.
    pub fn take(&mut self) -> Option<C> {
        let mut cell = self.queue.pop_front()?;
        cell.on_decache();
        Some(cell)
    }

    /// Changes the capacity, disposing the oldest cells that no longer fit.
    ///
    /// Returns how many cells were disposed.
    pub fn set_capacity(&mut self, capacity: usize) -> usize {
        self.capacity = capacity;
        let mut evicted = 0usize;
        while self.queue.len() > capacity {
            if let Some(mut cell) = self.queue.pop_front() {
                self.dispose(&mut cell);
                evicted += 1;
            }
        }
        if evicted > 0 {
            vdebug!(capacity, evicted, "cache shrunk");
        }
        evicted
    }

    /// Disposes every cached cell. Returns how many were disposed.
    pub fn clear(&mut self) -> usize {
        let mut cleared = 0usize;
        while let Some(mut cell) = self.queue.pop_front() {
            self.dispose(&mut cell);
            cleared += 1;
        }
        cleared
    }

    fn dispose(&mut self, cell: &mut C) {
        cell.dispose();
        self.disposed += 1;
    }
}

impl<T, C> fmt::Debug for CellCache<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellCache")
            .field("len", &self.queue.len())
            .field("capacity", &self.capacity)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}
