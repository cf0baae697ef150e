use alloc::collections::{BTreeMap, BTreeSet};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::IndexRange;
use crate::identity::{IdentityMap, ItemAddr, ItemId};

/// Consistency state of an [`IndexItemCellMap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Validity {
    /// Both sides agree.
    Valid,
    /// A fast removal happened; the item side may hold dangling indices.
    Unknown,
    /// A scan found the sides out of sync; call [`IndexItemCellMap::validate`].
    Invalid,
}

/// Bidirectional association between indices, items and the cells assigned to them.
///
/// The index side is an ordered `index -> (owner, cell)` map. The item side maps each item, by
/// identity, to the ordered set of indices it occupies: the same item may legally appear at
/// several positions of a collection. An item-side link counts only while the index side names
/// the same owner, so a stale link left by a fast removal never resolves to another item's cell.
pub struct IndexItemCellMap<T, C> {
    by_index: BTreeMap<usize, (ItemAddr, C)>,
    by_item: IdentityMap<T, BTreeSet<usize>>,
    validity: Validity,
}

impl<T, C> IndexItemCellMap<T, C> {
    pub fn new() -> Self {
        Self {
            by_index: BTreeMap::new(),
            by_item: IdentityMap::default(),
            validity: Validity::Valid,
        }
    }

    pub fn len(&self) -> usize {
        self.by_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_index.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&C> {
        self.by_index.get(&index).map(|(_, cell)| cell)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut C> {
        self.by_index.get_mut(&index).map(|(_, cell)| cell)
    }

    /// Every cell showing `item`, in index order.
    pub fn get_by_item(&self, item: &Arc<T>) -> Vec<&C> {
        let addr = ItemAddr::of(item);
        self.indices_of(item)
            .filter_map(|index| self.owned_by(addr, index))
            .collect()
    }

    pub fn first_by_item(&self, item: &Arc<T>) -> Option<&C> {
        let addr = ItemAddr::of(item);
        self.indices_of(item)
            .find_map(|index| self.owned_by(addr, index))
    }

    /// Indices recorded for `item`. May include dangling entries while the map is not
    /// [`Validity::Valid`].
    pub fn indices_of(&self, item: &Arc<T>) -> impl Iterator<Item = usize> + '_ {
        self.by_item
            .get(&ItemAddr::of(item))
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    pub fn contains_index(&self, index: usize) -> bool {
        self.by_index.contains_key(&index)
    }

    pub fn contains_item(&self, item: &Arc<T>) -> bool {
        self.first_by_item(item).is_some()
    }

    /// Whether `item` is materialized at exactly `index`.
    pub fn contains_pair(&self, item: &Arc<T>, index: usize) -> bool {
        self.owned_by(ItemAddr::of(item), index).is_some()
    }

    /// Assigns `cell` to `index` for `item`.
    ///
    /// Returns the cell previously stored at `index`, if any. Its index is unlinked from the
    /// item it belonged to.
    pub fn put(&mut self, index: usize, item: Arc<T>, cell: C) -> Option<C> {
        let addr = ItemAddr::of(&item);
        let displaced = self.by_index.insert(index, (addr, cell));
        if let Some((owner, _)) = &displaced {
            self.unlink(*owner, index);
        }
        self.by_item
            .entry(ItemId::new(item))
            .or_default()
            .insert(index);
        displaced.map(|(_, cell)| cell)
    }

    /// Removes the cell at `index`.
    ///
    /// With `validate` the index is unlinked from its item as well. Without it only the index
    /// side is touched and the map becomes [`Validity::Unknown`] until
    /// [`IndexItemCellMap::validate`] runs.
    pub fn remove_index(&mut self, index: usize, validate: bool) -> Option<C> {
        let (owner, cell) = self.by_index.remove(&index)?;
        if validate {
            self.unlink(owner, index);
        } else {
            self.mark_dirty();
        }
        Some(cell)
    }

    /// Removes the lowest index occupied by `item` together with its cell.
    pub fn remove_item(&mut self, item: &Arc<T>) -> Option<(usize, C)> {
        let addr = ItemAddr::of(item);
        loop {
            let set = self.by_item.get_mut(&addr)?;
            let index = set.pop_first();
            if set.is_empty() {
                self.by_item.remove(&addr);
            }
            let index = index?;
            // Stale links are dropped; they only exist after fast removals.
            if self.by_index.get(&index).is_some_and(|(owner, _)| *owner == addr) {
                if let Some((_, cell)) = self.by_index.remove(&index) {
                    return Some((index, cell));
                }
            }
        }
    }

    pub fn validity(&self) -> Validity {
        self.validity
    }

    /// Whether both sides agree. Scans the map unless the answer is already known.
    pub fn is_valid(&self) -> bool {
        match self.validity {
            Validity::Valid => true,
            Validity::Invalid => false,
            Validity::Unknown => self.scan(),
        }
    }

    /// Like [`IndexItemCellMap::is_valid`], but remembers the outcome of a scan.
    pub fn check(&mut self) -> bool {
        if self.validity == Validity::Unknown {
            self.validity = if self.scan() {
                Validity::Valid
            } else {
                Validity::Invalid
            };
        }
        self.validity == Validity::Valid
    }

    /// Prunes stale links from the item side: indices that are gone, or that now belong to
    /// another item.
    pub fn validate(&mut self) {
        if self.validity == Validity::Valid {
            return;
        }
        let by_index = &self.by_index;
        self.by_item.retain(|id, set| {
            let addr = id.addr();
            set.retain(|index| by_index.get(index).is_some_and(|(owner, _)| *owner == addr));
            !set.is_empty()
        });
        self.validity = if self.scan() {
            Validity::Valid
        } else {
            vwarn!(len = self.by_index.len(), "index map still inconsistent after validation");
            Validity::Invalid
        };
    }

    /// Full item to cell correspondence. Expensive; meant for inspection, not the scroll path.
    pub fn resolve(&self) -> Vec<(Arc<T>, &C)> {
        let mut out = Vec::with_capacity(self.by_index.len());
        for (id, set) in self.by_item.iter() {
            for index in set {
                if let Some(cell) = self.owned_by(id.addr(), *index) {
                    out.push((Arc::clone(id.item()), cell));
                }
            }
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &C)> + '_ {
        self.by_index.iter().map(|(index, (_, cell))| (*index, cell))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut C)> + '_ {
        self.by_index
            .iter_mut()
            .map(|(index, (_, cell))| (*index, cell))
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.by_index.keys().copied()
    }

    pub fn first(&self) -> Option<(usize, &C)> {
        self.by_index
            .first_key_value()
            .map(|(index, (_, cell))| (*index, cell))
    }

    pub fn last(&self) -> Option<(usize, &C)> {
        self.by_index
            .last_key_value()
            .map(|(index, (_, cell))| (*index, cell))
    }

    /// Removes the lowest entry without touching the item side.
    pub fn pop_first(&mut self) -> Option<(usize, C)> {
        let (index, (_, cell)) = self.by_index.pop_first()?;
        self.mark_dirty();
        Some((index, cell))
    }

    /// Removes the highest entry without touching the item side.
    pub fn pop_last(&mut self) -> Option<(usize, C)> {
        let (index, (_, cell)) = self.by_index.pop_last()?;
        self.mark_dirty();
        Some((index, cell))
    }

    /// Extracts the entries inside `range`, leaving the rest in place.
    pub fn take_range(&mut self, range: IndexRange) -> BTreeMap<usize, C> {
        if range.is_empty() {
            return BTreeMap::new();
        }
        let mut taken = self.by_index.split_off(&range.min());
        if let Some(after) = range.max().checked_add(1) {
            let mut tail = taken.split_off(&after);
            self.by_index.append(&mut tail);
        }
        if !taken.is_empty() {
            self.mark_dirty();
        }
        strip(taken)
    }

    /// Empties the map, handing back every cell in index order.
    pub fn drain(&mut self) -> BTreeMap<usize, C> {
        self.by_item.clear();
        self.validity = Validity::Valid;
        strip(core::mem::take(&mut self.by_index))
    }

    pub fn into_cells(self) -> BTreeMap<usize, C> {
        strip(self.by_index)
    }

    pub fn clear(&mut self) {
        self.by_index.clear();
        self.by_item.clear();
        self.validity = Validity::Valid;
    }

    fn mark_dirty(&mut self) {
        if self.validity == Validity::Valid {
            self.validity = Validity::Unknown;
        }
    }

    fn owned_by(&self, addr: ItemAddr, index: usize) -> Option<&C> {
        self.by_index
            .get(&index)
            .filter(|(owner, _)| *owner == addr)
            .map(|(_, cell)| cell)
    }

    fn unlink(&mut self, owner: ItemAddr, index: usize) {
        if let Some(set) = self.by_item.get_mut(&owner) {
            set.remove(&index);
            if set.is_empty() {
                self.by_item.remove(&owner);
            }
        }
    }

    fn scan(&self) -> bool {
        let mut linked = 0usize;
        for (id, set) in self.by_item.iter() {
            let addr = id.addr();
            for index in set {
                if self.owned_by(addr, *index).is_none() {
                    return false;
                }
            }
            linked += set.len();
        }
        linked == self.by_index.len()
    }
}

fn strip<C>(entries: BTreeMap<usize, (ItemAddr, C)>) -> BTreeMap<usize, C> {
    entries
        .into_iter()
        .map(|(index, (_, cell))| (index, cell))
        .collect()
}

impl<T, C> Default for IndexItemCellMap<T, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C> fmt::Debug for IndexItemCellMap<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexItemCellMap")
            .field("indices", &self.by_index.keys().collect::<Vec<_>>())
            .field("items", &self.by_item.len())
            .field("validity", &self.validity)
            .finish()
    }
}
