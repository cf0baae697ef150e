use alloc::sync::Arc;
use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};

#[cfg(not(feature = "std"))]
use alloc::collections::BTreeMap;
#[cfg(feature = "std")]
use std::collections::HashMap;

/// Address of an item allocation. Used to probe identity maps without cloning the `Arc`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemAddr(usize);

impl ItemAddr {
    pub fn of<T>(item: &Arc<T>) -> Self {
        Self(Arc::as_ptr(item) as *const () as usize)
    }
}

/// Identity key for an item.
///
/// Two keys are equal only when they point at the same allocation; the item's own `PartialEq`
/// is never consulted, so equal-valued items stay distinct.
pub struct ItemId<T> {
    addr: ItemAddr,
    item: Arc<T>,
}

impl<T> ItemId<T> {
    pub fn new(item: Arc<T>) -> Self {
        Self {
            addr: ItemAddr::of(&item),
            item,
        }
    }

    pub fn addr(&self) -> ItemAddr {
        self.addr
    }

    pub fn item(&self) -> &Arc<T> {
        &self.item
    }
}

impl<T> Clone for ItemId<T> {
    fn clone(&self) -> Self {
        Self {
            addr: self.addr,
            item: Arc::clone(&self.item),
        }
    }
}

impl<T> PartialEq for ItemId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr
    }
}

impl<T> Eq for ItemId<T> {}

impl<T> PartialOrd for ItemId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for ItemId<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.addr.cmp(&other.addr)
    }
}

impl<T> Hash for ItemId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr.hash(state);
    }
}

impl<T> Borrow<ItemAddr> for ItemId<T> {
    fn borrow(&self) -> &ItemAddr {
        &self.addr
    }
}

impl<T> fmt::Debug for ItemId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({:#x})", self.addr.0)
    }
}

#[cfg(feature = "std")]
pub(crate) type IdentityMap<T, V> = HashMap<ItemId<T>, V>;
#[cfg(not(feature = "std"))]
pub(crate) type IdentityMap<T, V> = BTreeMap<ItemId<T>, V>;
