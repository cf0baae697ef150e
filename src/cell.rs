use alloc::sync::Arc;

/// A reusable slot that presents one item at one index.
///
/// Cells carry no inherent tie to an item: the reconciler moves them between indices and items
/// through [`Cell::update_index`] and [`Cell::update_item`], parks them in the
/// [`crate::CellCache`] and eventually disposes them.
pub trait Cell<T> {
    fn update_index(&mut self, index: usize);

    fn update_item(&mut self, item: &Arc<T>);

    /// Called when the cell enters the cache.
    fn on_cache(&mut self) {}

    /// Called when the cell leaves the cache to be reused.
    fn on_decache(&mut self) {}

    /// Called at most once, when the engine discards the cell: on cache overflow, on a factory
    /// change, or from [`crate::Viewport::dispose`].
    ///
    /// Dropping a viewport does not dispose its cells; call [`crate::Viewport::dispose`] first
    /// when cells hold resources.
    fn dispose(&mut self) {}
}

/// Builds a cell for an item. `None` asks for an empty cell (cache pre-warming).
pub type CellFactory<T, C> = Arc<dyn Fn(Option<&Arc<T>>) -> C + Send + Sync>;
