use alloc::sync::Arc;

use crate::range::RangeCalculator;
use crate::{
    AxisLayoutCache, BufferSize, Cell, CellCache, CellFactory, ChangeBatch, ChangeReconciler,
    Error, Geometry, IndexItemCellMap, IndexRange, LayoutMode, Reconciliation, UpdateKind,
    ViewportOptions, ViewportState,
};

/// A viewport over an ordered collection that materializes only the cells it needs.
///
/// The viewport owns geometry and configuration; every entry point computes the target range
/// and lets the [`ChangeReconciler`] bring the cells in line with it. The collection itself is
/// owned by the caller and passed in as `&[Arc<T>]`.
///
/// In [`LayoutMode::Variable`] element extents come from [`Viewport::layout_mut`], which must
/// hold exactly one entry per item.
pub struct Viewport<T, C> {
    options: ViewportOptions<T, C>,
    geometry: Geometry,
    layout: AxisLayoutCache,
    reconciler: ChangeReconciler<T, C>,
}

impl<T, C: Cell<T>> Viewport<T, C> {
    pub fn new(options: ViewportOptions<T, C>) -> Result<Self, Error> {
        let factory = options
            .cell_factory
            .as_ref()
            .map(Arc::clone)
            .ok_or(Error::MissingCellFactory)?;
        let mut reconciler = ChangeReconciler::new(factory, options.cache_capacity);
        if options.prewarm_cache {
            reconciler.populate_cache()?;
        }
        vdebug!(
            buffer = options.buffer_size.items(),
            cache_capacity = options.cache_capacity,
            layout_mode = ?options.layout_mode,
            "viewport created"
        );
        Ok(Self {
            geometry: options.initial_geometry,
            layout: AxisLayoutCache::new(options.min_element_extent),
            options,
            reconciler,
        })
    }

    pub fn options(&self) -> &ViewportOptions<T, C> {
        &self.options
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn range(&self) -> IndexRange {
        self.reconciler.range()
    }

    pub fn cell(&self, index: usize) -> Option<&C> {
        self.reconciler.cell(index)
    }

    pub fn cell_mut(&mut self, index: usize) -> Option<&mut C> {
        self.reconciler.cell_mut(index)
    }

    /// Materialized cells in index order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, &C)> + '_ {
        self.reconciler.cells()
    }

    pub fn map(&self) -> &IndexItemCellMap<T, C> {
        self.reconciler.map()
    }

    pub fn cache(&self) -> &CellCache<T, C> {
        self.reconciler.cache()
    }

    pub fn reconciler(&self) -> &ChangeReconciler<T, C> {
        &self.reconciler
    }

    pub fn layout(&self) -> &AxisLayoutCache {
        &self.layout
    }

    /// Element extents for [`LayoutMode::Variable`]. Changes take effect on the next pass.
    pub fn layout_mut(&mut self) -> &mut AxisLayoutCache {
        &mut self.layout
    }

    pub fn state(&self) -> ViewportState {
        ViewportState {
            geometry: self.geometry,
            range: self.reconciler.range(),
            count: self.reconciler.count(),
            buffer_size: self.options.buffer_size,
            layout_mode: self.options.layout_mode,
            cached_cells: self.reconciler.cache().len(),
        }
    }

    /// Re-runs the geometry pass, for example after editing [`Viewport::layout_mut`].
    pub fn refresh(&mut self, items: &[Arc<T>]) -> Result<Reconciliation, Error> {
        self.run(UpdateKind::Geometry, items, None)
    }

    pub fn set_geometry(
        &mut self,
        items: &[Arc<T>],
        geometry: Geometry,
    ) -> Result<Reconciliation, Error> {
        let previous = core::mem::replace(&mut self.geometry, geometry);
        self.run(UpdateKind::Geometry, items, None)
            .inspect_err(|_| self.geometry = previous)
    }

    pub fn scroll_to(&mut self, items: &[Arc<T>], offset: u64) -> Result<Reconciliation, Error> {
        self.set_geometry(items, self.geometry.with_scroll_offset(offset))
    }

    pub fn resize(&mut self, items: &[Arc<T>], extent: u32) -> Result<Reconciliation, Error> {
        self.set_geometry(items, self.geometry.with_viewport_extent(extent))
    }

    pub fn set_item_extent(
        &mut self,
        items: &[Arc<T>],
        item_extent: u32,
    ) -> Result<Reconciliation, Error> {
        let previous = core::mem::replace(&mut self.options.item_extent, item_extent);
        self.run(UpdateKind::Geometry, items, None)
            .inspect_err(|_| self.options.item_extent = previous)
    }

    pub fn set_buffer_size(
        &mut self,
        items: &[Arc<T>],
        buffer_size: BufferSize,
    ) -> Result<Reconciliation, Error> {
        let previous = core::mem::replace(&mut self.options.buffer_size, buffer_size);
        self.run(UpdateKind::BufferSize, items, None)
            .inspect_err(|_| self.options.buffer_size = previous)
    }

    /// Replaces the cell factory. Every cell built by the old one is disposed.
    pub fn set_cell_factory(
        &mut self,
        items: &[Arc<T>],
        factory: impl Fn(Option<&Arc<T>>) -> C + Send + Sync + 'static,
    ) -> Result<Reconciliation, Error> {
        let factory: CellFactory<T, C> = Arc::new(factory);
        let target = self.target_range(items.len())?;
        self.options.cell_factory = Some(Arc::clone(&factory));
        let out = self.reconciler.set_cell_factory(factory, items, target)?;
        self.notify(&out);
        Ok(out)
    }

    /// Applies an in-place mutation of the collection described by `batch`.
    pub fn on_items_changed(
        &mut self,
        items: &[Arc<T>],
        batch: &ChangeBatch,
    ) -> Result<Reconciliation, Error> {
        self.run(UpdateKind::Items, items, Some(batch))
    }

    /// The collection was replaced wholesale; no item identity is assumed to carry over.
    pub fn on_collection_swapped(&mut self, items: &[Arc<T>]) -> Result<Reconciliation, Error> {
        self.run(UpdateKind::CollectionSwap, items, None)
    }

    /// Returns how many cached cells were disposed.
    pub fn set_cache_capacity(&mut self, capacity: usize) -> usize {
        self.options.cache_capacity = capacity;
        self.reconciler.set_cache_capacity(capacity)
    }

    pub fn populate_cache(&mut self) -> Result<usize, Error> {
        self.reconciler.populate_cache()
    }

    /// Disposes every live and cached cell. The viewport stays usable.
    ///
    /// Dropping a viewport skips this step, so call it before letting go of cells that hold
    /// resources.
    pub fn dispose(&mut self) -> usize {
        self.reconciler.dispose_all()
    }

    fn run(
        &mut self,
        kind: UpdateKind,
        items: &[Arc<T>],
        batch: Option<&ChangeBatch>,
    ) -> Result<Reconciliation, Error> {
        let target = self.target_range(items.len())?;
        let out = self.reconciler.reconcile(kind, items, target, batch)?;
        self.notify(&out);
        Ok(out)
    }

    fn target_range(&mut self, count: usize) -> Result<IndexRange, Error> {
        let buffer = self.options.buffer_size.items();
        match self.options.layout_mode {
            LayoutMode::Fixed => Ok(RangeCalculator::fixed(
                self.geometry,
                self.options.item_extent,
                count,
                buffer,
            )),
            LayoutMode::Variable => {
                if self.layout.len() != count {
                    return Err(Error::LayoutMismatch {
                        elements: self.layout.len(),
                        count,
                    });
                }
                self.layout
                    .set_viewport(self.geometry.scroll_offset, self.geometry.viewport_extent);
                Ok(RangeCalculator::variable(
                    &mut self.layout,
                    self.geometry,
                    buffer,
                ))
            }
        }
    }

    fn notify(&self, out: &Reconciliation) {
        if out.skipped {
            return;
        }
        if let Some(on_reconcile) = &self.options.on_reconcile {
            on_reconcile(self, out);
        }
    }
}

impl<T, C> core::fmt::Debug for Viewport<T, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Viewport")
            .field("options", &self.options)
            .field("geometry", &self.geometry)
            .field("reconciler", &self.reconciler)
            .finish_non_exhaustive()
    }
}
