use alloc::sync::Arc;

use crate::{CellFactory, Geometry, Reconciliation, Viewport};

/// Extra items materialized on each side of the visible ones.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BufferSize {
    Small,
    #[default]
    Standard,
    Big,
}

impl BufferSize {
    pub fn items(self) -> usize {
        match self {
            Self::Small => 1,
            Self::Standard => 2,
            Self::Big => 3,
        }
    }
}

/// How element extents along the primary axis are known.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LayoutMode {
    /// Every element has `item_extent`.
    #[default]
    Fixed,
    /// Extents come from the viewport's [`crate::AxisLayoutCache`].
    Variable,
}

/// A callback fired after every reconciliation that was not skipped.
pub type OnReconcileCallback<T, C> = Arc<dyn Fn(&Viewport<T, C>, &Reconciliation) + Send + Sync>;

/// Configuration for [`crate::Viewport`].
///
/// Closures are stored in `Arc`s so the options stay cheap to clone.
pub struct ViewportOptions<T, C> {
    /// Required: [`crate::Viewport::new`] fails without one.
    pub cell_factory: Option<CellFactory<T, C>>,
    pub buffer_size: BufferSize,
    /// Maximum number of idle cells kept for reuse. `0` disables caching.
    pub cache_capacity: usize,
    /// Extent of every element in [`LayoutMode::Fixed`].
    pub item_extent: u32,
    pub layout_mode: LayoutMode,
    /// Minimum element width of the variable layout cache.
    pub min_element_extent: u32,
    pub initial_geometry: Geometry,
    /// Fill the cache with empty cells on construction.
    pub prewarm_cache: bool,
    pub on_reconcile: Option<OnReconcileCallback<T, C>>,
}

impl<T, C> ViewportOptions<T, C> {
    pub fn new(
        item_extent: u32,
        cell_factory: impl Fn(Option<&Arc<T>>) -> C + Send + Sync + 'static,
    ) -> Self {
        Self {
            cell_factory: Some(Arc::new(cell_factory)),
            ..Self::default()
        }
        .with_item_extent(item_extent)
    }

    pub fn with_cell_factory(
        mut self,
        cell_factory: impl Fn(Option<&Arc<T>>) -> C + Send + Sync + 'static,
    ) -> Self {
        self.cell_factory = Some(Arc::new(cell_factory));
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: BufferSize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_cache_capacity(mut self, cache_capacity: usize) -> Self {
        self.cache_capacity = cache_capacity;
        self
    }

    pub fn with_item_extent(mut self, item_extent: u32) -> Self {
        self.item_extent = item_extent;
        self
    }

    pub fn with_layout_mode(mut self, layout_mode: LayoutMode) -> Self {
        self.layout_mode = layout_mode;
        self
    }

    pub fn with_min_element_extent(mut self, min_element_extent: u32) -> Self {
        self.min_element_extent = min_element_extent;
        self
    }

    pub fn with_initial_geometry(mut self, initial_geometry: Geometry) -> Self {
        self.initial_geometry = initial_geometry;
        self
    }

    pub fn with_prewarm_cache(mut self, prewarm_cache: bool) -> Self {
        self.prewarm_cache = prewarm_cache;
        self
    }

    pub fn with_on_reconcile(
        mut self,
        on_reconcile: impl Fn(&Viewport<T, C>, &Reconciliation) + Send + Sync + 'static,
    ) -> Self {
        self.on_reconcile = Some(Arc::new(on_reconcile));
        self
    }
}

impl<T, C> Default for ViewportOptions<T, C> {
    fn default() -> Self {
        Self {
            cell_factory: None,
            buffer_size: BufferSize::Standard,
            cache_capacity: 10,
            item_extent: 1,
            layout_mode: LayoutMode::Fixed,
            min_element_extent: 0,
            initial_geometry: Geometry::default(),
            prewarm_cache: false,
            on_reconcile: None,
        }
    }
}

impl<T, C> Clone for ViewportOptions<T, C> {
    fn clone(&self) -> Self {
        Self {
            cell_factory: self.cell_factory.clone(),
            buffer_size: self.buffer_size,
            cache_capacity: self.cache_capacity,
            item_extent: self.item_extent,
            layout_mode: self.layout_mode,
            min_element_extent: self.min_element_extent,
            initial_geometry: self.initial_geometry,
            prewarm_cache: self.prewarm_cache,
            on_reconcile: self.on_reconcile.clone(),
        }
    }
}

impl<T, C> core::fmt::Debug for ViewportOptions<T, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ViewportOptions")
            .field("buffer_size", &self.buffer_size)
            .field("cache_capacity", &self.cache_capacity)
            .field("item_extent", &self.item_extent)
            .field("layout_mode", &self.layout_mode)
            .field("min_element_extent", &self.min_element_extent)
            .field("initial_geometry", &self.initial_geometry)
            .field("prewarm_cache", &self.prewarm_cache)
            .field("has_cell_factory", &self.cell_factory.is_some())
            .finish_non_exhaustive()
    }
}
