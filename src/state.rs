use crate::{BufferSize, IndexRange, LayoutMode};

/// Scroll offset and viewport extent along the primary axis.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Geometry {
    pub scroll_offset: u64,
    pub viewport_extent: u32,
}

impl Geometry {
    pub fn new(scroll_offset: u64, viewport_extent: u32) -> Self {
        Self {
            scroll_offset,
            viewport_extent,
        }
    }

    pub fn with_scroll_offset(self, scroll_offset: u64) -> Self {
        Self {
            scroll_offset,
            ..self
        }
    }

    pub fn with_viewport_extent(self, viewport_extent: u32) -> Self {
        Self {
            viewport_extent,
            ..self
        }
    }
}

/// A serializable snapshot of a viewport: where it is and what it materializes.
///
/// This is useful for restoring scroll position across sessions without persisting any cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewportState {
    pub geometry: Geometry,
    pub range: IndexRange,
    pub count: usize,
    pub buffer_size: BufferSize,
    pub layout_mode: LayoutMode,
    pub cached_cells: usize,
}
