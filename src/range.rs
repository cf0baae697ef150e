use core::fmt;
use core::ops::RangeInclusive;

use crate::Geometry;
use crate::layout::AxisLayoutCache;

/// A closed interval of indices `[min, max]`, or the [`IndexRange::INVALID`] sentinel.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexRange {
    min: usize,
    max: usize,
}

impl IndexRange {
    /// The empty range: nothing is materialized.
    pub const INVALID: Self = Self {
        min: usize::MAX,
        max: 0,
    };

    /// Builds `[min, max]`. Returns [`IndexRange::INVALID`] when `min > max`.
    pub fn new(min: usize, max: usize) -> Self {
        if min > max {
            return Self::INVALID;
        }
        Self { min, max }
    }

    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }

    pub fn is_empty(&self) -> bool {
        !self.is_valid()
    }

    /// Lower bound. Meaningless for the invalid range.
    pub fn min(&self) -> usize {
        self.min
    }

    /// Upper bound (inclusive). Meaningless for the invalid range.
    pub fn max(&self) -> usize {
        self.max
    }

    pub fn len(&self) -> usize {
        if self.is_valid() {
            self.max - self.min + 1
        } else {
            0
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.is_valid() && self.min <= index && index <= self.max
    }

    pub fn intersection(&self, other: &Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::INVALID;
        }
        Self::new(self.min.max(other.min), self.max.min(other.max))
    }

    pub fn iter(&self) -> RangeInclusive<usize> {
        if self.is_valid() {
            self.min..=self.max
        } else {
            // An empty inclusive range.
            1..=0
        }
    }
}

impl Default for IndexRange {
    fn default() -> Self {
        Self::INVALID
    }
}

impl IntoIterator for IndexRange {
    type Item = usize;
    type IntoIter = RangeInclusive<usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for IndexRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "[{}, {}]", self.min, self.max)
        } else {
            f.write_str("[INVALID]")
        }
    }
}

/// Computes the index range a viewport needs to materialize.
///
/// All functions are pure: identical inputs yield identical ranges, which is what lets the
/// reconciler skip no-op geometry updates.
pub struct RangeCalculator;

impl RangeCalculator {
    /// Number of items needed to cover `viewport_extent`, rounding partial items up.
    pub fn visible_count(viewport_extent: u32, item_extent: u32) -> usize {
        if item_extent == 0 {
            return 0;
        }
        viewport_extent.div_ceil(item_extent) as usize
    }

    pub fn first_visible(scroll_offset: u64, item_extent: u32, count: usize) -> Option<usize> {
        if count == 0 || item_extent == 0 {
            return None;
        }
        Some(clamp_index(scroll_offset / item_extent as u64, count))
    }

    pub fn last_visible(geometry: Geometry, item_extent: u32, count: usize) -> Option<usize> {
        if count == 0 || item_extent == 0 {
            return None;
        }
        let total = (count as u64).saturating_mul(item_extent as u64);
        let end = geometry
            .scroll_offset
            .saturating_add(geometry.viewport_extent as u64)
            .min(total);
        Some(clamp_index(end / item_extent as u64, count))
    }

    /// Range for a fixed-extent axis.
    ///
    /// The window holds `min(count, visible + 2 * buffer)` indices. It starts `buffer` items
    /// before the first visible one and is pulled back when it would run past the end.
    pub fn fixed(geometry: Geometry, item_extent: u32, count: usize, buffer: usize) -> IndexRange {
        if geometry.viewport_extent == 0 {
            return IndexRange::INVALID;
        }
        let Some(first) = Self::first_visible(geometry.scroll_offset, item_extent, count) else {
            return IndexRange::INVALID;
        };
        let visible = Self::visible_count(geometry.viewport_extent, item_extent);
        let needed = visible.saturating_add(buffer.saturating_mul(2)).min(count);
        if needed == 0 {
            return IndexRange::INVALID;
        }

        let mut min = first.saturating_sub(buffer);
        let max = (count - 1).min(min + needed - 1);
        if max - min + 1 < needed {
            min = (max + 1).saturating_sub(needed);
        }
        IndexRange::new(min, max)
    }

    /// Range for a variable-extent axis, walking the layout cache's prefix positions.
    pub fn variable(
        layout: &mut AxisLayoutCache,
        geometry: Geometry,
        buffer: usize,
    ) -> IndexRange {
        let len = layout.len();
        if len == 0 || geometry.viewport_extent == 0 {
            return IndexRange::INVALID;
        }
        let start = geometry.scroll_offset;
        let end = start.saturating_add(geometry.viewport_extent as u64);

        // Position 0 is always 0, so both searches find at least one element.
        let first = partition(len, |i| layout.position(i).is_some_and(|p| p <= start)) - 1;
        let last = partition(len, |i| layout.position(i).is_some_and(|p| p < end)) - 1;

        let min = first.saturating_sub(buffer);
        let max = last.saturating_add(buffer).min(len - 1);
        IndexRange::new(min, max)
    }
}

fn clamp_index(index: u64, count: usize) -> usize {
    index.min(count as u64 - 1) as usize
}

/// Number of leading indices in `0..len` for which the monotone `pred` holds.
fn partition(len: usize, mut pred: impl FnMut(usize) -> bool) -> usize {
    let (mut lo, mut hi) = (0usize, len);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if pred(mid) {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}
