use alloc::vec::Vec;

/// Cached geometry of one element on the secondary axis.
///
/// `None` marks a value that must be recomputed. `stamp` is the cache epoch in which the
/// position was last computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayoutInfo {
    pref_width: u32,
    width: Option<u32>,
    pos: Option<u64>,
    visible: Option<bool>,
    stamp: u64,
}

impl LayoutInfo {
    fn new(pref_width: u32) -> Self {
        Self {
            pref_width,
            ..Self::default()
        }
    }

    pub fn pref_width(&self) -> u32 {
        self.pref_width
    }

    pub fn width(&self) -> Option<u32> {
        self.width
    }

    pub fn position(&self) -> Option<u64> {
        self.pos
    }

    pub fn visibility(&self) -> Option<bool> {
        self.visible
    }

    pub fn stamp(&self) -> u64 {
        self.stamp
    }
}

/// Lazily computed widths, positions and visibility for elements laid out along one axis,
/// such as the columns of a table.
///
/// Positions form a prefix chain: element `i` starts where `i - 1` ends, element `0` at the
/// origin. A width change therefore invalidates the positions of every following element and
/// never of a preceding one. The last element absorbs whatever viewport extent the others
/// leave free, so its width depends on everyone else's.
#[derive(Clone, Debug, Default)]
pub struct AxisLayoutCache {
    infos: Vec<LayoutInfo>,
    min_width: u32,
    viewport_offset: u64,
    viewport_extent: u32,
    epoch: u64,
}

impl AxisLayoutCache {
    pub fn new(min_width: u32) -> Self {
        Self {
            min_width,
            ..Self::default()
        }
    }

    pub fn from_widths(min_width: u32, widths: impl IntoIterator<Item = u32>) -> Self {
        let mut cache = Self::new(min_width);
        cache.infos = widths.into_iter().map(LayoutInfo::new).collect();
        cache
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Bumped by every invalidating operation.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn min_width(&self) -> u32 {
        self.min_width
    }

    pub fn viewport(&self) -> (u64, u32) {
        (self.viewport_offset, self.viewport_extent)
    }

    pub fn info(&self, index: usize) -> Option<&LayoutInfo> {
        self.infos.get(index)
    }

    pub fn is_width_valid(&self, index: usize) -> bool {
        self.infos.get(index).is_some_and(|info| info.width.is_some())
    }

    pub fn is_position_valid(&self, index: usize) -> bool {
        self.infos.get(index).is_some_and(|info| info.pos.is_some())
    }

    pub fn cached_visibility(&self, index: usize) -> Option<bool> {
        self.infos.get(index).and_then(|info| info.visible)
    }

    pub fn width(&mut self, index: usize) -> Option<u32> {
        let info = self.infos.get(index)?;
        if let Some(width) = info.width {
            return Some(width);
        }
        let width = self.compute_width(index);
        self.infos[index].width = Some(width);
        Some(width)
    }

    pub fn position(&mut self, index: usize) -> Option<u64> {
        if index >= self.infos.len() {
            return None;
        }
        let mut at = index;
        while self.infos[at].pos.is_none() && at > 0 {
            at -= 1;
        }
        let mut pos = match self.infos[at].pos {
            Some(pos) => pos,
            None => {
                self.store_position(0, 0);
                0
            }
        };
        while at < index {
            pos = pos.saturating_add(self.width(at).unwrap_or(0) as u64);
            at += 1;
            self.store_position(at, pos);
        }
        Some(pos)
    }

    /// Whether the element intersects the viewport. Cached until the viewport or the element's
    /// geometry changes.
    pub fn is_visible(&mut self, index: usize) -> Option<bool> {
        let info = self.infos.get(index)?;
        if let Some(visible) = info.visible {
            return Some(visible);
        }
        let pos = self.position(index)?;
        let width = self.width(index)? as u64;
        let end = self
            .viewport_offset
            .saturating_add(self.viewport_extent as u64);
        let visible = pos < end && pos.saturating_add(width) > self.viewport_offset;
        self.infos[index].visible = Some(visible);
        Some(visible)
    }

    pub fn total_width(&mut self) -> u64 {
        let Some(last) = self.last() else {
            return 0;
        };
        let pos = self.position(last).unwrap_or(0);
        pos.saturating_add(self.width(last).unwrap_or(0) as u64)
    }

    /// Changes the preferred width of an element. Returns whether anything changed.
    ///
    /// Positions from `index` onwards and the width of the last element are invalidated.
    pub fn resize(&mut self, index: usize, pref_width: u32) -> bool {
        let Some(info) = self.infos.get_mut(index) else {
            return false;
        };
        if info.pref_width == pref_width {
            return false;
        }
        info.pref_width = pref_width;
        info.width = None;
        self.epoch += 1;
        self.invalidate_from(index);
        if Some(index) != self.last() {
            self.invalidate_last_width();
        }
        vtrace!(index, pref_width, epoch = self.epoch, "layout element resized");
        true
    }

    pub fn insert(&mut self, index: usize, pref_width: u32) {
        self.infos.insert(index, LayoutInfo::new(pref_width));
        self.epoch += 1;
        self.invalidate_from(index);
        // The former last element no longer absorbs the free extent.
        if let Some(prev_last) = self.last().and_then(|last| last.checked_sub(1)) {
            self.infos[prev_last].width = None;
            self.infos[prev_last].visible = None;
        }
        self.invalidate_last_width();
    }

    pub fn push(&mut self, pref_width: u32) {
        self.insert(self.infos.len(), pref_width);
    }

    /// Removes an element, returning its preferred width.
    pub fn remove(&mut self, index: usize) -> Option<u32> {
        if index >= self.infos.len() {
            return None;
        }
        let info = self.infos.remove(index);
        self.epoch += 1;
        if index < self.infos.len() {
            self.invalidate_from(index);
        }
        self.invalidate_last_width();
        Some(info.pref_width)
    }

    pub fn set_min_width(&mut self, min_width: u32) {
        if self.min_width == min_width {
            return;
        }
        self.min_width = min_width;
        self.epoch += 1;
        for info in &mut self.infos {
            info.width = None;
            info.pos = None;
            info.visible = None;
        }
    }

    pub fn set_viewport(&mut self, offset: u64, extent: u32) {
        if self.viewport_offset == offset && self.viewport_extent == extent {
            return;
        }
        let extent_changed = self.viewport_extent != extent;
        self.viewport_offset = offset;
        self.viewport_extent = extent;
        self.epoch += 1;
        for info in &mut self.infos {
            info.visible = None;
        }
        if extent_changed {
            self.invalidate_last_width();
        }
    }

    pub fn clear(&mut self) {
        self.infos.clear();
        self.epoch += 1;
    }

    fn last(&self) -> Option<usize> {
        self.infos.len().checked_sub(1)
    }

    fn compute_width(&mut self, index: usize) -> u32 {
        let base = self.infos[index].pref_width.max(self.min_width);
        let len = self.infos.len();
        if len == 1 {
            return base.max(self.viewport_extent);
        }
        if index + 1 < len {
            return base;
        }
        let mut partial = 0u64;
        for other in 0..len - 1 {
            partial = partial.saturating_add(self.width(other).unwrap_or(0) as u64);
        }
        let free = (self.viewport_extent as u64).saturating_sub(partial);
        base.max(u32::try_from(free).unwrap_or(u32::MAX))
    }

    fn store_position(&mut self, index: usize, pos: u64) {
        let info = &mut self.infos[index];
        info.pos = Some(pos);
        info.stamp = self.epoch;
    }

    /// Invalidates position and visibility of `index` and every following element, stopping
    /// at the first position that is already invalid.
    fn invalidate_from(&mut self, index: usize) {
        let Some(first) = self.infos.get_mut(index) else {
            return;
        };
        first.pos = None;
        first.visible = None;
        for info in self.infos.iter_mut().skip(index + 1) {
            if info.pos.is_none() {
                break;
            }
            info.pos = None;
            info.visible = None;
        }
    }

    fn invalidate_last_width(&mut self) {
        if let Some(last) = self.last() {
            self.infos[last].width = None;
            self.infos[last].visible = None;
        }
    }
}
