//! A headless viewport reconciliation engine for virtualized lists and tables.
//!
//! Large ordered collections are shown through a bounded viewport by materializing only a
//! small, reused working set of *cells* for the visible (plus buffered) indices. This crate
//! keeps that working set in step with the viewport:
//! - it computes which indices must be represented ([`RangeCalculator`]),
//! - it maps indices and items to the cells assigned to them ([`IndexItemCellMap`]),
//! - it recycles cells across scrolls, resizes and collection mutations
//!   ([`ChangeReconciler`]) and parks idle ones in a bounded [`CellCache`].
//!
//! It is UI-agnostic. A TUI/GUI layer is expected to provide:
//! - a [`Cell`] implementation and a factory for it
//! - viewport extent and scroll offset
//! - collection mutations as [`ChangeBatch`]es (or use [`ObservedList`])
//!
//! Painting, placement and input handling stay with the host toolkit: after each pass the
//! materialized `(index, cell)` pairs are available from [`Viewport::cells`].
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod cache;
mod cell;
mod change;
mod error;
mod identity;
mod layout;
mod list;
mod map;
mod options;
mod range;
mod reconciler;
mod state;
mod viewport;


pub use cache::CellCache;
pub use cell::{Cell, CellFactory};
pub use change::{ChangeBatch, ChangeKind, ChangeOp, Decomposition};
pub use error::Error;
pub use identity::{ItemAddr, ItemId};
pub use layout::{AxisLayoutCache, LayoutInfo};
pub use list::{ChangeListener, ObservedList};
pub use map::{IndexItemCellMap, Validity};
pub use options::{BufferSize, LayoutMode, OnReconcileCallback, ViewportOptions};
pub use range::{IndexRange, RangeCalculator};
pub use reconciler::{ChangeReconciler, Reconciliation, UpdateKind};
pub use state::{Geometry, ViewportState};
pub use viewport::Viewport;
