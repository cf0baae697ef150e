use crate::ChangeOp;

/// Errors reported by the reconciliation engine.
///
/// Every error is raised before any state is touched: a failed call leaves the viewport, its
/// cell map and its cache exactly as they were.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// No cell factory is configured where one is required.
    #[error("no cell factory is configured")]
    MissingCellFactory,
    /// A change op does not fit the collection length it applies to.
    #[error("change {op:?} is out of bounds for a collection of {len} items")]
    InvalidChange { op: ChangeOp, len: usize },
    /// The net effect of a change batch disagrees with the new collection length.
    #[error("change batch yields {expected} items but the collection holds {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    /// The variable-extent layout cache is out of sync with the collection.
    #[error("layout cache holds {elements} elements but the collection holds {count}")]
    LayoutMismatch { elements: usize, count: usize },
}
