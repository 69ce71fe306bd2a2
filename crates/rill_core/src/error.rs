//! Error types for rill_core

use thiserror::Error;

/// Errors surfaced by holders, observables, and stores.
///
/// Mutation-path errors inside user transforms are not represented
/// here; they propagate to the caller untouched. The only contract
/// violation the core itself detects is use after disposal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// An operation reached a holder or store whose `dispose()` has
    /// already completed. Disposing twice reports the same error.
    #[error("{0} used after disposal")]
    UsedAfterDisposal(String),
}

/// Result type for rill_core operations
pub type Result<T> = std::result::Result<T, StateError>;
