//! Error types for the scheduling core.

use crate::store::StoreError;

/// Errors that can abort a scheduling round.
///
/// Note the deliberate narrowness: duplicate-constraint conflicts are
/// absorbed inside the store as benign no-ops, per-agent failures are
/// caught at the agent loop boundary, and content-synthesis failures
/// downgrade to "nothing to say." Only storage failures outside any
/// agent's scope (snapshot loads) surface here.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// A storage operation failed outside any per-agent isolation scope.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },
}
