//! Engine errors

use fos_dom::{NodeId, SelectorError};

/// Errors surfaced by `create` and configuration loading.
///
/// Everything after setup degrades silently (logged, never returned).
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    #[error("root {0:?} is not a node of the document")]
    InvalidRoot(NodeId),

    #[error("root selector `{0}` matched no element")]
    RootNotFound(String),

    #[error("invalid root selector: {0}")]
    Selector(#[from] SelectorError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
