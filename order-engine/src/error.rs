use crate::book::BookError;
use crate::lifecycle::IllegalTransition;
use oms_api::{OrderId, Symbol};
use thiserror::Error;

/// Engine-level failures.
///
/// Risk rejections are deliberately absent: a rejected order is a normal
/// business outcome and comes back as `Submission::Rejected`, not as an
/// error. Everything here is either a caller mistake (unknown id, bad
/// request), a refused lifecycle move, or a broken invariant that has halted
/// the symbol.
#[derive(Debug, Error)]
pub enum OmsError {
    #[error("order {id}: {source}")]
    Transition {
        id: OrderId,
        #[source]
        source: IllegalTransition,
    },

    #[error(transparent)]
    Book(#[from] BookError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no order for client id {0}")]
    UnknownClient(String),

    /// Fatal for the symbol it names: the book is halted and every further
    /// mutation on that symbol fails with this error. Other symbols keep
    /// processing.
    #[error("invariant violated on {symbol}: {detail}")]
    InvariantViolation { symbol: Symbol, detail: String },
}

pub type Result<T> = std::result::Result<T, OmsError>;
