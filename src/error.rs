use bacon_rajan_cc::Cc;
use thiserror::Error;

use crate::expr::Object;

/// Fatal evaluation errors. Any of these unwinds the whole in-progress
/// evaluation and resumes at the top-level driver loop.
#[derive(Debug, Clone, Error)]
pub enum EvalError {
    #[error("unbound variable `{0}`")]
    UnboundVariable(String),
    #[error("not a procedure: {0}")]
    NotAProcedure(String),
    #[error("wrong number of arguments to {callee} (expected {expected}, got {got})")]
    ArityMismatch {
        callee: String,
        expected: String,
        got: usize,
    },
    #[error("malformed {0} form")]
    MalformedSpecialForm(&'static str),
    #[error("type error: {0}")]
    TypeError(String),
    #[error("continuation invoked outside its capture extent")]
    InvalidContinuationUse,
}

/// Non-local transfer raised during evaluation: either a fatal error or a
/// continuation escape travelling to its capture point.
#[derive(Debug)]
pub enum Signal {
    Error(EvalError),
    Escape { token: u64, value: Cc<Object> },
}

impl Signal {
    /// Collapse to the user-facing error. An escape that got this far
    /// outlived its capture point.
    pub fn into_error(self) -> EvalError {
        match self {
            Signal::Error(error) => error,
            Signal::Escape { .. } => EvalError::InvalidContinuationUse,
        }
    }
}

impl From<EvalError> for Signal {
    fn from(error: EvalError) -> Signal {
        Signal::Error(error)
    }
}

pub type EvalResult = Result<Cc<Object>, Signal>;
