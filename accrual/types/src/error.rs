use {
    accrual_math::{MathError, Udec128},
    thiserror::Error,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    #[error(transparent)]
    Math(#[from] MathError),

    #[error("borrower checkpoint is ahead of the global index! checkpoint: {checkpoint}, index: {index}")]
    StaleIndex { checkpoint: Udec128, index: Udec128 },
}

pub type AccountResult<T> = core::result::Result<T, AccountError>;
