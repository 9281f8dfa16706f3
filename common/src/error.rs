use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecError {
    #[error("decimal overflow")]
    Overflow,

    #[error("division by zero")]
    DivisionByZero,

    #[error("decimal is negative")]
    Negative,

    #[error("invalid decimal string: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoinError {
    #[error("invalid denom: {0}")]
    InvalidDenom(String),

    #[error("duplicate denomination {0}")]
    DuplicateDenom(String),

    #[error("coin {0} amount is not positive")]
    NotPositive(String),

    #[error("coins are not sorted: {0}")]
    Unsorted(String),

    #[error("coin amount overflow")]
    Overflow,

    #[error("insufficient amount: need {need}, have {have}")]
    Insufficient { need: String, have: String },

    #[error("invalid coin string: {0}")]
    Parse(String),

    #[error(transparent)]
    Dec(#[from] DecError),
}
