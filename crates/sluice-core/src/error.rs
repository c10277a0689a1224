//! Error types for Sluice payment streams.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurveError {
    #[error("arithmetic overflow")] ArithmeticOverflow,
    #[error("invalid interval: start {start} must be before stop {stop}")] InvalidInterval { start: u64, stop: u64 },
    #[error("invalid curve spread: {0} ppb")] InvalidSpread(u64),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid length: expected 40 hex characters, got {0}")] InvalidLength(usize),
    #[error("invalid hex: {0}")] InvalidHex(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient balance: have {have}, need {need}")] InsufficientBalance { have: u128, need: u128 },
    #[error("insufficient allowance: have {have}, need {need}")] InsufficientAllowance { have: u128, need: u128 },
    #[error("balance overflow")] BalanceOverflow,
    #[error("transfer refused: {0}")] Refused(String),
}

/// Failures of the stream lifecycle and accounting operations.
///
/// Every variant is reported before any state is touched, so a failed call
/// leaves the engine exactly as it found it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    // validation
    #[error("deposit amount is zero")] ZeroDeposit,
    #[error("withdrawal amount is zero")] ZeroAmount,
    #[error("start height {start} must be before stop height {stop}")] InvalidInterval { start: u64, stop: u64 },
    #[error("start height {start} is before the current height {current}")] StartInPast { start: u64, current: u64 },
    #[error("stream to the zero address")] RecipientIsZero,
    #[error("stream to the caller")] RecipientIsSender,
    #[error("stream to the engine itself")] RecipientIsEngine,
    #[error("deposit {deposit} exceeds the curve limit {max}")] DepositTooLarge { deposit: u128, max: u128 },
    #[error("token {0} is not accepted by this engine")] TokenNotAccepted(String),
    #[error("height {got} is below the last processed height {last}")] HeightRegression { last: u64, got: u64 },
    // authorization
    #[error("caller is not the sender or the recipient of the stream")] Unauthorized,
    // insufficient funds
    #[error("amount exceeds the available balance")] AmountExceedsBalance { requested: u128, available: u128 },
    #[error("insufficient allowance: have {have}, need {need}")] InsufficientAllowance { have: u128, need: u128 },
    #[error("insufficient funds: have {have}, need {need}")] InsufficientFunds { have: u128, need: u128 },
    // not found
    #[error("stream does not exist")] StreamNotFound(u64),
    #[error("stream {0} is already settled")] StreamSettled(u64),
    // defects
    #[error("accounting invariant violated: {0}")] AccountingInvariant(String),
    #[error("id space exhausted")] IdExhausted,
    #[error(transparent)] Curve(#[from] CurveError),
    #[error(transparent)] Ledger(#[from] LedgerError),
}

impl StreamError {
    /// Coarse class of the failure, for callers that only branch on the kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ZeroDeposit
            | Self::ZeroAmount
            | Self::InvalidInterval { .. }
            | Self::StartInPast { .. }
            | Self::RecipientIsZero
            | Self::RecipientIsSender
            | Self::RecipientIsEngine
            | Self::DepositTooLarge { .. }
            | Self::TokenNotAccepted(_)
            | Self::HeightRegression { .. } => ErrorKind::Validation,
            Self::Unauthorized => ErrorKind::Authorization,
            Self::AmountExceedsBalance { .. }
            | Self::InsufficientAllowance { .. }
            | Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::StreamNotFound(_) | Self::StreamSettled(_) => ErrorKind::NotFound,
            Self::AccountingInvariant(_) | Self::IdExhausted | Self::Curve(_) | Self::Ledger(_) => {
                ErrorKind::Defect
            }
        }
    }
}

/// The error classes callers are expected to distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad arguments; rejected before any state change.
    Validation,
    /// The caller is not a party to the stream.
    Authorization,
    /// Not enough claimable balance, allowance or ledger funds.
    InsufficientFunds,
    /// The stream does not exist or is already terminal.
    NotFound,
    /// Internal inconsistency. Never expected in a correct engine.
    Defect,
}

#[derive(Error, Debug)]
pub enum SluiceError {
    #[error(transparent)] Stream(#[from] StreamError),
    #[error(transparent)] Curve(#[from] CurveError),
    #[error(transparent)] Ledger(#[from] LedgerError),
    #[error("snapshot: {0}")] Snapshot(String),
    #[error("config: {0}")] Config(String),
}
