pub mod error;
pub mod loan;
pub mod rates;
pub mod tax;
pub mod time_value;
pub mod types;

#[cfg(feature = "comparison")]
pub mod comparison;

pub use error::MortgageError;
pub use types::*;

/// Standard result type for all mortgage operations
pub type MortgageResult<T> = Result<T, MortgageError>;
