pub mod comparison;
pub mod loan;
pub mod rates;
pub mod tax;
