//! Danish interest deduction and the cross-border view of a foreign rental
//! property, plus the combined monthly picture.

pub mod combined;
pub mod deduction;
pub mod foreign_property;

pub use combined::{analyze_combined, combined_monthly_picture, CombinedInput, TaxAdjustedResult};
pub use deduction::{compute_rentefradrag, monthly_rentefradrag, yearly_summary, YearSummary};
pub use foreign_property::{analyze_foreign_property, ForeignPropertyParams, ForeignPropertyResult};
