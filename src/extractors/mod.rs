// src/extractors/mod.rs
pub mod date;
pub mod fields;
pub mod reason;

// Re-export key extraction types for convenience
#[allow(unused_imports)]
pub use date::{parse_date, ParsedDate};
#[allow(unused_imports)]
pub use fields::{ChangeDirection, FieldExtractor, PercentageChange, ReportFields};
#[allow(unused_imports)]
pub use reason::{ReasonCategorizer, ReasonType};
