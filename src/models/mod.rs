//! Data models for bizacquire.

mod business;
mod category;
mod source;

pub use business::{normalize_name, BusinessRecord, DayHours, OpeningHours, MIN_NAME_LEN};
pub use category::Category;
pub use source::{ParserKind, SourceDefinition};
