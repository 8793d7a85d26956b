//! Text, URL and freshness normalization shared by every extractor.
//!
//! - [`clean_text`] / [`truncate_chars`] - whitespace cleanup and bounded fields
//! - [`canonicalize`] / [`resolve`] - link identity used for deduplication
//! - [`parse_relative_age`] - "hace 2 días" style freshness to hours

pub mod age;
pub mod links;
pub mod text;

pub use age::{hours_since_date, parse_posted, parse_relative_age};
pub use links::{canonicalize, resolve, TRACKING_PARAMS};
pub use text::{clean_text, truncate_chars};
