//! General-purpose helpers.
//!
//! - [`arr`] - dot-notation access over JSON values
//! - [`strings`] - case conversion, slugs, searching
//! - [`dump`] - debug rendering of values

pub mod arr;
pub mod dump;
pub mod strings;

pub use dump::{dd, dump, escape_html};
pub use strings::SlugOptions;
