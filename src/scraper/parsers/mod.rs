//! HTML parsers for FC Online DataCenter pages.

pub mod price;

pub use price::{readiness_script, PriceParser};
