//! Core types, analytics, and the forecast engine for Lustre.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! daily sales source, the projection cache, and the narrative text service
//! are all traits; concrete backends live in sibling crates.

pub mod aggregate;
pub mod analysis;
pub mod engine;
pub mod error;
pub mod forecast;
pub mod insight;
pub mod momentum;
pub mod period;
pub mod projection;
pub mod report;
pub mod sales;
pub mod seasonal;
pub mod stats;
pub mod store;

pub use error::{Error, Result};
