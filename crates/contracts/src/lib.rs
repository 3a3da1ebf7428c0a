//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Record Model
//! - A [`Record`] is one telemetry measurement: name, tags, fields, UTC timestamp
//! - Tags added by enrichment are plain string key/value pairs

mod blueprint;
mod emit;
mod error;
mod record;
mod sink;

pub use blueprint::*;
pub use emit::Emitter;
pub use error::*;
pub use record::*;
pub use sink::*;
