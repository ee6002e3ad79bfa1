//! Byte-stream composition for segmented retrieval.
//!
//! The consumer-facing contract is plain [`std::io::Read`]: segment
//! boundaries are invisible to whatever drains the stream (a copy loop or a
//! downstream format parser).

mod bounded;
mod counting;
mod multi;

pub use bounded::BoundedReader;
pub use counting::CountingReader;
pub use multi::MultiReader;

/// A byte source as seen by the composed stream. Boxed because segments mix
/// in-memory cursors with live HTTP bodies.
pub type ByteSource = Box<dyn std::io::Read>;
