//! Client for ticket-based segmented retrieval in the htsget style.
//!
//! A server answers a query with a ticket: an ordered list of segments,
//! each an inline base64 payload or a remote URL with optional byte range
//! and headers. This crate fetches the ticket, retrieves every segment and
//! presents the concatenation as one ordered, seekless [`std::io::Read`]
//! stream.

pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod report;
pub mod resolve;
pub mod stream;
pub mod ticket;

pub use client::{ClientOptions, TicketClient};
pub use config::Config;
pub use error::{Error, Result};
