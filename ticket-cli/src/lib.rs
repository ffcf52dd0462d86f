//! Customer-support ticket triage.
//!
//! Library half of the `ticket-triage` binary: configuration, the ticket
//! domain types and schemas, and command runners that work with any
//! [`ModelCall`](structured_extractor::model::ModelCall).

pub mod app;
pub mod cli;
pub mod config;
pub mod errors;
pub mod ticket;

pub use config::AppConfig;
pub use errors::AppError;
pub use ticket::{CustomerSentiment, Reply, Ticket, TicketCategory};
