//! Broker-side order interface
//!
//! The live manager drives any venue through this trait; tests substitute a
//! mock to script confirmations and failures.

use thiserror::Error;

use crate::types::Direction;

pub type TicketId = u64;

#[derive(Debug, Error)]
pub enum BrokerError {
    /// Venue refused the request
    #[error("order rejected: {0}")]
    Rejected(String),
    /// Transport failure; the request may or may not have been applied
    #[error("connection to broker lost")]
    ConnectionLost,
}

/// Order operations a live execution venue must provide
#[cfg_attr(test, mockall::automock)]
pub trait ExecutionSink {
    /// Open a market order; returns the venue's ticket.
    fn place_order(
        &mut self,
        direction: Direction,
        volume: f64,
        stop: f64,
        target: Option<f64>,
    ) -> Result<TicketId, BrokerError>;

    /// Close `volume` of an open ticket.
    fn close_partial(&mut self, ticket: TicketId, volume: f64) -> Result<(), BrokerError>;

    /// Move the stop of an open ticket.
    fn modify_stop(&mut self, ticket: TicketId, new_stop: f64) -> Result<(), BrokerError>;
}
