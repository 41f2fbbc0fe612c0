//! Trade execution: fill simulation, position lifecycle, live order routing

mod broker;
mod fill;
mod live;
mod position;

pub use broker::{BrokerError, ExecutionSink, TicketId};
pub use fill::FillModel;
pub use live::LiveTradeManager;
pub use position::{ExitEvent, ExitIntent, ExitKind, Position, TradeUpdate};

#[cfg(test)]
pub use broker::MockExecutionSink;
