//! Live trade management over an execution sink
//!
//! Local state only moves after the venue confirms. Exits are planned against
//! the incoming tick, sent to the sink, and applied on success; a failed
//! close leaves the position exactly as it was so the next tick retries.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::TradeManagementConfig;
use crate::types::{ClosedTrade, Signal};

use super::broker::{BrokerError, ExecutionSink, TicketId};
use super::fill::FillModel;
use super::position::{Position, TradeUpdate};

pub struct LiveTradeManager<E: ExecutionSink> {
    sink: E,
    cfg: TradeManagementConfig,
    fill: FillModel,
    ticket: Option<TicketId>,
    position: Option<Position>,
    closed: Vec<ClosedTrade>,
}

impl<E: ExecutionSink> LiveTradeManager<E> {
    pub fn new(sink: E, cfg: TradeManagementConfig, fill: FillModel) -> Self {
        Self {
            sink,
            cfg,
            fill,
            ticket: None,
            position: None,
            closed: Vec::new(),
        }
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    /// Open a position from a signal at the current quote. The order goes to
    /// the venue first; only a confirmed ticket creates local state.
    pub fn open(
        &mut self,
        signal: &Signal,
        time: DateTime<Utc>,
        entry_price: f64,
    ) -> Result<(), BrokerError> {
        let tp2 = signal.tp2.or(Some(signal.take_profit));
        let ticket = self.sink.place_order(
            signal.direction,
            self.cfg.entry_lot,
            signal.stop_loss,
            tp2,
        )?;

        info!(
            ticket,
            direction = %signal.direction,
            entry_price,
            reason = %signal.reason,
            "order placed"
        );
        self.ticket = Some(ticket);
        self.position = Some(Position::open(
            signal,
            time,
            entry_price,
            self.cfg.entry_lot,
            self.cfg.tp1_close_lot,
            signal.tp1,
            tp2,
        ));
        Ok(())
    }

    /// Advance the open position on a quote.
    ///
    /// Returns the applied update, `Ok(None)` when nothing triggered, or the
    /// broker error with the position left untouched.
    pub fn on_tick(
        &mut self,
        time: DateTime<Utc>,
        bid: f64,
        ask: f64,
        atr: f64,
    ) -> Result<Option<TradeUpdate>, BrokerError> {
        let Some(pos) = self.position.take() else {
            return Ok(None);
        };
        let Some(intent) = pos.check_tick(bid, ask) else {
            self.position = Some(pos);
            return Ok(None);
        };
        let Some(ticket) = self.ticket else {
            self.position = Some(pos);
            return Err(BrokerError::Rejected("no ticket for open position".into()));
        };

        if let Err(e) = self.sink.close_partial(ticket, intent.lot) {
            warn!(ticket, error = %e, "close failed, keeping position");
            self.position = Some(pos);
            return Err(e);
        }

        let prev_stop = pos.stop_loss;
        let (mut pos, update) = pos.apply_exit(intent, atr, &self.cfg, &self.fill, time);

        if update.closed_all {
            info!(ticket, event = %update.event, pnl = pos.realized_pnl, "position closed");
            self.ticket = None;
            if let Some(trade) = pos.into_closed() {
                self.closed.push(trade);
            }
        } else {
            // Runner stays open after TP1: mirror the BE+ stop at the venue.
            // A failed modify keeps the confirmed partial but reverts the
            // local stop so it stays in sync with the broker's.
            if let Err(e) = self.sink.modify_stop(ticket, pos.stop_loss) {
                warn!(ticket, error = %e, "stop modify failed, reverting local stop");
                pos.stop_loss = prev_stop;
            }
            self.position = Some(pos);
        }

        Ok(Some(update))
    }

    /// Take ownership of the finished trade log.
    pub fn drain_closed(&mut self) -> Vec<ClosedTrade> {
        std::mem::take(&mut self.closed)
    }
}
