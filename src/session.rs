//! Named trading sessions and their wall-clock windows
//!
//! Session membership is decided on the instrument's local clock (configured
//! timezone), inclusive on both ends of the window.

use anyhow::{Context, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Named session, used as part of the profile cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionId {
    Asia,
    London,
}

impl SessionId {
    /// Uppercase tag used in signal reason strings
    pub fn tag(&self) -> &'static str {
        match self {
            SessionId::Asia => "ASIA",
            SessionId::London => "LONDON",
        }
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionId::Asia => write!(f, "asia"),
            SessionId::London => write!(f, "london"),
        }
    }
}

/// Inclusive `[start, end]` wall-clock window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl SessionWindow {
    /// Parse a window from "HH:MM" bounds
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start = NaiveTime::parse_from_str(start, "%H:%M")
            .with_context(|| format!("invalid session start time '{start}'"))?;
        let end = NaiveTime::parse_from_str(end, "%H:%M")
            .with_context(|| format!("invalid session end time '{end}'"))?;
        Ok(Self { start, end })
    }

    /// Inclusive membership on both ends, matching HH:MM string comparison
    pub fn contains(&self, t: NaiveTime) -> bool {
        self.start <= t && t <= self.end
    }
}
