//! Session profile cache
//!
//! Memoizes one ProfilePack per (day, session) over the minute-bar series.
//! Entries never expire on their own: appending minute bars invalidates the
//! cached packs for the days those bars touch, and explicit invalidation is
//! available for everything else. No internal locking; wrap the cache if it
//! is shared across threads.

use chrono::NaiveDate;
use chrono_tz::Tz;
use std::collections::{HashMap, HashSet};

use super::builder::VolumeProfile;
use super::zones::{extract_zones, Zone};
use crate::config::VpConfig;
use crate::session::{SessionId, SessionWindow};
use crate::types::Bar;

/// Derived landmarks of one session's volume profile.
///
/// Landmarks are absent (not NaN) when the session slice was empty; callers
/// treat `None` as "profile unavailable" and skip decisions.
#[derive(Debug, Clone, Default)]
pub struct ProfilePack {
    pub poc: Option<f64>,
    pub value_area: Option<(f64, f64)>,
    pub hvn: Vec<Zone>,
    pub lvn: Vec<Zone>,
}

impl ProfilePack {
    pub fn val(&self) -> Option<f64> {
        self.value_area.map(|(val, _)| val)
    }

    pub fn vah(&self) -> Option<f64> {
        self.value_area.map(|(_, vah)| vah)
    }
}

/// Per-(day, session) memoization over a minute-bar series
pub struct SessionProfileCache {
    bars: Vec<Bar>,
    tz: Tz,
    cfg: VpConfig,
    cache: HashMap<(NaiveDate, SessionId), ProfilePack>,
}

impl SessionProfileCache {
    pub fn new(bars: Vec<Bar>, tz: Tz, cfg: VpConfig) -> Self {
        Self {
            bars,
            tz,
            cfg,
            cache: HashMap::new(),
        }
    }

    /// Profile landmarks for `session` on `day`, built on first request.
    pub fn get(&mut self, day: NaiveDate, session: SessionId, window: &SessionWindow) -> ProfilePack {
        if let Some(pack) = self.cache.get(&(day, session)) {
            return pack.clone();
        }
        let pack = self.build(day, window);
        self.cache.insert((day, session), pack.clone());
        pack
    }

    fn build(&self, day: NaiveDate, window: &SessionWindow) -> ProfilePack {
        let slice = self.bars.iter().filter(|b| {
            let local = b.time.with_timezone(&self.tz);
            local.date_naive() == day && window.contains(local.time())
        });

        let profile = VolumeProfile::from_bars(slice, self.cfg.bin_size);
        let poc = profile.poc();
        let value_area = profile.value_area(self.cfg.value_area_pct);
        let (hvn, lvn) = extract_zones(
            &profile,
            self.cfg.hvn_top_bins,
            self.cfg.lvn_bottom_bins,
            self.cfg.merge_gap_bins,
        );

        ProfilePack {
            poc,
            value_area,
            hvn,
            lvn,
        }
    }

    /// Drop one cached entry, forcing a rebuild on the next `get`.
    pub fn invalidate(&mut self, day: NaiveDate, session: SessionId) {
        self.cache.remove(&(day, session));
    }

    /// Drop every cached entry.
    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    /// Append later minute bars and invalidate the cached packs for every
    /// local day they touch. Bars must arrive in time order.
    pub fn extend(&mut self, bars: Vec<Bar>) {
        let touched: HashSet<NaiveDate> = bars
            .iter()
            .map(|b| b.time.with_timezone(&self.tz).date_naive())
            .collect();
        self.cache.retain(|(day, _), _| !touched.contains(day));
        self.bars.extend(bars);
    }

    #[cfg(test)]
    fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn vp_cfg() -> VpConfig {
        VpConfig {
            bin_size: 0.5,
            value_area_pct: 0.7,
            hvn_top_bins: 5,
            lvn_bottom_bins: 5,
            merge_gap_bins: 1,
        }
    }

    fn make_bar(h: u32, m: u32, close: f64, volume: f64) -> Bar {
        Bar {
            time: Utc.with_ymd_and_hms(2025, 1, 6, h, m, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
    }

    #[test]
    fn test_memoizes_per_day_session() {
        let bars = vec![
            make_bar(1, 0, 1000.2, 10.0),
            make_bar(1, 1, 1000.6, 50.0),
            make_bar(1, 2, 1001.1, 5.0),
        ];
        let tz: Tz = "UTC".parse().unwrap();
        let mut cache = SessionProfileCache::new(bars, tz, vp_cfg());
        let window = SessionWindow::parse("00:00", "09:00").unwrap();

        let pack = cache.get(day(), SessionId::Asia, &window);
        assert_eq!(pack.poc, Some(1000.5));
        assert_eq!(pack.value_area, Some((1000.0, 1000.5)));
        assert_eq!(cache.cached_len(), 1);

        cache.get(day(), SessionId::Asia, &window);
        assert_eq!(cache.cached_len(), 1);
    }

    #[test]
    fn test_window_excludes_out_of_session_bars() {
        let bars = vec![
            make_bar(1, 0, 1000.2, 10.0),
            // Outside the window: must not contribute volume
            make_bar(12, 0, 2000.0, 500.0),
        ];
        let tz: Tz = "UTC".parse().unwrap();
        let mut cache = SessionProfileCache::new(bars, tz, vp_cfg());
        let window = SessionWindow::parse("00:00", "09:00").unwrap();

        let pack = cache.get(day(), SessionId::Asia, &window);
        assert_eq!(pack.poc, Some(1000.0));
    }

    #[test]
    fn test_empty_slice_yields_absent_landmarks() {
        let tz: Tz = "UTC".parse().unwrap();
        let mut cache = SessionProfileCache::new(Vec::new(), tz, vp_cfg());
        let window = SessionWindow::parse("00:00", "09:00").unwrap();

        let pack = cache.get(day(), SessionId::Asia, &window);
        assert_eq!(pack.poc, None);
        assert_eq!(pack.value_area, None);
        assert!(pack.hvn.is_empty());
    }

    #[test]
    fn test_extend_invalidates_touched_day() {
        let bars = vec![make_bar(1, 0, 1000.2, 10.0)];
        let tz: Tz = "UTC".parse().unwrap();
        let mut cache = SessionProfileCache::new(bars, tz, vp_cfg());
        let window = SessionWindow::parse("00:00", "09:00").unwrap();

        let before = cache.get(day(), SessionId::Asia, &window);
        assert_eq!(before.poc, Some(1000.0));

        // Late-arriving bar inside the same session shifts the POC
        cache.extend(vec![make_bar(2, 0, 1005.1, 99.0)]);
        assert_eq!(cache.cached_len(), 0);

        let after = cache.get(day(), SessionId::Asia, &window);
        assert_eq!(after.poc, Some(1005.0));
    }

    #[test]
    fn test_explicit_invalidation() {
        let bars = vec![make_bar(1, 0, 1000.2, 10.0)];
        let tz: Tz = "UTC".parse().unwrap();
        let mut cache = SessionProfileCache::new(bars, tz, vp_cfg());
        let window = SessionWindow::parse("00:00", "09:00").unwrap();

        cache.get(day(), SessionId::Asia, &window);
        cache.get(day(), SessionId::London, &window);
        assert_eq!(cache.cached_len(), 2);

        cache.invalidate(day(), SessionId::Asia);
        assert_eq!(cache.cached_len(), 1);
        cache.invalidate_all();
        assert_eq!(cache.cached_len(), 0);
    }
}
