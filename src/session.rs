// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! The bounded, append-only history of completed pauses.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::{self, Store};

/// Maximum number of sessions kept in the log.
pub const HISTORY_LIMIT: usize = 100;

/// One completed press-to-release interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseSession {
    /// Milliseconds since the Unix epoch at release.
    pub timestamp: i64,
    /// Hold duration in milliseconds. Zero for a tap.
    pub duration: u64,
}

impl PauseSession {
    /// Creates a session from a release timestamp and a hold duration.
    pub fn new(timestamp: i64, duration: Duration) -> PauseSession {
        PauseSession {
            timestamp,
            duration: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Creates a tap session, which never records a duration.
    pub fn tap(timestamp: i64) -> PauseSession {
        PauseSession {
            timestamp,
            duration: 0,
        }
    }

    /// Returns true if this session did not cross the long-press threshold.
    pub fn is_tap(&self) -> bool {
        self.duration == 0
    }

    /// Human readable label: "Tap" or the duration in tenths of a second.
    pub fn label(&self) -> String {
        if self.is_tap() {
            "Tap".to_string()
        } else {
            format_millis(self.duration)
        }
    }
}

/// Formats milliseconds as seconds with one decimal, e.g. `3.5s`.
pub fn format_millis(millis: u64) -> String {
    format!("{:.1}s", millis as f64 / 1000.0)
}

/// Aggregates derived from the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    /// Number of stored sessions.
    pub total_count: usize,
    /// Sum of all stored durations in milliseconds, taps included.
    pub total_duration: u64,
    /// Sessions whose timestamp falls on the current calendar day.
    pub today_count: usize,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Today: {} times, Total: {}, Zen time: {}s",
            self.today_count,
            self.total_count,
            (self.total_duration as f64 / 1000.0).round()
        )
    }
}

/// The session log. Insertion order is chronological order and only the newest
/// [HISTORY_LIMIT] sessions are kept.
pub struct SessionLog {
    sessions: VecDeque<PauseSession>,
    store: Arc<dyn Store>,
}

impl SessionLog {
    /// Loads the log from the store. Missing or corrupt history loads as empty.
    pub fn load(store: Arc<dyn Store>) -> SessionLog {
        let mut sessions: VecDeque<PauseSession> = match store.get(storage::HISTORY_KEY) {
            Some(serialized) => match serde_json::from_str::<Vec<PauseSession>>(&serialized) {
                Ok(sessions) => sessions.into(),
                Err(e) => {
                    warn!(err = %e, "Stored history is corrupt, starting empty");
                    VecDeque::new()
                }
            },
            None => VecDeque::new(),
        };

        while sessions.len() > HISTORY_LIMIT {
            sessions.pop_front();
        }

        debug!(sessions = sessions.len(), "Session log loaded");
        SessionLog { sessions, store }
    }

    /// Appends a session, evicting the oldest entries beyond the limit, and persists
    /// the trimmed log.
    pub fn append(&mut self, session: PauseSession) {
        self.sessions.push_back(session);
        while self.sessions.len() > HISTORY_LIMIT {
            self.sessions.pop_front();
        }

        self.persist(session.timestamp);
    }

    fn persist(&self, last_timestamp: i64) {
        let serialized = match serde_json::to_string(&self.sessions) {
            Ok(serialized) => serialized,
            Err(e) => {
                warn!(err = %e, "Unable to serialize history");
                return;
            }
        };

        if let Err(e) = self.store.set(storage::HISTORY_KEY, &serialized) {
            warn!(err = %e, "Unable to persist history");
        }
        if let Err(e) = self
            .store
            .set(storage::LAST_PAUSE_KEY, &last_timestamp.to_string())
        {
            warn!(err = %e, "Unable to persist last pause timestamp");
        }
    }

    /// Returns the number of stored sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Iterates over the sessions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &PauseSession> {
        self.sessions.iter()
    }

    /// Timestamp of the most recent session.
    pub fn last_pause(&self) -> Option<i64> {
        self.sessions.back().map(|session| session.timestamp)
    }

    /// The newest `count` sessions, newest first.
    pub fn recent(&self, count: usize) -> Vec<PauseSession> {
        self.sessions.iter().rev().take(count).copied().collect()
    }

    /// Computes the aggregates for the current local day.
    pub fn stats(&self) -> Stats {
        self.stats_at(&Local::now())
    }

    /// Computes the aggregates, counting sessions on the same calendar day as `now` in
    /// `now`'s time zone.
    pub fn stats_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Stats {
        let today = now.date_naive();
        let zone = now.timezone();

        Stats {
            total_count: self.sessions.len(),
            total_duration: self.sessions.iter().map(|session| session.duration).sum(),
            today_count: self
                .sessions
                .iter()
                .filter(|session| {
                    zone.timestamp_millis_opt(session.timestamp)
                        .single()
                        .is_some_and(|at| at.date_naive() == today)
                })
                .count(),
        }
    }
}

impl fmt::Debug for SessionLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionLog")
            .field("sessions", &self.sessions.len())
            .field("last_pause", &self.last_pause())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;
    use crate::storage::MemoryStore;

    fn empty_log() -> (SessionLog, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (SessionLog::load(store.clone()), store)
    }

    #[test]
    fn test_append_evicts_oldest() {
        let (mut log, store) = empty_log();

        for i in 0..105 {
            log.append(PauseSession {
                timestamp: 1_000 + i,
                duration: i as u64,
            });
        }

        assert_eq!(log.len(), HISTORY_LIMIT);
        let timestamps: Vec<i64> = log.iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps.first(), Some(&1_005));
        assert_eq!(timestamps.last(), Some(&1_104));
        assert!(timestamps.windows(2).all(|w| w[0] < w[1]));

        // The persisted form is trimmed as well.
        let persisted: Vec<PauseSession> =
            serde_json::from_str(&store.get(storage::HISTORY_KEY).unwrap()).unwrap();
        assert_eq!(persisted.len(), HISTORY_LIMIT);
        assert_eq!(persisted[0].timestamp, 1_005);
        assert_eq!(
            store.get(storage::LAST_PAUSE_KEY).as_deref(),
            Some("1104")
        );
    }

    #[test]
    fn test_stats_totals_include_taps() {
        let (mut log, _) = empty_log();
        assert_eq!(log.stats(), Stats::default());

        log.append(PauseSession::tap(1));
        log.append(PauseSession {
            timestamp: 2,
            duration: 3_500,
        });
        log.append(PauseSession {
            timestamp: 3,
            duration: 310,
        });

        let stats = log.stats();
        assert_eq!(stats.total_count, log.len());
        assert_eq!(stats.total_duration, 3_810);
    }

    #[test]
    fn test_today_count_uses_calendar_day() {
        let (mut log, _) = empty_log();
        let zone = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = zone.with_ymd_and_hms(2026, 3, 14, 0, 30, 0).unwrap();

        // 23:59 the previous local day.
        let yesterday = zone.with_ymd_and_hms(2026, 3, 13, 23, 59, 0).unwrap();
        // Just after local midnight.
        let today = zone.with_ymd_and_hms(2026, 3, 14, 0, 1, 0).unwrap();

        log.append(PauseSession::tap(yesterday.timestamp_millis()));
        log.append(PauseSession::tap(today.timestamp_millis()));
        log.append(PauseSession::tap(now.timestamp_millis()));

        let stats = log.stats_at(&now);
        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.today_count, 2);
    }

    #[test]
    fn test_load_recovers_from_corrupt_history() {
        let store = Arc::new(MemoryStore::new());
        store.set(storage::HISTORY_KEY, "[{\"timestamp\": 1").unwrap();
        let log = SessionLog::load(store);
        assert!(log.is_empty());
        assert_eq!(log.last_pause(), None);
    }

    #[test]
    fn test_load_trims_oversized_history() {
        let store = Arc::new(MemoryStore::new());
        let sessions: Vec<PauseSession> = (0..150).map(PauseSession::tap).collect();
        store
            .set(
                storage::HISTORY_KEY,
                &serde_json::to_string(&sessions).unwrap(),
            )
            .unwrap();

        let log = SessionLog::load(store);
        assert_eq!(log.len(), HISTORY_LIMIT);
        assert_eq!(log.iter().next().map(|s| s.timestamp), Some(50));
        assert_eq!(log.last_pause(), Some(149));
    }

    #[test]
    fn test_recent_and_labels() {
        let (mut log, _) = empty_log();
        log.append(PauseSession::tap(1));
        log.append(PauseSession::new(2, Duration::from_millis(3_456)));

        let recent = log.recent(5);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].label(), "3.5s");
        assert_eq!(recent[1].label(), "Tap");
    }
}
