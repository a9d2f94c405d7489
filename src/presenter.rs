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
//! Presentation seam. The interaction core produces a [View]; a presenter draws it.

use std::io::{self, Write};
use std::time::Duration;

use chrono::{Local, TimeZone};
use tracing::debug;

use crate::session::{format_millis, PauseSession, Stats};
use crate::theme::Theme;

/// Number of sessions listed in the stats view.
pub const RECENT_SESSIONS: usize = 5;

/// What the control is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ready,
    Pressed,
    Holding { elapsed: Duration },
}

/// The stats overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsView {
    pub stats: Stats,
    /// Newest first.
    pub recent: Vec<PauseSession>,
}

impl StatsView {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Today: {}", self.stats.today_count),
            format!("Total: {}", self.stats.total_count),
            format!(
                "Zen time: {}s",
                (self.stats.total_duration as f64 / 1000.0).round()
            ),
        ];
        if self.recent.is_empty() {
            lines.push("No pauses yet".to_string());
        }
        for session in &self.recent {
            lines.push(format!(
                "  {}  {}",
                format_clock(session.timestamp),
                session.label()
            ));
        }
        lines
    }
}

/// Everything needed to draw the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub status: Status,
    /// The affirmation card, once it has text.
    pub card: Option<String>,
    /// An affirmation is being generated.
    pub generating: bool,
    /// Timestamp of the most recent session.
    pub last_pause: Option<i64>,
    /// Present while the stats overlay is open.
    pub stats: Option<StatsView>,
}

impl View {
    /// The single status line shown under the control.
    pub fn status_line(&self) -> String {
        if let Status::Holding { elapsed } = self.status {
            return format!("Breathe {}", format_millis(elapsed.as_millis() as u64));
        }
        if let Some(card) = &self.card {
            return card.clone();
        }
        if self.generating {
            return "...".to_string();
        }
        match (self.status, self.last_pause) {
            (Status::Pressed, _) => "Oink!".to_string(),
            (_, Some(last_pause)) => format!("Last pause {}", format_clock(last_pause)),
            (_, None) => "Ready".to_string(),
        }
    }
}

/// Formats a millisecond timestamp as local `HH:MM`.
pub fn format_clock(timestamp: i64) -> String {
    match Local.timestamp_millis_opt(timestamp).single() {
        Some(at) => at.format("%H:%M").to_string(),
        None => "--:--".to_string(),
    }
}

/// Draws views.
pub trait Presenter: Send {
    fn render(&mut self, view: &View, theme: Theme);

    /// Shows a one-off notice, e.g. after changing a setting.
    fn notice(&mut self, text: &str);
}

/// Draws a single status line on stdout, rewriting it in place.
#[derive(Debug, Default)]
pub struct TerminalPresenter {
    last_line: Option<String>,
    stats_shown: bool,
}

impl TerminalPresenter {
    pub fn new() -> TerminalPresenter {
        TerminalPresenter::default()
    }

    fn write(&self, text: &str) {
        let mut stdout = io::stdout();
        if let Err(e) = stdout.write_all(text.as_bytes()).and_then(|_| stdout.flush()) {
            debug!(err = e.to_string(), "Unable to draw");
        }
    }
}

impl Presenter for TerminalPresenter {
    fn render(&mut self, view: &View, theme: Theme) {
        match &view.stats {
            Some(stats) if !self.stats_shown => {
                let mut text = String::from("\n");
                for line in stats.lines() {
                    text.push_str(&line);
                    text.push('\n');
                }
                self.write(&text);
                self.stats_shown = true;
                self.last_line = None;
            }
            Some(_) => {}
            None => self.stats_shown = false,
        }

        let line = view.status_line();
        if self.last_line.as_deref() == Some(line.as_str()) {
            return;
        }
        self.write(&format!("\r\x1b[2K{}{}\x1b[0m", theme.ansi_color(), line));
        self.last_line = Some(line);
    }

    fn notice(&mut self, text: &str) {
        self.write(&format!("\r\x1b[2K{}\n", text));
        self.last_line = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(status: Status) -> View {
        View {
            status,
            card: None,
            generating: false,
            last_pause: None,
            stats: None,
        }
    }

    #[test]
    fn test_status_line() {
        assert_eq!(view(Status::Ready).status_line(), "Ready");
        assert_eq!(view(Status::Pressed).status_line(), "Oink!");
        assert_eq!(
            view(Status::Holding {
                elapsed: Duration::from_millis(1234)
            })
            .status_line(),
            "Breathe 1.2s"
        );

        let mut with_card = view(Status::Ready);
        with_card.card = Some("You listened to yourself.".to_string());
        assert_eq!(with_card.status_line(), "You listened to yourself.");

        let mut with_last = view(Status::Ready);
        with_last.last_pause = Some(0);
        assert!(with_last.status_line().starts_with("Last pause "));
    }

    #[test]
    fn test_stats_lines() {
        let stats = StatsView {
            stats: Stats {
                total_count: 3,
                total_duration: 7_900,
                today_count: 2,
            },
            recent: vec![
                PauseSession {
                    timestamp: 2_000,
                    duration: 3_500,
                },
                PauseSession {
                    timestamp: 1_000,
                    duration: 0,
                },
            ],
        };

        let lines = stats.lines();
        assert_eq!(lines[0], "Today: 2");
        assert_eq!(lines[1], "Total: 3");
        assert_eq!(lines[2], "Zen time: 8s");
        assert!(lines[3].ends_with("3.5s"));
        assert!(lines[4].ends_with("Tap"));
    }
}
