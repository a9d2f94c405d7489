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
use std::mem;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::Instant;
use tracing::{debug, info};

use super::timer::Timer;
use super::{AFFIRMATION_THRESHOLD, CARD_DURATION, LONG_PRESS};
use crate::affirmation::{self, Generator, TimeOfDay};
use crate::haptics::{self, Haptics};
use crate::presenter::{StatsView, Status, View, RECENT_SESSIONS};
use crate::session::{PauseSession, SessionLog};
use crate::sound::SoundDispatcher;

/// Messages delivered back to the machine by its timers and affirmation requests.
/// Each carries the id of the interaction that scheduled it, so stale messages from
/// an earlier interaction are recognised and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// The long-press threshold passed.
    LongPress(u64),
    /// Refresh the elapsed time.
    Tick(u64),
    /// An affirmation finished generating.
    Affirmation { id: u64, message: String },
    /// The card display window ended.
    CardExpired(u64),
}

/// Where the press is. Timers live inside the phase that owns them, so leaving a
/// phase cancels them.
#[derive(Debug)]
enum Phase {
    Idle,
    Pressed {
        id: u64,
        started: Instant,
        _long_press: Timer,
    },
    Holding {
        id: u64,
        started: Instant,
        elapsed: Duration,
        _ticker: Timer,
    },
}

/// The affirmation card shown after a timed pause.
#[derive(Debug)]
enum Card {
    Hidden,
    /// Waiting for generated text. Does not block presses.
    Pending { id: u64, _expiry: Timer },
    /// Visible. Blocks presses until it expires.
    Showing {
        id: u64,
        message: String,
        _expiry: Timer,
    },
}

impl Card {
    fn id(&self) -> Option<u64> {
        match self {
            Card::Hidden => None,
            Card::Pending { id, .. } | Card::Showing { id, .. } => Some(*id),
        }
    }
}

/// Timing knobs.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    /// How often the elapsed time is refreshed while holding.
    pub tick_interval: Duration,
    /// How long to wait for a generated affirmation.
    pub affirmation_timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            tick_interval: Duration::from_millis(37),
            affirmation_timeout: Duration::from_secs(4),
        }
    }
}

/// The press/hold/release state machine.
pub struct Machine {
    phase: Phase,
    card: Card,
    stats_open: bool,
    next_id: u64,
    timing: Timing,
    signals: UnboundedSender<Signal>,
    sound: Arc<SoundDispatcher>,
    log: SessionLog,
    haptics: Arc<dyn Haptics>,
    generator: Arc<dyn Generator>,
}

impl Machine {
    /// Creates the machine and the receiver its signals arrive on. The owner must feed
    /// every received signal back through [Machine::handle].
    pub fn new(
        sound: Arc<SoundDispatcher>,
        log: SessionLog,
        haptics: Arc<dyn Haptics>,
        generator: Arc<dyn Generator>,
        timing: Timing,
    ) -> (Machine, UnboundedReceiver<Signal>) {
        let (signals, signals_rx) = mpsc::unbounded_channel();
        (
            Machine {
                phase: Phase::Idle,
                card: Card::Hidden,
                stats_open: false,
                next_id: 1,
                timing,
                signals,
                sound,
                log,
                haptics,
                generator,
            },
            signals_rx,
        )
    }

    /// Starts an interaction. Ignored while one is already in progress or an overlay
    /// is visible. Returns true if the press was accepted.
    pub fn press(&mut self) -> bool {
        if self.stats_open || matches!(self.card, Card::Showing { .. }) {
            debug!("Press ignored, overlay visible");
            return false;
        }
        if !matches!(self.phase, Phase::Idle) {
            debug!("Press ignored, already pressed");
            return false;
        }

        // A new interaction supersedes a card that is still waiting for text.
        self.card = Card::Hidden;

        let id = self.next_id;
        self.next_id += 1;

        self.sound.dispatch();
        self.haptics.pulse(haptics::PRESS_PULSE);

        self.phase = Phase::Pressed {
            id,
            started: Instant::now(),
            _long_press: Timer::once(LONG_PRESS, self.signals.clone(), Signal::LongPress(id)),
        };
        debug!(id, "Pressed");
        true
    }

    /// Ends the interaction and records it. A release with nothing pressed is a no-op.
    /// Returns the recorded session.
    pub fn release(&mut self) -> Option<PauseSession> {
        match mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => None,
            Phase::Pressed { id, .. } => {
                let session = PauseSession::tap(Utc::now().timestamp_millis());
                self.log.append(session);
                info!(id, "Tap recorded");
                Some(session)
            }
            Phase::Holding { id, started, .. } => {
                let duration = started.elapsed();
                let session = PauseSession::new(Utc::now().timestamp_millis(), duration);
                self.log.append(session);
                info!(id, duration_ms = session.duration, "Pause recorded");
                self.show_affirmation(id, duration);
                Some(session)
            }
        }
    }

    /// Applies a signal from a timer or an affirmation request.
    pub fn handle(&mut self, signal: Signal) {
        match signal {
            Signal::LongPress(signal_id) => self.enter_holding(signal_id),
            Signal::Tick(signal_id) => {
                if let Phase::Holding {
                    id,
                    started,
                    elapsed,
                    ..
                } = &mut self.phase
                {
                    if *id == signal_id {
                        *elapsed = started.elapsed();
                    }
                }
            }
            Signal::Affirmation { id, message } => match mem::replace(&mut self.card, Card::Hidden)
            {
                Card::Pending {
                    id: card_id,
                    _expiry,
                } if card_id == id => {
                    debug!(id, "Affirmation ready");
                    self.card = Card::Showing {
                        id,
                        message,
                        _expiry,
                    };
                }
                card => {
                    debug!(id, "Discarding stale affirmation");
                    self.card = card;
                }
            },
            Signal::CardExpired(id) => {
                if self.card.id() == Some(id) {
                    debug!(id, "Card expired");
                    self.card = Card::Hidden;
                }
            }
        }
    }

    fn enter_holding(&mut self, signal_id: u64) {
        let Phase::Pressed { id, started, .. } = self.phase else {
            return;
        };
        if id != signal_id {
            return;
        }

        self.haptics.pulse(haptics::HOLD_PULSE);
        self.phase = Phase::Holding {
            id,
            started,
            elapsed: started.elapsed(),
            _ticker: Timer::every(
                self.timing.tick_interval,
                self.signals.clone(),
                Signal::Tick(id),
            ),
        };
        debug!(id, "Holding");
    }

    fn show_affirmation(&mut self, id: u64, duration: Duration) {
        let expiry = Timer::once(CARD_DURATION, self.signals.clone(), Signal::CardExpired(id));

        if duration < AFFIRMATION_THRESHOLD {
            self.card = Card::Showing {
                id,
                message: affirmation::random_fallback(),
                _expiry: expiry,
            };
            return;
        }

        let generator = self.generator.clone();
        let signals = self.signals.clone();
        let seconds = duration.as_secs();
        let timeout = self.timing.affirmation_timeout;
        tokio::spawn(async move {
            let message =
                affirmation::request(generator.as_ref(), seconds, TimeOfDay::now(), timeout).await;
            let _ = signals.send(Signal::Affirmation { id, message });
        });

        self.card = Card::Pending {
            id,
            _expiry: expiry,
        };
    }

    /// Opens the stats overlay. Only possible while idle.
    pub fn open_stats(&mut self) -> bool {
        if !matches!(self.phase, Phase::Idle) {
            return false;
        }
        self.stats_open = true;
        true
    }

    pub fn close_stats(&mut self) {
        self.stats_open = false;
    }

    /// Returns true while a press or hold is in progress.
    pub fn is_active(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    pub fn sound(&self) -> &SoundDispatcher {
        &self.sound
    }

    /// The current view.
    pub fn view(&self) -> View {
        let status = match &self.phase {
            Phase::Idle => Status::Ready,
            Phase::Pressed { .. } => Status::Pressed,
            Phase::Holding { elapsed, .. } => Status::Holding { elapsed: *elapsed },
        };
        let card = match &self.card {
            Card::Showing { message, .. } => Some(message.clone()),
            _ => None,
        };
        let stats = self.stats_open.then(|| StatsView {
            stats: self.log.stats(),
            recent: self.log.recent(RECENT_SESSIONS),
        });

        View {
            status,
            card,
            generating: matches!(self.card, Card::Pending { .. }),
            last_pause: self.log.last_pause(),
            stats,
        }
    }
}
