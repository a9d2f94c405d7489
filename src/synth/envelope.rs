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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ramp {
    Set,
    Linear,
    Exponential,
}

#[derive(Debug, Clone, Copy)]
struct Event {
    ramp: Ramp,
    value: f64,
    time: f64,
}

/// A parameter curve over time, in seconds from the start of a sound. Each ramp runs
/// from the previous event's value and time to its own. Events must be added in time
/// order.
#[derive(Debug, Clone)]
pub struct Automation {
    initial: f64,
    events: Vec<Event>,
}

impl Automation {
    /// Creates a curve holding the given value until the first event.
    pub fn new(initial: f64) -> Automation {
        Automation {
            initial,
            events: Vec::new(),
        }
    }

    /// Jumps to the value at the given time.
    pub fn set(mut self, value: f64, time: f64) -> Automation {
        self.events.push(Event {
            ramp: Ramp::Set,
            value,
            time,
        });
        self
    }

    /// Ramps linearly to the value, arriving at the given time.
    pub fn linear_ramp_to(mut self, value: f64, time: f64) -> Automation {
        self.events.push(Event {
            ramp: Ramp::Linear,
            value,
            time,
        });
        self
    }

    /// Ramps exponentially to the value, arriving at the given time. The ramp holds
    /// the previous value if either end is zero or the signs differ.
    pub fn exponential_ramp_to(mut self, value: f64, time: f64) -> Automation {
        self.events.push(Event {
            ramp: Ramp::Exponential,
            value,
            time,
        });
        self
    }

    /// The value of the curve at the given time.
    pub fn value_at(&self, t: f64) -> f64 {
        let mut prev_value = self.initial;
        let mut prev_time = 0.0;

        for event in &self.events {
            let Event { ramp, value, time } = *event;
            if t < time {
                let span = time - prev_time;
                if span <= 0.0 {
                    return prev_value;
                }
                let progress = (t - prev_time) / span;
                return match ramp {
                    Ramp::Set => prev_value,
                    Ramp::Linear => prev_value + (value - prev_value) * progress,
                    Ramp::Exponential => {
                        if prev_value * value <= 0.0 {
                            prev_value
                        } else {
                            prev_value * (value / prev_value).powf(progress)
                        }
                    }
                };
            }
            prev_value = value;
            prev_time = time;
        }

        prev_value
    }
}
