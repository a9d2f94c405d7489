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
//! Short messages shown after a timed pause.
//!
//! Generation is best effort: any failure or timeout falls back to a fixed list
//! of messages, so callers always get text.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use chrono::{Local, Timelike};
use rand::seq::SliceRandom;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config;

/// Messages used whenever a generated one isn't available.
pub const FALLBACK_MESSAGES: [&str; 5] = [
    "You’re in control.",
    "Taking a pause was your choice.",
    "This moment belongs to you.",
    "That was a good place to stop.",
    "You listened to yourself.",
];

/// Template handed to generators that take a prompt.
const PROMPT: &str = "Generate a minimalist, modern zen koan (max 8 words) for someone who \
just paused their life for {seconds} seconds during the {time_of_day}. Focus on clarity and \
simplicity.";

/// Errors raised by a generator. These never reach the user.
#[derive(Debug, thiserror::Error)]
pub enum AffirmationError {
    #[error("Unable to run generator: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Generator exited with {0}")]
    Status(std::process::ExitStatus),

    #[error("Generator timed out after {0:?}")]
    Timeout(Duration),

    #[error("No generator configured")]
    Unavailable,
}

/// Coarse time of day passed to the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Morning,
    Day,
    Night,
}

impl TimeOfDay {
    /// Buckets a local hour: before 6 or after 21 is night, before 12 is morning.
    pub fn from_hour(hour: u32) -> TimeOfDay {
        if !(6..=21).contains(&hour) {
            TimeOfDay::Night
        } else if hour < 12 {
            TimeOfDay::Morning
        } else {
            TimeOfDay::Day
        }
    }

    pub fn now() -> TimeOfDay {
        TimeOfDay::from_hour(Local::now().hour())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Day => "day",
            TimeOfDay::Night => "night",
        })
    }
}

pub type GenerateFuture = Pin<Box<dyn Future<Output = Result<String, AffirmationError>> + Send>>;

/// Produces affirmation text for a pause of the given length.
pub trait Generator: Send + Sync {
    fn generate(&self, seconds: u64, time_of_day: TimeOfDay) -> GenerateFuture;
}

/// Always fails, so the fallback list is used.
#[derive(Debug, Default)]
pub struct OfflineGenerator;

impl Generator for OfflineGenerator {
    fn generate(&self, _seconds: u64, _time_of_day: TimeOfDay) -> GenerateFuture {
        Box::pin(async { Err(AffirmationError::Unavailable) })
    }
}

/// Runs an external program and uses the first line of its stdout. The
/// `{seconds}`, `{time_of_day}` and `{prompt}` placeholders in the arguments are
/// substituted.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
}

impl CommandGenerator {
    pub fn new(program: &str, args: Vec<String>) -> CommandGenerator {
        CommandGenerator {
            program: program.to_string(),
            args,
        }
    }

    fn expand(arg: &str, seconds: u64, time_of_day: TimeOfDay) -> String {
        let seconds = seconds.to_string();
        let time_of_day = time_of_day.to_string();
        arg.replace("{prompt}", PROMPT)
            .replace("{seconds}", &seconds)
            .replace("{time_of_day}", &time_of_day)
    }
}

impl Generator for CommandGenerator {
    fn generate(&self, seconds: u64, time_of_day: TimeOfDay) -> GenerateFuture {
        let program = self.program.clone();
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| CommandGenerator::expand(arg, seconds, time_of_day))
            .collect();

        Box::pin(async move {
            debug!(program, seconds, %time_of_day, "Requesting affirmation");
            let output = Command::new(&program)
                .args(&args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .output()
                .await?;

            if !output.status.success() {
                return Err(AffirmationError::Status(output.status));
            }
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        })
    }
}

/// Builds the generator described by the configuration.
pub fn from_config(config: &config::Affirmation) -> Box<dyn Generator> {
    match config.command() {
        Some((program, args)) => Box::new(CommandGenerator::new(program, args.to_vec())),
        None => Box::new(OfflineGenerator),
    }
}

/// Picks a fallback message uniformly at random.
pub fn random_fallback() -> String {
    FALLBACK_MESSAGES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(FALLBACK_MESSAGES[0])
        .to_string()
}

/// Requests a message, falling back on failure or timeout. An empty result is
/// replaced with the first fallback message.
pub async fn request(
    generator: &dyn Generator,
    seconds: u64,
    time_of_day: TimeOfDay,
    timeout: Duration,
) -> String {
    let result = match tokio::time::timeout(timeout, generator.generate(seconds, time_of_day)).await
    {
        Ok(result) => result,
        Err(_) => Err(AffirmationError::Timeout(timeout)),
    };

    match result {
        Ok(text) => match text.lines().map(str::trim).find(|line| !line.is_empty()) {
            Some(line) => line.to_string(),
            None => FALLBACK_MESSAGES[0].to_string(),
        },
        Err(AffirmationError::Unavailable) => random_fallback(),
        Err(e) => {
            warn!(err = e.to_string(), "Affirmation generation failed");
            random_fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<&'static str, ()>);

    impl Generator for Fixed {
        fn generate(&self, _seconds: u64, _time_of_day: TimeOfDay) -> GenerateFuture {
            let result = self
                .0
                .map(str::to_string)
                .map_err(|_| AffirmationError::Unavailable);
            Box::pin(async move { result })
        }
    }

    struct Slow;

    impl Generator for Slow {
        fn generate(&self, _seconds: u64, _time_of_day: TimeOfDay) -> GenerateFuture {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok("too late".to_string())
            })
        }
    }

    fn is_fallback(message: &str) -> bool {
        FALLBACK_MESSAGES.contains(&message)
    }

    #[test]
    fn test_time_of_day_buckets() {
        assert_eq!(TimeOfDay::from_hour(0), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(5), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(6), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(11), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(12), TimeOfDay::Day);
        assert_eq!(TimeOfDay::from_hour(21), TimeOfDay::Day);
        assert_eq!(TimeOfDay::from_hour(22), TimeOfDay::Night);
        assert_eq!(TimeOfDay::Morning.to_string(), "morning");
    }

    #[test]
    fn test_random_fallback() {
        for _ in 0..20 {
            assert!(is_fallback(&random_fallback()));
        }
    }

    #[tokio::test]
    async fn test_generated_text_is_trimmed() {
        let generator = Fixed(Ok("\n  Stillness answers.  \nmore"));
        let message = request(&generator, 5, TimeOfDay::Day, Duration::from_secs(1)).await;
        assert_eq!(message, "Stillness answers.");
    }

    #[tokio::test]
    async fn test_empty_text_uses_first_fallback() {
        let generator = Fixed(Ok("   \n"));
        let message = request(&generator, 5, TimeOfDay::Day, Duration::from_secs(1)).await;
        assert_eq!(message, FALLBACK_MESSAGES[0]);
    }

    #[tokio::test]
    async fn test_failure_uses_fallback() {
        let message = request(&Fixed(Err(())), 5, TimeOfDay::Day, Duration::from_secs(1)).await;
        assert!(is_fallback(&message));

        let message = request(&OfflineGenerator, 5, TimeOfDay::Day, Duration::from_secs(1)).await;
        assert!(is_fallback(&message));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_uses_fallback() {
        let message = request(&Slow, 5, TimeOfDay::Night, Duration::from_secs(4)).await;
        assert!(is_fallback(&message));
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(
            CommandGenerator::expand("{seconds}s in the {time_of_day}", 7, TimeOfDay::Morning),
            "7s in the morning"
        );
        assert!(CommandGenerator::expand("{prompt}", 7, TimeOfDay::Night)
            .contains("paused their life for 7 seconds during the night"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_generator() {
        let generator = CommandGenerator::new(
            "echo",
            vec!["{seconds} seconds at {time_of_day}".to_string()],
        );
        let message = request(&generator, 5, TimeOfDay::Night, Duration::from_secs(10)).await;
        assert_eq!(message, "5 seconds at night");

        let missing = CommandGenerator::new("/nonexistent/oinkpause-generator", vec![]);
        let message = request(&missing, 5, TimeOfDay::Night, Duration::from_secs(10)).await;
        assert!(is_fallback(&message));
    }
}
