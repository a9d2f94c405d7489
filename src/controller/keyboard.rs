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
use std::io;
use std::path::PathBuf;

use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{info, span, warn, Level};

use super::Event;

const PRESS: &str = "p";
const RELEASE: &str = "r";
const STATS: &str = "s";
const CLOSE: &str = "x";
const SOUND: &str = "m";
const CUSTOM: &str = "c";
const THEME: &str = "t";
const LOAD: &str = "load";
const CLEAR: &str = "clear";
const QUIT: &str = "q";

/// A driver that reads one command per line from stdin.
#[derive(Debug, Default)]
pub struct Driver {}

impl Driver {
    pub fn new() -> Driver {
        Driver {}
    }

    /// Parses a command line. Full words are accepted alongside the single letters.
    fn parse(input: &str) -> Option<Event> {
        let input = input.trim();
        let (command, argument) = match input.split_once(char::is_whitespace) {
            Some((command, argument)) => (command, argument.trim()),
            None => (input, ""),
        };

        let event = match command.to_lowercase().as_str() {
            PRESS | "press" => Event::Press,
            RELEASE | "release" => Event::Release,
            STATS | "stats" => Event::Stats,
            CLOSE | "close" => Event::Close,
            SOUND | "sound" => Event::Sound,
            CUSTOM | "custom" => Event::Custom,
            THEME | "theme" => Event::Theme,
            LOAD if !argument.is_empty() => Event::LoadSample(PathBuf::from(argument)),
            CLEAR => Event::ClearSample,
            QUIT | "quit" => Event::Quit,
            _ => return None,
        };
        Some(event)
    }

    /// Reads and forwards a single command. Returns false once input is exhausted or
    /// quit was requested.
    fn monitor_io<R, W>(
        events_tx: &Sender<Event>,
        mut reader: R,
        mut writer: W,
    ) -> Result<bool, io::Error>
    where
        R: io::BufRead,
        W: io::Write,
    {
        write!(
            writer,
            "\nCommand ({}ress, {}elease, {}tats, {} close, {} sound, {}ustom, {}heme, {} <file>, {}, {}uit): ",
            PRESS, RELEASE, STATS, CLOSE, SOUND, CUSTOM, THEME, LOAD, CLEAR, QUIT,
        )?;
        writer.flush()?;
        let mut input: String = String::default();
        if reader.read_line(&mut input)? == 0 {
            return Ok(false);
        }

        let Some(event) = Self::parse(&input) else {
            warn!(input = input.trim(), "Unrecognized input");
            return Ok(true);
        };

        let quit = event == Event::Quit;
        events_tx
            .blocking_send(event)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(!quit)
    }
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "keyboard driver");
            let _enter = span.enter();

            info!("Keyboard driver started.");

            while Self::monitor_io(&events_tx, io::stdin().lock(), io::stdout())? {}

            info!("Keyboard driver stopped.");
            Ok(())
        })
    }
}

#[cfg(test)]
mod test {
    use std::io::{self, BufReader, BufWriter};
    use std::path::PathBuf;

    use tokio::sync::mpsc;

    use crate::controller::Event;

    use super::{Driver, PRESS, QUIT, RELEASE};

    fn get_event(event: &str) -> Result<(bool, Option<Event>), io::Error> {
        let (sender, mut receiver) = mpsc::channel::<Event>(1);

        let reader = BufReader::new(event.as_bytes());
        let writer = BufWriter::new(Vec::new());
        let more = Driver::monitor_io(&sender, reader, writer)?;

        // Force the sender to close.
        drop(sender);
        Ok((more, receiver.blocking_recv()))
    }

    #[test]
    fn test_keyboard_events() -> Result<(), io::Error> {
        assert_eq!((true, Some(Event::Press)), get_event(PRESS)?);
        assert_eq!((true, Some(Event::Press)), get_event("PRESS\n")?);
        assert_eq!((true, Some(Event::Release)), get_event(RELEASE)?);
        assert_eq!((true, Some(Event::Stats)), get_event("stats")?);
        assert_eq!((true, Some(Event::Close)), get_event("x")?);
        assert_eq!((true, Some(Event::Sound)), get_event("m")?);
        assert_eq!((true, Some(Event::Custom)), get_event("c")?);
        assert_eq!((true, Some(Event::Theme)), get_event("t")?);
        assert_eq!((true, Some(Event::ClearSample)), get_event("clear")?);
        assert_eq!(
            (true, Some(Event::LoadSample(PathBuf::from("/tmp/my oink.wav")))),
            get_event("load /tmp/my oink.wav\n")?
        );
        assert_eq!((false, Some(Event::Quit)), get_event(QUIT)?);
        Ok(())
    }

    #[test]
    fn test_unrecognized_and_eof() -> Result<(), io::Error> {
        assert_eq!((true, None), get_event("unrecognized")?);
        assert_eq!((true, None), get_event("load")?);
        assert_eq!((false, None), get_event("")?);
        Ok(())
    }
}
