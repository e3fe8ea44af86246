//! Interactive court-side session driven from standard input.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use courtside_core::{
    BalanceConfig, Command, Event, ScoreAdjustment, Side, WIN_NOTIFICATION_DURATION,
};
use courtside_roster::Roster;
use courtside_session::{self as session, query, Session};
use courtside_system_partition::Partitioner;
use courtside_system_recorder::Recorder;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
    time,
};
use tracing::info;

use crate::{
    render,
    timer::{BannerExpiry, TimerDriver},
};

pub(crate) const HELP: &str = "\
commands:
  balance                 partition the present players
  clear                   empty every team
  bench <player>          take a player out of the teams
  swap <player> <player>  exchange two players
  score <1|2> [+|-]       adjust the score of a side
  win <1|2>               declare the winner of the current match
  start | pause           run or pause the countdown
  reset [minutes]         rewind the countdown
  teams | status          show the teams or the clock
  help | quit";

/// A single operator request typed at the prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Input {
    Balance,
    Clear,
    Bench(String),
    Swap(String, String),
    Score(Side, ScoreAdjustment),
    Win(Side),
    Start,
    Pause,
    Reset(Option<u32>),
    Teams,
    Status,
    Help,
    Quit,
}

fn side(word: Option<&str>) -> Result<Side> {
    let word = word.context("expected a side, 1 or 2")?;
    word.parse::<u8>()
        .ok()
        .and_then(Side::from_number)
        .with_context(|| format!("`{word}` is not a side; use 1 or 2"))
}

/// Parses a prompt line; blank lines yield `None`.
pub(crate) fn parse_input(line: &str) -> Result<Option<Input>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let input = match verb.to_ascii_lowercase().as_str() {
        "balance" | "b" => Input::Balance,
        "clear" => Input::Clear,
        "bench" => Input::Bench(words.next().context("bench needs a player")?.to_owned()),
        "swap" => {
            let first = words.next().context("swap needs two players")?;
            let second = words.next().context("swap needs two players")?;
            Input::Swap(first.to_owned(), second.to_owned())
        }
        "score" | "s" => {
            let side = side(words.next())?;
            let adjustment = match words.next().unwrap_or("+") {
                "+" => ScoreAdjustment::Increment,
                "-" => ScoreAdjustment::Decrement,
                other => bail!("`{other}` is not a score adjustment; use + or -"),
            };
            Input::Score(side, adjustment)
        }
        "win" | "w" => Input::Win(side(words.next())?),
        "start" => Input::Start,
        "pause" => Input::Pause,
        "reset" => Input::Reset(
            words
                .next()
                .map(|minutes| {
                    minutes
                        .parse::<u32>()
                        .with_context(|| format!("`{minutes}` is not a number of minutes"))
                })
                .transpose()?,
        ),
        "teams" | "t" => Input::Teams,
        "status" => Input::Status,
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        other => bail!("unknown command `{other}`; type `help`"),
    };
    Ok(Some(input))
}

/// Everything a court-side session mutates, without the async plumbing.
pub(crate) struct Table {
    pub(crate) roster: Roster,
    pub(crate) session: Session,
    partitioner: Partitioner,
    recorder: Recorder,
    config: BalanceConfig,
    timer_minutes: u32,
}

impl Table {
    pub(crate) fn new(
        roster: Roster,
        partitioner: Partitioner,
        config: BalanceConfig,
        timer_minutes: u32,
    ) -> Self {
        let mut table = Self {
            roster,
            session: Session::new(),
            partitioner,
            recorder: Recorder::new(),
            config,
            timer_minutes,
        };
        let _ = table.apply(Command::ResetTimer {
            minutes: timer_minutes,
        });
        table
    }

    /// Applies a command and feeds the resulting events through the recorder.
    pub(crate) fn apply(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        session::apply(&mut self.session, command, &mut events);

        let mut follow_up = Vec::new();
        self.recorder
            .handle(&events, &mut self.roster, &mut follow_up);
        for command in follow_up {
            session::apply(&mut self.session, command, &mut events);
        }
        events
    }

    /// Runs every request that does not involve the timer task.
    pub(crate) fn execute(&mut self, input: &Input) -> Result<Vec<Event>> {
        let events = match input {
            Input::Balance => {
                let present: Vec<_> = self.roster.present_players().cloned().collect();
                let mut commands = Vec::new();
                let outcome = self.partitioner.handle(
                    &present,
                    &self.config,
                    self.roster.category(),
                    &mut commands,
                );
                if let Some(line) = render::balance(outcome) {
                    println!("{line}");
                }
                commands
                    .into_iter()
                    .flat_map(|command| self.apply(command))
                    .collect()
            }
            Input::Clear => self.apply(Command::ClearTeams),
            Input::Bench(player) => {
                let player = self.roster.resolve(player)?;
                self.apply(Command::RemoveFromTeams { player })
            }
            Input::Swap(first, second) => {
                let first = self.roster.resolve(first)?;
                let second = self.roster.resolve(second)?;
                self.apply(Command::SwapPlayers { first, second })
            }
            Input::Score(side, adjustment) => self.apply(Command::AdjustScore {
                side: *side,
                adjustment: *adjustment,
            }),
            Input::Win(side) => self.apply(Command::DeclareWinner { side: *side }),
            Input::Start => self.apply(Command::StartTimer),
            Input::Pause => self.apply(Command::PauseTimer),
            Input::Reset(minutes) => {
                if let Some(minutes) = minutes {
                    self.timer_minutes = *minutes;
                }
                self.apply(Command::ResetTimer {
                    minutes: self.timer_minutes,
                })
            }
            Input::Teams | Input::Status | Input::Help | Input::Quit => Vec::new(),
        };
        Ok(events)
    }
}

/// Runs the prompt loop until `quit` or end of input.
pub(crate) async fn run(mut table: Table, roster_path: PathBuf) -> Result<()> {
    let (ticks, mut tick_rx) = mpsc::channel(16);
    let (notices, mut expiry_rx) = mpsc::channel(4);
    let mut banner = BannerExpiry::new(WIN_NOTIFICATION_DURATION, notices);
    let mut driver = TimerDriver::new(time::Duration::from_secs(1), ticks);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{HELP}");
    print!("{}", render::teams(&table.session, &table.roster));

    loop {
        let (input, events) = tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read from stdin")? else {
                    break;
                };
                let input = match parse_input(&line) {
                    Ok(Some(input)) => input,
                    Ok(None) => continue,
                    Err(error) => {
                        println!("{error:#}");
                        continue;
                    }
                };
                match table.execute(&input) {
                    Ok(events) => (Some(input), events),
                    Err(error) => {
                        println!("{error:#}");
                        continue;
                    }
                }
            }
            Some(command) = tick_rx.recv() => (None, table.apply(command)),
            Some(generation) = expiry_rx.recv() => {
                if !banner.is_current(generation) || query::timer_running(&table.session) {
                    continue;
                }
                (None, table.apply(Command::Tick { dt: WIN_NOTIFICATION_DURATION }))
            }
        };

        for event in &events {
            if let Some(line) = render::event(event, &table.roster) {
                println!("{line}");
            }
        }

        let declared = events
            .iter()
            .any(|event| matches!(event, Event::MatchDeclared { .. }));
        if declared {
            if let Some(message) = query::notification(&table.session) {
                println!("{message}");
            }
            table
                .roster
                .save(&roster_path)
                .context("failed to save match stats")?;
            info!(path = %roster_path.display(), "match stats saved");
            banner.schedule();
        }

        if query::timer_running(&table.session) {
            let _ = driver.start();
        } else {
            driver.pause().await;
        }
        if events.contains(&Event::TimerExpired) {
            println!("{}", render::clock(&table.session));
        }

        match input {
            Some(Input::Quit) => break,
            Some(Input::Help) => println!("{HELP}"),
            Some(Input::Status | Input::Start | Input::Pause | Input::Reset(_)) => {
                println!("{}", render::clock(&table.session));
            }
            Some(_) => print!("{}", render::teams(&table.session, &table.roster)),
            None => {}
        }
    }

    if driver.is_running() {
        driver.pause().await;
    }
    Ok(())
}
