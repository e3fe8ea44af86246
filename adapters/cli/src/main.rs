#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for running pickup sessions with Courtside.

mod play;
mod render;
mod timer;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use courtside_core::{BalanceConfig, TeamCount, DEFAULT_TIMER_MINUTES};
use courtside_roster::{Roster, StatField};
use courtside_session::{self as session, Session};
use courtside_system_leaderboard::{LeaderboardSort, SortColumn, SortDirection};
use courtside_system_partition::Partitioner;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Balances pickup teams, rotates matches and keeps the standings.
#[derive(Debug, Parser)]
#[command(name = "courtside", version)]
struct Cli {
    /// Roster file holding players, marked players and balance defaults.
    #[arg(
        long,
        global = true,
        env = "COURTSIDE_ROSTER",
        default_value = "courtside.toml"
    )]
    roster: PathBuf,

    /// Enables debug logging.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Partitions the present players once and prints the teams.
    Balance {
        #[command(flatten)]
        balance: BalanceArgs,
        /// Stores the resulting balance settings in the roster file.
        #[arg(long)]
        save_config: bool,
    },
    /// Prints the standings.
    Leaderboard {
        /// Column to order by.
        #[arg(long, value_enum, default_value_t = ColumnArg::Wins)]
        sort: ColumnArg,
        /// Orders smallest values first.
        #[arg(long)]
        ascending: bool,
    },
    /// Manages roster members.
    #[command(subcommand)]
    Roster(RosterCommand),
    /// Runs an interactive court-side session.
    Play {
        #[command(flatten)]
        balance: BalanceArgs,
        /// Countdown length in minutes.
        #[arg(long, default_value_t = DEFAULT_TIMER_MINUTES)]
        minutes: u32,
    },
}

#[derive(Debug, Subcommand)]
enum RosterCommand {
    /// Lists every player with attendance and stats.
    List,
    /// Adds a new absent player.
    Add {
        /// Display name; surrounding whitespace is trimmed.
        name: String,
    },
    /// Flips whether a player attends today.
    Toggle {
        /// Player id or unique name.
        player: String,
    },
    /// Removes a player permanently.
    Remove {
        /// Player id or unique name.
        player: String,
        /// Confirms the removal.
        #[arg(long)]
        yes: bool,
    },
    /// Sets wins and games of a player back to zero.
    Reset {
        /// Player id or unique name.
        player: String,
        /// Confirms the reset.
        #[arg(long)]
        yes: bool,
    },
    /// Overwrites a single counter.
    Edit {
        /// Player id or unique name.
        player: String,
        /// Counter to overwrite.
        #[arg(value_enum)]
        field: FieldArg,
        /// New non-negative value.
        value: u32,
    },
    /// Marks a player for category balancing.
    Mark {
        /// Player id or unique name.
        player: String,
        /// Removes the mark instead.
        #[arg(long)]
        unmark: bool,
    },
}

/// Overrides applied on top of the roster file's `[balance]` table.
#[derive(Clone, Debug, Default, Args)]
struct BalanceArgs {
    /// Number of teams to form.
    #[arg(long, value_parser = clap::value_parser!(u8).range(2..=3))]
    teams: Option<u8>,
    /// Weights players by their win rate.
    #[arg(long)]
    weighted: bool,
    /// Spreads marked players evenly across two teams.
    #[arg(long)]
    balance_category: bool,
    /// Keeps an odd player on a team instead of the bench.
    #[arg(long)]
    no_subs: bool,
    /// Largest tolerated weight difference between two teams.
    #[arg(long)]
    max_diff: Option<f64>,
    /// Seed for reproducible shuffles.
    #[arg(long)]
    seed: Option<u64>,
}

impl BalanceArgs {
    fn apply(&self, base: BalanceConfig) -> Result<BalanceConfig> {
        let mut config = base;
        if let Some(teams) = self.teams {
            config.team_count = TeamCount::try_from(teams)
                .with_context(|| format!("cannot form {teams} teams"))?;
        }
        config.weighted |= self.weighted;
        config.balance_category |= self.balance_category;
        if self.no_subs {
            config.allow_sub = false;
        }
        if let Some(max_diff) = self.max_diff {
            config.max_weight_diff = max_diff;
        }
        Ok(config)
    }

    fn partitioner(&self) -> Partitioner {
        self.seed
            .map_or_else(Partitioner::from_entropy, Partitioner::new)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ColumnArg {
    Name,
    Wins,
    Losses,
    Games,
    Winrate,
}

impl From<ColumnArg> for SortColumn {
    fn from(column: ColumnArg) -> Self {
        match column {
            ColumnArg::Name => Self::Name,
            ColumnArg::Wins => Self::Wins,
            ColumnArg::Losses => Self::Losses,
            ColumnArg::Games => Self::Games,
            ColumnArg::Winrate => Self::WinRate,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FieldArg {
    Wins,
    Games,
}

impl From<FieldArg> for StatField {
    fn from(field: FieldArg) -> Self {
        match field {
            FieldArg::Wins => Self::Wins,
            FieldArg::Games => Self::Games,
        }
    }
}

/// Entry point for the Courtside command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        CliCommand::Balance {
            balance,
            save_config,
        } => run_balance(&cli.roster, &balance, save_config),
        CliCommand::Leaderboard { sort, ascending } => {
            let roster = Roster::load_or_default(&cli.roster)
                .with_context(|| format!("failed to load roster {}", cli.roster.display()))?;
            let direction = if ascending {
                SortDirection::Ascending
            } else {
                SortDirection::Descending
            };
            print!(
                "{}",
                render::leaderboard(&roster, &LeaderboardSort::new(sort.into(), direction))
            );
            Ok(())
        }
        CliCommand::Roster(command) => run_roster(&cli.roster, command),
        CliCommand::Play { balance, minutes } => {
            let roster = Roster::load_or_default(&cli.roster)
                .with_context(|| format!("failed to load roster {}", cli.roster.display()))?;
            let config = balance.apply(*roster.balance())?;
            let table = play::Table::new(roster, balance.partitioner(), config, minutes);
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to start the async runtime")?
                .block_on(play::run(table, cli.roster))
        }
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let directive = if verbose {
        "courtside=debug"
    } else {
        "courtside=info"
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .try_init()
        .context("failed to install the log subscriber")
}

fn run_balance(path: &Path, args: &BalanceArgs, save_config: bool) -> Result<()> {
    let mut roster = Roster::load_or_default(path)
        .with_context(|| format!("failed to load roster {}", path.display()))?;
    let config = args.apply(*roster.balance())?;
    let present: Vec<_> = roster.present_players().cloned().collect();
    if present.is_empty() {
        println!("Nobody is marked present.");
    }

    let mut commands = Vec::new();
    let outcome = args
        .partitioner()
        .handle(&present, &config, roster.category(), &mut commands);
    let mut session = Session::new();
    let mut events = Vec::new();
    for command in commands {
        session::apply(&mut session, command, &mut events);
    }

    print!("{}", render::teams(&session, &roster));
    if let Some(line) = render::balance(outcome) {
        println!("{line}");
    }

    if save_config {
        roster.set_balance(config);
        roster
            .save(path)
            .with_context(|| format!("failed to save roster {}", path.display()))?;
        info!(path = %path.display(), "balance settings saved");
    }
    Ok(())
}

fn run_roster(path: &Path, command: RosterCommand) -> Result<()> {
    let mut roster = Roster::load_or_default(path)
        .with_context(|| format!("failed to load roster {}", path.display()))?;

    match command {
        RosterCommand::List => {
            print!(
                "{}",
                render::leaderboard(
                    &roster,
                    &LeaderboardSort::new(SortColumn::Name, SortDirection::Ascending)
                )
            );
            return Ok(());
        }
        RosterCommand::Add { name } => {
            let id = roster.add_player(&name)?;
            println!("Added {} as {id}", name.trim());
        }
        RosterCommand::Toggle { player } => {
            let id = roster.resolve(&player)?;
            let present = roster.toggle_presence(id)?;
            let state = if present { "present" } else { "absent" };
            println!("{} is {state}", render::player_name(&roster, id));
        }
        RosterCommand::Remove { player, yes } => {
            let id = roster.resolve(&player)?;
            if !yes {
                bail!(
                    "removing {} is permanent; rerun with --yes",
                    render::player_name(&roster, id)
                );
            }
            let removed = roster.remove_player(id)?;
            println!("Removed {}", removed.name());
        }
        RosterCommand::Reset { player, yes } => {
            let id = roster.resolve(&player)?;
            if !yes {
                bail!(
                    "resetting the stats of {} cannot be undone; rerun with --yes",
                    render::player_name(&roster, id)
                );
            }
            roster.reset_stats(id)?;
            println!("Reset {}", render::player_name(&roster, id));
        }
        RosterCommand::Edit {
            player,
            field,
            value,
        } => {
            let id = roster.resolve(&player)?;
            let stats = roster.edit_stat(id, field.into(), value)?;
            println!(
                "{}: {} wins in {} games",
                render::player_name(&roster, id),
                stats.wins(),
                stats.games()
            );
        }
        RosterCommand::Mark { player, unmark } => {
            let id = roster.resolve(&player)?;
            roster.set_marked(id, !unmark)?;
        }
    }

    roster
        .save(path)
        .with_context(|| format!("failed to save roster {}", path.display()))
}
