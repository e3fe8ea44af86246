#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! File-backed roster that supplies players to the balancing engine and
//! persists the stats it records.
//!
//! The roster file is TOML. Marked players are stored by id in
//! `category_ids`; hand-written files may list unique names in `category`
//! instead.
//!
//! ```toml
//! category_ids = [1]
//!
//! [balance]
//! team_count = 2
//! weighted = true
//!
//! [[players]]
//! id = 1
//! name = "Ann"
//! present = true
//! games = 4
//! wins = 3
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use courtside_core::{BalanceConfig, CategorySet, Player, PlayerId, PlayerStats};
use courtside_system_recorder::{StatsStore, StoreError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Errors raised by roster operations and roster file I/O.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    /// A player name was empty after trimming.
    #[error("player name must not be empty")]
    EmptyName,
    /// No player carries the requested identifier.
    #[error("no player with id {0}")]
    UnknownPlayer(PlayerId),
    /// No player carries the requested name.
    #[error("no player named `{0}`")]
    UnknownName(String),
    /// Several players share the requested name.
    #[error("`{name}` matches {count} players; use the numeric id instead")]
    AmbiguousName {
        /// Name that was looked up.
        name: String,
        /// Number of players sharing it.
        count: usize,
    },
    /// Two records in the roster file share an identifier.
    #[error("player id {0} appears more than once in the roster file")]
    DuplicateId(PlayerId),
    /// The roster file could not be read or written.
    #[error("failed to access roster file {}", path.display())]
    Io {
        /// Path of the roster file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The roster file is not valid TOML for a roster.
    #[error("failed to parse roster file")]
    Parse(#[from] toml::de::Error),
    /// The roster could not be encoded as TOML.
    #[error("failed to encode roster file")]
    Encode(#[from] toml::ser::Error),
}

/// Counter that can be edited directly from the leaderboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatField {
    /// Recorded wins.
    Wins,
    /// Recorded games.
    Games,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RosterFile {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    category: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    category_ids: Vec<PlayerId>,
    #[serde(default)]
    balance: BalanceConfig,
    #[serde(default)]
    players: Vec<Player>,
}

/// In-memory roster with monotonically allocated player identifiers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Roster {
    players: Vec<Player>,
    category: CategorySet,
    balance: BalanceConfig,
    next_id: u64,
}

impl Roster {
    /// Creates an empty roster with the default balance configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Loads a roster from the TOML file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RosterError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| RosterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let roster = Self::from_toml(&contents)?;
        debug!(path = %path.display(), players = roster.players.len(), "roster loaded");
        Ok(roster)
    }

    /// Loads the roster at `path`, or starts an empty one when the file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, RosterError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "roster file missing; starting empty");
            Ok(Self::new())
        }
    }

    /// Writes the roster to `path` as TOML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RosterError> {
        let path = path.as_ref();
        let contents = self.to_toml()?;
        fs::write(path, contents).map_err(|source| RosterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), players = self.players.len(), "roster saved");
        Ok(())
    }

    /// Parses a roster from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, RosterError> {
        let file: RosterFile = toml::from_str(contents)?;

        let mut roster = Self {
            balance: file.balance,
            ..Self::new()
        };
        for player in file.players {
            if roster.get(player.id()).is_some() {
                return Err(RosterError::DuplicateId(player.id()));
            }
            roster.next_id = roster.next_id.max(player.id().get().saturating_add(1));
            roster.players.push(player);
        }
        for id in file.category_ids {
            if roster.get(id).is_none() {
                return Err(RosterError::UnknownPlayer(id));
            }
            roster.category.insert(id);
        }
        for name in &file.category {
            let id = roster.resolve_name(name)?;
            roster.category.insert(id);
        }
        Ok(roster)
    }

    /// Encodes the roster as TOML text.
    pub fn to_toml(&self) -> Result<String, RosterError> {
        let file = RosterFile {
            category: Vec::new(),
            category_ids: self.category.iter().collect(),
            balance: self.balance,
            players: self.players.clone(),
        };
        Ok(toml::to_string_pretty(&file)?)
    }

    /// Every player in roster order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Players currently marked present.
    pub fn present_players(&self) -> impl Iterator<Item = &Player> + '_ {
        self.players.iter().filter(|player| player.is_present())
    }

    /// Looks a player up by identifier.
    #[must_use]
    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|player| player.id() == id)
    }

    /// Players whose name matches `name`, ignoring case and surrounding whitespace.
    pub fn find_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Player> + 'a {
        let wanted = name.trim();
        self.players
            .iter()
            .filter(move |player| player.name().eq_ignore_ascii_case(wanted))
    }

    /// Resolves a numeric identifier or a unique player name.
    pub fn resolve(&self, reference: &str) -> Result<PlayerId, RosterError> {
        let reference = reference.trim();
        let numeric = reference.strip_prefix('#').unwrap_or(reference);
        if let Ok(raw) = numeric.parse::<u64>() {
            let id = PlayerId::new(raw);
            return self
                .get(id)
                .map(Player::id)
                .ok_or(RosterError::UnknownPlayer(id));
        }

        self.resolve_name(reference)
    }

    /// Marked players that the balancer spreads across teams.
    #[must_use]
    pub fn category(&self) -> &CategorySet {
        &self.category
    }

    /// Balance configuration stored alongside the roster.
    #[must_use]
    pub fn balance(&self) -> &BalanceConfig {
        &self.balance
    }

    /// Replaces the stored balance configuration.
    pub fn set_balance(&mut self, balance: BalanceConfig) {
        self.balance = balance;
    }

    /// Adds an absent player without stats and returns its identifier.
    pub fn add_player(&mut self, name: &str) -> Result<PlayerId, RosterError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(RosterError::EmptyName);
        }
        let id = PlayerId::new(self.next_id);
        self.next_id += 1;
        self.players.push(Player::new(id, trimmed));
        Ok(id)
    }

    /// Flips the attendance flag and returns the new value.
    pub fn toggle_presence(&mut self, id: PlayerId) -> Result<bool, RosterError> {
        let player = self.get_mut(id)?;
        let present = !player.is_present();
        player.set_present(present);
        Ok(present)
    }

    /// Removes a player permanently and returns its record.
    pub fn remove_player(&mut self, id: PlayerId) -> Result<Player, RosterError> {
        let index = self
            .players
            .iter()
            .position(|player| player.id() == id)
            .ok_or(RosterError::UnknownPlayer(id))?;
        let _ = self.category.remove(id);
        Ok(self.players.remove(index))
    }

    /// Sets both counters of a player back to zero.
    pub fn reset_stats(&mut self, id: PlayerId) -> Result<(), RosterError> {
        self.get_mut(id)?.set_stats(PlayerStats::default());
        Ok(())
    }

    /// Overwrites a single counter of a player.
    pub fn edit_stat(
        &mut self,
        id: PlayerId,
        field: StatField,
        value: u32,
    ) -> Result<PlayerStats, RosterError> {
        let player = self.get_mut(id)?;
        let current = player.stats();
        let updated = match field {
            StatField::Wins => PlayerStats::new(current.games(), value),
            StatField::Games => PlayerStats::new(value, current.wins()),
        };
        player.set_stats(updated);
        Ok(updated)
    }

    /// Marks or unmarks a player for category balancing.
    pub fn set_marked(&mut self, id: PlayerId, marked: bool) -> Result<(), RosterError> {
        let _ = self.get_mut(id)?;
        if marked {
            self.category.insert(id);
        } else {
            let _ = self.category.remove(id);
        }
        Ok(())
    }

    fn get_mut(&mut self, id: PlayerId) -> Result<&mut Player, RosterError> {
        self.players
            .iter_mut()
            .find(|player| player.id() == id)
            .ok_or(RosterError::UnknownPlayer(id))
    }

    fn resolve_name(&self, name: &str) -> Result<PlayerId, RosterError> {
        let name = name.trim();
        let matches: Vec<PlayerId> = self.find_by_name(name).map(Player::id).collect();
        match matches.as_slice() {
            [] => Err(RosterError::UnknownName(name.to_owned())),
            [id] => Ok(*id),
            _ => Err(RosterError::AmbiguousName {
                name: name.to_owned(),
                count: matches.len(),
            }),
        }
    }
}

impl StatsStore for Roster {
    fn fetch_stats(&self, player: PlayerId) -> Result<PlayerStats, StoreError> {
        self.get(player)
            .map(Player::stats)
            .ok_or(StoreError::UnknownPlayer(player))
    }

    fn update_player_stats(
        &mut self,
        player: PlayerId,
        stats: PlayerStats,
    ) -> Result<(), StoreError> {
        self.get_mut(player)
            .map(|record| record.set_stats(stats))
            .map_err(|_| StoreError::UnknownPlayer(player))
    }
}
