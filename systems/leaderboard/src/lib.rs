#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Sortable win/loss standings derived from roster snapshots.

use std::cmp::Ordering;

use courtside_core::{Player, PlayerStats};
use serde::{Deserialize, Serialize};

/// Column the standings can be ordered by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortColumn {
    /// Player name, compared case-insensitively.
    Name,
    /// Recorded wins.
    #[default]
    Wins,
    /// Games minus wins.
    Losses,
    /// Recorded games.
    Games,
    /// Wins divided by games.
    #[serde(rename = "winrate")]
    WinRate,
}

/// Ordering direction of the standings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest values first.
    Ascending,
    /// Largest values first.
    #[default]
    Descending,
}

impl SortDirection {
    /// Returns the opposite direction.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Active column and direction of the standings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardSort {
    /// Column the rows are ordered by.
    pub column: SortColumn,
    /// Direction applied to the column.
    pub direction: SortDirection,
}

impl LeaderboardSort {
    /// Creates a sort over `column` in `direction`.
    #[must_use]
    pub const fn new(column: SortColumn, direction: SortDirection) -> Self {
        Self { column, direction }
    }

    /// Selects `column`, flipping the direction when it is already active.
    ///
    /// A newly selected column always starts descending.
    pub fn toggle_sort(&mut self, column: SortColumn) {
        if self.column == column {
            self.direction = self.direction.flipped();
        } else {
            self.column = column;
            self.direction = SortDirection::Descending;
        }
    }

    /// Orders `players` in place; rows comparing equal keep their roster order.
    pub fn sort(&self, players: &mut [Player]) {
        players.sort_by(|lhs, rhs| {
            let ordering = compare(self.column, lhs, rhs);
            match self.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
    }

    /// Returns a sorted copy of `players`.
    #[must_use]
    pub fn sorted(&self, players: &[Player]) -> Vec<Player> {
        let mut rows = players.to_vec();
        self.sort(&mut rows);
        rows
    }
}

fn compare(column: SortColumn, lhs: &Player, rhs: &Player) -> Ordering {
    let (left, right) = (lhs.stats(), rhs.stats());
    match column {
        SortColumn::Name => lhs.name().to_lowercase().cmp(&rhs.name().to_lowercase()),
        SortColumn::Wins => left.wins().cmp(&right.wins()),
        SortColumn::Losses => left.losses().cmp(&right.losses()),
        SortColumn::Games => left.games().cmp(&right.games()),
        SortColumn::WinRate => left.cmp_win_rate(&right),
    }
}

/// Formats the win rate as a percentage with two decimals, e.g. `"66.67"`.
#[must_use]
pub fn win_percent(stats: &PlayerStats) -> String {
    format!("{:.2}", stats.win_rate() * 100.0)
}
