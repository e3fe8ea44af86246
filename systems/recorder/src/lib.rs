#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Recorder system that commits the stat deltas of declared matches.
//!
//! Every participant is read from the store and incremented relative to the
//! value the store currently holds, so stats edited between partition and
//! declaration are not lost. A failed update is reported and skipped without
//! blocking the remaining participants.

use courtside_core::{Command, Event, MatchResult, PlayerId, PlayerStats, StatDelta};
use tracing::{info, warn};

/// Failures surfaced by a stats store.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store holds no record for the player.
    #[error("no stats recorded for player {0}")]
    UnknownPlayer(PlayerId),
    /// The backing storage refused the read or write.
    #[error("stats storage unavailable: {0}")]
    Unavailable(String),
}

/// Persistence seam used to read and write player counters.
pub trait StatsStore {
    /// Reads the latest persisted counters of `player`.
    fn fetch_stats(&self, player: PlayerId) -> Result<PlayerStats, StoreError>;

    /// Replaces the persisted counters of `player`.
    fn update_player_stats(&mut self, player: PlayerId, stats: PlayerStats)
        -> Result<(), StoreError>;
}

/// Per-player outcome of a stat commit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Players whose counters were updated, with their new values.
    pub applied: Vec<(PlayerId, PlayerStats)>,
    /// Players whose update failed together with the reason.
    pub failed: Vec<(PlayerId, StoreError)>,
}

impl CommitReport {
    /// Reports whether every participant was updated.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Applies every delta to the store, continuing past individual failures.
pub fn commit<S>(store: &mut S, deltas: &[StatDelta]) -> CommitReport
where
    S: StatsStore + ?Sized,
{
    let mut report = CommitReport::default();
    for delta in deltas {
        let outcome = store.fetch_stats(delta.player).and_then(|current| {
            let updated = current.with_delta(delta);
            store
                .update_player_stats(delta.player, updated)
                .map(|()| updated)
        });
        match outcome {
            Ok(updated) => report.applied.push((delta.player, updated)),
            Err(error) => {
                warn!(player = %delta.player, %error, "failed to record match stats");
                report.failed.push((delta.player, error));
            }
        }
    }
    report
}

/// Event-driven system that records declared matches and settles them.
#[derive(Debug, Default)]
pub struct Recorder {
    last_report: Option<CommitReport>,
}

impl Recorder {
    /// Creates a recorder that has not committed anything yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Report of the most recent commit, if any.
    #[must_use]
    pub fn last_report(&self) -> Option<&CommitReport> {
        self.last_report.as_ref()
    }

    /// Commits every `MatchDeclared` event and queues its settlement.
    ///
    /// A settlement is emitted even when some updates failed so the session
    /// never stays locked behind a broken store.
    pub fn handle<S>(&mut self, events: &[Event], store: &mut S, out: &mut Vec<Command>)
    where
        S: StatsStore + ?Sized,
    {
        for event in events {
            if let Event::MatchDeclared { result } = event {
                let report = self.record(result, store);
                info!(
                    match_index = result.match_index.get(),
                    applied = report.applied.len(),
                    failed = report.failed.len(),
                    "match stats committed"
                );
                self.last_report = Some(report);
                out.push(Command::SettleDeclaration);
            }
        }
    }

    fn record<S>(&self, result: &MatchResult, store: &mut S) -> CommitReport
    where
        S: StatsStore + ?Sized,
    {
        commit(store, &result.deltas())
    }
}
