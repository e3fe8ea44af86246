#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state management for Courtside.
//!
//! A [`Session`] holds the current partition, the rotation index, the
//! scoreboard, the countdown and the winner notification. It references
//! players by identifier only; names and historical counters stay with the
//! roster provider.

mod countdown;
mod rotation;

use std::time::Duration;

use courtside_core::{
    Command, Event, MatchIndex, MatchResult, RejectionReason, ScoreAdjustment, Side, TeamCount,
    Teams, DEFAULT_TIMER_MINUTES, WIN_NOTIFICATION_DURATION,
};
use tracing::{debug, info};

use crate::countdown::Countdown;

/// Represents the authoritative state of a single balancing session.
#[derive(Debug)]
pub struct Session {
    team_count: TeamCount,
    teams: Teams,
    match_index: MatchIndex,
    scores: Scoreboard,
    declaration_in_flight: bool,
    countdown: Countdown,
    notification: Option<Notification>,
}

impl Session {
    /// Creates a fresh two-team session with empty slots.
    #[must_use]
    pub fn new() -> Self {
        Self {
            team_count: TeamCount::Two,
            teams: Teams::empty(),
            match_index: MatchIndex::FIRST,
            scores: Scoreboard::default(),
            declaration_in_flight: false,
            countdown: Countdown::new(DEFAULT_TIMER_MINUTES),
            notification: None,
        }
    }

    fn reset_match_state(&mut self) {
        self.scores = Scoreboard::default();
        self.match_index = MatchIndex::FIRST;
    }

    fn ensure_idle(&self) -> Result<(), RejectionReason> {
        if self.declaration_in_flight {
            Err(RejectionReason::DeclarationInFlight)
        } else {
            Ok(())
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Scoreboard {
    first: u32,
    second: u32,
}

impl Scoreboard {
    fn get(&self, side: Side) -> u32 {
        match side {
            Side::First => self.first,
            Side::Second => self.second,
        }
    }

    fn adjust(&mut self, side: Side, adjustment: ScoreAdjustment) -> u32 {
        let score = match side {
            Side::First => &mut self.first,
            Side::Second => &mut self.second,
        };
        *score = match adjustment {
            ScoreAdjustment::Increment => score.saturating_add(1),
            ScoreAdjustment::Decrement => score.saturating_sub(1),
        };
        *score
    }
}

#[derive(Clone, Debug)]
struct Notification {
    message: String,
    remaining: Duration,
}

/// Declares the winner of the current match.
///
/// The active pair is captured before the rotation advances, so the returned
/// result always names the teams that actually played. Scores reset, the
/// winner notification is posted and the in-flight guard is raised until a
/// [`Command::SettleDeclaration`] arrives.
pub fn declare_winner(session: &mut Session, side: Side) -> Result<MatchResult, RejectionReason> {
    session.ensure_idle()?;

    let (first, second) = query::active_pair(session);
    if first.is_empty() && second.is_empty() {
        return Err(RejectionReason::NoActiveMatch);
    }

    let (winners, losers) = match side {
        Side::First => (first.to_vec(), second.to_vec()),
        Side::Second => (second.to_vec(), first.to_vec()),
    };
    let match_index = session.match_index;
    let next_match_index = rotation::advance(session.team_count, &session.teams, match_index);

    session.match_index = next_match_index;
    session.scores = Scoreboard::default();
    session.declaration_in_flight = true;
    session.notification = Some(Notification {
        message: format!("Team {} Wins!", side.number()),
        remaining: WIN_NOTIFICATION_DURATION,
    });

    info!(
        winner = side.number(),
        match_index = match_index.get(),
        next_match_index = next_match_index.get(),
        "match declared"
    );

    Ok(MatchResult {
        winner: side,
        match_index,
        next_match_index,
        winners,
        losers,
    })
}

/// Applies the provided command to the session, mutating state deterministically.
pub fn apply(session: &mut Session, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SetTeamCount { count } => {
            if let Err(reason) = session.ensure_idle() {
                out_events.push(Event::CommandRejected { reason });
                return;
            }
            if session.team_count != count {
                session.team_count = count;
                out_events.push(Event::TeamCountChanged { count });
            }
        }
        Command::AssignTeams { teams } => {
            if let Err(reason) = session.ensure_idle() {
                out_events.push(Event::CommandRejected { reason });
                return;
            }
            debug_assert!(teams.is_disjoint(), "partition assigns a player twice");
            debug!(
                team1 = teams.team1().len(),
                team2 = teams.team2().len(),
                team3 = teams.team3().len(),
                subs = teams.subs().len(),
                "teams assigned"
            );
            session.teams = teams.clone();
            session.reset_match_state();
            out_events.push(Event::TeamsAssigned { teams });
        }
        Command::ClearTeams => {
            if let Err(reason) = session.ensure_idle() {
                out_events.push(Event::CommandRejected { reason });
                return;
            }
            session.teams = Teams::empty();
            session.reset_match_state();
            out_events.push(Event::TeamsCleared);
        }
        Command::RemoveFromTeams { player } => match session.teams.remove(player) {
            Some(slot) => out_events.push(Event::PlayerBenched { player, slot }),
            None => out_events.push(Event::CommandRejected {
                reason: RejectionReason::UnknownPlayer(player),
            }),
        },
        Command::SwapPlayers { first, second } => {
            if let Err(reason) = session.ensure_idle() {
                out_events.push(Event::CommandRejected { reason });
                return;
            }
            let missing = [first, second]
                .into_iter()
                .find(|player| session.teams.slot_of(*player).is_none());
            if let Some(player) = missing {
                out_events.push(Event::CommandRejected {
                    reason: RejectionReason::UnknownPlayer(player),
                });
                return;
            }
            let _ = session.teams.swap(first, second);
            if let (Some(first_slot), Some(second_slot)) = (
                session.teams.slot_of(first),
                session.teams.slot_of(second),
            ) {
                out_events.push(Event::PlayersSwapped {
                    first: (first, first_slot),
                    second: (second, second_slot),
                });
            }
        }
        Command::AdjustScore { side, adjustment } => {
            let score = session.scores.adjust(side, adjustment);
            out_events.push(Event::ScoreChanged { side, score });
        }
        Command::DeclareWinner { side } => match declare_winner(session, side) {
            Ok(result) => out_events.push(Event::MatchDeclared { result }),
            Err(reason) => out_events.push(Event::CommandRejected { reason }),
        },
        Command::SettleDeclaration => {
            if session.declaration_in_flight {
                session.declaration_in_flight = false;
                out_events.push(Event::DeclarationSettled);
            }
        }
        Command::StartTimer => {
            let _ = session.countdown.start();
        }
        Command::PauseTimer => session.countdown.pause(),
        Command::ResetTimer { minutes } => session.countdown.reset(minutes),
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });

            let progress = session.countdown.tick(dt);
            if let Some(remaining_secs) = progress.ticked {
                out_events.push(Event::TimerTicked { remaining_secs });
            }
            if progress.expired {
                out_events.push(Event::TimerExpired);
            }

            if let Some(notification) = session.notification.as_mut() {
                notification.remaining = notification.remaining.saturating_sub(dt);
                if notification.remaining.is_zero() {
                    session.notification = None;
                    out_events.push(Event::NotificationCleared);
                }
            }
        }
    }
}

/// Query functions that provide read-only access to the session state.
pub mod query {
    use courtside_core::{MatchIndex, PlayerId, Side, TeamCount, TeamSlot, Teams};

    use super::{rotation, Session};

    /// Number of teams the session partitions into.
    #[must_use]
    pub fn team_count(session: &Session) -> TeamCount {
        session.team_count
    }

    /// Provides read-only access to the current partition.
    #[must_use]
    pub fn teams(session: &Session) -> &Teams {
        &session.teams
    }

    /// Rotation index of the match currently being played.
    ///
    /// Outside of an active three-team rotation the index is always the first.
    #[must_use]
    pub fn match_index(session: &Session) -> MatchIndex {
        if rotation::is_active(session.team_count, &session.teams) {
            session.match_index
        } else {
            MatchIndex::FIRST
        }
    }

    /// Reports whether the three-team rotation selects the active pair.
    #[must_use]
    pub fn rotation_active(session: &Session) -> bool {
        rotation::is_active(session.team_count, &session.teams)
    }

    /// Slots of the two teams currently facing off.
    #[must_use]
    pub fn active_slots(session: &Session) -> (TeamSlot, TeamSlot) {
        rotation::active_slots(session.team_count, &session.teams, session.match_index)
    }

    /// Players of the two teams currently facing off.
    #[must_use]
    pub fn active_pair(session: &Session) -> (&[PlayerId], &[PlayerId]) {
        let (first, second) = active_slots(session);
        (session.teams.slot(first), session.teams.slot(second))
    }

    /// Current score of the provided scoreboard side.
    #[must_use]
    pub fn score(session: &Session, side: Side) -> u32 {
        session.scores.get(side)
    }

    /// Reports whether a declaration still awaits its stat commit.
    #[must_use]
    pub fn declaration_in_flight(session: &Session) -> bool {
        session.declaration_in_flight
    }

    /// Whole seconds left on the countdown.
    #[must_use]
    pub fn timer_remaining_secs(session: &Session) -> u32 {
        session.countdown.remaining_secs()
    }

    /// Reports whether the countdown is running.
    #[must_use]
    pub fn timer_running(session: &Session) -> bool {
        session.countdown.is_running()
    }

    /// Winner announcement that is still visible, if any.
    #[must_use]
    pub fn notification(session: &Session) -> Option<&str> {
        session
            .notification
            .as_ref()
            .map(|notification| notification.message.as_str())
    }
}
