//! Plain-text views of the session, the roster and session events.

use std::fmt::Write as _;

use courtside_core::{Event, PlayerId, Side, TeamSlot};
use courtside_roster::Roster;
use courtside_session::{query, Session};
use courtside_system_leaderboard::{win_percent, LeaderboardSort};
use courtside_system_partition::BalanceOutcome;

pub(crate) fn player_name(roster: &Roster, player: PlayerId) -> String {
    roster
        .get(player)
        .map_or_else(|| player.to_string(), |record| record.name().to_owned())
}

fn names(roster: &Roster, players: &[PlayerId]) -> String {
    players
        .iter()
        .map(|player| player_name(roster, *player))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Lists every populated slot and the match currently being played.
pub(crate) fn teams(session: &Session, roster: &Roster) -> String {
    let teams = query::teams(session);
    if teams.is_empty() {
        return "No teams assigned.\n".to_owned();
    }

    let mut view = String::new();
    for slot in TeamSlot::ALL {
        let members = teams.slot(slot);
        if members.is_empty() {
            continue;
        }
        let marker = if roster.category().count_in(members) > 0 {
            format!(" ({} marked)", roster.category().count_in(members))
        } else {
            String::new()
        };
        let _ = writeln!(
            view,
            "{:<7} [{}]{marker}: {}",
            slot.label(),
            members.len(),
            names(roster, members)
        );
    }

    let (first, second) = query::active_slots(session);
    if query::rotation_active(session) {
        let _ = write!(view, "Match {} of 3: ", query::match_index(session).get());
    } else {
        view.push_str("Match: ");
    }
    let _ = writeln!(
        view,
        "{} {} - {} {}",
        first.label(),
        query::score(session, Side::First),
        query::score(session, Side::Second),
        second.label()
    );
    view
}

pub(crate) fn balance(outcome: BalanceOutcome) -> Option<String> {
    match outcome {
        BalanceOutcome::NotApplicable => None,
        BalanceOutcome::WithinTolerance { diff } => Some(format!("Weight difference: {diff}")),
        BalanceOutcome::AboveTolerance { diff, allowed } => Some(format!(
            "Weight difference {diff} exceeds the allowed {allowed}; no better swap was found"
        )),
    }
}

pub(crate) fn clock(session: &Session) -> String {
    let remaining = query::timer_remaining_secs(session);
    let state = if query::timer_running(session) {
        "running"
    } else {
        "paused"
    };
    format!("{:02}:{:02} ({state})", remaining / 60, remaining % 60)
}

/// Renders the standings as an aligned table.
pub(crate) fn leaderboard(roster: &Roster, sort: &LeaderboardSort) -> String {
    let rows = sort.sorted(roster.players());
    let width = rows
        .iter()
        .map(|player| player.name().chars().count())
        .max()
        .unwrap_or(0)
        .max("Name".len());

    let mut table = String::new();
    let _ = writeln!(
        table,
        "{:>4}  {:<width$}  {:>5}  {:>6}  {:>5}  {:>7}",
        "Id", "Name", "Wins", "Losses", "Games", "Win %"
    );
    for player in rows {
        let stats = player.stats();
        let presence = if player.is_present() { "*" } else { " " };
        let _ = writeln!(
            table,
            "{:>4}{presence} {:<width$}  {:>5}  {:>6}  {:>5}  {:>7}",
            player.id().get(),
            player.name(),
            stats.wins(),
            stats.losses(),
            stats.games(),
            win_percent(&stats)
        );
    }
    table
}

/// One-line description of an event worth showing to the operator.
pub(crate) fn event(event: &Event, roster: &Roster) -> Option<String> {
    let line = match event {
        Event::TeamCountChanged { count } => format!("Playing with {} teams", count.get()),
        Event::TeamsCleared => "Teams cleared".to_owned(),
        Event::PlayerBenched { player, slot } => {
            format!("{} left {}", player_name(roster, *player), slot.label())
        }
        Event::PlayersSwapped { first, second } => format!(
            "{} moved to {}, {} moved to {}",
            player_name(roster, first.0),
            first.1.label(),
            player_name(roster, second.0),
            second.1.label()
        ),
        Event::MatchDeclared { result } => format!(
            "Recording match {}: {} beat {}",
            result.match_index.get(),
            names(roster, &result.winners),
            names(roster, &result.losers)
        ),
        Event::TimerExpired => "Time is up!".to_owned(),
        Event::CommandRejected { reason } => format!("Rejected: {reason}"),
        Event::TeamsAssigned { .. }
        | Event::ScoreChanged { .. }
        | Event::DeclarationSettled
        | Event::TimeAdvanced { .. }
        | Event::TimerTicked { .. }
        | Event::NotificationCleared => return None,
    };
    Some(line)
}
