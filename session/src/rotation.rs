//! Match rotation across three teams sharing a single court.

use courtside_core::{MatchIndex, TeamCount, TeamSlot, Teams};

/// Reports whether the three-team rotation drives the active pair.
pub(crate) fn is_active(team_count: TeamCount, teams: &Teams) -> bool {
    team_count == TeamCount::Three && !teams.team3().is_empty()
}

/// Slots facing off for the provided rotation state.
pub(crate) fn active_slots(
    team_count: TeamCount,
    teams: &Teams,
    match_index: MatchIndex,
) -> (TeamSlot, TeamSlot) {
    if is_active(team_count, teams) {
        match_index.pairing()
    } else {
        (TeamSlot::Team1, TeamSlot::Team2)
    }
}

/// Match index that follows a declaration.
pub(crate) fn advance(team_count: TeamCount, teams: &Teams, match_index: MatchIndex) -> MatchIndex {
    if is_active(team_count, teams) {
        match_index.next()
    } else {
        MatchIndex::FIRST
    }
}
