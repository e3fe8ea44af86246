use std::collections::BTreeMap;

use courtside_core::{Command, Event, PlayerId, PlayerStats, Side, Teams};
use courtside_session::{self as session, query, Session};
use courtside_system_recorder::{Recorder, StatsStore, StoreError};

#[derive(Default)]
struct Ledger {
    stats: BTreeMap<PlayerId, PlayerStats>,
}

impl StatsStore for Ledger {
    fn fetch_stats(&self, player: PlayerId) -> Result<PlayerStats, StoreError> {
        self.stats
            .get(&player)
            .copied()
            .ok_or(StoreError::UnknownPlayer(player))
    }

    fn update_player_stats(
        &mut self,
        player: PlayerId,
        stats: PlayerStats,
    ) -> Result<(), StoreError> {
        match self.stats.get_mut(&player) {
            Some(slot) => {
                *slot = stats;
                Ok(())
            }
            None => Err(StoreError::UnknownPlayer(player)),
        }
    }
}

fn ids(values: &[u64]) -> Vec<PlayerId> {
    values.iter().copied().map(PlayerId::new).collect()
}

fn stats_of(ledger: &Ledger, id: u64) -> PlayerStats {
    ledger.stats[&PlayerId::new(id)]
}

fn run(session: &mut Session, recorder: &mut Recorder, ledger: &mut Ledger, command: Command) {
    let mut events = Vec::new();
    session::apply(session, command, &mut events);
    let mut commands = Vec::new();
    recorder.handle(&events, ledger, &mut commands);
    for command in commands {
        session::apply(session, command, &mut events);
    }
}

#[test]
fn declaration_updates_participants_only() {
    let mut ledger = Ledger::default();
    for id in 1..=5 {
        let _ = ledger.stats.insert(PlayerId::new(id), PlayerStats::new(2, 1));
    }
    let mut session = Session::new();
    let mut recorder = Recorder::new();
    run(
        &mut session,
        &mut recorder,
        &mut ledger,
        Command::AssignTeams {
            teams: Teams::new(ids(&[1, 2]), ids(&[3, 4]), Vec::new(), ids(&[5])),
        },
    );

    run(
        &mut session,
        &mut recorder,
        &mut ledger,
        Command::DeclareWinner { side: Side::Second },
    );

    assert_eq!(stats_of(&ledger, 1), PlayerStats::new(3, 1));
    assert_eq!(stats_of(&ledger, 2), PlayerStats::new(3, 1));
    assert_eq!(stats_of(&ledger, 3), PlayerStats::new(3, 2));
    assert_eq!(stats_of(&ledger, 4), PlayerStats::new(3, 2));
    assert_eq!(stats_of(&ledger, 5), PlayerStats::new(2, 1), "substitute untouched");
    assert!(!query::declaration_in_flight(&session));
}

#[test]
fn externally_edited_stats_are_not_overwritten() {
    let mut ledger = Ledger::default();
    for id in 1..=2 {
        let _ = ledger.stats.insert(PlayerId::new(id), PlayerStats::default());
    }
    let mut session = Session::new();
    let mut recorder = Recorder::new();
    run(
        &mut session,
        &mut recorder,
        &mut ledger,
        Command::AssignTeams {
            teams: Teams::new(ids(&[1]), ids(&[2]), Vec::new(), Vec::new()),
        },
    );

    let _ = ledger
        .stats
        .insert(PlayerId::new(1), PlayerStats::new(10, 7));
    run(
        &mut session,
        &mut recorder,
        &mut ledger,
        Command::DeclareWinner { side: Side::First },
    );

    assert_eq!(stats_of(&ledger, 1), PlayerStats::new(11, 8));
    assert_eq!(stats_of(&ledger, 2), PlayerStats::new(1, 0));
}

#[test]
fn failed_updates_still_settle_the_declaration() {
    let mut ledger = Ledger::default();
    let _ = ledger.stats.insert(PlayerId::new(1), PlayerStats::default());
    let mut session = Session::new();
    let mut recorder = Recorder::new();
    run(
        &mut session,
        &mut recorder,
        &mut ledger,
        Command::AssignTeams {
            teams: Teams::new(ids(&[1]), ids(&[2]), Vec::new(), Vec::new()),
        },
    );

    let mut events = Vec::new();
    session::apply(
        &mut session,
        Command::DeclareWinner { side: Side::First },
        &mut events,
    );
    assert!(query::declaration_in_flight(&session));

    let mut commands = Vec::new();
    recorder.handle(&events, &mut ledger, &mut commands);
    assert_eq!(commands, vec![Command::SettleDeclaration]);

    let report = recorder.last_report().expect("commit recorded");
    assert_eq!(report.applied, vec![(PlayerId::new(1), PlayerStats::new(1, 1))]);
    assert_eq!(
        report.failed,
        vec![(PlayerId::new(2), StoreError::UnknownPlayer(PlayerId::new(2)))]
    );

    for command in commands {
        session::apply(&mut session, command, &mut events);
    }
    assert!(events.contains(&Event::DeclarationSettled));
    assert!(!query::declaration_in_flight(&session));
}
