use courtside_core::{BalanceConfig, PlayerId, PlayerStats, TeamCount};
use courtside_roster::{Roster, RosterError, StatField};
use courtside_system_recorder::{commit, StatsStore};

const ROSTER: &str = r#"
category = ["Bea"]

[balance]
team_count = 3
weighted = true
max_weight_diff = 1.5

[[players]]
id = 3
name = "Ann"
present = true
games = 4
wins = 3

[[players]]
id = 7
name = "Bea"

[[players]]
id = 5
name = "Carl"
present = true
games = 2
"#;

#[test]
fn parses_players_category_and_balance() {
    let roster = Roster::from_toml(ROSTER).expect("valid roster");

    assert_eq!(roster.players().len(), 3);
    let ann = roster.get(PlayerId::new(3)).expect("ann");
    assert!(ann.is_present());
    assert_eq!(ann.stats(), PlayerStats::new(4, 3));

    let bea = roster.get(PlayerId::new(7)).expect("bea");
    assert!(!bea.is_present());
    assert_eq!(bea.stats(), PlayerStats::default());
    assert!(roster.category().contains(PlayerId::new(7)));
    assert_eq!(roster.category().len(), 1);

    assert_eq!(
        *roster.balance(),
        BalanceConfig {
            team_count: TeamCount::Three,
            weighted: true,
            max_weight_diff: 1.5,
            ..BalanceConfig::default()
        }
    );
}

#[test]
fn new_ids_continue_after_the_largest_loaded_id() {
    let mut roster = Roster::from_toml(ROSTER).expect("valid roster");
    assert_eq!(roster.add_player("Dana").expect("added"), PlayerId::new(8));
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let roster = Roster::from_toml("").expect("empty roster");
    assert!(roster.players().is_empty());
    assert_eq!(*roster.balance(), BalanceConfig::default());
}

#[test]
fn rejects_duplicate_ids_and_unknown_category_names() {
    let duplicate = "[[players]]\nid = 1\nname = \"a\"\n\n[[players]]\nid = 1\nname = \"b\"\n";
    assert!(matches!(
        Roster::from_toml(duplicate),
        Err(RosterError::DuplicateId(id)) if id == PlayerId::new(1)
    ));

    let unknown = "category = [\"Zed\"]\n";
    assert!(matches!(
        Roster::from_toml(unknown),
        Err(RosterError::UnknownName(name)) if name == "Zed"
    ));

    assert!(matches!(
        Roster::from_toml("[balance]\nteam_count = 4\n"),
        Err(RosterError::Parse(_))
    ));
}

#[test]
fn save_and_load_preserve_the_roster() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("roster.toml");
    let mut roster = Roster::from_toml(ROSTER).expect("valid roster");
    let dana = roster.add_player("Dana").expect("added");
    let _ = roster.edit_stat(dana, StatField::Games, 1).expect("known");

    roster.save(&path).expect("saved");
    let reloaded = Roster::load(&path).expect("loaded");

    assert_eq!(reloaded, roster);
}

#[test]
fn missing_file_starts_an_empty_roster() {
    let dir = tempfile::tempdir().expect("temp dir");
    let roster = Roster::load_or_default(dir.path().join("absent.toml")).expect("default");
    assert!(roster.players().is_empty());

    assert!(matches!(
        Roster::load(dir.path().join("absent.toml")),
        Err(RosterError::Io { .. })
    ));
}

#[test]
fn commits_write_through_to_the_roster() {
    let mut roster = Roster::from_toml(ROSTER).expect("valid roster");
    let deltas = [
        courtside_core::StatDelta {
            player: PlayerId::new(3),
            games_delta: 1,
            wins_delta: 1,
        },
        courtside_core::StatDelta {
            player: PlayerId::new(99),
            games_delta: 1,
            wins_delta: 0,
        },
    ];

    let report = commit(&mut roster, &deltas);

    assert_eq!(report.applied.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(
        roster.fetch_stats(PlayerId::new(3)),
        Ok(PlayerStats::new(5, 4))
    );
}

#[test]
fn marks_survive_a_save_when_names_repeat() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("roster.toml");
    let mut roster = Roster::new();
    let marked = roster.add_player("Sam").expect("added");
    let unmarked = roster.add_player("Sam").expect("added");
    roster.set_marked(marked, true).expect("known");

    roster.save(&path).expect("saved");
    let reloaded = Roster::load(&path).expect("loaded");

    assert!(reloaded.category().contains(marked));
    assert!(!reloaded.category().contains(unmarked));
    assert_eq!(reloaded.category(), roster.category());
}

#[test]
fn hand_written_category_names_must_be_unique() {
    let contents = "category = [\"Sam\"]\n\n[[players]]\nid = 1\nname = \"Sam\"\n\n[[players]]\nid = 2\nname = \"sam\"\n";
    assert!(matches!(
        Roster::from_toml(contents),
        Err(RosterError::AmbiguousName { count: 2, .. })
    ));

    let unknown_id = "category_ids = [9]\n\n[[players]]\nid = 1\nname = \"Sam\"\n";
    assert!(matches!(
        Roster::from_toml(unknown_id),
        Err(RosterError::UnknownPlayer(id)) if id == PlayerId::new(9)
    ));
}
