use std::time::Duration;

use hangtime::clock::ManualTime;
use hangtime::profile::{Difficulty, ProfileTable};
use hangtime::session::SessionSummary;
use hangtime::stats::StatsDb;
use hangtime::{Session, Status};
use tempfile::tempdir;

fn summary(status: Status, final_score: u32, high_score: u32, outstanding: u32) -> SessionSummary {
    SessionSummary {
        secret: "ox".to_string(),
        difficulty: Difficulty::Medium,
        status,
        final_score,
        high_score,
        outstanding_score: outstanding,
        elapsed: Duration::from_secs(42),
        remaining_attempts: 3,
        hints_used: 1,
    }
}

#[test]
fn stats_survive_reopening_the_database() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("stats.db");

    {
        let mut db = StatsDb::open(&path).unwrap();
        db.record_game("ada", &summary(Status::Won, 90, 90, 120)).unwrap();
    }

    let mut db = StatsDb::open(&path).unwrap();
    db.record_game("ada", &summary(Status::Resigned, 0, 40, 40)).unwrap();

    let ada = db.player("ada").unwrap().unwrap();
    assert_eq!(ada.high_score, 90);
    assert_eq!(ada.outstanding_score, 160);
    assert_eq!(ada.games_played, 2);

    let history = db.recent_games("ada", 10).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].status, "resigned");
    assert_eq!(history[1].status, "won");
    assert_eq!(history[1].elapsed_secs, 42);
}

#[test]
fn finished_session_feeds_the_next_one() {
    let dir = tempdir().unwrap();
    let mut db = StatsDb::open(dir.path().join("stats.db")).unwrap();
    let profile = ProfileTable::standard().get(Difficulty::Easy).clone();

    let mut first = Session::with_time_source("ox", profile.clone(), 0, ManualTime::new()).unwrap();
    first.begin().unwrap();
    first.submit_letter("o").unwrap();
    first.submit_letter("x").unwrap();
    assert_eq!(first.status(), Status::Won);
    db.record_game("bob", &first.summary()).unwrap();

    let stored = db.high_score("bob").unwrap();
    assert_eq!(stored, first.high_score());

    let second = Session::new("cat", profile, stored).unwrap();
    assert_eq!(second.high_score(), stored);
    assert_eq!(second.current_score(), 0);
}

#[test]
fn leaderboard_export_lists_players_by_rank() {
    let dir = tempdir().unwrap();
    let mut db = StatsDb::open(dir.path().join("stats.db")).unwrap();
    db.record_game("low", &summary(Status::LostTime, 10, 10, 10)).unwrap();
    db.record_game("high", &summary(Status::Won, 200, 200, 200)).unwrap();

    let mut out = Vec::new();
    let written = db.export_leaderboard_csv(&mut out).unwrap();
    assert_eq!(written, 2);

    let csv = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "rank,name,high_score,outstanding_score,games_played,last_played"
    );
    assert!(lines[1].starts_with("1,high,200,200,1,"));
    assert!(lines[2].starts_with("2,low,10,10,1,"));
}

#[test]
fn clearing_stats_empties_the_board() {
    let dir = tempdir().unwrap();
    let mut db = StatsDb::open(dir.path().join("stats.db")).unwrap();
    db.record_game("ada", &summary(Status::Won, 5, 5, 5)).unwrap();

    db.clear_all_stats().unwrap();
    assert!(db.leaderboard(10).unwrap().is_empty());
    assert!(db.recent_games("ada", 10).unwrap().is_empty());
    assert_eq!(db.high_score("ada").unwrap(), 0);
}
