// Drives the compiled binary through a PTY to exercise the real event loop
// and crossterm input handling.
//
// Unix-only and ignored by default; run manually via:
// `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn resign_and_quit_exits_cleanly() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let bin = assert_cmd::cargo::cargo_bin("hangtime");
    let cmd = format!(
        "env HOME={home} {bin} -n pty -d easy --offline --config {home}/config.json --db {home}/stats.db",
        home = dir.path().display(),
        bin = bin.display(),
    );

    let mut p = spawn(cmd)?;
    std::thread::sleep(Duration::from_millis(200));

    // one letter, then resign to reach the results screen
    p.send("le\r")?;
    std::thread::sleep(Duration::from_millis(100));
    p.send("r")?;
    std::thread::sleep(Duration::from_millis(200));

    p.send("\x1b")?; // ESC
    p.expect(Eof)?;

    let db = hangtime::stats::StatsDb::open(dir.path().join("stats.db"))?;
    assert_eq!(db.player("pty")?.map(|p| p.games_played), Some(1));
    Ok(())
}
