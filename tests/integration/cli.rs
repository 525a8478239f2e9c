// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use anyhow::Result;
use assert_cmd::Command;
use indoc::indoc;

const LOG: &str = indoc! {"
    [2025/03/14 18:00:05]  Bob Builder entered chat range (12.47 m).
    [2025/03/14 18:00:10]  Bob Builder: hi!
    [2025/03/14 18:01:00]  Bob Builder left chat range.
"};

fn sl_hello_goodbye(config_home: &std::path::Path) -> Result<Command> {
    let mut cmd = Command::cargo_bin("sl_hello_goodbye")?;
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env("HOME", config_home)
        .env_remove("RUST_LOG")
        .env_remove("SL_HELLO_GOODBYE_LOG_DIR");
    Ok(cmd)
}

#[test]
fn parse_prints_event_table() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let log = dir.path().join("chat.txt");
    std::fs::write(&log, LOG)?;

    let output = sl_hello_goodbye(dir.path())?.arg("parse").arg(&log).output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("entered chat range (12.47 m)"));
    assert!(stdout.contains("says: hi!"));

    Ok(())
}

#[test]
fn parse_prints_greetings() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let log = dir.path().join("chat.txt");
    std::fs::write(&log, LOG)?;

    let output = sl_hello_goodbye(dir.path())?.args(["parse", "--greetings"]).arg(&log).output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("hello"));
    assert!(stdout.contains("goodbye"));
    assert!(!stdout.contains("says: hi!"));

    Ok(())
}

#[test]
fn parse_missing_log_exits_with_noinput() -> Result<()> {
    let dir = tempfile::tempdir()?;
    sl_hello_goodbye(dir.path())?
        .args(["parse", "no_such_chat.txt"])
        .assert()
        .failure()
        .code(exitcode::NOINPUT);

    Ok(())
}

#[test]
fn watch_without_avatar_exits_with_config_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    sl_hello_goodbye(dir.path())?.arg("watch").assert().failure().code(exitcode::CONFIG);

    Ok(())
}

#[test]
fn watch_with_missing_chat_log_exits_with_noinput() -> Result<()> {
    let dir = tempfile::tempdir()?;
    sl_hello_goodbye(dir.path())?
        .args(["watch", "--avatar-name", "Jane Resident", "--viewer-dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .code(exitcode::NOINPUT);

    Ok(())
}

#[test]
fn release_rejects_unknown_level() -> Result<()> {
    Command::cargo_bin("release")?.arg("huge").assert().failure();
    Ok(())
}

#[test]
fn release_outside_repository_fails() -> Result<()> {
    let dir = tempfile::tempdir()?;
    Command::cargo_bin("release")?
        .arg("patch")
        .current_dir(dir.path())
        .env_remove("SL_HELLO_GOODBYE_LOG_DIR")
        .assert()
        .failure();

    Ok(())
}
