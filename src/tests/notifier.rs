// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{
    notifier::*,
    presence::{Greeting, GreetingEvent, Trigger},
    Error,
};

use anyhow::Result;
use chrono::NaiveDate;
use pretty_assertions::assert_eq as pretty_assert_eq;

fn hello() -> GreetingEvent {
    GreetingEvent {
        avatar: "Bob Builder".into(),
        greeting: Greeting::Hello,
        trigger: Trigger::ChatRange,
        distance: Some(12.47),
        timestamp: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap().and_hms_opt(18, 2, 40).unwrap(),
    }
}

#[test]
fn script_notifier_passes_greeting_through_environment() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("greeting.txt");
    let script = dir.path().join("greet.sh");
    std::fs::write(
        &script,
        format!(
            "echo \"$SLHG_AVATAR|$SLHG_GREETING|$SLHG_TRIGGER|$SLHG_TIMESTAMP|$SLHG_DISTANCE\" > {}\n",
            out.display()
        ),
    )?;

    let mut notifier = ScriptNotifier::new(&script)?;
    notifier.notify(&hello())?;

    let result = std::fs::read_to_string(&out)?;
    pretty_assert_eq!(result, "Bob Builder|hello|chat-range|2025-03-14T18:02:40|12.47\n");

    Ok(())
}

#[test]
fn script_notifier_reports_failing_script() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let script = dir.path().join("greet.sh");
    std::fs::write(&script, "echo nope >&2\nexit 4\n")?;

    let mut notifier = ScriptNotifier::new(&script)?;
    match notifier.notify(&hello()) {
        Err(Error::ScriptFailed { code, stderr, .. }) => {
            pretty_assert_eq!(code, 4);
            pretty_assert_eq!(stderr.trim(), "nope");
        }
        other => panic!("expected script failure, got {other:?}"),
    }

    Ok(())
}

#[test]
fn script_notifier_needs_readable_script() {
    assert!(ScriptNotifier::new("/does/not/exist.sh").is_err());
}

#[test]
fn desktop_notifier_runs_program() {
    let mut notifier = DesktopNotifier::new("Test").with_program("echo");
    assert!(notifier.notify(&hello()).is_ok());

    let mut notifier = DesktopNotifier::new("Test").with_program("false");
    assert!(matches!(notifier.notify(&hello()), Err(Error::SyscallNonInteractive { .. })));
}

#[test]
fn log_notifier_never_fails() {
    assert!(LogNotifier.notify(&hello()).is_ok());
}
