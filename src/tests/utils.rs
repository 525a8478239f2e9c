// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{utils::*, Error};

use pretty_assertions::assert_eq as pretty_assert_eq;
use simple_test_case::test_case;

#[test_case("echo", vec!["hello".into()], Ok("stdout: hello".into()); "no error")]
#[test_case("sh", vec!["-c".into(), "echo oops >&2".into()], Ok("stderr: oops".into()); "stderr only")]
#[test_case("not_found", vec!["fail".into()], Err(()); "no program")]
#[test_case("sh", vec!["-c".into(), "exit 3".into()], Err(()); "non zero exit")]
#[test]
fn smoke_syscall_non_interactive(cmd: &str, args: Vec<String>, expect: Result<String, ()>) {
    let result = syscall_non_interactive(cmd, args, None);
    match expect {
        Ok(message) => pretty_assert_eq!(result.unwrap(), message),
        Err(_) => assert!(result.is_err()),
    }
}

#[test]
fn syscall_non_interactive_keeps_output_of_failure() {
    let result = syscall_non_interactive("sh", ["-c", "echo broken >&2; exit 1"], None);
    match result {
        Err(Error::SyscallNonInteractive { program, message }) => {
            pretty_assert_eq!(program, "sh");
            pretty_assert_eq!(message, "stderr: broken");
        }
        other => panic!("expected syscall failure, got {other:?}"),
    }
}

#[test]
fn syscall_non_interactive_runs_in_work_dir() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let result = syscall_non_interactive("pwd", std::iter::empty::<&str>(), Some(dir.path()))?;
    pretty_assert_eq!(result, format!("stdout: {}", dir.path().canonicalize()?.display()));

    Ok(())
}

#[test]
fn syscall_interactive_reports_exit_status() {
    assert!(syscall_interactive("true", std::iter::empty::<&str>(), None).is_ok());
    assert!(syscall_interactive("false", std::iter::empty::<&str>(), None).is_err());
}
