#![cfg(test)]
use std::thread;
use std::time::{Duration, Instant};

use netdeck_common::error::ProcessError;
use netdeck_core::process::{ProcessState, ProcessSupervisor};

fn run_to_completion(supervisor: &mut ProcessSupervisor) -> (Vec<u8>, ProcessState) {
    let started = Instant::now();
    let mut output = Vec::new();
    loop {
        let outcome = supervisor.poll().unwrap();
        output.extend(outcome.chunk);
        if outcome.state.is_terminal() {
            return (output, outcome.state);
        }
        assert!(started.elapsed() < Duration::from_secs(10), "process hung");
        thread::sleep(Duration::from_millis(10));
    }
}

fn pid_exists(pid: u32) -> bool {
    unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
}

#[test]
fn output_arrives_in_order_and_complete() {
    let mut supervisor = ProcessSupervisor::new();
    supervisor
        .start("sh", &["-c", "echo line1; echo line2"])
        .unwrap();

    let (output, state) = run_to_completion(&mut supervisor);

    assert_eq!(String::from_utf8(output).unwrap(), "line1\nline2\n");
    assert_eq!(state, ProcessState::Exited(Some(0)));
}

#[test]
fn large_output_is_not_truncated_at_exit() {
    let mut supervisor = ProcessSupervisor::new();
    supervisor
        .start("sh", &["-c", "i=0; while [ $i -lt 2000 ]; do echo row$i; i=$((i+1)); done"])
        .unwrap();

    let (output, _) = run_to_completion(&mut supervisor);
    let text = String::from_utf8(output).unwrap();
    let rows: Vec<&str> = text.lines().collect();
    assert_eq!(rows.len(), 2000);
    assert_eq!(rows[0], "row0");
    assert_eq!(rows[1999], "row1999");
}

#[test]
fn start_then_stop_leaves_no_zombie() {
    let mut supervisor = ProcessSupervisor::new();
    let pid = supervisor.start("sleep", &["30"]).unwrap().pid();
    assert!(pid_exists(pid));

    let state = supervisor.stop().unwrap().unwrap();

    assert!(state.is_terminal());
    assert!(!pid_exists(pid));
}

#[test]
fn a_finished_tool_can_be_followed_by_another() {
    let mut supervisor = ProcessSupervisor::new();
    supervisor.start("sh", &["-c", "exit 2"]).unwrap();
    let (_, first) = run_to_completion(&mut supervisor);
    assert_eq!(first, ProcessState::Exited(Some(2)));

    supervisor.start("echo", &["next"]).unwrap();
    let (output, second) = run_to_completion(&mut supervisor);
    assert_eq!(output, b"next\n");
    assert_eq!(second, ProcessState::Exited(Some(0)));
}

#[test]
fn unknown_tool_reports_a_spawn_error() {
    let mut supervisor = ProcessSupervisor::new();
    let err = supervisor
        .start("netdeck-no-such-tool", &["-c", "1"])
        .unwrap_err();
    assert!(matches!(err, ProcessError::Spawn { .. }));
    assert!(supervisor.state().is_none());
}
