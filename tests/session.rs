use std::{
    fs::{self, File},
    io::Write,
    os::fd::BorrowedFd,
    path::PathBuf,
};

use nix::{errno::Errno, unistd::Pid};
use sctrace::{
    cli::TraceConfig,
    errors::TraceError,
    event::TraceEvent,
    facility::TraceFacility,
    registers::RegisterSnapshot,
    session::TraceSession,
};
use tempfile::TempDir;

/// Stands in for the kernel: writes a prepared event stream into the sink
/// when asked to attach.
struct ScriptedFacility {
    stream: Vec<u8>,
}

impl ScriptedFacility {
    fn new(events: &[TraceEvent]) -> Self {
        ScriptedFacility {
            stream: events.iter().flat_map(|event| event.to_bytes()).collect(),
        }
    }

    fn raw(stream: Vec<u8>) -> Self {
        ScriptedFacility { stream }
    }
}

impl TraceFacility for ScriptedFacility {
    fn attach(&self, _child: Pid, sink: BorrowedFd<'_>) -> nix::Result<()> {
        let mut sink = File::from(sink.try_clone_to_owned().unwrap());
        sink.write_all(&self.stream).unwrap();
        Ok(())
    }
}

struct RefusingFacility;

impl TraceFacility for RefusingFacility {
    fn attach(&self, _child: Pid, _sink: BorrowedFd<'_>) -> nix::Result<()> {
        Err(Errno::EPERM)
    }
}

fn call(tid: u16, code: u64, args: [u64; 6]) -> TraceEvent {
    let [rdi, rsi, rdx, r12, r8, r9] = args;
    TraceEvent::new(
        tid,
        RegisterSnapshot {
            rax: code,
            rdi,
            rsi,
            rdx,
            r12,
            r8,
            r9,
            ..Default::default()
        },
    )
}

fn ret(tid: u16, value: u64, secondary: u64) -> TraceEvent {
    TraceEvent::new(
        tid,
        RegisterSnapshot {
            rax: value,
            rdx: secondary,
            ..Default::default()
        },
    )
}

fn shell(script: &str) -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string(), script.to_string()]
}

fn run_traced<F: TraceFacility>(
    facility: F,
    command: Vec<String>,
    summary: bool,
) -> (Result<i32, TraceError>, String) {
    let dir = TempDir::new().unwrap();
    let output: PathBuf = dir.path().join("trace.out");
    let config = TraceConfig {
        output: Some(output.clone()),
        summary,
        mute_stdout: true,
        command,
    };
    let result = TraceSession::with_facility(config, facility).run();
    let text = fs::read_to_string(&output).unwrap_or_default();
    (result, text)
}

fn lines_for(text: &str, tid: u16) -> Vec<String> {
    let call = format!("{tid}: ");
    let ret = format!("\t{tid}:");
    text.lines()
        .filter(|line| line.starts_with(&call) || line.starts_with(&ret))
        .map(str::to_string)
        .collect()
}

#[test]
fn write_call_and_return() {
    let facility = ScriptedFacility::new(&[
        call(1, 5, [1, 0x2000, 12, 0, 0, 0]),
        ret(1, 12, 0),
    ]);
    let (result, text) = run_traced(facility, shell("exit 0"), false);
    assert_eq!(result.unwrap(), 0);
    assert_eq!(
        text,
        "1: write(0x1, 0x2000, 0xc)\n\t1: = 0xc\n+++ exited with 0 +++\n"
    );
}

#[test]
fn exit_status_is_forwarded() {
    let (result, text) = run_traced(ScriptedFacility::new(&[]), shell("exit 7"), false);
    assert_eq!(result.unwrap(), 7);
    assert_eq!(text, "+++ exited with 7 +++\n");
}

#[test]
fn exit_never_waits_for_a_return() {
    let facility = ScriptedFacility::new(&[
        call(4, 0, [0; 6]),
        // the next record for this thread is a call again
        call(4, 9, [0; 6]),
        ret(4, 42, 0),
    ]);
    let (result, text) = run_traced(facility, shell("exit 0"), false);
    assert_eq!(result.unwrap(), 0);
    assert_eq!(
        lines_for(&text, 4),
        vec!["4: exit(0x0)", "4: get_pid()", "\t4: = 0x2a"]
    );
}

#[test]
fn unknown_syscall_shows_raw_registers() {
    let facility = ScriptedFacility::new(&[call(2, 9999, [1, 2, 0, 0, 0, 0]), ret(2, 0, 5)]);
    let (result, text) = run_traced(facility, shell("exit 0"), false);
    assert_eq!(result.unwrap(), 0);
    assert_eq!(
        lines_for(&text, 2),
        vec!["2: (9999)(0x1, 0x2, 0x0, 0x0, 0x0, 0x0)", "\t2: = 0x0 (5)"]
    );
}

#[test]
fn interleaved_threads_pair_correctly() {
    let a_call = call(10, 4, [3, 0x1000, 64, 0, 0, 0]);
    let a_ret = ret(10, 64, 0);
    let b_call = call(11, 5, [1, 0x2000, 12, 0, 0, 0]);
    let b_ret = ret(11, 12, 0);

    let (_, alone_a) = run_traced(ScriptedFacility::new(&[a_call, a_ret]), shell("exit 0"), false);
    let (_, alone_b) = run_traced(ScriptedFacility::new(&[b_call, b_ret]), shell("exit 0"), false);

    let interleavings = [
        [a_call, b_call, a_ret, b_ret],
        [a_call, b_call, b_ret, a_ret],
        [b_call, a_call, a_ret, b_ret],
        [a_call, a_ret, b_call, b_ret],
    ];
    for events in interleavings {
        let (result, text) = run_traced(ScriptedFacility::new(&events), shell("exit 0"), false);
        assert_eq!(result.unwrap(), 0);
        assert_eq!(lines_for(&text, 10), lines_for(&alone_a, 10));
        assert_eq!(lines_for(&text, 11), lines_for(&alone_b, 11));
    }
    assert_eq!(
        lines_for(&alone_a, 10),
        vec!["10: read(0x3, 0x1000, 0x40)", "\t10: = 0x40"]
    );
}

#[test]
fn trailing_partial_event_is_dropped() {
    let mut stream: Vec<u8> = call(1, 3, [5, 0, 0, 0, 0, 0]).to_bytes().to_vec();
    stream.extend_from_slice(&ret(1, 0, 0).to_bytes()[..40]);
    let (result, text) = run_traced(ScriptedFacility::raw(stream), shell("exit 3"), false);
    assert_eq!(result.unwrap(), 3);
    assert_eq!(text, "1: close(0x5)\n+++ exited with 3 +++\n");
}

#[test]
fn summary_follows_exit_line() {
    let facility = ScriptedFacility::new(&[
        call(1, 5, [1, 0, 1, 0, 0, 0]),
        ret(1, 1, 0),
        call(1, 5, [1, 0, 1, 0, 0, 0]),
        ret(1, 1, 0),
        call(1, 0, [0; 6]),
    ]);
    let (result, text) = run_traced(facility, shell("exit 0"), true);
    assert_eq!(result.unwrap(), 0);
    let (trace, table) = text.split_once("+++ exited with 0 +++").unwrap();
    assert_eq!(trace.lines().count(), 5);
    assert!(table.contains("write"));
    assert!(table.contains("exit"));
    assert!(table.contains("calls"));
}

#[test]
fn launch_failure_is_fatal() {
    let (result, _) = run_traced(
        ScriptedFacility::new(&[]),
        vec!["/nonexistent/definitely-not-a-program".to_string()],
        false,
    );
    assert!(matches!(result, Err(TraceError::Launch { .. })));
}

#[test]
fn attach_failure_is_fatal() {
    let (result, text) = run_traced(RefusingFacility, shell("sleep 5"), false);
    assert!(matches!(result, Err(TraceError::Attach(Errno::EPERM))));
    assert!(text.is_empty());
}

#[test]
fn unopenable_output_stops_before_launch() {
    let dir = TempDir::new().unwrap();
    let marker = dir.path().join("launched");
    let config = TraceConfig {
        output: Some(dir.path().join("missing").join("trace.out")),
        command: shell(&format!("touch {}", marker.display())),
        ..Default::default()
    };
    let result = TraceSession::with_facility(config, ScriptedFacility::new(&[])).run();
    assert!(matches!(result, Err(TraceError::Output { .. })));
    assert!(!marker.exists());
}
