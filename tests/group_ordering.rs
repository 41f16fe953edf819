//! Ordered group startup, shutdown and failure tests.

use std::time::Duration;

use silk_controller::lifecycle::{Group, Member, Process, Readiness, RunError};

mod common;
use common::{events, Recorder, Script};

fn cause_of(err: RunError) -> (String, RunError, usize) {
    match err {
        RunError::Group(group) => {
            let count = group.errors().len();
            let mut errors = group.into_errors();
            let first = errors.remove(0);
            (first.name, first.error, count)
        }
        other => panic!("expected a group error, got {other:?}"),
    }
}

#[tokio::test]
async fn starts_in_order_and_stops_in_reverse() {
    let recorder = Recorder::new();
    let group = Group::ordered(
        "test",
        vec![
            Member::new("a", recorder.unit("a", Script::Serve)),
            Member::new("b", recorder.unit("b", Script::Serve)),
            Member::new("c", recorder.unit("c", Script::Serve)),
        ],
    );

    let mut process = Process::spawn(group);
    assert_eq!(process.ready().await, Readiness::Ready(None));
    assert_eq!(
        recorder.events(),
        events(&["start:a", "ready:a", "start:b", "ready:b", "start:c", "ready:c"])
    );

    process.stop();
    process.wait().await.expect("clean shutdown");

    assert_eq!(
        recorder.events()[6..],
        events(&["stop:c", "exited:c", "stop:b", "exited:b", "stop:a", "exited:a"])[..]
    );
}

#[tokio::test]
async fn each_member_has_returned_before_the_previous_is_stopped() {
    let recorder = Recorder::new();
    let group = Group::ordered(
        "test",
        vec![
            Member::new("a", recorder.unit("a", Script::Serve)),
            Member::new("b", recorder.unit("b", Script::SlowStop(Duration::from_millis(40)))),
            Member::new("c", recorder.unit("c", Script::SlowStop(Duration::from_millis(40)))),
        ],
    );

    let mut process = Process::spawn(group);
    process.ready().await;
    process.stop();
    process.wait().await.expect("clean shutdown");

    let log = recorder.events();
    let at = |event: &str| log.iter().position(|e| e == event).unwrap();
    assert!(at("exited:c") < at("stop:b"));
    assert!(at("exited:b") < at("stop:a"));
    assert_eq!(log.last().map(String::as_str), Some("exited:a"));
}

#[tokio::test]
async fn main_and_debug_scenario() {
    let recorder = Recorder::new();
    let group = Group::ordered(
        "controller",
        vec![
            Member::new("main", recorder.unit("main", Script::Serve)),
            Member::new("debug", recorder.unit("debug", Script::Serve)),
        ],
    );

    let mut process = Process::spawn(group);
    assert!(matches!(process.ready().await, Readiness::Ready(_)));
    process.stop();
    process.wait().await.expect("clean shutdown");

    assert_eq!(
        recorder.events(),
        events(&[
            "start:main",
            "ready:main",
            "start:debug",
            "ready:debug",
            "stop:debug",
            "exited:debug",
            "stop:main",
            "exited:main",
        ])
    );
}

#[tokio::test]
async fn startup_failure_stops_started_members_and_skips_the_rest() {
    let recorder = Recorder::new();
    let group = Group::ordered(
        "test",
        vec![
            Member::new("a", recorder.unit("a", Script::Serve)),
            Member::new("b", recorder.unit("b", Script::Serve)),
            Member::new("c", recorder.unit("c", Script::FailStartup("address in use"))),
            Member::new("d", recorder.unit("d", Script::Serve)),
        ],
    );

    let mut process = Process::spawn(group);
    assert_eq!(process.ready().await, Readiness::NeverReady);
    let (name, error, count) = cause_of(process.wait().await.unwrap_err());

    assert_eq!(name, "c");
    assert_eq!(error.to_string(), "address in use");
    assert_eq!(count, 1);
    assert_eq!(
        recorder.events(),
        events(&[
            "start:a", "ready:a", "start:b", "ready:b", "start:c", "fail:c", "exited:c", "stop:b",
            "exited:b", "stop:a", "exited:a",
        ])
    );
}

#[tokio::test]
async fn first_member_failure_never_starts_second() {
    let recorder = Recorder::new();
    let group = Group::ordered(
        "controller",
        vec![
            Member::new("main", recorder.unit("main", Script::FailStartup("bind failed"))),
            Member::new("debug", recorder.unit("debug", Script::Serve)),
        ],
    );

    let (name, _, _) = cause_of(Process::spawn(group).wait().await.unwrap_err());

    assert_eq!(name, "main");
    assert_eq!(recorder.events(), events(&["start:main", "fail:main", "exited:main"]));
}

#[tokio::test]
async fn run_phase_failure_stops_the_others_and_is_reported() {
    let recorder = Recorder::new();
    let group = Group::ordered(
        "controller",
        vec![
            Member::new(
                "main",
                recorder.unit("main", Script::CrashAfter(Duration::from_millis(50), "lost listener")),
            ),
            Member::new("debug", recorder.unit("debug", Script::Serve)),
        ],
    );

    let mut process = Process::spawn(group);
    assert!(matches!(process.ready().await, Readiness::Ready(_)));
    let (name, error, count) = cause_of(process.wait().await.unwrap_err());

    assert_eq!(name, "main");
    assert_eq!(error.to_string(), "lost listener");
    assert_eq!(count, 1);
    assert_eq!(
        recorder.events()[4..],
        events(&["crash:main", "exited:main", "stop:debug", "exited:debug"])[..]
    );
}

#[tokio::test]
async fn clean_exit_during_run_is_a_failure() {
    let recorder = Recorder::new();
    let group = Group::ordered(
        "test",
        vec![
            Member::new("a", recorder.unit("a", Script::Serve)),
            Member::new("b", recorder.unit("b", Script::ExitAfter(Duration::from_millis(20)))),
        ],
    );

    let (name, error, _) = cause_of(Process::spawn(group).wait().await.unwrap_err());

    assert_eq!(name, "b");
    assert!(matches!(error, RunError::UnexpectedExit));
    assert_eq!(recorder.count("stop:a"), 1);
}

#[tokio::test]
async fn shutdown_errors_do_not_block_the_next_member() {
    let recorder = Recorder::new();
    let group = Group::ordered(
        "test",
        vec![
            Member::new("a", recorder.unit("a", Script::Serve)),
            Member::new("b", recorder.unit("b", Script::FailStop("flush failed"))),
        ],
    );

    let mut process = Process::spawn(group);
    process.ready().await;
    process.stop();
    let (name, error, count) = cause_of(process.wait().await.unwrap_err());

    assert_eq!((name.as_str(), error.to_string().as_str(), count), ("b", "flush failed", 1));
    assert_eq!(
        recorder.events()[4..],
        events(&["stop:b", "exited:b", "stop:a", "exited:a"])[..]
    );
}

#[tokio::test]
async fn first_failure_wins_over_shutdown_errors() {
    let recorder = Recorder::new();
    let group = Group::ordered(
        "test",
        vec![
            Member::new(
                "a",
                recorder.unit("a", Script::CrashAfter(Duration::from_millis(30), "crashed")),
            ),
            Member::new("b", recorder.unit("b", Script::FailStop("dirty stop"))),
        ],
    );

    let err = Process::spawn(group).wait().await.unwrap_err();
    let RunError::Group(group) = err else {
        panic!("expected group error");
    };

    let reported: Vec<_> = group
        .errors()
        .iter()
        .map(|e| (e.name.as_str(), e.error.to_string()))
        .collect();
    assert_eq!(
        reported,
        vec![("a", "crashed".to_string()), ("b", "dirty stop".to_string())]
    );
    assert_eq!(group.cause().name, "a");
}

#[tokio::test]
async fn empty_group_is_ready_immediately_and_stops_cleanly() {
    let mut process = Process::spawn(Group::ordered("empty", Vec::new()));
    assert_eq!(process.ready().await, Readiness::Ready(None));
    process.stop();
    process.wait().await.expect("empty group stops cleanly");
}

#[tokio::test]
async fn stop_during_startup_aborts_remaining_members() {
    let recorder = Recorder::new();
    let group = Group::ordered(
        "test",
        vec![
            Member::new("a", recorder.unit("a", Script::Serve)),
            Member::new("b", recorder.unit("b", Script::HangStartup)),
            Member::new("c", recorder.unit("c", Script::Serve)),
        ],
    );

    let process = Process::spawn(group);
    tokio::time::sleep(Duration::from_millis(50)).await;
    process.stop();
    process.wait().await.expect("aborted startup is not a failure");

    assert_eq!(
        recorder.events(),
        events(&["start:a", "ready:a", "start:b", "stop:b", "exited:b", "stop:a", "exited:a"])
    );
}

#[tokio::test]
async fn groups_nest() {
    let recorder = Recorder::new();
    let inner = Group::ordered(
        "inner",
        vec![
            Member::new("x", recorder.unit("x", Script::Serve)),
            Member::new("y", recorder.unit("y", Script::Serve)),
        ],
    );
    let outer = Group::ordered(
        "outer",
        vec![
            Member::new("inner", inner),
            Member::new("z", recorder.unit("z", Script::Serve)),
        ],
    );

    let mut process = Process::spawn(outer);
    process.ready().await;
    process.stop();
    process.wait().await.expect("clean shutdown");

    assert_eq!(
        recorder.events(),
        events(&[
            "start:x", "ready:x", "start:y", "ready:y", "start:z", "ready:z", "stop:z", "exited:z",
            "stop:y", "exited:y", "stop:x", "exited:x",
        ])
    );
}

#[tokio::test]
async fn panicking_member_is_reported_by_name() {
    let recorder = Recorder::new();
    let group = Group::ordered(
        "test",
        vec![
            Member::new("a", recorder.unit("a", Script::Serve)),
            Member::new(
                "b",
                silk_controller::lifecycle::run_fn(|_ready, _stop| async move {
                    if true {
                        panic!("boom");
                    }
                    Ok(())
                }),
            ),
        ],
    );

    let (name, error, _) = cause_of(Process::spawn(group).wait().await.unwrap_err());
    assert_eq!(name, "b");
    assert!(matches!(error, RunError::Panicked(ref msg) if msg == "boom"));
    assert_eq!(recorder.count("stop:a"), 1);
}
