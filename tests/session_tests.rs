// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the session state machine

mod common;

use common::{ScriptedBackend, front, rear};
use foodcam::backends::camera::types::BackendError;
use foodcam::backends::camera::{SessionController, SessionState};
use foodcam::errors::CameraError;
use std::thread;

fn configured() -> (SessionController, common::ScriptHandle) {
    let (backend, handle) = ScriptedBackend::new(vec![front(), rear()]);
    let session = SessionController::new(Box::new(backend));
    session.configure().unwrap();
    (session, handle)
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Start,
    Stop,
}

#[test]
fn test_start_stop_sequences_follow_state_machine() {
    // Every sequence of up to 6 start/stop calls
    for len in 0..=6u32 {
        for bits in 0..(1u32 << len) {
            let ops: Vec<Op> = (0..len)
                .map(|i| if bits & (1 << i) != 0 { Op::Start } else { Op::Stop })
                .collect();

            let (session, handle) = configured();
            let mut expected = SessionState::Stopped;
            let mut hardware_starts = 0;
            let mut hardware_stops = 0;

            for op in &ops {
                match op {
                    Op::Start => {
                        session.start().unwrap();
                        if expected == SessionState::Stopped {
                            hardware_starts += 1;
                        }
                        expected = SessionState::Running;
                    }
                    Op::Stop => {
                        session.stop();
                        if expected == SessionState::Running {
                            hardware_stops += 1;
                        }
                        expected = SessionState::Stopped;
                    }
                }
                assert_eq!(session.state(), expected, "sequence {:?}", ops);
            }

            assert_eq!(handle.start_calls(), hardware_starts, "sequence {:?}", ops);
            assert_eq!(handle.stop_calls(), hardware_stops, "sequence {:?}", ops);
            assert_eq!(handle.hardware_running(), expected == SessionState::Running);
        }
    }
}

#[test]
fn test_configure_selects_rear_device() {
    let (session, handle) = configured();
    assert_eq!(session.active_device().unwrap().id, "rear");
    assert_eq!(handle.bound_device().as_deref(), Some("rear"));
}

#[test]
fn test_configure_front_only() {
    let (backend, _handle) = ScriptedBackend::new(vec![front()]);
    let session = SessionController::new(Box::new(backend));
    session.configure().unwrap();
    assert_eq!(session.active_device().unwrap().id, "front");
}

#[test]
fn test_configure_no_devices() {
    let (backend, handle) = ScriptedBackend::new(Vec::new());
    let session = SessionController::new(Box::new(backend));

    assert_eq!(session.configure(), Err(CameraError::NoDeviceAvailable));
    assert_eq!(session.state(), SessionState::Unconfigured);
    assert!(handle.bound_device().is_none());
}

#[test]
fn test_configure_busy_device_then_retry() {
    let (backend, handle) = ScriptedBackend::new(vec![rear()]);
    let session = SessionController::new(Box::new(backend));

    handle.set_bind_error(Some(BackendError::DeviceBusy));
    assert!(matches!(
        session.configure(),
        Err(CameraError::ConfigurationFailed(_))
    ));
    assert_eq!(session.state(), SessionState::Unconfigured);
    assert_eq!(session.start(), Err(CameraError::NotConfigured));

    handle.set_bind_error(None);
    session.configure().unwrap();
    session.start().unwrap();
    assert_eq!(session.state(), SessionState::Running);
}

#[test]
fn test_concurrent_transitions_are_serialized() {
    let (session, handle) = configured();

    let workers: Vec<_> = (0..8)
        .map(|i| {
            let session = session.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    if i % 2 == 0 {
                        session.start().unwrap();
                    } else {
                        session.stop();
                    }
                    let state = session.state();
                    assert!(
                        matches!(state, SessionState::Running | SessionState::Stopped),
                        "unexpected state {:?}",
                        state
                    );
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    // Hardware start/stop calls strictly alternate, so they differ by at most one
    let starts = handle.start_calls();
    let stops = handle.stop_calls();
    match session.state() {
        SessionState::Running => assert_eq!(starts, stops + 1),
        SessionState::Stopped => assert_eq!(starts, stops),
        other => panic!("unexpected final state {:?}", other),
    }
    assert_eq!(handle.hardware_running(), session.state() == SessionState::Running);
}

#[test]
fn test_grace_stop_only_from_running() {
    let (session, handle) = configured();

    assert!(!session.schedule_grace_stop());
    session.start().unwrap();
    assert!(session.schedule_grace_stop());
    assert!(!session.schedule_grace_stop());
    assert_eq!(session.state(), SessionState::StoppingGrace);
    assert!(handle.hardware_running());

    session.stop();
    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(handle.stop_calls(), 1);
}
