//! Cancellation and reset: listener-triggered stop, cross-thread stop,
//! and pool clearing.

mod common;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use parallel_process_runner::config::RunnerConfig;
use parallel_process_runner::core::ParallelRunner;
use parallel_process_runner::event::EventType;
use parallel_process_runner::process::{Process, ProcessId, ProcessStatus};

use common::{ids_of, spawn_fake, FakeProcess};

fn runner_with(max_parallel: usize) -> ParallelRunner {
    ParallelRunner::with_config(
        RunnerConfig::new()
            .with_max_parallel(max_parallel)
            .with_poll_interval(Duration::from_micros(200)),
    )
    .unwrap()
}

#[test]
fn stop_from_listener_abandons_waiting_processes() {
    let runner = runner_with(1);
    let (first, first_id) = spawn_fake(FakeProcess::instant());
    let (second, _second_id) = spawn_fake(FakeProcess::instant());
    runner.submit(vec![first, second]).unwrap();

    let started: Arc<Mutex<Vec<ProcessId>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&started);
    runner.bus().subscribe(EventType::BeforeStart, move |event| {
        sink.lock().unwrap().push(event.id());
    });

    let handle = runner.stop_handle();
    runner.bus().subscribe(EventType::AfterStop, move |event| {
        if event.id() == first_id {
            handle.stop().unwrap();
        }
    });

    let done = runner.run().unwrap();

    // the second process never started and never produced an event
    assert_eq!(ids_of(&done), vec![first_id]);
    assert_eq!(*started.lock().unwrap(), vec![first_id]);
    assert_eq!(runner.waiting_count(), 0);
}

#[test]
fn stop_from_listener_force_stops_active_processes() {
    let runner = runner_with(2);
    let (slow, slow_id) = spawn_fake(FakeProcess::running_for(Duration::from_secs(5)));
    let (fast, fast_id) = spawn_fake(FakeProcess::instant());
    runner.submit(vec![slow.clone(), fast]).unwrap();

    let handle = runner.stop_handle();
    runner.bus().subscribe(EventType::AfterStop, move |event| {
        if event.id() == fast_id {
            handle.stop().unwrap();
        }
    });

    let begun = Instant::now();
    let done = runner.run().unwrap();

    // completion order: the fast process settled first, then the stopped one
    assert_eq!(ids_of(&done), vec![fast_id, slow_id]);
    assert_eq!(slow.lock().status(), ProcessStatus::Terminated);
    assert!(begun.elapsed() < Duration::from_secs(2));
}

#[test]
fn stop_handle_works_from_another_thread() {
    let runner = runner_with(1);
    let (slow, slow_id) = spawn_fake(FakeProcess::running_for(Duration::from_millis(500)));
    runner.submit(slow).unwrap();

    let handle = runner.stop_handle();
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        handle.stop().unwrap();
    });

    let begun = Instant::now();
    let done = runner.run().unwrap();
    stopper.join().unwrap();

    assert_eq!(ids_of(&done), vec![slow_id]);
    assert!(begun.elapsed() < Duration::from_millis(400));
}

#[test]
fn stop_without_work_is_a_noop() {
    let runner = runner_with(1);
    runner.stop().unwrap();
    runner.stop().unwrap();
    assert_eq!(runner.waiting_count(), 0);
    assert_eq!(runner.done_count(), 0);
}

#[test]
fn reset_on_an_empty_runner_is_a_noop() {
    let runner = runner_with(1);
    runner.reset();
    assert!(runner.run().unwrap().is_empty());
}

#[test]
fn reset_clears_done_for_the_next_run() {
    let runner = runner_with(1);
    runner.submit(spawn_fake(FakeProcess::instant()).0).unwrap();
    assert_eq!(runner.run().unwrap().len(), 1);

    runner.reset();
    assert_eq!(runner.done_count(), 0);
    assert!(runner.run().unwrap().is_empty());
}

#[test]
fn reset_abandons_waiting_processes() {
    let runner = runner_with(1);
    runner.submit(spawn_fake(FakeProcess::instant()).0).unwrap();
    runner.reset();
    assert_eq!(runner.waiting_count(), 0);
    assert!(runner.run().unwrap().is_empty());
}

#[test]
fn start_failure_propagates_and_drop_stops_survivors() {
    let (slow, _slow_id) = spawn_fake(FakeProcess::running_for(Duration::from_secs(5)));
    {
        let runner = runner_with(2);
        runner.submit(slow.clone()).unwrap();
        runner.submit(spawn_fake(FakeProcess::failing()).0).unwrap();

        // the second admission fails to start, aborting the run loop and
        // leaving the first process active
        assert!(runner.run().is_err());
        assert_eq!(runner.active_count(), 2);
    }
    // dropping the runner force-stopped the survivor
    assert_eq!(slow.lock().status(), ProcessStatus::Terminated);
}
