//! Controller lifecycle tests against the public API.
//!
//! All tests run on a paused clock, so pacing delays resolve instantly while
//! `Instant` arithmetic still reflects them.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use sortscope_engine::{
    Advance, AlgorithmId, Controller, CustomLoad, DatasetSize, IndexSet, Pacing, PlaybackError,
    PlaybackEvent, ProducerFault, RunState, Settings, Speed, Step,
};

fn settings(algorithm: AlgorithmId) -> Settings {
    Settings {
        algorithm,
        pacing: Pacing::immediate(),
        ..Settings::default()
    }
}

fn drain(rx: &mut mpsc::UnboundedReceiver<PlaybackEvent>) -> Vec<PlaybackEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn steps(events: &[PlaybackEvent]) -> Vec<Step> {
    events
        .iter()
        .filter_map(|event| match event {
            PlaybackEvent::Step { step, .. } => Some(step.clone()),
            _ => None,
        })
        .collect()
}

fn transitions(events: &[PlaybackEvent]) -> Vec<(RunState, RunState)> {
    events
        .iter()
        .filter_map(|event| match event {
            PlaybackEvent::Lifecycle { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect()
}

fn full_range(len: usize) -> IndexSet {
    (0..len).collect()
}

const SCRAMBLED: [i64; 12] = [42, 7, 19, 7, 88, 3, 56, 21, 3, 64, 10, 29];

#[tokio::test(start_paused = true)]
async fn bubble_run_reports_every_step_then_done() {
    let mut controller = Controller::with_dataset(settings(AlgorithmId::Bubble), vec![5, 3, 8, 1]);
    let mut rx = controller.subscribe();

    controller.start();
    assert_eq!(controller.state(), RunState::Running);
    let finished = controller.run_to_end().await.unwrap();
    assert_eq!(finished, Advance::Finished(RunState::Completed));

    assert_eq!(controller.state(), RunState::Completed);
    assert_eq!(controller.dataset(), [1, 3, 5, 8]);
    assert_eq!(controller.steps_applied(), 10);
    assert_eq!(controller.view().completed, &full_range(4));
    assert!(controller.view().highlight.is_empty());

    let events = drain(&mut rx);
    assert_eq!(
        transitions(&events),
        [
            (RunState::Idle, RunState::Running),
            (RunState::Running, RunState::Completed)
        ]
    );
    let indices: Vec<usize> = events
        .iter()
        .filter_map(|event| match event {
            PlaybackEvent::Step { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(indices, (0..10).collect::<Vec<_>>());
    assert_eq!(
        events.last(),
        Some(&PlaybackEvent::Done {
            completed: full_range(4)
        })
    );
}

#[tokio::test(start_paused = true)]
async fn every_algorithm_completes_sorted_with_full_markers() {
    for &id in AlgorithmId::all() {
        let mut controller = Controller::with_dataset(settings(id), SCRAMBLED.to_vec());
        controller.start();
        let finished = controller.run_to_end().await.unwrap();
        assert_eq!(finished, Advance::Finished(RunState::Completed), "{id}");

        let array = controller.dataset();
        assert!(array.windows(2).all(|pair| pair[0] <= pair[1]), "{id}: {array:?}");
        assert_eq!(
            controller.view().completed,
            &full_range(SCRAMBLED.len()),
            "{id}"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn empty_dataset_completes_without_steps() {
    let mut controller = Controller::with_dataset(settings(AlgorithmId::Merge), Vec::new());
    let mut rx = controller.subscribe();
    controller.start();
    assert_eq!(
        controller.advance().await.unwrap(),
        Advance::Finished(RunState::Completed)
    );
    assert_eq!(controller.steps_applied(), 0);
    assert!(steps(&drain(&mut rx)).is_empty());
}

#[tokio::test(start_paused = true)]
async fn stop_then_start_replays_identical_steps() {
    let mut controller = Controller::with_dataset(settings(AlgorithmId::Heap), SCRAMBLED.to_vec());
    let mut rx = controller.subscribe();

    controller.start();
    controller.run_to_end().await.unwrap();
    let reference = steps(&drain(&mut rx));
    controller.reset().unwrap();
    controller.load_custom("42 7 19 7 88 3 56 21 3 64 10 29").unwrap();

    controller.start();
    for _ in 0..7 {
        assert_eq!(controller.advance().await.unwrap(), Advance::Applied);
    }
    assert!(controller.stop());
    drain(&mut rx);

    controller.start();
    controller.run_to_end().await.unwrap();
    assert_eq!(steps(&drain(&mut rx)), reference);
}

#[tokio::test(start_paused = true)]
async fn pausing_does_not_change_the_step_sequence() {
    let mut plain = Controller::with_dataset(settings(AlgorithmId::Quick), SCRAMBLED.to_vec());
    let mut plain_rx = plain.subscribe();
    plain.start();
    plain.run_to_end().await.unwrap();
    let expected = steps(&drain(&mut plain_rx));

    let mut paused = Controller::with_dataset(settings(AlgorithmId::Quick), SCRAMBLED.to_vec());
    let mut paused_rx = paused.subscribe();
    paused.start();
    for _ in 0..3 {
        assert_eq!(paused.advance().await.unwrap(), Advance::Applied);
    }
    assert!(paused.pause());
    assert_eq!(paused.advance().await.unwrap(), Advance::Held);
    assert!(paused.step());
    assert_eq!(paused.advance().await.unwrap(), Advance::Applied);
    assert_eq!(paused.state(), RunState::Paused);
    assert!(paused.resume());
    assert_eq!(
        paused.run_to_end().await.unwrap(),
        Advance::Finished(RunState::Completed)
    );

    assert_eq!(steps(&drain(&mut paused_rx)), expected);
    assert_eq!(paused.dataset(), plain.dataset());
}

#[tokio::test(start_paused = true)]
async fn step_applies_exactly_one_step_while_paused() {
    let mut controller =
        Controller::with_dataset(settings(AlgorithmId::Selection), SCRAMBLED.to_vec());
    controller.start();
    assert_eq!(controller.advance().await.unwrap(), Advance::Applied);
    assert!(controller.pause());

    assert!(controller.step());
    // A second grant before the first is applied is ignored.
    assert!(!controller.step());
    assert_eq!(controller.advance().await.unwrap(), Advance::Applied);
    assert_eq!(controller.advance().await.unwrap(), Advance::Held);
    assert_eq!(controller.steps_applied(), 2);
    assert_eq!(controller.state(), RunState::Paused);
}

#[tokio::test(start_paused = true)]
async fn pause_before_first_step_holds_it() {
    let mut controller = Controller::with_dataset(settings(AlgorithmId::Shell), SCRAMBLED.to_vec());
    controller.start();
    assert!(controller.pause());
    assert_eq!(controller.advance().await.unwrap(), Advance::Held);
    assert_eq!(controller.steps_applied(), 0);

    assert!(controller.step());
    assert_eq!(controller.advance().await.unwrap(), Advance::Applied);
    assert_eq!(controller.steps_applied(), 1);
}

#[tokio::test(start_paused = true)]
async fn step_is_a_noop_unless_paused() {
    let mut controller =
        Controller::with_dataset(settings(AlgorithmId::Insertion), SCRAMBLED.to_vec());
    assert!(!controller.step());
    assert!(!controller.pause());
    assert!(!controller.resume());

    controller.start();
    assert!(!controller.step());
    assert_eq!(controller.advance().await.unwrap(), Advance::Applied);
    assert!(!controller.step());
    assert_eq!(controller.state(), RunState::Running);
    assert_eq!(controller.steps_applied(), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_discards_partial_run() {
    let input = vec![9, 8, 7, 6, 5, 4, 3, 2, 1, 0];
    let mut controller = Controller::with_dataset(settings(AlgorithmId::Bubble), input.clone());
    let mut rx = controller.subscribe();

    controller.start();
    for _ in 0..5 {
        assert_eq!(controller.advance().await.unwrap(), Advance::Applied);
    }
    assert_ne!(controller.dataset(), input.as_slice());

    assert!(controller.stop());
    assert_eq!(controller.state(), RunState::Idle);
    assert_eq!(controller.dataset(), input.as_slice());
    assert!(controller.view().completed.is_empty());
    assert_eq!(controller.steps_applied(), 0);
    assert!(controller.session().is_none());
    assert_eq!(controller.advance().await.unwrap(), Advance::Inactive);

    tokio::task::yield_now().await;
    let events = drain(&mut rx);
    assert_eq!(steps(&events).len(), 5);
    assert_eq!(
        transitions(&events),
        [
            (RunState::Idle, RunState::Running),
            (RunState::Running, RunState::Aborted),
            (RunState::Aborted, RunState::Idle),
        ]
    );
    assert!(!controller.stop());
}

#[tokio::test(start_paused = true)]
async fn start_while_live_restarts_the_run() {
    let mut controller = Controller::with_dataset(settings(AlgorithmId::Merge), SCRAMBLED.to_vec());
    let mut rx = controller.subscribe();

    controller.start();
    controller.advance().await.unwrap();
    controller.advance().await.unwrap();
    controller.start();

    assert_eq!(controller.state(), RunState::Running);
    assert_eq!(controller.steps_applied(), 0);
    assert_eq!(controller.session().map(|s| s.run()), Some(2));
    assert_eq!(controller.session().map(|s| s.input()), Some(&SCRAMBLED[..]));
    assert_eq!(
        transitions(&drain(&mut rx)),
        [
            (RunState::Idle, RunState::Running),
            (RunState::Running, RunState::Aborted),
            (RunState::Aborted, RunState::Idle),
            (RunState::Idle, RunState::Running),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn cancelling_the_session_token_aborts_the_run() {
    let mut controller = Controller::with_dataset(settings(AlgorithmId::Heap), SCRAMBLED.to_vec());
    controller.start();
    assert_eq!(controller.advance().await.unwrap(), Advance::Applied);

    let token = controller.session().map(|s| s.cancel_token().clone()).unwrap();
    token.cancel();

    assert_eq!(
        controller.advance().await.unwrap(),
        Advance::Finished(RunState::Aborted)
    );
    assert_eq!(controller.state(), RunState::Idle);
    assert_eq!(controller.dataset(), SCRAMBLED);
}

#[tokio::test(start_paused = true)]
async fn producer_fault_leaves_controller_restartable() {
    let mut controller = Controller::with_dataset(settings(AlgorithmId::Radix), vec![3, -1, 2]);
    let mut rx = controller.subscribe();

    controller.start();
    let err = controller.advance().await.unwrap_err();
    assert!(matches!(
        err,
        PlaybackError::Fault(ProducerFault::Unsupported(_))
    ));
    assert_eq!(controller.state(), RunState::Idle);
    assert_eq!(controller.dataset(), [3, -1, 2]);

    let events = drain(&mut rx);
    assert!(
        events
            .iter()
            .any(|event| matches!(event, PlaybackEvent::Fault { .. }))
    );
    assert_eq!(
        transitions(&events).last(),
        Some(&(RunState::Running, RunState::Idle))
    );

    controller.set_algorithm(AlgorithmId::Merge).unwrap();
    controller.start();
    assert_eq!(
        controller.run_to_end().await.unwrap(),
        Advance::Finished(RunState::Completed)
    );
    assert_eq!(controller.dataset(), [-1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn dataset_changes_are_rejected_while_live() {
    let mut controller = Controller::with_dataset(settings(AlgorithmId::Bubble), SCRAMBLED.to_vec());
    controller.start();

    assert_eq!(
        controller.set_size(DatasetSize::clamped(20)),
        Err(PlaybackError::Busy {
            operation: "change the dataset size"
        })
    );
    assert!(matches!(
        controller.load_custom("1, 2, 3"),
        Err(PlaybackError::Busy { .. })
    ));
    assert!(matches!(
        controller.set_algorithm(AlgorithmId::Heap),
        Err(PlaybackError::Busy { .. })
    ));
    assert!(matches!(
        controller.regenerate(),
        Err(PlaybackError::Busy { .. })
    ));
    assert!(matches!(controller.reset(), Err(PlaybackError::Busy { .. })));

    controller.set_speed(Speed::new(90).unwrap());
    assert_eq!(controller.speed().value(), 90);
    assert_eq!(controller.state(), RunState::Running);
    assert_eq!(controller.dataset(), SCRAMBLED);
}

#[tokio::test(start_paused = true)]
async fn custom_data_without_numbers_is_ignored() {
    let mut controller = Controller::with_dataset(settings(AlgorithmId::Bubble), vec![1, 2]);
    assert_eq!(
        controller.load_custom("10, 5,,abc 3").unwrap(),
        CustomLoad::Loaded(3)
    );
    assert_eq!(controller.dataset(), [10, 5, 3]);

    assert_eq!(
        controller.load_custom("abc, ,").unwrap(),
        CustomLoad::Ignored
    );
    assert_eq!(controller.dataset(), [10, 5, 3]);
}

#[tokio::test(start_paused = true)]
async fn changing_data_after_completion_clears_markers() {
    let mut controller = Controller::with_dataset(settings(AlgorithmId::Insertion), vec![3, 1, 2]);
    let mut rx = controller.subscribe();
    controller.start();
    controller.run_to_end().await.unwrap();
    assert!(!controller.view().completed.is_empty());

    controller.set_size(DatasetSize::clamped(12)).unwrap();
    assert_eq!(controller.state(), RunState::Idle);
    assert!(controller.view().completed.is_empty());
    assert_eq!(controller.steps_applied(), 0);
    assert_eq!(controller.dataset().len(), 12);
    assert!(
        controller
            .dataset()
            .iter()
            .all(|value| controller.settings().values.contains(*value))
    );
    assert_eq!(
        transitions(&drain(&mut rx)).last(),
        Some(&(RunState::Completed, RunState::Idle))
    );
}

#[tokio::test(start_paused = true)]
async fn reset_returns_completed_run_to_idle() {
    let mut controller = Controller::with_dataset(settings(AlgorithmId::Selection), vec![2, 1]);
    controller.start();
    controller.run_to_end().await.unwrap();

    controller.reset().unwrap();
    assert_eq!(controller.state(), RunState::Idle);
    assert!(controller.view().completed.is_empty());
    assert_eq!(controller.dataset(), [1, 2]);
}

#[tokio::test(start_paused = true)]
async fn steps_are_paced_by_speed() {
    let slow = Speed::new(1).unwrap();
    let fast = Speed::new(100).unwrap();
    let pacing = Pacing::default();
    let mut controller = Controller::with_dataset(
        Settings {
            algorithm: AlgorithmId::Bubble,
            speed: slow,
            ..Settings::default()
        },
        vec![4, 3, 2, 1],
    );

    controller.start();
    let began = Instant::now();
    assert_eq!(controller.advance().await.unwrap(), Advance::Applied);
    assert!(began.elapsed() < pacing.delay_for(slow));

    // The second step is held for the delay computed when the first was applied.
    controller.set_speed(fast);
    let waited = Instant::now();
    assert_eq!(controller.advance().await.unwrap(), Advance::Applied);
    assert!(waited.elapsed() >= pacing.delay_for(slow));

    let waited = Instant::now();
    assert_eq!(controller.advance().await.unwrap(), Advance::Applied);
    let elapsed = waited.elapsed();
    assert!(elapsed >= pacing.delay_for(fast));
    assert!(elapsed < Duration::from_millis(100));
}
