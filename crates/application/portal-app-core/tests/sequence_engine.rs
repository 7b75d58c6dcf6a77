use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use portal_app_core::{
    scripts, CancelResult, EngineEvent, EventBus, PlayOutcome, Sequence, SequenceEngine, SequenceStep,
    StepAction, TokioClock,
};
use tokio::sync::broadcast;
use tokio::time::Instant;

fn engine() -> (SequenceEngine, broadcast::Receiver<EngineEvent>) {
    let bus = EventBus::new(256);
    let rx = bus.subscribe();
    (SequenceEngine::new(Arc::new(TokioClock), bus), rx)
}

fn drain(rx: &mut broadcast::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

fn phases(events: &[EngineEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::PhaseChanged { phase, .. } => Some(phase.clone()),
            _ => None,
        })
        .collect()
}

type Timeline = Arc<Mutex<Vec<(String, Duration)>>>;

fn recorder(timeline: &Timeline, origin: Instant, label: &str) -> StepAction {
    let timeline = timeline.clone();
    let label = label.to_string();
    StepAction::sync(move || {
        timeline
            .lock()
            .unwrap()
            .push((label.clone(), origin.elapsed()));
        Ok(())
    })
}

#[tokio::test(start_paused = true)]
async fn sequence_lasts_at_least_its_total_duration() {
    let (engine, _rx) = engine();
    let seq = Sequence::new("short-steps", 2000)
        .step(SequenceStep::new("a", 0, 400))
        .step(SequenceStep::new("b", 200, 600));
    assert_eq!(seq.scripted_span(), Duration::from_millis(1200));

    let start = Instant::now();
    assert_eq!(engine.play(seq).await, PlayOutcome::Completed);
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(2000), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(2100), "{elapsed:?}");
    assert!(!engine.is_playing());
}

#[tokio::test(start_paused = true)]
async fn steps_chain_their_delays_and_durations() {
    let (engine, mut rx) = engine();
    let origin = Instant::now();
    let timeline = Timeline::default();
    let seq = Sequence::new("chain", 0)
        .step(SequenceStep::new("first", 100, 300).with_action(recorder(&timeline, origin, "first")))
        .step(SequenceStep::new("second", 50, 0).with_action(recorder(&timeline, origin, "second")))
        .step(SequenceStep::new("third", 0, 10).with_action(recorder(&timeline, origin, "third")));

    engine.play(seq).await;

    let timeline = timeline.lock().unwrap().clone();
    let at = |label: &str| {
        timeline
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, t)| *t)
            .unwrap()
    };
    assert!(at("first") >= Duration::from_millis(100));
    assert!(at("second") >= Duration::from_millis(450));
    assert!(at("third") >= at("second"));

    let events = drain(&mut rx);
    assert_eq!(phases(&events), ["first", "second", "third"]);
    assert!(matches!(events.first(), Some(EngineEvent::SequenceStarted { .. })));
    assert!(matches!(
        events.last(),
        Some(EngineEvent::SequenceFinished {
            outcome: PlayOutcome::Completed,
            ..
        })
    ));
}

#[tokio::test(start_paused = true)]
async fn gate_script_phases_land_on_the_chained_offsets() {
    let (engine, _rx) = engine();
    let origin = Instant::now();
    let timeline = Timeline::default();
    let mut gate = scripts::gate_opening();
    gate.steps = gate
        .steps
        .into_iter()
        .map(|step| {
            let action = recorder(&timeline, origin, &step.phase);
            step.with_action(action)
        })
        .collect();

    assert_eq!(engine.play(gate).await, PlayOutcome::Completed);
    let end = origin.elapsed();

    let timeline = timeline.lock().unwrap().clone();
    let ms = |d: Duration| d.as_millis() as u64;
    let got: Vec<(&str, u64)> = timeline.iter().map(|(l, t)| (l.as_str(), ms(*t))).collect();
    assert_eq!(
        got,
        [
            ("gateStart", 0),
            ("gateMovement", 0),
            ("auraShadowRise", 2000),
            ("textGlow", 4000),
        ]
    );
    assert_eq!(ms(end), 4800);
}

#[tokio::test(start_paused = true)]
async fn a_second_sequence_is_ignored_while_one_plays() {
    let (engine, mut rx) = engine();
    let a = Sequence::new("A", 1000).step(SequenceStep::new("a-phase", 0, 1000));
    let b = Sequence::new("B", 1000).step(SequenceStep::new("b-phase", 0, 1000));

    let first = engine.start(a);
    let second = engine.start(b.clone());
    assert!(first.accepted());
    assert!(!second.accepted());
    assert_eq!(second.run_id(), first.run_id());
    assert_eq!(second.name(), "A");
    assert_eq!(engine.snapshot().current_sequence.as_deref(), Some("A"));

    assert_eq!(second.finished().await, PlayOutcome::Completed);
    assert_eq!(first.finished().await, PlayOutcome::Completed);

    let events = drain(&mut rx);
    assert_eq!(phases(&events), ["a-phase"]);

    // Once idle, the same request is accepted.
    let third = engine.start(b);
    assert!(third.accepted());
    assert_eq!(third.finished().await, PlayOutcome::Completed);
}

#[tokio::test(start_paused = true)]
async fn failing_steps_do_not_stop_the_sequence() {
    let (engine, mut rx) = engine();
    let origin = Instant::now();
    let timeline = Timeline::default();
    let seq = Sequence::new("fragile", 300)
        .step(
            SequenceStep::new("errors", 0, 500)
                .with_action(StepAction::sync(|| Err(anyhow::anyhow!("element missing")))),
        )
        .step(
            SequenceStep::new("panics", 0, 500).with_action(StepAction::sync(
                || -> anyhow::Result<()> { panic!("renderer crashed") },
            )),
        )
        .step(SequenceStep::new("survivor", 0, 100).with_action(recorder(&timeline, origin, "survivor")));

    let start = Instant::now();
    assert_eq!(engine.play(seq).await, PlayOutcome::Completed);

    // Failed steps forfeit their hold, so the survivor runs straight away.
    let survivor_at = timeline.lock().unwrap()[0].1;
    assert!(survivor_at < Duration::from_millis(100), "{survivor_at:?}");
    assert!(start.elapsed() >= Duration::from_millis(300));
    assert_eq!(phases(&drain(&mut rx)), ["errors", "panics", "survivor"]);
}

#[tokio::test(start_paused = true)]
async fn hung_actions_time_out() {
    let bus = EventBus::new(16);
    let engine = SequenceEngine::new(Arc::new(TokioClock), bus)
        .with_action_timeout(Duration::from_millis(250));
    let reached = Arc::new(AtomicBool::new(false));
    let flag = reached.clone();
    let seq = Sequence::new("stuck", 0)
        .step(SequenceStep::new("hang", 0, 0).with_action(StepAction::new(|| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })))
        .step(SequenceStep::new("after", 0, 0).with_action(StepAction::sync(move || {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        })));

    let start = Instant::now();
    assert_eq!(engine.play(seq).await, PlayOutcome::Completed);
    assert!(reached.load(Ordering::SeqCst));
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(250) && elapsed < Duration::from_secs(1), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_a_cancellable_sequence() {
    let (engine, mut rx) = engine();
    let finished_action = Arc::new(AtomicBool::new(false));
    let flag = finished_action.clone();
    let seq = Sequence::new("skippable", 3000)
        .cancellable(true)
        .step(SequenceStep::new("one", 0, 0).with_action(StepAction::new(move || {
            let flag = flag.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(400)).await;
                flag.store(true, Ordering::SeqCst);
                Ok(())
            }
        })))
        .step(SequenceStep::new("two", 0, 1000))
        .step(SequenceStep::new("three", 0, 1000));

    let handle = engine.start(seq);
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(engine.cancel(), CancelResult::Cancelled);
    assert!(!engine.is_playing());
    assert_eq!(handle.finished().await, PlayOutcome::Cancelled);

    // The in-flight action still completes; later steps never dispatch.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(finished_action.load(Ordering::SeqCst));
    let events = drain(&mut rx);
    assert_eq!(phases(&events), ["one"]);
    let finishes = events
        .iter()
        .filter(|e| matches!(e, EngineEvent::SequenceFinished { .. }))
        .count();
    assert_eq!(finishes, 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_is_refused_for_locked_sequences() {
    let (engine, mut rx) = engine();
    let handle = engine.start(Sequence::new("locked", 1000).step(SequenceStep::new("hold", 0, 1000)));
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(engine.cancel(), CancelResult::Refused);
    assert!(engine.is_playing());
    assert_eq!(handle.finished().await, PlayOutcome::Completed);

    let events = drain(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, EngineEvent::CancelRefused { name, .. } if name == "locked")));
}

#[tokio::test(start_paused = true)]
async fn a_new_sequence_can_start_right_after_cancel() {
    let (engine, _rx) = engine();
    let first = engine.start(
        Sequence::new("first", 5000)
            .cancellable(true)
            .step(SequenceStep::new("slow", 0, 5000)),
    );
    tokio::time::sleep(Duration::from_millis(10)).await;
    engine.cancel();

    let start = Instant::now();
    let second = engine.start(Sequence::new("second", 200).step(SequenceStep::new("quick", 0, 200)));
    assert!(second.accepted());
    assert_eq!(second.finished().await, PlayOutcome::Completed);
    assert!(start.elapsed() < Duration::from_millis(300));
    assert_eq!(first.finished().await, PlayOutcome::Cancelled);
    assert!(!engine.is_playing());
}
