mod common;

use common::{scroll, wake, MockHost};
use scroll_reveal::{
    Direction, NodeId, RevealError, RevealOverrides, ScrollReveal, Status, Timestamp,
};

fn reveal_times(sr: &ScrollReveal) -> Vec<(NodeId, u64)> {
    sr.history()
        .iter()
        .filter(|t| t.direction == Direction::Revealed)
        .map(|t| (t.node, t.timestamp.as_millis()))
        .collect()
}

#[test]
fn test_sequence_staggers_members_entering_together() {
    let host = MockHost::new();
    let a = host.add(".seq", 1, 100.0);
    let b = host.add(".seq", 2, 250.0);
    let c = host.add(".seq", 3, 400.0);
    let sr = ScrollReveal::new(host.clone(), &RevealOverrides::new());

    let registration = sr.reveal_sequence(".seq", &RevealOverrides::new(), 200);
    assert!(registration.is_ok());
    assert!(registration.sequence.is_some());

    assert_eq!(sr.on_frame().revealed, vec![a]);
    assert_eq!(sr.status(b), Some(Status::Unrevealed));
    assert_eq!(sr.next_wake(), Some(Timestamp::from_millis(200)));

    // Waking early changes nothing
    host.set_time(150);
    assert!(sr.on_frame().revealed.is_empty());

    assert_eq!(wake(&host, &sr).map(|r| r.revealed), Some(vec![b]));
    assert_eq!(sr.next_wake(), Some(Timestamp::from_millis(400)));
    assert_eq!(wake(&host, &sr).map(|r| r.revealed), Some(vec![c]));
    assert!(wake(&host, &sr).is_none());

    assert_eq!(reveal_times(&sr), vec![(a, 0), (b, 200), (c, 400)]);
    assert!(host.wakes().contains(&Timestamp::from_millis(200)));
}

#[test]
fn test_sequence_reveals_in_registration_order() {
    let host = MockHost::new();
    let a = host.add(".seq", 1, 1_500.0);
    let b = host.add(".seq", 2, 100.0);
    let c = host.add(".seq", 3, 200.0);
    let sr = ScrollReveal::new(host.clone(), &RevealOverrides::new());
    sr.reveal_sequence(".seq", &RevealOverrides::new(), 200);

    // B and C are in view but wait for A
    assert!(sr.on_frame().revealed.is_empty());
    assert_eq!(sr.next_wake(), None);

    assert_eq!(scroll(&host, &sr, 1_200.0).revealed, vec![a]);

    host.set_time(1_000);
    assert_eq!(scroll(&host, &sr, 0.0).revealed, vec![b]);
    assert_eq!(wake(&host, &sr).map(|r| r.revealed), Some(vec![c]));

    assert_eq!(reveal_times(&sr), vec![(a, 0), (b, 1_000), (c, 1_200)]);
}

#[test]
fn test_late_member_waits_for_interval() {
    let host = MockHost::new();
    let a = host.add(".seq", 1, 100.0);
    let b = host.add(".seq", 2, 1_500.0);
    let sr = ScrollReveal::new(host.clone(), &RevealOverrides::new());
    sr.reveal_sequence(".seq", &RevealOverrides::new(), 500);

    assert_eq!(sr.on_frame().revealed, vec![a]);

    host.set_time(100);
    assert!(scroll(&host, &sr, 1_200.0).revealed.is_empty());
    assert_eq!(sr.next_wake(), Some(Timestamp::from_millis(500)));
    assert_eq!(wake(&host, &sr).map(|r| r.revealed), Some(vec![b]));
}

#[test]
fn test_interval_below_minimum_is_rejected() {
    let host = MockHost::new();
    let a = host.add(".seq", 1, 100.0);
    let sr = ScrollReveal::new(host.clone(), &RevealOverrides::new());

    let registration = sr.reveal_sequence(".seq", &RevealOverrides::new(), 5);
    assert!(matches!(
        registration.errors.as_slice(),
        [RevealError::InvalidConfiguration(_)]
    ));
    assert_eq!(sr.status(a), None);
    assert_eq!(sr.stats().sequences, 0);
}

#[test]
fn test_reversible_sequence_rewinds_after_full_reset() {
    let host = MockHost::new();
    let a = host.add(".seq", 1, 100.0);
    let b = host.add(".seq", 2, 250.0);
    let sr = ScrollReveal::new(host.clone(), &RevealOverrides::new());
    sr.reveal_sequence(".seq", &RevealOverrides::new().reset(true), 100);

    sr.on_frame();
    wake(&host, &sr);
    assert_eq!(reveal_times(&sr), vec![(a, 0), (b, 100)]);

    host.set_time(500);
    assert_eq!(scroll(&host, &sr, 3_000.0).reset, vec![a, b]);

    host.set_time(1_000);
    assert_eq!(scroll(&host, &sr, 0.0).revealed, vec![a]);
    assert_eq!(sr.next_wake(), Some(Timestamp::from_millis(1_100)));
    assert_eq!(wake(&host, &sr).map(|r| r.revealed), Some(vec![b]));

    assert_eq!(
        reveal_times(&sr),
        vec![(a, 0), (b, 100), (a, 1_000), (b, 1_100)]
    );
}

#[test]
fn test_partial_reset_keeps_cursor() {
    let host = MockHost::new();
    let a = host.add(".seq", 1, 100.0);
    host.add(".seq", 2, 250.0);
    host.add(".seq", 3, 400.0);
    let sr = ScrollReveal::new(host.clone(), &RevealOverrides::new());
    sr.reveal_sequence(".seq", &RevealOverrides::new().reset(true), 100);

    sr.on_frame();
    wake(&host, &sr);
    wake(&host, &sr);

    // Only A leaves; the others stay revealed and the cursor stays put
    host.set_time(300);
    assert_eq!(scroll(&host, &sr, 220.0).reset, vec![a]);

    // Behind the cursor: A comes back at once, without a new step
    host.set_time(310);
    assert_eq!(scroll(&host, &sr, 0.0).revealed, vec![a]);
    assert_eq!(sr.next_wake(), None);
}

#[test]
fn test_one_shot_member_is_exempt_from_sequence_reset() {
    let host = MockHost::new();
    let a = host.add(".seq", 1, 100.0);
    let b = host.add(".seq", 2, 250.0);
    let sr = ScrollReveal::new(host.clone(), &RevealOverrides::new());
    sr.reveal_sequence(".seq", &RevealOverrides::new().reset(true), 100);
    // A stays in the sequence but becomes one-shot
    sr.reveal(a, &RevealOverrides::new().reset(false));

    sr.on_frame();
    wake(&host, &sr);

    host.set_time(500);
    assert_eq!(scroll(&host, &sr, 3_000.0).reset, vec![b]);
    assert_eq!(sr.status(a), Some(Status::Revealed));

    // The rewound cursor skips A
    host.set_time(1_000);
    assert_eq!(scroll(&host, &sr, 0.0).revealed, vec![b]);
    assert_eq!(reveal_times(&sr), vec![(a, 0), (b, 100), (b, 1_000)]);
}

#[test]
fn test_cleaning_the_cursor_member_moves_on() {
    let host = MockHost::new();
    let a = host.add(".seq", 1, 100.0);
    let b = host.add(".seq", 2, 250.0);
    let c = host.add(".seq", 3, 400.0);
    let sr = ScrollReveal::new(host.clone(), &RevealOverrides::new());
    sr.reveal_sequence(".seq", &RevealOverrides::new(), 200);

    sr.on_frame();
    host.set_time(50);
    assert_eq!(sr.clean(b), vec![b]);
    assert_eq!(sr.next_wake(), Some(Timestamp::from_millis(200)));
    assert_eq!(wake(&host, &sr).map(|r| r.revealed), Some(vec![c]));
    assert_eq!(reveal_times(&sr), vec![(a, 0), (c, 200)]);
}

#[test]
fn test_step_fires_without_recheck() {
    let host = MockHost::new();
    host.add(".seq", 1, 100.0);
    let b = host.add(".seq", 2, 250.0);
    let sr = ScrollReveal::new(host.clone(), &RevealOverrides::new());
    sr.reveal_sequence(".seq", &RevealOverrides::new(), 200);
    sr.on_frame();

    // Out of view, but no signal reaches the engine before the step
    host.scroll_to(common::ROOT, 3_000.0);
    assert_eq!(wake(&host, &sr).map(|r| r.revealed), Some(vec![b]));
}

#[test]
fn test_step_rechecks_when_configured() {
    let host = MockHost::new();
    host.add(".seq", 1, 100.0);
    let b = host.add(".seq", 2, 250.0);
    let sr = ScrollReveal::new(host.clone(), &RevealOverrides::new());
    sr.reveal_sequence(".seq", &RevealOverrides::new().recheck_sequence(true), 200);
    sr.on_frame();

    host.scroll_to(common::ROOT, 3_000.0);
    let report = wake(&host, &sr).unwrap();
    assert!(report.revealed.is_empty());
    assert_eq!(sr.status(b), Some(Status::Unrevealed));

    host.set_time(1_000);
    assert_eq!(scroll(&host, &sr, 200.0).revealed, vec![b]);
}

#[test]
fn test_moving_a_member_to_another_sequence() {
    let host = MockHost::new();
    let a = host.add(".first", 1, 100.0);
    host.add(".second", 2, 200.0);
    let sr = ScrollReveal::new(host.clone(), &RevealOverrides::new());
    sr.reveal_sequence(".first", &RevealOverrides::new(), 100);
    assert_eq!(sr.stats().sequences, 1);

    // A leaves its single-member sequence, which is dropped
    sr.reveal_sequence(vec![a, NodeId::new(2)], &RevealOverrides::new(), 100);
    assert_eq!(sr.stats().sequences, 1);
    sr.check_consistency().unwrap();
}

#[test]
fn test_sequence_call_matching_nothing_leaves_no_sequence() {
    let host = MockHost::new();
    let sr = ScrollReveal::new(host.clone(), &RevealOverrides::new());

    let registration = sr.reveal_sequence(".nothing", &RevealOverrides::new(), 200);
    assert!(matches!(
        registration.errors.as_slice(),
        [RevealError::MissingTarget(_)]
    ));
    assert_eq!(registration.sequence, None);
    assert_eq!(sr.stats().sequences, 0);
    sr.check_consistency().unwrap();

    // Nothing was logged, so a later sync has nothing to replay
    host.add(".nothing", 1, 100.0);
    assert!(sr.sync().elements.is_empty());
    assert_eq!(sr.stats().sequences, 0);
}

#[test]
fn test_rewind_holds_a_member_reentering_in_the_same_tick() {
    let host = MockHost::new();
    let a = host.add(".seq", 1, 0.0);
    let b = host.add(".seq", 2, 650.0);
    let sr = ScrollReveal::new(host.clone(), &RevealOverrides::new());
    sr.reveal_sequence(".seq", &RevealOverrides::new().reset(true), 200);

    assert_eq!(sr.on_frame().revealed, vec![a]);
    host.set_time(300);
    assert_eq!(scroll(&host, &sr, 80.0).revealed, vec![b]);
    host.set_time(400);
    assert_eq!(scroll(&host, &sr, 0.0).reset, vec![b]);

    // A leaves and B comes back in one tick: A's reset rewinds the
    // sequence, so B has to wait for A again
    host.set_time(500);
    let report = scroll(&host, &sr, 160.0);
    assert_eq!(report.reset, vec![a]);
    assert!(report.revealed.is_empty());
    assert_eq!(sr.status(b), Some(Status::Unrevealed));

    host.set_time(1_000);
    assert_eq!(scroll(&host, &sr, 80.0).revealed, vec![a]);
    assert_eq!(wake(&host, &sr).map(|r| r.revealed), Some(vec![b]));
    assert_eq!(
        reveal_times(&sr),
        vec![(a, 0), (b, 300), (a, 1_000), (b, 1_200)]
    );
}
