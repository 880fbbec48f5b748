//! Routing scenarios driven against the engine with a manual ring scheduler,
//! so timeouts fire exactly when the test says so.

use std::collections::HashSet;
use std::time::Duration;

use hotline_call_engine::prelude::*;
use pretty_assertions::assert_eq;

fn two_operator_engine() -> RoutingEngine<ManualRingScheduler> {
    RoutingEngine::new(2, Some(Duration::from_secs(10)), ManualRingScheduler::new())
        .expect("engine creation failed")
}

fn op(id: &str) -> OperatorId {
    OperatorId::new(id)
}

fn status(engine: &RoutingEngine<ManualRingScheduler>, id: &str) -> OperatorStatus {
    engine.operators().status(&op(id)).expect("operator exists")
}

/// Assigned and waiting calls never overlap, and status agrees with the table
fn assert_consistent(engine: &RoutingEngine<ManualRingScheduler>) {
    engine.verify_invariants().expect("status and assignments disagree");

    let snapshot = engine.snapshot();
    let assigned: HashSet<CallId> = snapshot.ongoing.iter().map(|a| a.call).collect();
    let waiting: HashSet<CallId> = snapshot.waiting_ids().into_iter().collect();
    assert!(
        assigned.is_disjoint(&waiting),
        "calls both assigned and waiting: {:?}",
        assigned.intersection(&waiting).collect::<Vec<_>>()
    );
}

/// Calls 1, 2 and 3 against operators A and B
fn scenario_a(engine: &mut RoutingEngine<ManualRingScheduler>) {
    assert_eq!(
        engine.receive_call(CallId(1)),
        "Call 1 received\nCall 1 ringing for operator A"
    );
    assert_eq!(
        engine.receive_call(CallId(2)),
        "Call 2 received\nCall 2 ringing for operator B"
    );
    assert_eq!(
        engine.receive_call(CallId(3)),
        "Call 3 received\nCall 3 waiting in queue"
    );
}

#[test]
fn test_scenario_a_assigns_in_registry_order_then_queues() {
    let mut engine = two_operator_engine();
    scenario_a(&mut engine);

    assert_eq!(status(&engine, "A"), OperatorStatus::Ringing);
    assert_eq!(status(&engine, "B"), OperatorStatus::Ringing);
    assert_eq!(engine.snapshot().waiting_ids(), vec![CallId(3)]);
    assert_consistent(&engine);
}

#[test]
fn test_scenario_b_reject_requeues_and_advances_queue() {
    let mut engine = two_operator_engine();
    scenario_a(&mut engine);

    assert_eq!(
        engine.reject(&op("A")).unwrap(),
        "Call 1 rejected by operator A\nCall 1 waiting in queue\nCall 3 ringing for operator A"
    );

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.call_for(&op("A")), Some(CallId(3)));
    assert_eq!(snapshot.call_for(&op("B")), Some(CallId(2)));
    assert_eq!(snapshot.waiting_ids(), vec![CallId(1)]);
    assert_eq!(snapshot.stats.calls_rejected, 1);
    assert_consistent(&engine);
}

#[test]
fn test_reject_rings_another_free_operator() {
    let mut engine = two_operator_engine();
    engine.receive_call(CallId(1));

    assert_eq!(
        engine.reject(&op("A")).unwrap(),
        "Call 1 rejected by operator A\nCall 1 ringing for operator B"
    );
    assert_eq!(status(&engine, "A"), OperatorStatus::Available);
    assert_consistent(&engine);
}

#[test]
fn test_scenario_c_timeout_reassigns_to_free_operator() {
    let mut engine = two_operator_engine();
    engine.receive_call(CallId(1));

    let expiry = engine.scheduler_mut().fire(&op("A")).expect("timer armed for A");
    assert_eq!(
        engine.handle_expiry(&expiry),
        Some("Call 1 ignored by operator A\nCall 1 ringing for operator B".to_string())
    );
    assert_eq!(status(&engine, "A"), OperatorStatus::Available);
    assert_eq!(engine.snapshot().call_for(&op("B")), Some(CallId(1)));
    assert_consistent(&engine);
}

#[test]
fn test_scenario_c_timeout_requeues_when_everybody_is_occupied() {
    let mut engine = two_operator_engine();
    scenario_a(&mut engine);

    let expiry = engine.scheduler_mut().fire(&op("A")).expect("timer armed for A");
    assert_eq!(
        engine.handle_expiry(&expiry),
        Some(
            "Call 1 ignored by operator A\nCall 1 waiting in queue\nCall 3 ringing for operator A"
                .to_string()
        )
    );
    assert_eq!(engine.stats().calls_ignored, 1);
    assert_consistent(&engine);
}

#[test]
fn test_scenario_d_hangup_of_unknown_call_changes_nothing() {
    let mut engine = two_operator_engine();
    scenario_a(&mut engine);
    let before = engine.snapshot();

    let result = engine.hangup(CallId(99));
    assert!(matches!(result, Err(HotlineError::NotFound(_))));

    let after = engine.snapshot();
    assert_eq!(after.operators, before.operators);
    assert_eq!(after.ongoing, before.ongoing);
    assert_eq!(after.waiting, before.waiting);
    assert_eq!(after.stats, before.stats);
}

#[test]
fn test_failed_commands_leave_state_untouched() {
    let mut engine = two_operator_engine();
    engine.receive_call(CallId(1));
    engine.answer(&op("A")).unwrap();
    let before = engine.snapshot();

    assert!(matches!(engine.answer(&op("A")), Err(HotlineError::InvalidTransition(_))));
    assert!(matches!(engine.reject(&op("B")), Err(HotlineError::InvalidTransition(_))));
    assert!(matches!(engine.reject(&op("Z")), Err(HotlineError::NotFound(_))));
    assert!(matches!(
        engine.execute(&Command::Answer(op("C"))),
        Err(HotlineError::NotFound(_))
    ));

    let after = engine.snapshot();
    assert_eq!(after.operators, before.operators);
    assert_eq!(after.ongoing, before.ongoing);
    assert_eq!(after.stats, before.stats);
}

#[test]
fn test_answer_hangup_round_trip() {
    let mut engine = two_operator_engine();
    engine.receive_call(CallId(1));

    assert_eq!(engine.answer(&op("A")).unwrap(), "Call 1 answered by operator A");
    assert_eq!(status(&engine, "A"), OperatorStatus::Busy);

    assert_eq!(
        engine.hangup(CallId(1)).unwrap(),
        "Call 1 finished and operator A is available"
    );
    assert_eq!(status(&engine, "A"), OperatorStatus::Available);
    assert!(engine.assignments().is_empty());
    assert_consistent(&engine);
}

#[test]
fn test_stale_ring_token_is_a_no_op() {
    let mut engine = RoutingEngine::new(1, Some(Duration::from_secs(10)), ManualRingScheduler::new())
        .expect("engine creation failed");
    engine.receive_call(CallId(1));
    let first = engine.ring_token(&op("A")).unwrap();

    // Rejecting with nobody else around re-rings A with a new token
    engine.reject(&op("A")).unwrap();
    let second = engine.ring_token(&op("A")).unwrap();
    assert_ne!(first, second);

    let before = engine.snapshot();
    assert_eq!(engine.timeout_ring(&op("A"), first), None);
    let after = engine.snapshot();
    assert_eq!(after.ongoing, before.ongoing);
    assert_eq!(after.stats, before.stats);

    assert_eq!(
        engine.timeout_ring(&op("A"), second),
        Some(
            "Call 1 ignored by operator A\nCall 1 waiting in queue\nCall 1 ringing for operator A"
                .to_string()
        )
    );
}

#[test]
fn test_hangup_of_ringing_call_cancels_timer_and_serves_queue() {
    let mut engine = two_operator_engine();
    scenario_a(&mut engine);

    assert_eq!(
        engine.hangup(CallId(2)).unwrap(),
        "Call 2 missed\nCall 3 ringing for operator B"
    );
    let token = engine.ring_token(&op("B")).unwrap();
    assert_eq!(engine.scheduler().armed(&op("B")).map(|t| t.token), Some(token));
    assert_consistent(&engine);
}

#[test]
fn test_n_operators_take_n_calls_in_order() {
    let mut engine = RoutingEngine::new(5, None, ManualRingScheduler::new()).unwrap();

    for (index, letter) in ["A", "B", "C", "D", "E"].iter().enumerate() {
        let call = CallId(index as i64 + 10);
        assert_eq!(
            engine.receive_call(call),
            format!("Call {} received\nCall {} ringing for operator {}", call, call, letter)
        );
    }
    assert_eq!(
        engine.receive_call(CallId(99)),
        "Call 99 received\nCall 99 waiting in queue"
    );
    assert_consistent(&engine);
}

#[test]
fn test_duplicate_call_ids_are_distinct_calls() {
    let mut engine = two_operator_engine();
    engine.receive_call(CallId(7));
    engine.receive_call(CallId(7));
    engine.receive_call(CallId(7));

    // The waiting copy goes first, then the holders in registry order
    assert_eq!(engine.hangup(CallId(7)).unwrap(), "Call 7 missed");
    assert!(engine.queue().is_empty());
    assert_eq!(engine.hangup(CallId(7)).unwrap(), "Call 7 missed");
    assert_eq!(status(&engine, "A"), OperatorStatus::Available);
    assert_eq!(status(&engine, "B"), OperatorStatus::Ringing);
    assert_eq!(engine.stats().calls_received, 3);
}

#[test]
fn test_invariants_hold_through_a_busy_session() {
    let mut engine = RoutingEngine::new(3, Some(Duration::from_secs(10)), ManualRingScheduler::new())
        .unwrap();

    let script = [
        "call 1", "call 2", "call 3", "call 4", "call 5", "answer A", "reject B", "hangup 4",
        "answer C", "call 6", "reject B", "hangup 1", "answer B", "hangup 3", "call 7",
        "hangup 6", "reject A", "hangup 2", "hangup 5",
    ];

    for line in script {
        let command = Command::parse_line(line).unwrap();
        // Some steps are expected to fail depending on who is ringing
        let _ = engine.execute(&command);
        assert_consistent(&engine);

        if let Some(expiry) = engine.scheduler_mut().fire(&op("C")) {
            engine.handle_expiry(&expiry);
            assert_consistent(&engine);
        }
    }
}

#[test]
fn test_state_dump_lists_everything() {
    let mut engine = two_operator_engine();
    scenario_a(&mut engine);
    engine.answer(&op("A")).unwrap();

    let dump = engine.execute(&Command::State).unwrap();
    assert_eq!(
        dump,
        "OPERATORS:\n    Operator #A: busy\n    Operator #B: ringing\n\n\
         ONGOING CALLS:\n    Operator #A: busy, Call #1\n    Operator #B: ringing, Call #2\n\n\
         WAITING QUEUE:\n    Call #3\n\n\
         STATS: received=3 answered=1 rejected=0 ignored=0 missed=0 finished=0"
    );
}
