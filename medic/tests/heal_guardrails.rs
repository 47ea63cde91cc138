//! Guardrail behavior of `medic heal` across independent invocations.
//!
//! Each `run_heal` call here models one CI job invocation: no in-process
//! state survives between calls, everything goes through `.medic/`.

use medic::core::types::{ActionKind, ErrorType, PlannedAction, ReportStatus, SkipReason};
use medic::decide::run_decide;
use medic::heal::run_heal;
use medic::io::attempt_store::load_attempt_state;
use medic::io::decision_doc::{load_decision, write_decision};
use medic::io::report_doc::load_report;
use medic::test_support::{ScriptedActionRunner, TestState, context_fixture};

fn decided_state(error_type: ErrorType) -> TestState {
    let state = TestState::new().expect("state");
    state
        .write_context(&context_fixture("run-1", Some(error_type)))
        .expect("context");
    run_decide(state.root(), &state.env()).expect("decide");
    state
}

#[test]
fn run_attempt_past_ceiling_skips_without_touching_attempt_state() {
    let state = decided_state(ErrorType::InfraNetwork);
    let mut env = state.env();
    env.run_attempt = 3;

    let runner = ScriptedActionRunner::passing();
    let report = run_heal(state.root(), &env, &runner).expect("heal");

    assert_eq!(report.status, ReportStatus::Skipped);
    assert_eq!(report.reason, Some(SkipReason::RunAttemptExceeded));
    assert!(report.actions.is_empty());
    assert_eq!(report.attempt, None);
    assert!(runner.calls().is_empty());
    // No attempt was consumed: the store was never created.
    assert!(!state.paths().attempt_state_path.exists());
}

#[test]
fn third_execution_for_the_same_run_is_always_skipped() {
    let state = decided_state(ErrorType::InfraNetwork);
    let env = state.env();

    let first = run_heal(state.root(), &env, &ScriptedActionRunner::passing()).expect("heal 1");
    assert_eq!(first.status, ReportStatus::RerunPassed);
    assert_eq!(first.attempt, Some(1));

    let second = run_heal(state.root(), &env, &ScriptedActionRunner::passing()).expect("heal 2");
    assert_eq!(second.attempt, Some(2));

    let runner = ScriptedActionRunner::passing();
    let third = run_heal(state.root(), &env, &runner).expect("heal 3");
    assert_eq!(third.status, ReportStatus::Skipped);
    assert_eq!(third.reason, Some(SkipReason::MaxAttemptsReached));
    assert!(runner.calls().is_empty());

    let attempts = load_attempt_state(&state.paths().attempt_state_path, "run-1")
        .expect("attempt state")
        .attempts;
    assert_eq!(attempts, 2);
}

#[test]
fn disallowed_decision_skips_with_policy_reason() {
    let state = decided_state(ErrorType::FrontendSelector);
    let runner = ScriptedActionRunner::passing();
    let report = run_heal(state.root(), &state.env(), &runner).expect("heal");

    assert_eq!(report.status, ReportStatus::Skipped);
    assert_eq!(report.reason, Some(SkipReason::NotAllowedByPolicy));
    assert!(runner.calls().is_empty());
    assert!(!state.paths().attempt_state_path.exists());
}

#[test]
fn attempt_is_persisted_before_actions_run() {
    let state = decided_state(ErrorType::FrontendTiming);
    let report = run_heal(state.root(), &state.env(), &ScriptedActionRunner::passing())
        .expect("heal");

    assert_eq!(report.attempt, Some(1));
    let stored = load_attempt_state(&state.paths().attempt_state_path, "run-1")
        .expect("attempt state");
    assert_eq!(stored.attempts, 1);
}

#[test]
fn auth_session_plan_runs_in_declared_order() {
    let state = decided_state(ErrorType::AuthSession);
    let runner = ScriptedActionRunner::passing();
    let report = run_heal(state.root(), &state.env(), &runner).expect("heal");

    assert_eq!(
        runner.calls(),
        vec![
            ActionKind::RegenerateStorageState,
            ActionKind::ReseedDb,
            ActionKind::RerunE2eSubset,
        ]
    );
    assert_eq!(report.status, ReportStatus::RerunPassed);
}

#[test]
fn failing_reseed_does_not_abort_the_rerun() {
    let state = decided_state(ErrorType::InfraNetwork);
    let runner = ScriptedActionRunner::failing_on(vec![ActionKind::ReseedDb]);
    let report = run_heal(state.root(), &state.env(), &runner).expect("heal");

    // The rerun still ran and is the sole source of the final status.
    assert_eq!(
        runner.calls(),
        vec![ActionKind::ReseedDb, ActionKind::RerunE2eSubset]
    );
    assert_eq!(report.status, ReportStatus::RerunPassed);
    let reseed = &report.actions[0];
    assert!(!reseed.ok);
}

#[test]
fn failed_rerun_writes_the_fix_brief() {
    let state = decided_state(ErrorType::FrontendTiming);
    let runner = ScriptedActionRunner::failing_on(vec![ActionKind::RerunE2eSubset]);
    let report = run_heal(state.root(), &state.env(), &runner).expect("heal");

    assert_eq!(report.status, ReportStatus::RerunFailed);
    assert!(state.paths().fix_brief_path.is_file());
}

#[test]
fn unknown_action_type_is_recorded_not_fatal() {
    let state = decided_state(ErrorType::InfraNetwork);
    let paths = state.paths();
    let mut decision = load_decision(&paths.decision_path).expect("decision");
    decision.actions.insert(
        0,
        PlannedAction {
            kind: ActionKind::Unknown,
            why: "from a newer medic version".to_string(),
        },
    );
    write_decision(&paths.decision_path, &decision).expect("rewrite decision");

    let runner = ScriptedActionRunner::passing();
    let report = run_heal(state.root(), &state.env(), &runner).expect("heal");

    assert_eq!(report.status, ReportStatus::RerunPassed);
    let unknown = &report.actions[0];
    assert_eq!(unknown.kind, ActionKind::Unknown);
    assert!(!unknown.ok);
    assert!(unknown.note.as_deref().expect("note").contains("unknown"));
    // The real actions still ran.
    assert_eq!(
        runner.calls(),
        vec![ActionKind::ReseedDb, ActionKind::RerunE2eSubset]
    );
}

#[test]
fn attempts_do_not_leak_across_distinct_runs() {
    let state = decided_state(ErrorType::InfraNetwork);
    let env = state.env();
    run_heal(state.root(), &env, &ScriptedActionRunner::passing()).expect("heal run-1");

    // A new run arrives in the same workspace: fresh context, fresh decision.
    state
        .write_context(&context_fixture("run-2", Some(ErrorType::InfraNetwork)))
        .expect("context");
    let mut env2 = env.clone();
    env2.run_id = "run-2".to_string();
    run_decide(state.root(), &env2).expect("decide run-2");

    let report = run_heal(state.root(), &env2, &ScriptedActionRunner::passing())
        .expect("heal run-2");
    assert_eq!(report.attempt, Some(1));

    let stored = load_attempt_state(&state.paths().attempt_state_path, "run-2")
        .expect("attempt state");
    assert_eq!(stored.attempts, 1);
}

#[test]
fn report_is_overwritten_per_run_not_appended() {
    let state = decided_state(ErrorType::InfraNetwork);
    let env = state.env();
    run_heal(state.root(), &env, &ScriptedActionRunner::passing()).expect("heal 1");
    run_heal(state.root(), &env, &ScriptedActionRunner::passing()).expect("heal 2");

    let report = load_report(&state.paths().report_path).expect("report");
    assert_eq!(report.attempt, Some(2));
}

#[test]
fn decision_for_another_run_is_an_input_error() {
    let state = decided_state(ErrorType::InfraNetwork);
    let mut env = state.env();
    env.run_id = "run-9".to_string();

    let err = run_heal(state.root(), &env, &ScriptedActionRunner::passing()).unwrap_err();
    assert!(err.to_string().contains("run 'run-9'"));
    assert!(!state.paths().report_path.exists());
}
