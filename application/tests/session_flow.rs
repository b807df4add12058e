//! End-to-end protocol scenarios over scripted model clients.
//!
//! With a fixed clock, sequential ids, and scripted responses, every run
//! is fully deterministic; the assertions pin the event stream the
//! protocol must produce.

mod support;

use council_application::ports::ModelError;
use council_application::{RunSessionUseCase, SessionError, SessionResult};
use council_domain::{
    CouncilConfig, EventType, FallbackAction, PhaseEnd, TransitionRule, TransitionTrigger,
};
use std::sync::Arc;
use support::*;
use tokio_util::sync::CancellationToken;

struct Harness {
    use_case: RunSessionUseCase,
    store: Arc<MemSessionStore>,
    memory: Arc<MemMemoryStore>,
}

fn harness(config: CouncilConfig, council: ScriptedCouncil) -> Harness {
    let store = Arc::new(MemSessionStore::default());
    let memory = Arc::new(MemMemoryStore::default());
    let use_case = RunSessionUseCase::new(
        Arc::new(config),
        Arc::new(council),
        Arc::new(MemStoreProvider {
            store: Arc::clone(&store),
        }),
        Arc::clone(&memory) as Arc<dyn council_application::MemoryStore>,
        Arc::new(FixedClock),
        Arc::new(SeqIds::default()),
    );
    Harness {
        use_case,
        store,
        memory,
    }
}

async fn run(harness: &Harness) -> SessionResult {
    harness.use_case.run("Pick a database", false).await.unwrap()
}

// ---------------------------------------------------------------------------
// S1: a motion passes mid-round and closes the phase
// ---------------------------------------------------------------------------

fn s1_harness() -> Harness {
    let council = ScriptedCouncil::new()
        .member(
            "a",
            [
                elect("a"),
                call_vote("Adopt plan B", "Plan B is adopted"),
                vote("YES"),
                summary("Plan B is adopted"),
            ],
        )
        .member("b", [elect("a"), second(true), vote("YES")])
        .member("c", [elect("a"), second(false), vote("NO")]);
    harness(config(&["a", "b", "c"], vec![phase("debate", 3)], "debate"), council)
}

#[tokio::test]
async fn motion_passes_mid_round_and_closes_phase() {
    let h = s1_harness();
    let result = run(&h).await;

    assert_eq!(result.phase_results.len(), 1);
    let phase_result = &result.phase_results[0];
    assert_eq!(phase_result.ended_by, PhaseEnd::MajorityVote);
    assert_eq!(phase_result.final_resolution, "Plan B is adopted");
    assert_eq!(phase_result.rounds_completed, 1);
    assert_eq!(
        phase_result.winning_motion.as_ref().unwrap().motion_id,
        "motion-1"
    );

    // Round 2 never starts.
    assert_eq!(h.store.events_of(EventType::RoundStarted).len(), 1);

    let vote_result = &h.store.events_of(EventType::VoteResult)[0];
    assert_eq!(vote_result.payload["passed"], true);
    assert_eq!(vote_result.payload["yesVotes"], 2);
    assert_eq!(vote_result.payload["totalCouncilSize"], 3);
}

#[tokio::test]
async fn ballots_are_blind_and_emitted_in_turn_order() {
    let h = s1_harness();
    run(&h).await;

    let events = h.store.events();
    let cast_positions: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| e.event_type == EventType::VoteCast)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(cast_positions.len(), 3);
    // Consecutive: nothing interleaves the ballot block.
    assert_eq!(cast_positions[2] - cast_positions[0], 2);
    // Turn order, not arrival order.
    let actors: Vec<&str> = cast_positions
        .iter()
        .map(|&i| events[i].actor_id.as_deref().unwrap())
        .collect();
    assert_eq!(actors, vec!["a", "b", "c"]);
    // The result follows the last ballot directly.
    assert_eq!(events[cast_positions[2] + 1].event_type, EventType::VoteResult);
}

#[tokio::test]
async fn event_seq_monotonic_and_turn_index_non_decreasing() {
    let h = s1_harness();
    run(&h).await;

    let events = h.store.events();
    for pair in events.windows(2) {
        assert_eq!(pair[1].seq, pair[0].seq + 1);
        assert!(pair[1].turn_index >= pair[0].turn_index);
    }
}

#[tokio::test]
async fn identical_scripts_produce_identical_event_streams() {
    let first = s1_harness();
    run(&first).await;
    let second_run = s1_harness();
    run(&second_run).await;

    let a = serde_json::to_string(&first.store.events()).unwrap();
    let b = serde_json::to_string(&second_run.store.events()).unwrap();
    assert_eq!(a, b);
}

// ---------------------------------------------------------------------------
// S2: no seconder; discussion resumes with the next speaker
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unseconded_motion_returns_to_discussion() {
    let council = ScriptedCouncil::new()
        .member(
            "a",
            [
                elect("a"),
                call_vote("Adopt plan B", "Plan B is adopted"),
                summary("No consensus reached; revisit next session."),
            ],
        )
        .member("b", [elect("a"), second(false), pass()])
        .member("c", [elect("a"), second(false), pass()]);
    let h = harness(config(&["a", "b", "c"], vec![phase("debate", 1)], "debate"), council);
    let result = run(&h).await;

    assert_eq!(h.store.events_of(EventType::MotionNotSeconded).len(), 1);
    assert!(h.store.events_of(EventType::VoteCast).is_empty());
    assert!(h.store.events_of(EventType::VoteResult).is_empty());

    // The next turn after the dead motion belongs to b.
    let events = h.store.events();
    let not_seconded = events
        .iter()
        .position(|e| e.event_type == EventType::MotionNotSeconded)
        .unwrap();
    let next_turn = events[not_seconded..]
        .iter()
        .find(|e| e.event_type == EventType::TurnAction)
        .unwrap();
    assert_eq!(next_turn.actor_id.as_deref(), Some("b"));

    assert_eq!(result.phase_results[0].ended_by, PhaseEnd::RoundLimit);
}

// ---------------------------------------------------------------------------
// S3: round limit, fallback resolution, round-robin coverage
// ---------------------------------------------------------------------------

#[tokio::test]
async fn round_limit_adopts_fallback_resolution() {
    let ids = ["a", "b", "c", "d", "e"];
    let mut council = ScriptedCouncil::new();
    for id in ids {
        let mut script = vec![elect("a")];
        script.push(pass()); // round 1
        script.push(pass()); // round 2
        if id == "a" {
            script.push(summary("No consensus reached; revisit next session."));
        }
        council = council.member(id, script);
    }
    let h = harness(config(&ids, vec![phase("debate", 2)], "debate"), council);
    let result = run(&h).await;

    let phase_result = &result.phase_results[0];
    assert_eq!(phase_result.ended_by, PhaseEnd::RoundLimit);
    assert_eq!(
        phase_result.final_resolution,
        "No consensus reached; revisit next session."
    );
    assert_eq!(phase_result.rounds_completed, 2);

    let events = h.store.events();
    let limit = events
        .iter()
        .position(|e| e.event_type == EventType::RoundLimitReached)
        .unwrap();
    assert_eq!(events[limit + 1].event_type, EventType::PhaseCompleted);
    assert_eq!(events[limit + 1].payload["endedBy"], "ROUND_LIMIT");

    // Round-robin coverage: each round gives every member exactly one turn.
    for round in 1..=2u32 {
        let mut actors: Vec<String> = events
            .iter()
            .filter(|e| e.event_type == EventType::TurnAction && e.round == round)
            .map(|e| e.actor_id.clone().unwrap())
            .collect();
        actors.sort();
        assert_eq!(actors, vec!["a", "b", "c", "d", "e"]);
    }
}

// ---------------------------------------------------------------------------
// S4: parse fallback preserves flow and is remembered
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unparseable_turn_becomes_pass_and_flags_member() {
    let council = ScriptedCouncil::new()
        .member(
            "a",
            [elect("a"), contribute("we should use postgres"), summary("Use postgres")],
        )
        .member("b", [elect("a"), "lol not json".to_string()])
        .member("c", [elect("a"), pass()]);
    let h = harness(config(&["a", "b", "c"], vec![phase("debate", 1)], "debate"), council);
    let result = run(&h).await;

    assert_eq!(result.phase_results[0].ended_by, PhaseEnd::RoundLimit);

    let passes = h.store.events_of(EventType::PassRecorded);
    let fallback_pass = passes
        .iter()
        .find(|e| e.actor_id.as_deref() == Some("b"))
        .unwrap();
    let reason = fallback_pass.payload["reason"].as_str().unwrap();
    assert!(reason.starts_with("Model JSON parse error"));

    // Session close records the reliability risk for that member.
    let recorded = h.memory.recorded.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    assert!(recorded[0].parse_fallback_members.contains("b"));
    assert_eq!(
        recorded[0].last_contributions.get("a").unwrap(),
        "we should use postgres"
    );
}

// ---------------------------------------------------------------------------
// S5: documentation approved on revision 2
// ---------------------------------------------------------------------------

#[tokio::test]
async fn documentation_approved_on_second_revision() {
    let ids = ["a", "b", "c", "d", "e"];
    let mut cfg = config(&ids, vec![phase("debate", 1)], "debate");
    cfg.output.kind = council_domain::OutputKind::Documentation;
    cfg.output.max_revision_rounds = 2;

    let council = ScriptedCouncil::new()
        .member(
            "a",
            [
                elect("a"),
                pass(),
                summary("Ship the design doc"),
                "# Design v1".to_string(), // draft 1
                vote("YES"),
                "# Design v2".to_string(), // revision
                vote("YES"),
            ],
        )
        .member("b", [elect("a"), pass(), vote("YES"), vote("YES")])
        .member(
            "c",
            [elect("a"), pass(), vote("NO"), feedback("B1"), vote("YES")],
        )
        .member(
            "d",
            [elect("a"), pass(), vote("NO"), feedback("B2"), vote("NO")],
        )
        .member(
            "e",
            [elect("a"), pass(), vote("NO"), feedback("B3"), vote("NO")],
        );

    let h = harness(cfg, council);
    let result = run(&h).await;

    let doc = result.documentation.unwrap();
    assert!(doc.approved);
    assert_eq!(doc.final_version, 2);

    assert_eq!(h.store.artifact("documentation.md").unwrap(), "# Design v2");
    assert_eq!(
        h.store.artifact("documentation.draft.v1.md").unwrap(),
        "# Design v1"
    );
    assert!(h.store.artifact("documentation.review.v1.json").is_some());
    assert_eq!(
        h.store.artifact("documentation.draft.v2.md").unwrap(),
        "# Design v2"
    );
    assert!(h.store.artifact("documentation.unapproved.md").is_none());

    assert_eq!(
        h.store
            .events_of(EventType::DocumentApprovalVoteCalled)
            .len(),
        2
    );
    let results = h.store.events_of(EventType::DocumentApprovalVoteResult);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].payload["passed"], false);
    assert_eq!(results[1].payload["passed"], true);
}

#[tokio::test]
async fn documentation_rejection_persists_unresolved_blockers() {
    let mut cfg = config(&["a", "b", "c"], vec![phase("debate", 1)], "debate");
    cfg.output.kind = council_domain::OutputKind::Documentation;
    cfg.output.max_revision_rounds = 1;

    let council = ScriptedCouncil::new()
        .member(
            "a",
            [
                elect("a"),
                pass(),
                summary("Ship it"),
                "# Draft v1".to_string(),
                vote("YES"),
                "# Draft v2".to_string(),
                vote("YES"),
            ],
        )
        .member(
            "b",
            [elect("a"), pass(), vote("NO"), feedback("B1"), vote("NO")],
        )
        .member(
            "c",
            [elect("a"), pass(), vote("NO"), feedback("B2"), vote("NO")],
        );

    let h = harness(cfg, council);
    let result = run(&h).await;

    let doc = result.documentation.unwrap();
    assert!(!doc.approved);
    assert_eq!(doc.unresolved_blockers.len(), 2);
    assert_eq!(h.store.artifact("documentation.unapproved.md").unwrap(), "# Draft v2");
    assert!(h
        .store
        .artifact("documentation.unresolved-blockers.json")
        .is_some());
    assert_eq!(h.store.events_of(EventType::DocumentRejected).len(), 1);
}

// ---------------------------------------------------------------------------
// S6: the execution gate
// ---------------------------------------------------------------------------

fn s6_harness(require_approval: bool) -> Harness {
    let mut cfg = config(&["a", "b", "c"], vec![phase("debate", 1)], "debate");
    cfg.execution.require_human_approval = require_approval;
    cfg.execution.default_executor_profile = "default-executor".into();

    let council = ScriptedCouncil::new()
        .member(
            "a",
            [
                elect("a"),
                pass(),
                summary_with_execution("Migrate to postgres", "Run the migration plan"),
            ],
        )
        .member("b", [elect("a"), pass()])
        .member("c", [elect("a"), pass()]);
    harness(cfg, council)
}

#[tokio::test]
async fn execution_gate_blocks_without_flag() {
    let h = s6_harness(true);
    let result = h.use_case.run("Pick a database", false).await.unwrap();

    let handoff = result.execution_handoff.unwrap();
    assert!(!handoff.approved);
    assert!(handoff.approval_required);

    let raw = h.store.artifact("execution-handoff.json").unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed["approved"], false);
    assert_eq!(parsed["executionBrief"], "Run the migration plan");
}

#[tokio::test]
async fn execution_gate_opens_with_flag() {
    let h = s6_harness(true);
    let result = h.use_case.run("Pick a database", true).await.unwrap();
    assert!(result.execution_handoff.unwrap().approved);
}

// ---------------------------------------------------------------------------
// Phase graph traversal
// ---------------------------------------------------------------------------

#[tokio::test]
async fn transition_cap_forces_termination() {
    // A phase that always loops back to itself.
    let mut looping = phase("debate", 1);
    looping.transitions = vec![TransitionRule {
        to: "debate".into(),
        when: TransitionTrigger::Always,
        priority: 0,
    }];
    let mut cfg = config(&["a", "b", "c"], vec![looping], "debate");
    cfg.session.max_phase_transitions = 3;

    let mut council = ScriptedCouncil::new();
    for id in ["a", "b", "c"] {
        let mut script = vec![elect("a")];
        for _ in 0..3 {
            script.push(pass());
        }
        if id == "a" {
            script.push(summary("No consensus reached; revisit next session."));
        }
        council = council.member(id, script);
    }

    let h = harness(cfg, council);
    let result = run(&h).await;

    assert_eq!(result.phase_results.len(), 3);
    let closed = &h.store.events_of(EventType::SessionClosed)[0];
    assert_eq!(closed.payload["stopReason"], "MAX_PHASE_TRANSITIONS");
    assert_eq!(result.document.ended_by, PhaseEnd::RoundLimit);
}

#[tokio::test]
async fn round_limit_fallback_transition_is_taken() {
    let mut debate = phase("debate", 1);
    debate.fallback.action = FallbackAction::Transition { to: "retro".into() };
    let retro = phase("retro", 1);
    let cfg = config(&["a", "b", "c"], vec![debate, retro], "debate");

    let mut council = ScriptedCouncil::new();
    for id in ["a", "b", "c"] {
        let mut script = vec![elect("a")];
        script.push(pass()); // debate round
        script.push(pass()); // retro round
        if id == "a" {
            script.push(summary("No consensus reached; revisit next session."));
        }
        council = council.member(id, script);
    }

    let h = harness(cfg, council);
    let result = run(&h).await;

    let visited: Vec<&str> = result
        .phase_results
        .iter()
        .map(|r| r.phase_id.as_str())
        .collect();
    assert_eq!(visited, vec!["debate", "retro"]);
}

// ---------------------------------------------------------------------------
// Failure semantics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn transport_error_is_fatal() {
    let council = ScriptedCouncil::new()
        .member("a", [elect("a")])
        .member("b", [elect("a")])
        .failing_member("c");
    let h = harness(config(&["a", "b", "c"], vec![phase("debate", 1)], "debate"), council);

    let error = h.use_case.run("Pick a database", false).await.unwrap_err();
    assert!(matches!(
        error,
        SessionError::Model(ModelError::Transport(_))
    ));
}

#[tokio::test]
async fn cancellation_fails_fast() {
    let h = s1_harness();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let use_case = s1_use_case_with_cancel(cancel);

    let error = use_case.run("Pick a database", false).await.unwrap_err();
    assert!(matches!(error, SessionError::Cancelled));
}

fn s1_use_case_with_cancel(cancel: CancellationToken) -> RunSessionUseCase {
    let council = ScriptedCouncil::new()
        .member("a", [elect("a")])
        .member("b", [elect("a")])
        .member("c", [elect("a")]);
    RunSessionUseCase::new(
        Arc::new(config(&["a", "b", "c"], vec![phase("debate", 3)], "debate")),
        Arc::new(council),
        Arc::new(MemStoreProvider {
            store: Arc::new(MemSessionStore::default()),
        }),
        Arc::new(MemMemoryStore::default()),
        Arc::new(FixedClock),
        Arc::new(SeqIds::default()),
    )
    .with_cancellation(cancel)
}

#[tokio::test]
async fn invalid_config_fails_before_any_event() {
    // Even council: validation rejects before any session activity.
    let council = ScriptedCouncil::new();
    let h = harness(config(&["a", "b"], vec![phase("debate", 1)], "debate"), council);

    let error = h.use_case.run("Pick a database", false).await.unwrap_err();
    assert!(matches!(error, SessionError::InvalidConfig(_)));
    assert!(h.store.events().is_empty());
}
