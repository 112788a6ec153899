//! End-to-end tests for the thesis/antithesis/synthesis protocol
//! (spec §4.9): convergence, the hard-limits safety block, and round-cap
//! escalation, driven entirely through [`DialecticSession::submit`] the
//! way a real caller would — no reaching into `convergence`/`safety`
//! directly.

use sentinel_dialectic::{DialecticSession, MessageKind};
use sentinel_domain::config::DialecticConfig;
use sentinel_domain::error::Error;
use sentinel_domain::types::{DialecticPhase, ResolutionAction};
use uuid::Uuid;

const SECRET: &[u8] = b"test-secret";

fn new_session() -> (DialecticSession, Uuid, Uuid) {
    let paused = Uuid::new_v4();
    let reviewer = Uuid::new_v4();
    (DialecticSession::new(Uuid::new_v4(), paused, reviewer), paused, reviewer)
}

fn open_thesis_and_antithesis(session: &mut DialecticSession, paused: Uuid, reviewer: Uuid, cfg: &DialecticConfig) {
    session
        .submit(
            MessageKind::Thesis,
            paused,
            "observed a sharp entropy spike".into(),
            vec![],
            Some("external load spike".into()),
            serde_json::json!({}),
            None,
            SECRET,
            cfg,
        )
        .unwrap();
    session
        .submit(
            MessageKind::Antithesis,
            reviewer,
            "monitor closely before resuming".into(),
            vec![],
            None,
            serde_json::json!({}),
            Some(false),
            SECRET,
            cfg,
        )
        .unwrap();
}

#[test]
fn matching_synthesis_converges_and_resumes() {
    let cfg = DialecticConfig::default();
    let (mut session, paused, reviewer) = new_session();
    open_thesis_and_antithesis(&mut session, paused, reviewer, &cfg);

    let conditions = vec!["lower complexity cap to 0.4".to_string()];
    let outcome = session
        .submit(
            MessageKind::Synthesis,
            paused,
            "agree, external cause confirmed".into(),
            conditions.clone(),
            Some("external load spike".into()),
            serde_json::json!({}),
            Some(true),
            SECRET,
            &cfg,
        )
        .unwrap();
    assert!(!outcome.converged);
    assert_eq!(session.phase, DialecticPhase::Synthesis);

    let outcome = session
        .submit(
            MessageKind::Synthesis,
            reviewer,
            "agree, conditions are reasonable".into(),
            conditions,
            Some("external load spike".into()),
            serde_json::json!({}),
            Some(true),
            SECRET,
            &cfg,
        )
        .unwrap();

    assert!(outcome.converged);
    assert_eq!(session.phase, DialecticPhase::Resolved);
    let resolution = session.resolution.as_ref().unwrap();
    assert_eq!(resolution.action, ResolutionAction::Resume);
}

#[test]
fn synthesis_proposing_a_forbidden_condition_converges_to_block() {
    let cfg = DialecticConfig::default();
    let (mut session, paused, reviewer) = new_session();
    open_thesis_and_antithesis(&mut session, paused, reviewer, &cfg);

    let conditions = vec!["disable the circuit breaker for this agent".to_string()];
    session
        .submit(
            MessageKind::Synthesis,
            paused,
            "agree".into(),
            conditions.clone(),
            Some("external load spike".into()),
            serde_json::json!({}),
            Some(true),
            SECRET,
            &cfg,
        )
        .unwrap();
    let outcome = session
        .submit(
            MessageKind::Synthesis,
            reviewer,
            "agree".into(),
            conditions,
            Some("external load spike".into()),
            serde_json::json!({}),
            Some(true),
            SECRET,
            &cfg,
        )
        .unwrap();

    assert!(outcome.converged);
    assert_eq!(session.phase, DialecticPhase::Resolved);
    let resolution = session.resolution.as_ref().unwrap();
    assert_eq!(resolution.action, ResolutionAction::Block);
}

#[test]
fn disagreement_through_the_round_cap_escalates() {
    let cfg = DialecticConfig::default();
    let (mut session, paused, reviewer) = new_session();
    open_thesis_and_antithesis(&mut session, paused, reviewer, &cfg);

    let mut last_err = None;
    for round in 0..cfg.max_rounds {
        session
            .submit(
                MessageKind::Synthesis,
                paused,
                format!("still disagree, round {round}"),
                vec![],
                Some("external load spike".into()),
                serde_json::json!({}),
                Some(false),
                SECRET,
                &cfg,
            )
            .unwrap();
        let result = session.submit(
            MessageKind::Synthesis,
            reviewer,
            format!("still disagree, round {round}"),
            vec![],
            Some("a different cause".into()),
            serde_json::json!({}),
            Some(false),
            SECRET,
            &cfg,
        );
        match result {
            Ok(outcome) => assert!(!outcome.converged),
            Err(e) => last_err = Some(e),
        }
    }

    assert!(matches!(last_err, Some(Error::MaxRoundsExceeded)));
    assert_eq!(session.phase, DialecticPhase::Escalated);
    let resolution = session.resolution.as_ref().unwrap();
    assert_eq!(resolution.action, ResolutionAction::Escalate);
}

#[test]
fn llm_assisted_synthesis_agreeing_resumes_without_a_second_author() {
    let cfg = DialecticConfig::default();
    let (mut session, paused, reviewer) = new_session();
    open_thesis_and_antithesis(&mut session, paused, reviewer, &cfg);

    let outcome = session
        .submit_llm_synthesis(
            "collaborator agrees with the thesis's root cause".into(),
            vec!["lower complexity cap to 0.4".into()],
            Some("external load spike".into()),
            true,
            SECRET,
            &cfg,
        )
        .unwrap();

    assert!(outcome.converged);
    assert_eq!(session.phase, DialecticPhase::Resolved);
    assert_eq!(session.resolution.as_ref().unwrap().action, ResolutionAction::Resume);
}

#[test]
fn llm_assisted_synthesis_disagreeing_escalates() {
    let cfg = DialecticConfig::default();
    let (mut session, paused, reviewer) = new_session();
    open_thesis_and_antithesis(&mut session, paused, reviewer, &cfg);

    let err = session
        .submit_llm_synthesis(
            "collaborator does not find the root cause convincing".into(),
            vec![],
            None,
            false,
            SECRET,
            &cfg,
        )
        .unwrap_err();

    assert!(matches!(err, Error::MaxRoundsExceeded));
    assert_eq!(session.phase, DialecticPhase::Escalated);
    assert_eq!(
        session.resolution.as_ref().unwrap().action,
        ResolutionAction::Escalate
    );
}

#[test]
fn a_non_participant_cannot_submit_a_thesis() {
    let cfg = DialecticConfig::default();
    let (mut session, _paused, _reviewer) = new_session();
    let outsider = Uuid::new_v4();

    let err = session
        .submit(
            MessageKind::Thesis,
            outsider,
            "I'd like to weigh in".into(),
            vec![],
            None,
            serde_json::json!({}),
            None,
            SECRET,
            &cfg,
        )
        .unwrap_err();
    assert!(matches!(err, Error::AuthRequired(_)));
}
