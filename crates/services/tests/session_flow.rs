use std::sync::Arc;

use chrono::Duration;
use drill_core::model::{
    AnswerChoice, AnswerId, KindFilter, Question, QuestionCount, QuestionId, QuestionKind,
    ScoringTable, SessionConfig, ThemeSelection, UserId,
};
use drill_core::time::fixed_now;
use services::{Clock, QuestionProvider, SessionAdvance, SessionLoopService, SessionStart};
use storage::repository::{InMemoryRepository, QuestionRepository, SnapshotRepository};

fn build_question(id: u64) -> Question {
    Question::new(
        QuestionId::new(id),
        "Fire behavior",
        "Combustion",
        format!("Question {id}"),
        None,
        vec![
            AnswerChoice::new(AnswerId::new(1), "right", true),
            AnswerChoice::new(AnswerId::new(2), "wrong", false),
        ],
        QuestionKind::Single,
        None,
        None,
        None,
    )
    .unwrap()
}

fn build_config() -> SessionConfig {
    SessionConfig::new(
        vec![ThemeSelection::new("Fire behavior", vec![], 10)],
        QuestionCount::Limited(3),
        false,
        30,
        ScoringTable::new(10.0, 0.0, 0.0, 5.0).unwrap(),
        KindFilter::All,
    )
    .unwrap()
}

async fn seeded_repo() -> InMemoryRepository {
    let repo = InMemoryRepository::new();
    for id in 1..=3 {
        repo.upsert_question(&build_question(id)).await.unwrap();
    }
    repo
}

fn service(repo: &InMemoryRepository, clock: Clock) -> SessionLoopService {
    SessionLoopService::new(
        clock,
        QuestionProvider::new(Arc::new(repo.clone())),
        Arc::new(repo.clone()),
    )
}

fn correct_id(session: &services::TrainingSession) -> AnswerId {
    let question = session.current_question().unwrap();
    *question.correct_answer_ids().iter().next().unwrap()
}

#[tokio::test]
async fn full_session_produces_report_and_clears_snapshot() {
    let repo = seeded_repo().await;
    let user = UserId::random();
    let loop_svc = service(&repo, Clock::fixed(fixed_now()));

    let start = loop_svc.start(user, build_config()).await.unwrap();
    let mut session = match start {
        SessionStart::Fresh(session) => session,
        SessionStart::Resumable { .. } => panic!("no snapshot expected on first start"),
    };

    let mut completed = None;
    while completed.is_none() {
        let id = correct_id(&session);
        session.toggle_answer(id).unwrap();
        loop_svc.submit_answer(user, &mut session).await.unwrap();

        // a snapshot exists after every validated answer
        assert!(repo.load_snapshot(user).await.unwrap().is_some());

        match loop_svc.advance(user, &mut session).await.unwrap() {
            SessionAdvance::Continued(_) => {}
            SessionAdvance::Completed(payload) => completed = Some(payload),
        }
    }

    let payload = completed.unwrap();
    assert_eq!(payload.answers.len(), 3);

    // the handoff payload is what the results screen serializes
    let encoded = serde_json::to_string(&payload).unwrap();
    assert!(encoded.contains("\"answers\""));

    // completion clears the snapshot
    assert!(repo.load_snapshot(user).await.unwrap().is_none());

    let report = payload.report(0, 0.0);
    assert_eq!(report.counts().correct, 3);
    assert!((report.success_rate() - 1.0).abs() < 1e-9);
    // 30 base + 50% performance bonus + 10 speed bonus (zero elapsed time)
    assert!((report.breakdown().total_points - 55.0).abs() < 1e-9);

    // the report is a pure function of the payload
    assert_eq!(payload.report(0, 0.0), report);
}

#[tokio::test]
async fn pause_then_resume_on_fresh_start_restores_progress() {
    let repo = seeded_repo().await;
    let user = UserId::random();
    let loop_svc = service(&repo, Clock::fixed(fixed_now()));

    let mut session = loop_svc
        .start(user, build_config())
        .await
        .unwrap()
        .into_session();

    let id = correct_id(&session);
    session.toggle_answer(id).unwrap();
    loop_svc.submit_answer(user, &mut session).await.unwrap();
    loop_svc.advance(user, &mut session).await.unwrap();
    loop_svc.pause(user, &mut session).await.unwrap();
    drop(session);

    // 23 hours later the snapshot is still offered
    let later = Clock::fixed(fixed_now() + Duration::hours(23));
    let restart = service(&repo, later).start(user, build_config()).await.unwrap();
    let (mut restored, snapshot) = match restart {
        SessionStart::Resumable { session, snapshot } => (session, snapshot),
        SessionStart::Fresh(_) => panic!("expected a resumable snapshot"),
    };

    service(&repo, later)
        .accept_resume(&mut restored, &snapshot)
        .unwrap();
    assert_eq!(restored.current_index(), 1);
    assert_eq!(restored.answers().len(), 1);
    assert!(restored.answers()[0].is_correct());
}

#[tokio::test]
async fn stale_snapshot_is_refused_and_cleared() {
    let repo = seeded_repo().await;
    let user = UserId::random();
    let loop_svc = service(&repo, Clock::fixed(fixed_now()));

    let mut session = loop_svc
        .start(user, build_config())
        .await
        .unwrap()
        .into_session();
    let id = correct_id(&session);
    session.toggle_answer(id).unwrap();
    loop_svc.submit_answer(user, &mut session).await.unwrap();
    loop_svc.pause(user, &mut session).await.unwrap();
    drop(session);

    // 25 hours later the snapshot has expired
    let later = Clock::fixed(fixed_now() + Duration::hours(25));
    let restart = service(&repo, later).start(user, build_config()).await.unwrap();
    assert!(matches!(restart, SessionStart::Fresh(_)));

    // and it was proactively cleared
    assert!(repo.load_snapshot(user).await.unwrap().is_none());
}

#[tokio::test]
async fn declining_resume_discards_the_snapshot() {
    let repo = seeded_repo().await;
    let user = UserId::random();
    let loop_svc = service(&repo, Clock::fixed(fixed_now()));

    let mut session = loop_svc
        .start(user, build_config())
        .await
        .unwrap()
        .into_session();
    let id = correct_id(&session);
    session.toggle_answer(id).unwrap();
    loop_svc.submit_answer(user, &mut session).await.unwrap();
    loop_svc.pause(user, &mut session).await.unwrap();
    drop(session);

    let restart = loop_svc.start(user, build_config()).await.unwrap();
    assert!(matches!(restart, SessionStart::Resumable { .. }));

    loop_svc.decline_resume(user).await.unwrap();
    assert!(repo.load_snapshot(user).await.unwrap().is_none());

    let again = loop_svc.start(user, build_config()).await.unwrap();
    assert!(matches!(again, SessionStart::Fresh(_)));
}

#[tokio::test]
async fn snapshot_for_a_different_shape_is_not_offered() {
    let repo = seeded_repo().await;
    let user = UserId::random();
    let loop_svc = service(&repo, Clock::fixed(fixed_now()));

    let mut session = loop_svc
        .start(user, build_config())
        .await
        .unwrap()
        .into_session();
    let id = correct_id(&session);
    session.toggle_answer(id).unwrap();
    loop_svc.submit_answer(user, &mut session).await.unwrap();
    loop_svc.pause(user, &mut session).await.unwrap();
    drop(session);

    let other_config = SessionConfig::new(
        vec![ThemeSelection::new("Fire behavior", vec![], 10)],
        QuestionCount::Unlimited,
        false,
        30,
        ScoringTable::exam_preset(),
        KindFilter::All,
    )
    .unwrap();

    let restart = loop_svc.start(user, other_config).await.unwrap();
    assert!(matches!(restart, SessionStart::Fresh(_)));
    // the paused session for the original shape survives
    assert!(repo.load_snapshot(user).await.unwrap().is_some());
}

#[tokio::test]
async fn abandon_discards_snapshot_without_report() {
    let repo = seeded_repo().await;
    let user = UserId::random();
    let loop_svc = service(&repo, Clock::fixed(fixed_now()));

    let mut session = loop_svc
        .start(user, build_config())
        .await
        .unwrap()
        .into_session();
    let id = correct_id(&session);
    session.toggle_answer(id).unwrap();
    loop_svc.submit_answer(user, &mut session).await.unwrap();
    loop_svc.pause(user, &mut session).await.unwrap();

    loop_svc.abandon(user, &mut session).await.unwrap();
    assert!(session.is_abandoned());
    assert!(!session.is_complete());
    assert!(repo.load_snapshot(user).await.unwrap().is_none());
}

#[tokio::test]
async fn skip_and_timeout_record_skipped_answers() {
    let repo = seeded_repo().await;
    let user = UserId::random();
    let loop_svc = service(&repo, Clock::fixed(fixed_now()));

    let mut session = loop_svc
        .start(user, build_config())
        .await
        .unwrap()
        .into_session();

    let skipped = loop_svc.skip(user, &mut session).await.unwrap();
    assert!(skipped.answer.is_skipped());
    loop_svc.advance(user, &mut session).await.unwrap();

    let timed_out = loop_svc.handle_timeout(user, &mut session).await.unwrap();
    assert!(timed_out.answer.is_skipped());
    assert_eq!(timed_out.progress.answered, 2);
}

#[tokio::test]
async fn review_session_re_runs_mistakes_without_timer() {
    let repo = seeded_repo().await;
    let user = UserId::random();
    let loop_svc = service(&repo, Clock::fixed(fixed_now()));

    let mut session = loop_svc
        .start(user, build_config())
        .await
        .unwrap()
        .into_session();

    // answer the first wrong, skip the second, answer the third right
    session.toggle_answer(AnswerId::new(2)).unwrap();
    loop_svc.submit_answer(user, &mut session).await.unwrap();
    loop_svc.advance(user, &mut session).await.unwrap();

    loop_svc.skip(user, &mut session).await.unwrap();
    loop_svc.advance(user, &mut session).await.unwrap();

    let id = correct_id(&session);
    session.toggle_answer(id).unwrap();
    loop_svc.submit_answer(user, &mut session).await.unwrap();
    let SessionAdvance::Completed(payload) = loop_svc.advance(user, &mut session).await.unwrap()
    else {
        panic!("session should be complete");
    };

    let review = loop_svc.start_review_session(&payload).unwrap();
    assert_eq!(review.questions().len(), 2);
    assert!(review.config().review_mode());
    assert_eq!(review.remaining_secs(), None);
}

#[tokio::test]
async fn empty_store_still_starts_via_samples() {
    let repo = InMemoryRepository::new();
    let user = UserId::random();
    let loop_svc = service(&repo, Clock::fixed(fixed_now()));

    let session = loop_svc
        .start(user, build_config())
        .await
        .unwrap()
        .into_session();
    assert!(!session.questions().is_empty());
}
