use course_core::model::{ChapterId, Question, QuestionDraft, QuizSettings};
use course_core::time::fixed_now;
use course_core::ResolverSettings;
use rand::SeedableRng;
use rand::rngs::StdRng;
use services::{Clock, CourseServices, QuizPhase, QuizSessionService};
use storage::repository::Storage;

fn pool(n: usize) -> Vec<Question> {
    Question::pool_from_drafts((0..n).map(|i| {
        QuestionDraft::new(format!("Q{i}"), ["a", "b", "c", "d"], i % 4, format!("see {i}"))
    }))
    .unwrap()
}

#[tokio::test]
async fn ten_question_quiz_submits_once() {
    let services = CourseServices::in_memory(
        Clock::fixed(fixed_now()),
        QuizSettings::default(),
        ResolverSettings::default(),
    );
    let quiz = services.quiz();
    let chapter = ChapterId::new(1);
    let mut session = quiz.start(chapter, pool(10)).await.unwrap();

    for i in 0..10 {
        let option = if i < 7 { i % 4 } else { (i + 2) % 4 };
        assert!(quiz.answer(&mut session, i, option).await.unwrap());
    }
    for _ in 0..42 {
        session.tick();
    }

    assert!(session.can_submit());
    assert!(session.request_submit());
    let submission = quiz.confirm_submit(&mut session).await.unwrap();
    assert_eq!(submission.result.score, 7);
    assert_eq!(submission.result.total, 10);
    assert_eq!(submission.result.elapsed_seconds, 42);
    assert!(quiz.confirm_submit(&mut session).await.is_none());

    let review = quiz.open_review(chapter, pool(10)).await.unwrap();
    assert_eq!(review.phase(), QuizPhase::Completed);
    assert_eq!(review.score(), 7);
    assert_eq!(review.elapsed_seconds(), 42);
}

#[tokio::test]
async fn large_pool_gates_on_one_batch() {
    let services = CourseServices::in_memory(
        Clock::fixed(fixed_now()),
        QuizSettings::default(),
        ResolverSettings::default(),
    );
    let quiz = services.quiz();
    let mut session = quiz.start(ChapterId::new(2), pool(120)).await.unwrap();
    assert_eq!(session.progress().batch_count, 3);

    let order = session.order().to_vec();
    for &i in &order[..40] {
        quiz.answer(&mut session, i, 0).await.unwrap();
    }
    assert!(!session.can_submit());

    assert!(quiz.next_batch(&mut session).await.unwrap());
    for &i in &order[40..50] {
        quiz.answer(&mut session, i, 0).await.unwrap();
    }
    assert!(session.can_submit());
    assert!(session.progress().can_submit);
}

#[tokio::test]
async fn progress_survives_reopening_sqlite_storage() {
    let url = "sqlite:file:services_resume?mode=memory&cache=shared";
    let chapter = ChapterId::new(7);
    let settings = QuizSettings::new(3, true).unwrap();

    let first_storage = Storage::sqlite(url).await.unwrap();
    let first = QuizSessionService::from_storage(Clock::fixed(fixed_now()), &first_storage)
        .with_settings(settings);
    let mut session = first
        .start_with_rng(chapter, pool(8), &mut StdRng::seed_from_u64(11))
        .await
        .unwrap();
    let order = session.order().to_vec();
    first.answer(&mut session, order[0], 1).await.unwrap();
    first.answer(&mut session, order[1], 2).await.unwrap();
    first.next_batch(&mut session).await.unwrap();
    let expected_answers = session.answers().clone();

    let second_storage = Storage::sqlite(url).await.unwrap();
    let second = QuizSessionService::from_storage(Clock::fixed(fixed_now()), &second_storage)
        .with_settings(settings);
    let mut reopened = second
        .start_with_rng(chapter, pool(8), &mut StdRng::seed_from_u64(99))
        .await
        .unwrap();
    assert_eq!(reopened.phase(), QuizPhase::AwaitingResumeChoice);
    assert!(second.resume(&mut reopened));
    assert_eq!(reopened.order(), order.as_slice());
    assert_eq!(reopened.answers(), &expected_answers);
    assert_eq!(reopened.batch_index(), 1);

    assert!(second.restart(&mut reopened).await.unwrap());
    let fresh = second.start(chapter, pool(8)).await.unwrap();
    assert_eq!(fresh.phase(), QuizPhase::InProgress);
    drop(first_storage);
}

#[tokio::test]
async fn questions_load_from_chapter_json() {
    let raw = r#"{
        "id": 4,
        "title": "Cells",
        "content": {
            "type": "mcq",
            "questions": [
                { "text": "Powerhouse of the cell?", "options": ["Nucleus", "Mitochondria"], "correctOptionIndex": 1, "explanation": "ATP" },
                { "text": "Plant cell wall?", "options": ["Cellulose", "Chitin", "Keratin"], "correct": 0 }
            ]
        }
    }"#;
    let chapter: course_core::model::Chapter = serde_json::from_str(raw).unwrap();
    let services = CourseServices::in_memory(
        Clock::fixed(fixed_now()),
        QuizSettings::default(),
        ResolverSettings::default(),
    );

    let services::PreparedContent::Quiz { pool } =
        services.chapters().prepare_chapter(&chapter, None).unwrap()
    else {
        panic!("expected a quiz");
    };
    let quiz = services.quiz();
    let mut session = quiz.start(chapter.id, pool).await.unwrap();
    assert!(quiz.answer(&mut session, 0, 1).await.unwrap());
    let view = session.question_view(0).unwrap();
    assert_eq!(view.is_correct, Some(true));
    assert_eq!(view.explanation, Some("ATP"));
}
