//! Terminal quiz host.
//!
//! Reads commands line by line from stdin while the elapsed timer ticks in the
//! same `select!` loop.

use course_core::model::{AttemptId, Question, QuestionDraft, QuizAttempt};
use course_core::{Clock, ResolverSettings};
use services::{
    CourseServices, ElapsedTicker, HostNotice, QuestionView, QuizError, QuizPhase, QuizSession,
    QuizSessionService,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::QuizArgs;

/// One line of learner input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    /// Display position and option, both zero-based.
    Answer { position: usize, option: usize },
    Next,
    Prev,
    Submit,
    Yes,
    No,
    Resume,
    Restart,
    Show,
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    let mut parts = line.split_whitespace();
    let first = parts.next()?.to_ascii_lowercase();
    let input = match first.as_str() {
        "n" | "next" => Input::Next,
        "p" | "prev" => Input::Prev,
        "s" | "submit" => Input::Submit,
        "y" | "yes" => Input::Yes,
        "no" | "cancel" => Input::No,
        "r" | "resume" => Input::Resume,
        "restart" | "new" => Input::Restart,
        "show" | "l" => Input::Show,
        "q" | "quit" => Input::Quit,
        number => {
            let position = number.parse::<usize>().ok()?.checked_sub(1)?;
            let option = parse_option(parts.next()?)?;
            Input::Answer { position, option }
        }
    };
    if parts.next().is_some() {
        return None;
    }
    Some(input)
}

/// `b`, `B` and `2` all name the second option.
fn parse_option(raw: &str) -> Option<usize> {
    let mut chars = raw.chars();
    let first = chars.next()?;
    if chars.as_str().is_empty() && first.is_ascii_alphabetic() {
        return Some(usize::from(first.to_ascii_lowercase() as u8 - b'a'));
    }
    raw.parse::<usize>().ok()?.checked_sub(1)
}

fn option_letter(option: usize) -> char {
    u8::try_from(option)
        .ok()
        .filter(|o| *o < 26)
        .map_or('?', |o| char::from(b'a' + o))
}

fn format_elapsed(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

fn load_pool(path: &std::path::Path) -> Result<Vec<Question>, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    let drafts: Vec<QuestionDraft> = serde_json::from_str(&raw)?;
    Ok(Question::pool_from_drafts(drafts)?)
}

//
// ─── RENDERING ─────────────────────────────────────────────────────────────────
//

fn question_heading(view: &QuestionView<'_>) -> String {
    let lock = if view.is_locked() { "  [locked]" } else { "" };
    format!("{}. {}{lock}", view.position + 1, view.question.text())
}

fn history_line(id: AttemptId, attempt: &QuizAttempt) -> String {
    format!(
        "  #{id} {} {:>3}% ({}/{}, {} answered) in {}",
        attempt.submitted_at.format("%Y-%m-%d %H:%M"),
        attempt.percent(),
        attempt.score,
        attempt.total,
        attempt.answered(),
        format_elapsed(attempt.elapsed_seconds)
    )
}

fn render_question(view: &QuestionView<'_>) {
    println!();
    println!("{}", question_heading(view));
    for (index, text) in view.question.options().iter().enumerate() {
        let chosen = if view.selected == Some(index) { "*" } else { " " };
        let correct = if view.revealed_correct_option == Some(index) {
            "  (correct)"
        } else {
            ""
        };
        println!("   [{chosen}] {}) {text}{correct}", option_letter(index));
    }
    if let Some(explanation) = view.explanation.filter(|e| !e.is_empty()) {
        println!("   -> {explanation}");
    }
}

fn render_batch(session: &QuizSession) {
    for view in session.current_batch() {
        render_question(&view);
    }
    render_status(session);
}

fn render_status(session: &QuizSession) {
    let progress = session.progress();
    println!();
    println!(
        "answered {}/{} | batch {}/{} | {}{}",
        progress.answered,
        progress.total,
        progress.batch_index + 1,
        progress.batch_count,
        format_elapsed(progress.elapsed_seconds),
        if progress.can_submit {
            " | type `s` to submit"
        } else {
            ""
        }
    );
    println!("answer with `<number> <option>`, `n`/`p` to page, `q` to quit");
}

fn render_result(session: &QuizSession) {
    let result = session.result();
    println!();
    println!(
        "score {}/{} in {}",
        result.score,
        result.total,
        format_elapsed(result.elapsed_seconds)
    );
    for (position, question) in result.ordered_questions.iter().enumerate() {
        let mark = match result.answers.get(question.index()) {
            Some(option) if question.is_correct(option) => "right",
            Some(_) => "wrong",
            None => "skipped",
        };
        println!("  {:>3}. {mark:<7} {}", position + 1, question.text());
    }
}

async fn render_history(quiz: &QuizSessionService, session: &QuizSession) {
    match quiz.history(session.chapter_id(), 5).await {
        Ok(attempts) if !attempts.is_empty() => {
            println!();
            println!("recent attempts:");
            for (id, attempt) in &attempts {
                println!("{}", history_line(*id, attempt));
            }
        }
        Ok(_) => {}
        Err(err) => warn!(chapter_id = %session.chapter_id(), error = %err, "quiz history unavailable"),
    }
}

fn show_notice(notice: &HostNotice) {
    eprintln!("! {}", notice.message);
}

//
// ─── LOOP ──────────────────────────────────────────────────────────────────────
//

enum Flow {
    Continue,
    Quit,
}

async fn handle(
    quiz: &QuizSessionService,
    session: &mut QuizSession,
    input: Input,
) -> Result<Flow, QuizError> {
    match (session.phase(), input) {
        (_, Input::Quit) => return Ok(Flow::Quit),
        (QuizPhase::AwaitingResumeChoice, Input::Resume) => {
            quiz.resume(session);
            render_batch(session);
        }
        (QuizPhase::AwaitingResumeChoice | QuizPhase::InProgress, Input::Restart) => {
            let outcome = quiz.restart(session).await;
            save_or_warn(session, outcome)?;
            render_batch(session);
        }
        (QuizPhase::InProgress, Input::Answer { position, option }) => {
            let Some(&pool_index) = session.order().get(position) else {
                println!("no question {}", position + 1);
                return Ok(Flow::Continue);
            };
            match quiz.answer(session, pool_index, option).await {
                Ok(false) => println!("question {} is already answered", position + 1),
                outcome => save_or_warn(session, outcome.map(|_| ()))?,
            }
            if let Some(view) = session.question_view(pool_index) {
                render_question(&view);
            }
            render_status(session);
        }
        (QuizPhase::InProgress, Input::Next) => {
            let outcome = quiz.next_batch(session).await;
            save_or_warn(session, outcome.map(|_| ()))?;
            render_batch(session);
        }
        (QuizPhase::InProgress, Input::Prev) => {
            let outcome = quiz.prev_batch(session).await;
            save_or_warn(session, outcome.map(|_| ()))?;
            render_batch(session);
        }
        (QuizPhase::InProgress, Input::Show) => render_batch(session),
        (QuizPhase::InProgress, Input::Submit) => {
            if session.request_submit() {
                println!(
                    "submit {} of {} answers? [y/no]",
                    session.answers().len(),
                    session.pool().len()
                );
            } else {
                let needed = session.settings().submit_threshold(session.pool().len());
                println!("answer at least {needed} questions before submitting");
            }
        }
        (QuizPhase::ConfirmingSubmit, Input::Yes) => {
            if let Some(submission) = quiz.confirm_submit(session).await {
                render_result(session);
                if submission.attempt_id.is_none() {
                    show_notice(&HostNotice::warning("this attempt was not added to history"));
                }
                render_history(quiz, session).await;
            }
            return Ok(Flow::Quit);
        }
        (QuizPhase::ConfirmingSubmit, Input::No) => {
            session.cancel_submit();
            render_status(session);
        }
        (phase, _) => println!("that does not apply right now ({phase:?})"),
    }
    Ok(Flow::Continue)
}

/// Storage failures keep the session running with a warning.
fn save_or_warn<T>(session: &QuizSession, outcome: Result<T, QuizError>) -> Result<(), QuizError> {
    match outcome {
        Ok(_) => Ok(()),
        Err(QuizError::Storage(err)) => {
            warn!(chapter_id = %session.chapter_id(), error = %err, "quiz progress not saved");
            show_notice(&HostNotice::progress_not_saved(session.chapter_id()));
            Ok(())
        }
        Err(err) => Err(err),
    }
}

pub(crate) async fn run(args: QuizArgs) -> Result<(), Box<dyn std::error::Error>> {
    let pool = load_pool(&args.questions)?;
    let services = CourseServices::new_sqlite(
        &args.db_url,
        Clock::default(),
        args.settings.validate()?,
        ResolverSettings::default(),
    )
    .await?;
    let quiz = services.quiz();

    let mut session = quiz.start(args.chapter_id, pool).await?;
    if session.phase() == QuizPhase::AwaitingResumeChoice {
        println!(
            "saved progress found for chapter {}: `r` to resume, `restart` to start over",
            args.chapter_id
        );
    } else {
        render_batch(&session);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = ElapsedTicker::new();
    loop {
        ticker.sync(session.phase());
        tokio::select! {
            () = ticker.tick() => {
                session.tick();
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let Some(input) = parse_input(&line) else {
                    println!("unrecognized input: {}", line.trim());
                    continue;
                };
                if let Flow::Quit = handle(&quiz, &mut session, input).await? {
                    break;
                }
            }
        }
    }
    ticker.stop();

    if session.has_unsaved_progress() {
        println!(
            "{} answers kept; run the same command again to resume",
            session.answers().len()
        );
    }
    Ok(())
}
