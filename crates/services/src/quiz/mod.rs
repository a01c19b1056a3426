mod engine;
mod order;
mod service;
mod ticker;
mod view;

// Public API of the quiz subsystem.
pub use crate::error::QuizError;
pub use engine::{Persistence, QuizSession};
pub use order::{pool_order, shuffled_order};
pub use service::{QuizSessionService, QuizSubmission};
pub use ticker::{ElapsedTicker, TICK_PERIOD, TickSubscription};
pub use view::{QuestionView, QuizPhase, QuizProgress, QuizResult};
