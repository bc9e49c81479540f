use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Error;
use crate::models::{Account, Choice, ChoiceId, Question, QuestionId};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/**
 * Persistence for questions, their choices, and the accounts allowed to log in
 *
 * Implementations must make `vote` a single atomic increment so that
 * concurrent votes for the same choice are never lost.
 */
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /**
     * Up to `limit` questions, most recently published first
     */
    async fn latest_questions(&self, limit: usize) -> Result<Vec<Question>, Error>;

    async fn question(&self, id: QuestionId) -> Result<Question, Error>;

    /**
     * The choices of a question, ordered by id
     */
    async fn choices(&self, question: QuestionId) -> Result<Vec<Choice>, Error>;

    /**
     * Add one vote to `choice`, which must belong to `question`
     */
    async fn vote(&self, question: QuestionId, choice: ChoiceId) -> Result<Choice, Error>;

    async fn add_question(
        &self,
        question_text: &str,
        pub_date: DateTime<Utc>,
    ) -> Result<Question, Error>;

    async fn add_choice(&self, question: QuestionId, choice_text: &str) -> Result<Choice, Error>;

    async fn add_account(&self, username: &str, password_hash: &str) -> Result<Account, Error>;

    async fn account(&self, username: &str) -> Result<Option<Account>, Error>;
}
