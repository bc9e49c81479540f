use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::*;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

use crate::error::Error;
use crate::models::{Account, Choice, ChoiceId, Question, QuestionId};
use crate::store::Store;

fn question_from_row(row: PgRow) -> Question {
    Question {
        id: QuestionId(row.get("id")),
        question_text: row.get("question_text"),
        pub_date: row.get("pub_date"),
    }
}

fn choice_from_row(row: PgRow) -> Choice {
    Choice {
        id: ChoiceId(row.get("id")),
        question_id: QuestionId(row.get("question_id")),
        choice_text: row.get("choice_text"),
        votes: row.get("votes"),
    }
}

fn account_from_row(row: PgRow) -> Account {
    Account {
        id: row.get("id"),
        username: row.get("username"),
        password: row.get("password"),
    }
}

/**
 * Log the failed query and wrap it up for the handlers
 */
fn query_error(err: sqlx::Error) -> Error {
    error!("Database query failed: {:?}", err);
    Error::DatabaseQueryError(err)
}

#[derive(Clone, Debug)]
pub struct PgStore {
    pub pool: PgPool,
}

impl PgStore {
    /**
     * Open a pool of at most `max_connections` connections to `database_url`
     */
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(PgStore { pool })
    }

    /**
     * Bring the schema up to date with the migrations embedded in the binary
     */
    pub async fn migrate(&self) -> Result<(), Error> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(Error::MigrationError)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn latest_questions(&self, limit: usize) -> Result<Vec<Question>, Error> {
        sqlx::query(
            "SELECT id, question_text, pub_date FROM questions
            ORDER BY pub_date DESC, id ASC LIMIT $1",
        )
        .bind(limit as i64)
        .map(question_from_row)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn question(&self, id: QuestionId) -> Result<Question, Error> {
        debug!("Fetching question: {}", id);
        sqlx::query("SELECT id, question_text, pub_date FROM questions WHERE id = $1")
            .bind(id.0)
            .map(question_from_row)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?
            .ok_or(Error::QuestionNotFound(id))
    }

    async fn choices(&self, question: QuestionId) -> Result<Vec<Choice>, Error> {
        sqlx::query(
            "SELECT id, question_id, choice_text, votes FROM choices
            WHERE question_id = $1 ORDER BY id ASC",
        )
        .bind(question.0)
        .map(choice_from_row)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn vote(&self, question: QuestionId, choice: ChoiceId) -> Result<Choice, Error> {
        // A single statement, so concurrent votes cannot overwrite each other
        sqlx::query(
            "UPDATE choices SET votes = votes + 1
            WHERE id = $1 AND question_id = $2
            RETURNING id, question_id, choice_text, votes",
        )
        .bind(choice.0)
        .bind(question.0)
        .map(choice_from_row)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?
        .ok_or(Error::ChoiceNotFound(question, choice))
    }

    async fn add_question(
        &self,
        question_text: &str,
        pub_date: DateTime<Utc>,
    ) -> Result<Question, Error> {
        sqlx::query(
            "INSERT INTO questions (question_text, pub_date) VALUES ($1, $2)
            RETURNING id, question_text, pub_date",
        )
        .bind(question_text)
        .bind(pub_date)
        .map(question_from_row)
        .fetch_one(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn add_choice(&self, question: QuestionId, choice_text: &str) -> Result<Choice, Error> {
        // Checked up front rather than decoding the foreign key violation
        self.question(question).await?;

        sqlx::query(
            "INSERT INTO choices (question_id, choice_text) VALUES ($1, $2)
            RETURNING id, question_id, choice_text, votes",
        )
        .bind(question.0)
        .bind(choice_text)
        .map(choice_from_row)
        .fetch_one(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn add_account(&self, username: &str, password_hash: &str) -> Result<Account, Error> {
        sqlx::query(
            "INSERT INTO accounts (username, password) VALUES ($1, $2)
            ON CONFLICT (username) DO UPDATE SET password = EXCLUDED.password
            RETURNING id, username, password",
        )
        .bind(username)
        .bind(password_hash)
        .map(account_from_row)
        .fetch_one(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn account(&self, username: &str) -> Result<Option<Account>, Error> {
        sqlx::query("SELECT id, username, password FROM accounts WHERE username = $1")
            .bind(username)
            .map(account_from_row)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)
    }
}

/**
 * These need a disposable PostgreSQL database named by DATABASE_URL:
 *
 *   DATABASE_URL=postgres://localhost/polls_test cargo test -- --ignored
 */
