use async_std::sync::RwLock;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::*;

use crate::error::Error;
use crate::models::{Account, Choice, ChoiceId, Question, QuestionId};
use crate::store::Store;

#[derive(Default)]
struct Tables {
    questions: Vec<Question>,
    choices: Vec<Choice>,
    accounts: Vec<Account>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/**
 * Process-local store, used when no DATABASE_URL is configured and in tests
 */
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn latest_questions(&self, limit: usize) -> Result<Vec<Question>, Error> {
        let tables = self.tables.read().await;
        let mut questions = tables.questions.clone();
        // stable sort, so equal timestamps keep insertion order
        questions.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));
        questions.truncate(limit);
        Ok(questions)
    }

    async fn question(&self, id: QuestionId) -> Result<Question, Error> {
        let tables = self.tables.read().await;
        tables
            .questions
            .iter()
            .find(|q| q.id == id)
            .cloned()
            .ok_or(Error::QuestionNotFound(id))
    }

    async fn choices(&self, question: QuestionId) -> Result<Vec<Choice>, Error> {
        let tables = self.tables.read().await;
        Ok(tables
            .choices
            .iter()
            .filter(|c| c.question_id == question)
            .cloned()
            .collect())
    }

    async fn vote(&self, question: QuestionId, choice: ChoiceId) -> Result<Choice, Error> {
        let mut tables = self.tables.write().await;
        match tables
            .choices
            .iter_mut()
            .find(|c| c.id == choice && c.question_id == question)
        {
            Some(found) => {
                found.votes = found
                    .votes
                    .checked_add(1)
                    .ok_or(Error::VoteCountOverflow(found.id))?;
                debug!("Choice {} now has {} votes", found.id, found.votes);
                Ok(found.clone())
            }
            None => Err(Error::ChoiceNotFound(question, choice)),
        }
    }

    async fn add_question(
        &self,
        question_text: &str,
        pub_date: DateTime<Utc>,
    ) -> Result<Question, Error> {
        let mut tables = self.tables.write().await;
        let question = Question {
            id: QuestionId(tables.next_id()),
            question_text: question_text.to_string(),
            pub_date,
        };
        tables.questions.push(question.clone());
        Ok(question)
    }

    async fn add_choice(&self, question: QuestionId, choice_text: &str) -> Result<Choice, Error> {
        let mut tables = self.tables.write().await;
        if !tables.questions.iter().any(|q| q.id == question) {
            return Err(Error::QuestionNotFound(question));
        }
        let choice = Choice {
            id: ChoiceId(tables.next_id()),
            question_id: question,
            choice_text: choice_text.to_string(),
            votes: 0,
        };
        tables.choices.push(choice.clone());
        Ok(choice)
    }

    async fn add_account(&self, username: &str, password_hash: &str) -> Result<Account, Error> {
        let mut tables = self.tables.write().await;
        let account = Account {
            id: tables.next_id(),
            username: username.to_string(),
            password: password_hash.to_string(),
        };
        tables.accounts.retain(|a| a.username != username);
        tables.accounts.push(account.clone());
        Ok(account)
    }

    async fn account(&self, username: &str) -> Result<Option<Account>, Error> {
        let tables = self.tables.read().await;
        Ok(tables
            .accounts
            .iter()
            .find(|a| a.username == username)
            .cloned())
    }
}
