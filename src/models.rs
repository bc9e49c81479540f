use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct QuestionId(pub i64);

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ChoiceId(pub i64);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ChoiceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/**
 * A poll item, published at `pub_date`
 */
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Question {
    pub id: QuestionId,
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
}

/**
 * A selectable answer to a Question along with the votes it has received
 */
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Choice {
    pub id: ChoiceId,
    pub question_id: QuestionId,
    pub choice_text: String,
    pub votes: i32,
}

#[derive(Clone, Debug)]
pub struct Account {
    pub id: i64,
    pub username: String,
    /**
     * argon2 encoded hash, never the plain text password
     */
    pub password: String,
}
