use tide::StatusCode;

use crate::models::{ChoiceId, QuestionId};

#[derive(Debug)]
pub enum Error {
    QuestionNotFound(QuestionId),
    ChoiceNotFound(QuestionId, ChoiceId),
    /**
     * A path parameter which cannot name any object, e.g. `/polls/abc`
     */
    InvalidIdentifier(String),
    VoteCountOverflow(ChoiceId),
    DatabaseQueryError(sqlx::Error),
    MigrationError(sqlx::migrate::MigrateError),
    TemplateError(String),
    PasswordHashError(argon2::Error),
    FormError(serde_qs::Error),
    ConfigError(String),
    FixtureError(String),
}

impl Error {
    /**
     * The HTTP status a request failing with this error should receive
     */
    pub fn status(&self) -> StatusCode {
        match self {
            Error::QuestionNotFound(_) | Error::ChoiceNotFound(..) | Error::InvalidIdentifier(_) => {
                StatusCode::NotFound
            }
            _ => StatusCode::InternalServerError,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::QuestionNotFound(id) => write!(f, "No question with id {}", id),
            Error::ChoiceNotFound(question, choice) => {
                write!(f, "No choice {} for question {}", choice, question)
            }
            Error::InvalidIdentifier(raw) => write!(f, "Invalid identifier: {:?}", raw),
            Error::VoteCountOverflow(choice) => {
                write!(f, "Choice {} cannot hold any more votes", choice)
            }
            Error::DatabaseQueryError(_) => write!(f, "Database query failed"),
            Error::MigrationError(err) => write!(f, "Cannot migrate database: {}", err),
            Error::TemplateError(msg) => write!(f, "Cannot render template: {}", msg),
            Error::PasswordHashError(_) => write!(f, "Cannot verify password"),
            Error::FormError(err) => write!(f, "Cannot encode form data: {}", err),
            Error::ConfigError(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::FixtureError(msg) => write!(f, "Cannot load fixture: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::DatabaseQueryError(err) => Some(err),
            Error::MigrationError(err) => Some(err),
            Error::PasswordHashError(err) => Some(err),
            Error::FormError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::DatabaseQueryError(err)
    }
}

impl From<serde_qs::Error> for Error {
    fn from(err: serde_qs::Error) -> Self {
        Error::FormError(err)
    }
}

impl From<argon2::Error> for Error {
    fn from(err: argon2::Error) -> Self {
        Error::PasswordHashError(err)
    }
}
