use log::*;
use serde::{Deserialize, Serialize};
use tide::{Redirect, Request, StatusCode};

use crate::auth::CurrentUser;
use crate::error::Error;
use crate::models::{Choice, ChoiceId, Question, QuestionId};
use crate::templates;
use crate::AppState;

/**
 * How many questions the index page lists
 */
pub const LATEST_LIMIT: usize = 5;

pub const NO_CHOICE_SELECTED: &str = "You didn't select a choice.";

#[derive(Serialize)]
struct IndexPage<'a> {
    latest_question_list: &'a [Question],
    user: Option<&'a str>,
}

#[derive(Serialize)]
struct QuestionPage<'a> {
    question: &'a Question,
    choices: &'a [Choice],
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
struct VoteForm {
    choice: Option<String>,
}

/**
 * Decode a vote body, treating anything unreadable as no choice at all
 *
 * When `choice` is repeated the last value wins.
 */
fn vote_form(body: &[u8]) -> VoteForm {
    let last_choice = body
        .split(|b| *b == b'&')
        .filter(|pair| pair.starts_with(b"choice="))
        .last();
    match last_choice {
        Some(pair) => serde_qs::from_bytes::<VoteForm>(pair).unwrap_or_else(|err| {
            debug!("Unreadable vote form: {}", err);
            VoteForm::default()
        }),
        None => VoteForm::default(),
    }
}

/**
 * Parse the `:question_id` route parameter
 */
fn question_id(req: &Request<AppState>) -> Result<QuestionId, Error> {
    let raw = req
        .param("question_id")
        .map_err(|_| Error::InvalidIdentifier(String::new()))?;
    raw.parse::<i64>()
        .map(QuestionId)
        .map_err(|_| Error::InvalidIdentifier(raw.to_string()))
}

fn render_question(
    state: &AppState,
    template: &str,
    question: &Question,
    choices: &[Choice],
    error_message: Option<&str>,
) -> tide::Result {
    let page = QuestionPage {
        question,
        choices,
        error_message,
    };
    Ok(templates::render(
        &state.templates,
        template,
        StatusCode::Ok,
        &page,
    )?)
}

/**
 *  GET /polls
 */
pub async fn index(req: Request<AppState>) -> tide::Result {
    let questions = req.state().store.latest_questions(LATEST_LIMIT).await?;
    let page = IndexPage {
        latest_question_list: &questions,
        user: req.ext::<CurrentUser>().map(|u| u.username.as_str()),
    };
    Ok(templates::render(
        &req.state().templates,
        templates::INDEX,
        StatusCode::Ok,
        &page,
    )?)
}

/**
 *  GET /polls/:question_id
 */
pub async fn detail(req: Request<AppState>) -> tide::Result {
    let id = question_id(&req)?;
    let question = req.state().store.question(id).await?;
    let choices = req.state().store.choices(id).await?;
    render_question(req.state(), templates::DETAIL, &question, &choices, None)
}

/**
 *  POST /polls/:question_id/vote
 *
 * A missing or foreign choice re-renders the detail page with an error
 * rather than failing the request.
 */
pub async fn vote(mut req: Request<AppState>) -> tide::Result {
    let id = question_id(&req)?;
    let question = req.state().store.question(id).await?;

    let body = req.body_bytes().await?;
    let choice = vote_form(&body)
        .choice
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .map(ChoiceId);

    let state = req.state();
    if let Some(choice) = choice {
        match state.store.vote(id, choice).await {
            Ok(voted) => {
                info!(
                    "Vote recorded for choice {} of question {} ({} votes)",
                    voted.id, id, voted.votes
                );
                return Ok(Redirect::new(format!("/polls/{}/results", id)).into());
            }
            Err(Error::ChoiceNotFound(..)) => {
                debug!("Choice {} does not belong to question {}", choice, id);
            }
            Err(err) => return Err(err.into()),
        }
    } else {
        debug!("Vote for question {} without a choice", id);
    }

    let choices = state.store.choices(id).await?;
    render_question(
        state,
        templates::DETAIL,
        &question,
        &choices,
        Some(NO_CHOICE_SELECTED),
    )
}

/**
 *  GET /polls/:question_id/results
 */
pub async fn results(req: Request<AppState>) -> tide::Result {
    let id = question_id(&req)?;
    let question = req.state().store.question(id).await?;
    let choices = req.state().store.choices(id).await?;
    render_question(req.state(), templates::RESULTS, &question, &choices, None)
}
