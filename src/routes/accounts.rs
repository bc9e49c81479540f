use log::*;
use serde::{Deserialize, Serialize};
use tide::{Redirect, Request, StatusCode};

use crate::auth::{safe_next, verify_password, LOGIN_PATH, SESSION_USER};
use crate::templates;
use crate::AppState;

pub const BAD_CREDENTIALS: &str = "Please enter a correct username and password.";

#[derive(Debug, Default, Deserialize)]
struct LoginForm {
    username: Option<String>,
    password: Option<String>,
    next: Option<String>,
}

#[derive(Serialize)]
struct LoginPage<'a> {
    next: &'a str,
    username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<&'a str>,
}

/**
 *  GET /accounts/login
 */
pub async fn login_form(req: Request<AppState>) -> tide::Result {
    let form: LoginForm = serde_qs::from_str(req.url().query().unwrap_or("")).unwrap_or_default();
    let page = LoginPage {
        next: safe_next(form.next.as_deref()),
        username: "",
        error_message: None,
    };
    Ok(templates::render(
        &req.state().templates,
        templates::LOGIN,
        StatusCode::Ok,
        &page,
    )?)
}

/**
 *  POST /accounts/login
 */
pub async fn login(mut req: Request<AppState>) -> tide::Result {
    let body = req.body_string().await?;
    let form: LoginForm = serde_qs::from_str(&body).unwrap_or_default();
    let username = form.username.unwrap_or_default();
    let password = form.password.unwrap_or_default();
    let next = safe_next(form.next.as_deref()).to_string();

    let verified = match req.state().store.account(&username).await? {
        Some(account) => verify_password(&account.password, &password)?,
        None => false,
    };

    if !verified {
        warn!("Failed login for {:?}", username);
        let page = LoginPage {
            next: &next,
            username: &username,
            error_message: Some(BAD_CREDENTIALS),
        };
        return Ok(templates::render(
            &req.state().templates,
            templates::LOGIN,
            StatusCode::Ok,
            &page,
        )?);
    }

    let session = req.session_mut();
    // a fresh session id on every login
    session.regenerate();
    session.insert(SESSION_USER, &username)?;
    info!("{} logged in", username);
    Ok(Redirect::new(next).into())
}

/**
 *  GET|POST /accounts/logout
 */
pub async fn logout(mut req: Request<AppState>) -> tide::Result {
    if let Some(username) = req.session().get::<String>(SESSION_USER) {
        info!("{} logged out", username);
    }
    req.session_mut().destroy();
    Ok(Redirect::new(LOGIN_PATH).into())
}
