use argon2::Config;
use async_trait::async_trait;
use log::*;
use rand::Rng;
use serde::Serialize;
use tide::{Middleware, Next, Redirect, Request};

use crate::error::Error;
use crate::store::Store;

pub const LOGIN_PATH: &str = "/accounts/login";
pub const DEFAULT_NEXT: &str = "/polls";

/**
 * Session key holding the username of the logged in account
 */
pub const SESSION_USER: &str = "username";

/**
 * The logged in account, attached to the request by `LoginRequired`
 */
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub username: String,
}

#[derive(Serialize)]
struct NextParam<'a> {
    next: &'a str,
}

/**
 * The login page URL which will send the user back to `next` afterwards
 */
pub fn login_url(next: &str) -> Result<String, Error> {
    let query = serde_qs::to_string(&NextParam { next })?;
    Ok(format!("{}?{}", LOGIN_PATH, query))
}

/**
 * Only follow `next` when it stays on this site
 */
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(next) if next.starts_with('/') && !next.starts_with("//") && !next.starts_with("/\\") => {
            next
        }
        _ => DEFAULT_NEXT,
    }
}

pub fn hash_password(password: &str) -> Result<String, Error> {
    let salt = rand::thread_rng().gen::<[u8; 32]>();
    let config = Config::default();
    Ok(argon2::hash_encoded(password.as_bytes(), &salt, &config)?)
}

pub fn verify_password(hash: &str, password: &str) -> Result<bool, Error> {
    Ok(argon2::verify_encoded(hash, password.as_bytes())?)
}

/**
 * Create the bootstrap account unless one with that name already exists
 */
pub async fn ensure_account(store: &dyn Store, username: &str, password: &str) -> Result<(), Error> {
    if store.account(username).await?.is_some() {
        debug!("Account {} already exists", username);
        return Ok(());
    }
    let hash = hash_password(password)?;
    store.add_account(username, &hash).await?;
    info!("Created account {}", username);
    Ok(())
}

/**
 * Route middleware which only lets requests with a logged in session through
 *
 * Everyone else is redirected to the login page.
 */
#[derive(Debug, Default)]
pub struct LoginRequired;

#[async_trait]
impl<State: Clone + Send + Sync + 'static> Middleware<State> for LoginRequired {
    async fn handle(&self, mut req: Request<State>, next: Next<'_, State>) -> tide::Result {
        let username = req.session().get::<String>(SESSION_USER);
        match username {
            Some(username) => {
                req.set_ext(CurrentUser { username });
                Ok(next.run(req).await)
            }
            None => {
                let path = match req.url().query() {
                    Some(query) => format!("{}?{}", req.url().path(), query),
                    None => req.url().path().to_string(),
                };
                debug!("Anonymous request for {}, redirecting to login", path);
                Ok(Redirect::new(login_url(&path)?).into())
            }
        }
    }
}
