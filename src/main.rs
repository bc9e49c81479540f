use dotenv::dotenv;
use handlebars::Handlebars;
use log::*;
use tide::sessions::SessionMiddleware;
use tide::utils::After;

use std::sync::Arc;

mod auth;
mod config;
mod error;
mod fixtures;
mod models;
mod routes;
mod store;
mod templates;
#[cfg(test)]
mod testing;

use crate::config::Settings;
use crate::error::Error;
use crate::store::{MemoryStore, PgStore, Store};

/**
 * Shared by every handler: the poll store and the compiled page templates
 */
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub templates: Arc<Handlebars<'static>>,
}

/**
 * Wire up the middleware and routes around the given state
 */
pub fn app(state: AppState, session_secret: &[u8]) -> tide::Server<AppState> {
    let mut app = tide::with_state(state);
    app.with(After(routes::handle_errors));
    app.with(SessionMiddleware::new(
        tide::sessions::MemoryStore::new(),
        session_secret,
    ));

    app.at("/").get(routes::index);
    app.at("/polls")
        .with(auth::LoginRequired)
        .get(routes::polls::index);
    app.at("/polls/:question_id").get(routes::polls::detail);
    app.at("/polls/:question_id/vote").post(routes::polls::vote);
    app.at("/polls/:question_id/results")
        .get(routes::polls::results);
    app.at("/accounts/login")
        .get(routes::accounts::login_form)
        .post(routes::accounts::login);
    app.at("/accounts/logout")
        .get(routes::accounts::logout)
        .post(routes::accounts::logout);
    app
}

/**
 * Pick the store: PostgreSQL when a DATABASE_URL is configured, memory otherwise
 */
async fn create_store(settings: &Settings) -> Result<Arc<dyn Store>, Error> {
    match &settings.database_url {
        Some(url) => {
            let store = PgStore::connect(url, settings.max_connections).await?;
            store.migrate().await?;
            info!("Connected to PostgreSQL");
            Ok(Arc::new(store))
        }
        None => {
            warn!("DATABASE_URL is not set, polls will only be kept in memory");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn run(settings: Settings) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let store = create_store(&settings).await?;

    if let Some(path) = &settings.fixture {
        fixtures::load(&*store, path).await?;
    }
    if let Some((username, password)) = &settings.admin {
        auth::ensure_account(&*store, username, password).await?;
    }

    let templates = templates::registry(settings.templates_dir.as_deref())?;
    let state = AppState {
        store,
        templates: Arc::new(templates),
    };

    info!("Listening on {}", settings.listen_addr);
    app(state, &settings.session_secret)
        .listen(settings.listen_addr.clone())
        .await?;
    Ok(())
}

#[async_std::main]
async fn main() -> Result<(), std::io::Error> {
    dotenv().ok();
    pretty_env_logger::init();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            error!("{}", err);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, err));
        }
    };

    if let Err(err) = run(settings).await {
        error!("Could not start polls: {}", err);
        return Err(std::io::Error::new(std::io::ErrorKind::Other, err));
    }
    Ok(())
}
