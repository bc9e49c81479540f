//! Helpers for driving the full tide application from tests

use chrono::Utc;
use tide::http::{mime, Method, Request, Response, Url};

use std::sync::Arc;

use crate::auth::hash_password;
use crate::models::{Choice, Question};
use crate::store::{MemoryStore, Store};
use crate::AppState;

pub const SECRET: &[u8] = b"a session secret only ever used by the tests";
pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "wonderland";

pub async fn server() -> (tide::Server<AppState>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState {
        store: store.clone(),
        templates: Arc::new(crate::templates::registry(None).unwrap()),
    };
    (crate::app(state, SECRET), store)
}

pub async fn beatles(store: &MemoryStore) -> (Question, Choice, Choice) {
    let question = store
        .add_question("Favorite Beatle?", Utc::now())
        .await
        .unwrap();
    let john = store.add_choice(question.id, "John").await.unwrap();
    let paul = store.add_choice(question.id, "Paul").await.unwrap();
    (question, john, paul)
}

pub async fn add_user(store: &MemoryStore) {
    let hash = hash_password(PASSWORD).unwrap();
    store.add_account(USERNAME, &hash).await.unwrap();
}

fn request(method: Method, path: &str, cookie: Option<&str>) -> Request {
    let url = Url::parse("http://localhost/").unwrap().join(path).unwrap();
    let mut req = Request::new(method, url);
    if let Some(cookie) = cookie {
        req.insert_header("Cookie", cookie);
    }
    req
}

pub async fn get(app: &tide::Server<AppState>, path: &str, cookie: Option<&str>) -> Response {
    app.respond(request(Method::Get, path, cookie)).await.unwrap()
}

pub async fn post_form(
    app: &tide::Server<AppState>,
    path: &str,
    body: &str,
    cookie: Option<&str>,
) -> Response {
    let mut req = request(Method::Post, path, cookie);
    req.set_body(body);
    req.set_content_type(mime::FORM);
    app.respond(req).await.unwrap()
}

pub async fn post_form_bytes(app: &tide::Server<AppState>, path: &str, body: &[u8]) -> Response {
    let mut req = request(Method::Post, path, None);
    req.set_body(body.to_vec());
    req.set_content_type(mime::FORM);
    app.respond(req).await.unwrap()
}

pub fn location(res: &Response) -> Option<String> {
    res.header("Location").map(|h| h.last().as_str().to_string())
}

/**
 * The `name=value` pair of the session cookie set by `res`, ready to send back
 */
pub fn session_cookie(res: &Response) -> Option<String> {
    res.header("Set-Cookie")?
        .iter()
        .map(|h| h.as_str())
        .find(|h| h.starts_with("tide.sid="))
        .and_then(|h| h.split(';').next())
        .map(str::to_string)
}

/**
 * Log in as the test user, returning the cookie to send with later requests
 */
pub async fn login(app: &tide::Server<AppState>, store: &MemoryStore) -> String {
    add_user(store).await;
    let body = format!("username={}&password={}", USERNAME, PASSWORD);
    let res = post_form(app, "/accounts/login", &body, None).await;
    assert_eq!(res.status(), tide::StatusCode::Found);
    session_cookie(&res).expect("login should set the session cookie")
}
