use log::*;
use tide::{Redirect, Request, Response};

use crate::auth::DEFAULT_NEXT;
use crate::error::Error;
use crate::AppState;

pub mod accounts;
pub mod polls;

/**
 *  GET /
 */
pub async fn index(_req: Request<AppState>) -> tide::Result {
    Ok(Redirect::new(DEFAULT_NEXT).into())
}

/**
 * Turn handler failures carrying a crate `Error` into a response with the
 * right status
 *
 * Server errors are logged and answered with a generic body so nothing about
 * the database or templates leaks to the client.
 */
pub async fn handle_errors(mut res: Response) -> tide::Result {
    let failure = res
        .downcast_error::<Error>()
        .map(|err| (err.status(), err.to_string()));

    if let Some((status, message)) = failure {
        if status.is_server_error() {
            error!("Request failed: {}", message);
            res.set_body(status.canonical_reason());
        } else {
            debug!("Request failed: {}", message);
            res.set_body(message);
        }
        res.set_status(status);
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use crate::testing::*;

    #[async_std::test]
    async fn test_root_redirects_to_polls() {
        let (app, _store) = server().await;
        let res = get(&app, "/", None).await;
        assert_eq!(res.status(), tide::StatusCode::Found);
        assert_eq!(location(&res).unwrap(), "/polls");
    }
}
