use handlebars::{handlebars_helper, Handlebars};
use log::*;
use serde::Serialize;
use tide::{http::mime, Response, StatusCode};

use std::path::Path;

use crate::error::Error;

pub const INDEX: &str = "polls/index";
pub const DETAIL: &str = "polls/detail";
pub const RESULTS: &str = "polls/results";
pub const LOGIN: &str = "accounts/login";

/**
 * Templates compiled into the binary, keyed by the name handlers render them with
 */
const EMBEDDED: &[(&str, &str)] = &[
    (INDEX, include_str!("../templates/polls/index.hbs")),
    (DETAIL, include_str!("../templates/polls/detail.hbs")),
    (RESULTS, include_str!("../templates/polls/results.hbs")),
    (LOGIN, include_str!("../templates/accounts/login.hbs")),
];

handlebars_helper!(pluralize: |count: i64| if count == 1 { "" } else { "s" });

/**
 * Build the registry used for every page
 *
 * When `overrides` is given, any `.hbs` file under it replaces the embedded
 * template of the same relative name, e.g. `polls/detail.hbs`.
 */
pub fn registry(overrides: Option<&Path>) -> Result<Handlebars<'static>, Error> {
    let mut hb = Handlebars::new();
    hb.register_helper("pluralize", Box::new(pluralize));

    for (name, source) in EMBEDDED {
        hb.register_template_string(name, source)
            .map_err(|e| Error::TemplateError(e.to_string()))?;
    }

    if let Some(dir) = overrides {
        info!("Loading template overrides from {}", dir.display());
        hb.register_templates_directory(".hbs", dir)
            .map_err(|e| Error::TemplateError(e.to_string()))?;
    }

    Ok(hb)
}

/**
 * Render `name` into an HTML response with the given status
 */
pub fn render<T: Serialize>(
    hb: &Handlebars<'static>,
    name: &str,
    status: StatusCode,
    data: &T,
) -> Result<Response, Error> {
    let body = hb.render(name, data).map_err(|e| {
        error!("Failed to render {}: {}", name, e);
        Error::TemplateError(e.to_string())
    })?;

    Ok(Response::builder(status)
        .body(body)
        .content_type(mime::HTML)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_embedded_templates_register() {
        let hb = registry(None).unwrap();
        for (name, _) in EMBEDDED {
            assert!(hb.get_template(name).is_some(), "missing {}", name);
        }
    }

    #[test]
    fn test_pluralize_votes() {
        let hb = registry(None).unwrap();
        let page = hb
            .render(
                RESULTS,
                &json!({
                    "question": { "id": 1, "question_text": "Favorite Beatle?" },
                    "choices": [
                        { "id": 2, "choice_text": "John", "votes": 1 },
                        { "id": 3, "choice_text": "Paul", "votes": 0 },
                        { "id": 4, "choice_text": "George", "votes": 2 },
                    ],
                }),
            )
            .unwrap();
        assert!(page.contains("John -- 1 vote</li>"));
        assert!(page.contains("Paul -- 0 votes</li>"));
        assert!(page.contains("George -- 2 votes</li>"));
    }

    #[test]
    fn test_detail_escapes_question_text() {
        let hb = registry(None).unwrap();
        let page = hb
            .render(
                DETAIL,
                &json!({
                    "question": { "id": 1, "question_text": "<script>" },
                    "choices": [],
                }),
            )
            .unwrap();
        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;"));
    }
}
