use chrono::{DateTime, Utc};
use log::*;
use serde::Deserialize;

use std::path::Path;

use crate::error::Error;
use crate::store::Store;

/**
 * One question of a fixture file, along with the text of each of its choices
 */
#[derive(Debug, Deserialize)]
pub struct QuestionFixture {
    pub question_text: String,
    /**
     * Defaults to the time the fixture is loaded
     */
    pub pub_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub choices: Vec<String>,
}

pub fn parse(json: &str) -> Result<Vec<QuestionFixture>, Error> {
    serde_json::from_str(json).map_err(|e| Error::FixtureError(e.to_string()))
}

/**
 * Insert every question in `fixtures` and its choices, returning how many questions were added
 */
pub async fn install(store: &dyn Store, fixtures: Vec<QuestionFixture>) -> Result<usize, Error> {
    let count = fixtures.len();
    for fixture in fixtures {
        let pub_date = fixture.pub_date.unwrap_or_else(Utc::now);
        let question = store.add_question(&fixture.question_text, pub_date).await?;
        for choice in fixture.choices.iter() {
            store.add_choice(question.id, choice).await?;
        }
        debug!("Installed question {}: {}", question.id, question.question_text);
    }
    Ok(count)
}

/**
 * Load the fixture file at `path`, unless the store already holds questions
 *
 * A persistent database therefore only receives the fixture on its first start.
 */
pub async fn load(store: &dyn Store, path: &Path) -> Result<usize, Error> {
    if !store.latest_questions(1).await?.is_empty() {
        info!("Questions already exist, skipping {}", path.display());
        return Ok(0);
    }
    let json = async_std::fs::read_to_string(path)
        .await
        .map_err(|e| Error::FixtureError(format!("{}: {}", path.display(), e)))?;
    let count = install(store, parse(&json)?).await?;
    info!("Loaded {} questions from {}", count, path.display());
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[async_std::test]
    async fn test_install() {
        let store = MemoryStore::new();
        let fixtures = parse(
            r#"[
                {"question_text": "Favorite Beatle?", "pub_date": "2020-10-19T12:00:00Z",
                 "choices": ["John", "Paul", "George", "Ringo"]},
                {"question_text": "Best album?"}
            ]"#,
        )
        .unwrap();

        assert_eq!(install(&store, fixtures).await.unwrap(), 2);

        let latest = store.latest_questions(5).await.unwrap();
        assert_eq!(latest.len(), 2);
        // the second question defaults to now, so it is the most recent
        assert_eq!(latest[0].question_text, "Best album?");
        let beatles = &latest[1];
        let choices = store.choices(beatles.id).await.unwrap();
        let names: Vec<&str> = choices.iter().map(|c| c.choice_text.as_str()).collect();
        assert_eq!(names, vec!["John", "Paul", "George", "Ringo"]);
        assert!(choices.iter().all(|c| c.votes == 0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse("{"), Err(Error::FixtureError(_))));
        assert!(matches!(
            parse(r#"[{"choices": []}]"#),
            Err(Error::FixtureError(_))
        ));
    }

    #[async_std::test]
    async fn test_load_skips_populated_store() {
        let store = MemoryStore::new();
        store.add_question("Already here", Utc::now()).await.unwrap();

        let path = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/beatles.json"));
        assert_eq!(load(&store, path).await.unwrap(), 0);
        assert_eq!(store.latest_questions(5).await.unwrap().len(), 1);
    }

    #[async_std::test]
    async fn test_load_bundled_fixture() {
        let store = MemoryStore::new();
        let path = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/beatles.json"));
        assert_eq!(load(&store, path).await.unwrap(), 2);
    }

    #[async_std::test]
    async fn test_missing_file() {
        let store = MemoryStore::new();
        let result = load(&store, Path::new("/nonexistent/polls.json")).await;
        assert!(matches!(result, Err(Error::FixtureError(_))));
    }
}
