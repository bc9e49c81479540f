use log::*;
use rand::Rng;

use std::env;
use std::path::PathBuf;

use crate::error::Error;

/**
 * Tide refuses session secrets shorter than this
 */
pub const MIN_SECRET_LEN: usize = 32;

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/**
 * Runtime settings, read from the environment (and `.env` through dotenv)
 */
#[derive(Clone, Debug)]
pub struct Settings {
    /**
     * Without a database the polls live in memory for the life of the process
     */
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub listen_addr: String,
    pub session_secret: Vec<u8>,
    pub templates_dir: Option<PathBuf>,
    pub fixture: Option<PathBuf>,
    pub admin: Option<(String, String)>,
}

impl Settings {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_connections = match var("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                Error::ConfigError(format!(
                    "DATABASE_MAX_CONNECTIONS must be a positive number, not {:?}",
                    raw
                ))
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        if max_connections == 0 {
            return Err(Error::ConfigError(
                "DATABASE_MAX_CONNECTIONS must be at least 1".into(),
            ));
        }

        let session_secret = match var("SESSION_SECRET") {
            Some(secret) if secret.len() < MIN_SECRET_LEN => {
                return Err(Error::ConfigError(format!(
                    "SESSION_SECRET must be at least {} bytes",
                    MIN_SECRET_LEN
                )));
            }
            Some(secret) => secret.into_bytes(),
            None => {
                warn!("SESSION_SECRET is not set, sessions will not survive a restart");
                rand::thread_rng().gen::<[u8; MIN_SECRET_LEN]>().to_vec()
            }
        };

        let admin = match (var("POLLS_ADMIN_USER"), var("POLLS_ADMIN_PASSWORD")) {
            (Some(user), Some(password)) => Some((user, password)),
            (None, None) => None,
            _ => {
                return Err(Error::ConfigError(
                    "POLLS_ADMIN_USER and POLLS_ADMIN_PASSWORD must be set together".into(),
                ));
            }
        };

        Ok(Settings {
            database_url: var("DATABASE_URL"),
            max_connections,
            listen_addr: var("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            session_secret,
            templates_dir: var("TEMPLATES_DIR").map(PathBuf::from),
            fixture: var("POLLS_FIXTURE").map(PathBuf::from),
            admin,
        })
    }
}
