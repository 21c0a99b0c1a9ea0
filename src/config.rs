use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "https://opentdb.com/api.php";
pub const DEFAULT_QUESTION_AMOUNT: u32 = 10;
pub const DEFAULT_SESSION_TTL_DAYS: u32 = 7;

// OpenTDB refuses more than 50 questions per request
const MAX_QUESTION_AMOUNT: u32 = 50;
const MAX_SESSION_TTL_DAYS: u32 = 365;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub question_amount: u32,
    pub ledger_path: PathBuf,
    pub session_path: PathBuf,
    pub dialogue_db_path: String,
    pub session_ttl_days: u32,
}

impl Config {
    /// Reads the configuration from the process environment.
    /// Call `dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let question_amount = read_number(
            &lookup,
            "QUESTION_AMOUNT",
            DEFAULT_QUESTION_AMOUNT,
            1,
            MAX_QUESTION_AMOUNT,
        )?;
        let session_ttl_days = read_number(
            &lookup,
            "SESSION_TTL_DAYS",
            DEFAULT_SESSION_TTL_DAYS,
            1,
            MAX_SESSION_TTL_DAYS,
        )?;

        Ok(Self {
            api_url: lookup("TRIVIA_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            question_amount,
            ledger_path: lookup("LEDGER_PATH")
                .unwrap_or_else(|| "scores.json".to_string())
                .into(),
            session_path: lookup("SESSION_PATH")
                .unwrap_or_else(|| "sessions.json".to_string())
                .into(),
            dialogue_db_path: lookup("DIALOGUE_DB_PATH").unwrap_or_else(|| "db.sqlite".to_string()),
            session_ttl_days,
        })
    }
}

fn read_number<F>(
    lookup: &F,
    name: &'static str,
    default: u32,
    min: u32,
    max: u32,
) -> Result<u32, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::NotANumber { name, value: raw })?,
        None => return Ok(default),
    };
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_with(&[]).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.question_amount, 10);
        assert_eq!(config.session_ttl_days, 7);
        assert_eq!(config.ledger_path, PathBuf::from("scores.json"));
        assert_eq!(config.session_path, PathBuf::from("sessions.json"));
    }

    #[test]
    fn overrides_are_read() {
        let config = config_with(&[
            ("QUESTION_AMOUNT", "5"),
            ("SESSION_TTL_DAYS", "1"),
            ("LEDGER_PATH", "/tmp/ledger.json"),
        ])
        .unwrap();
        assert_eq!(config.question_amount, 5);
        assert_eq!(config.session_ttl_days, 1);
        assert_eq!(config.ledger_path, PathBuf::from("/tmp/ledger.json"));
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(matches!(
            config_with(&[("QUESTION_AMOUNT", "ten")]),
            Err(ConfigError::NotANumber { .. })
        ));
        assert!(matches!(
            config_with(&[("QUESTION_AMOUNT", "0")]),
            Err(ConfigError::OutOfRange { .. })
        ));
        assert!(matches!(
            config_with(&[("QUESTION_AMOUNT", "51")]),
            Err(ConfigError::OutOfRange { .. })
        ));
    }
}
