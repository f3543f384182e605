use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, Result};

const DEFAULT_REFRESH_MINUTES: u64 = 300;

/// Typed configuration, read from the environment (and `.env` if present).
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,

    // Channels
    pub admin_channels: Vec<i64>,
    pub operator_chat_id: Option<i64>,

    // Refresh
    pub refresh_interval: Duration,
    pub refresh_on_start: bool,
    pub boundary_probe_text: String,

    // Throttling
    pub probe_min_interval: Duration,
    pub send_min_interval: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let admin_channels = parse_csv_i64(env_str("ADMIN_CHANNEL_IDS"));
        let operator_chat_id = env_str("OPERATOR_CHAT_ID")
            .and_then(non_empty)
            .and_then(|s| s.trim().parse::<i64>().ok());

        let refresh_interval = minutes(
            env_u64("REFRESH_INTERVAL_MINUTES")
                .filter(|m| *m > 0)
                .unwrap_or(DEFAULT_REFRESH_MINUTES),
        );
        let refresh_on_start = env_bool("REFRESH_ON_START").unwrap_or(true);
        let boundary_probe_text = env_str("BOUNDARY_PROBE_TEXT")
            .and_then(non_empty)
            .unwrap_or_else(|| "cache probe".to_string());

        let probe_min_interval =
            Duration::from_millis(env_u64("PROBE_MIN_INTERVAL_MS").unwrap_or(40));
        let send_min_interval =
            Duration::from_millis(env_u64("SEND_MIN_INTERVAL_MS").unwrap_or(1050));

        Ok(Self {
            telegram_bot_token,
            admin_channels,
            operator_chat_id,
            refresh_interval,
            refresh_on_start,
            boundary_probe_text,
            probe_min_interval,
            send_min_interval,
        })
    }
}

fn minutes(m: u64) -> Duration {
    Duration::from_secs(m.saturating_mul(60))
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn env_bool(key: &str) -> Option<bool> {
    env_str(key).map(|s| parse_bool(&s))
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_channel_ids_skip_garbage() {
        let ids = parse_csv_i64(Some(" -1001744445555, ,abc,-100200".to_string()));
        assert_eq!(ids, vec![-1001744445555, -100200]);
        assert!(parse_csv_i64(None).is_empty());
    }

    #[test]
    fn dotenv_strips_quotes_and_comments() {
        let parsed = parse_dotenv(
            "# comment\nTELEGRAM_BOT_TOKEN=\"abc:def\"\n\nREFRESH_ON_START='no'\nbroken line\n=x\n",
        );
        assert_eq!(
            parsed,
            vec![
                ("TELEGRAM_BOT_TOKEN".to_string(), "abc:def".to_string()),
                ("REFRESH_ON_START".to_string(), "no".to_string()),
            ]
        );
    }

    #[test]
    fn bool_parsing_accepts_common_spellings() {
        assert!(parse_bool("Yes"));
        assert!(parse_bool(" on "));
        assert!(!parse_bool("off"));
        assert!(!parse_bool(""));
    }

    #[test]
    fn minutes_to_duration() {
        assert_eq!(minutes(300), Duration::from_secs(18_000));
    }
}
