//! Bot configuration from the environment.

use std::time::Duration;

use crate::error::{Result, TelegramError};

/// Environment variable holding the bot token.
pub const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Environment variable holding the operator chat id.
pub const CHAT_ID_ENV: &str = "TELEGRAM_CHAT_ID";

/// Environment variable holding the per-lesson response timeout in seconds.
pub const TIMEOUT_ENV: &str = "TUTORFLOW_RESPONSE_TIMEOUT_SECS";

/// Settings needed to talk to the operator.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    pub chat_id: i64,
    pub response_timeout: Option<Duration>,
}

impl BotConfig {
    /// Read the configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(TOKEN_ENV)
            .filter(|t| !t.trim().is_empty())
            .ok_or(TelegramError::NoToken)?;

        let chat_raw = lookup(CHAT_ID_ENV)
            .filter(|c| !c.trim().is_empty())
            .ok_or(TelegramError::NoChatId)?;
        let chat_id = chat_raw
            .trim()
            .parse::<i64>()
            .map_err(|_| TelegramError::InvalidChatId(chat_raw.clone()))?;

        let response_timeout = match lookup(TIMEOUT_ENV) {
            Some(raw) if !raw.trim().is_empty() => Some(parse_timeout_secs(&raw)?),
            _ => None,
        };

        Ok(Self {
            token,
            chat_id,
            response_timeout,
        })
    }
}

/// Parse a timeout given in whole seconds. Zero is rejected.
pub fn parse_timeout_secs(raw: &str) -> Result<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(TelegramError::InvalidTimeout(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_full_config() {
        let config = BotConfig::from_lookup(lookup(&[
            (TOKEN_ENV, "123:abc"),
            (CHAT_ID_ENV, "-100200"),
            (TIMEOUT_ENV, "900"),
        ]))
        .unwrap();
        assert_eq!(config.token, "123:abc");
        assert_eq!(config.chat_id, -100200);
        assert_eq!(config.response_timeout, Some(Duration::from_secs(900)));
    }

    #[test]
    fn test_missing_token() {
        let err = BotConfig::from_lookup(lookup(&[(CHAT_ID_ENV, "1")])).unwrap_err();
        assert!(matches!(err, TelegramError::NoToken));
    }

    #[test]
    fn test_missing_and_invalid_chat() {
        let err = BotConfig::from_lookup(lookup(&[(TOKEN_ENV, "t")])).unwrap_err();
        assert!(matches!(err, TelegramError::NoChatId));

        let err =
            BotConfig::from_lookup(lookup(&[(TOKEN_ENV, "t"), (CHAT_ID_ENV, "me")])).unwrap_err();
        assert!(matches!(err, TelegramError::InvalidChatId(ref c) if c == "me"));
    }

    #[test]
    fn test_timeout_is_optional() {
        let config =
            BotConfig::from_lookup(lookup(&[(TOKEN_ENV, "t"), (CHAT_ID_ENV, "7")])).unwrap();
        assert_eq!(config.response_timeout, None);
    }

    #[test]
    fn test_parse_timeout_secs() {
        assert_eq!(parse_timeout_secs("30").unwrap(), Duration::from_secs(30));
        assert!(parse_timeout_secs("0").is_err());
        assert!(parse_timeout_secs("soon").is_err());
    }
}
