use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use anyhow::{Result, anyhow};
use tracing::info;

use bookeasy_mail::SmtpSettings;

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub static_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub public_url: String,
    pub support_mailbox: String,
    /// `None` when no relay is configured; mail is then only logged.
    pub smtp: Option<SmtpSettings>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let smtp = match var("BOOKEASY_SMTP_HOST") {
            Some(host) => Some(SmtpSettings {
                host,
                port: try_load("BOOKEASY_SMTP_PORT", "587")?,
                username: var("BOOKEASY_SMTP_USERNAME").unwrap_or_default(),
                password: var("BOOKEASY_SMTP_PASSWORD").unwrap_or_default(),
                from: or_default("BOOKEASY_MAIL_FROM", "bookeasy_help@mail.ru"),
            }),
            None => None,
        };

        Ok(Self {
            host: or_default("BOOKEASY_HOST", "0.0.0.0"),
            port: try_load("BOOKEASY_PORT", "8080")?,
            db_path: or_default("BOOKEASY_DB_PATH", "bookeasy.db").into(),
            static_dir: or_default("BOOKEASY_STATIC_DIR", "./static").into(),
            upload_dir: or_default("BOOKEASY_UPLOAD_DIR", "./uploads").into(),
            public_url: or_default("BOOKEASY_PUBLIC_URL", "http://localhost:8080"),
            support_mailbox: or_default("BOOKEASY_SUPPORT_MAILBOX", "support@bookeasy.local"),
            smtp,
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn or_default(key: &str, default: &str) -> String {
    var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    or_default(key, default)
        .parse()
        .map_err(|e| anyhow!("Invalid {key} value: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_vars_fall_back() {
        let port: u16 = try_load("BOOKEASY_TEST_NEVER_SET_PORT", "8080").unwrap();
        assert_eq!(port, 8080);
        assert_eq!(or_default("BOOKEASY_TEST_NEVER_SET_HOST", "0.0.0.0"), "0.0.0.0");
    }

    #[test]
    fn bad_number_is_an_error() {
        let err = try_load::<u16>("BOOKEASY_TEST_NEVER_SET_PORT", "eighty").unwrap_err();
        assert!(err.to_string().contains("BOOKEASY_TEST_NEVER_SET_PORT"));
    }
}
