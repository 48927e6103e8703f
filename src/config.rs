use anyhow::Context;
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
    pub bind_addr: String,
    pub template_dir: String,
    pub static_dir: String,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub secure_cookie: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            rust_log: "info".into(),
            bind_addr: "0.0.0.0:3000".into(),
            template_dir: "templates".into(),
            static_dir: "static".into(),
            admin_username: None,
            admin_password: None,
            secure_cookie: false,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // A missing .env is fine in deployed environments.
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let secure_cookie = match env::var("SESSION_SECURE_COOKIE") {
            Ok(value) => parse_flag(&value)
                .with_context(|| format!("SESSION_SECURE_COOKIE is not a boolean: {value}"))?,
            Err(_) => defaults.secure_cookie,
        };

        Ok(Self {
            database_url,
            rust_log: env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            template_dir: env::var("TEMPLATE_DIR").unwrap_or(defaults.template_dir),
            static_dir: env::var("STATIC_DIR").unwrap_or(defaults.static_dir),
            admin_username: non_empty_var("ADMIN_USERNAME"),
            admin_password: non_empty_var("ADMIN_PASSWORD"),
            secure_cookie,
        })
    }

    /// Bootstrap admin credentials, when both halves are configured.
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        self.admin_username
            .as_deref()
            .zip(self.admin_password.as_deref())
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_common_spellings() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" on "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag(""), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn admin_credentials_need_both_halves() {
        let mut config = Config {
            admin_username: Some("admin".into()),
            ..Config::default()
        };
        assert_eq!(config.admin_credentials(), None);

        config.admin_password = Some("hunter2".into());
        assert_eq!(config.admin_credentials(), Some(("admin", "hunter2")));
    }
}
