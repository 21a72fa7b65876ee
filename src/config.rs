use std::path::PathBuf;

use actix_web::cookie::Key;
use anyhow::Context;
use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "APPRAISAL_BIND", default_value = "127.0.0.1:5000")]
    pub bind: String,
    /// Secret used to sign session cookies, at least 64 bytes
    #[arg(long, env = "APPRAISAL_SESSION_KEY", hide_env_values = true)]
    pub session_key: Option<String>,
    /// Only send the session cookie over HTTPS
    #[arg(long, env = "APPRAISAL_COOKIE_SECURE")]
    pub cookie_secure: bool,
    /// Where unauthenticated callers are sent
    #[arg(long, env = "APPRAISAL_LOGIN_URL", default_value = "/login")]
    pub login_url: String,
    /// Serve without requiring a logged-in session
    #[arg(long, env = "APPRAISAL_ALLOW_ANONYMOUS")]
    pub allow_anonymous: bool,
    /// Also keep a copy of every generated report here
    #[arg(long, env = "APPRAISAL_REPORT_DIR")]
    pub report_dir: Option<PathBuf>,
    #[arg(long, env = "APPRAISAL_WORKERS")]
    pub workers: Option<usize>,
}

/// Settings shared with every request handler.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub login_url: String,
    pub require_login: bool,
    pub report_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            login_url: "/login".to_string(),
            require_login: true,
            report_dir: None,
        }
    }
}

impl From<&ServeArgs> for AppConfig {
    fn from(args: &ServeArgs) -> Self {
        AppConfig {
            login_url: args.login_url.clone(),
            require_login: !args.allow_anonymous,
            report_dir: args.report_dir.clone(),
        }
    }
}

impl ServeArgs {
    pub fn cookie_key(&self) -> anyhow::Result<Key> {
        match &self.session_key {
            Some(secret) => Key::try_from(secret.as_bytes())
                .context("session key must be at least 64 bytes long"),
            None => {
                tracing::warn!(
                    "no session key configured; sessions will not survive a restart"
                );
                Ok(Key::generate())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ServeArgs {
        ServeArgs {
            bind: "127.0.0.1:0".to_string(),
            session_key: None,
            cookie_secure: false,
            login_url: "/auth/login".to_string(),
            allow_anonymous: false,
            report_dir: None,
            workers: None,
        }
    }

    #[test]
    fn short_session_key_is_rejected() {
        let args = ServeArgs {
            session_key: Some("too-short".to_string()),
            ..args()
        };
        assert!(args.cookie_key().is_err());
    }

    #[test]
    fn long_session_key_is_accepted() {
        let args = ServeArgs {
            session_key: Some("k".repeat(64)),
            ..args()
        };
        assert!(args.cookie_key().is_ok());
    }

    #[test]
    fn app_config_follows_args() {
        let config = AppConfig::from(&ServeArgs {
            allow_anonymous: true,
            ..args()
        });
        assert_eq!(config.login_url, "/auth/login");
        assert!(!config.require_login);
    }
}
