use std::{collections::HashMap, fs, path::Path};

use anyhow::{anyhow, Context};
use tracing::warn;
use url::Url;

use crate::{reducer::LoginResetPolicy, session::HOME_ROUTE};

pub const SETTINGS_FILE: &str = "client.toml";

#[derive(Debug, Clone)]
pub struct Settings {
    pub identity_url: String,
    pub team_search_url: String,
    pub team_search_api_key: Option<String>,
    pub team_search_host: String,
    pub home_route: String,
    pub login_reset_policy: LoginResetPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            identity_url: "http://localhost:3001".into(),
            team_search_url: "https://api-football-v1.p.rapidapi.com/v3/teams".into(),
            team_search_api_key: None,
            team_search_host: "api-football-v1.p.rapidapi.com".into(),
            home_route: HOME_ROUTE.into(),
            login_reset_policy: LoginResetPolicy::default(),
        }
    }
}

impl Settings {
    pub fn identity_base_url(&self) -> anyhow::Result<Url> {
        parse_http_url(&self.identity_url).context("invalid identity_url")
    }

    pub fn team_search_endpoint(&self) -> anyhow::Result<Url> {
        parse_http_url(&self.team_search_url).context("invalid team_search_url")
    }

    /// Applies a flat `key = "value"` table, ignoring unknown keys.
    pub fn apply_file(&mut self, raw: &str) -> anyhow::Result<()> {
        let file_cfg: HashMap<String, String> =
            toml::from_str(raw).context("settings file is not a flat string table")?;
        for (key, value) in file_cfg {
            self.apply(&key, value);
        }
        Ok(())
    }

    /// Applies environment overrides. `lookup` is `std::env::var` outside of
    /// tests.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        const OVERRIDES: &[(&str, &str)] = &[
            ("IDENTITY_URL", "identity_url"),
            ("APP__IDENTITY_URL", "identity_url"),
            ("TEAM_SEARCH_URL", "team_search_url"),
            ("APP__TEAM_SEARCH_URL", "team_search_url"),
            ("RAPIDAPI_KEY", "team_search_api_key"),
            ("APP__TEAM_SEARCH_API_KEY", "team_search_api_key"),
            ("APP__TEAM_SEARCH_HOST", "team_search_host"),
            ("APP__HOME_ROUTE", "home_route"),
            ("APP__LOGIN_RESET_POLICY", "login_reset_policy"),
        ];
        for &(var, key) in OVERRIDES {
            if let Some(value) = lookup(var) {
                self.apply(key, value);
            }
        }
    }

    fn apply(&mut self, key: &str, value: String) {
        match key {
            "identity_url" => self.identity_url = value,
            "team_search_url" => self.team_search_url = value,
            "team_search_api_key" => {
                self.team_search_api_key = Some(value).filter(|api_key| !api_key.is_empty())
            }
            "team_search_host" => self.team_search_host = value,
            "home_route" => self.home_route = value,
            "login_reset_policy" => match value.parse() {
                Ok(policy) => self.login_reset_policy = policy,
                Err(err) => warn!("config: ignoring login_reset_policy: {err}"),
            },
            _ => {}
        }
    }
}

fn parse_http_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(anyhow!("unsupported scheme {other}; expected http or https")),
    }
}

/// Defaults, then `client.toml` in the working directory if present, then the
/// environment.
pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(Path::new(SETTINGS_FILE))
}

pub fn load_settings_from(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        settings
            .apply_file(&raw)
            .with_context(|| format!("failed to load {}", path.display()))?;
    }
    settings.apply_env(|var| std::env::var(var).ok());

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_identity_service() {
        let settings = Settings::default();
        assert_eq!(
            settings.identity_base_url().expect("url").as_str(),
            "http://localhost:3001/"
        );
        assert_eq!(settings.home_route, "/home");
        assert_eq!(settings.team_search_api_key, None);
        assert_eq!(
            settings.login_reset_policy,
            LoginResetPolicy::ClearBeforeOutcome
        );
    }

    #[test]
    fn file_values_override_defaults() {
        let mut settings = Settings::default();
        settings
            .apply_file(
                r#"
identity_url = "https://id.example"
team_search_api_key = "k-123"
login_reset_policy = "clear_on_success"
unknown = "ignored"
"#,
            )
            .expect("apply");
        assert_eq!(settings.identity_url, "https://id.example");
        assert_eq!(settings.team_search_api_key.as_deref(), Some("k-123"));
        assert_eq!(settings.login_reset_policy, LoginResetPolicy::ClearOnSuccess);
    }

    #[test]
    fn prefixed_env_vars_win_over_plain_ones() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("IDENTITY_URL", "http://plain:1"),
            ("APP__IDENTITY_URL", "http://prefixed:2"),
            ("RAPIDAPI_KEY", "from-env"),
            ("APP__LOGIN_RESET_POLICY", "bogus"),
        ]);
        let mut settings = Settings::default();
        settings.apply_env(|var| env.get(var).map(|v| v.to_string()));
        assert_eq!(settings.identity_url, "http://prefixed:2");
        assert_eq!(settings.team_search_api_key.as_deref(), Some("from-env"));
        assert_eq!(
            settings.login_reset_policy,
            LoginResetPolicy::ClearBeforeOutcome
        );
    }

    #[test]
    fn rejects_non_http_urls() {
        let settings = Settings {
            identity_url: "ftp://files.example".into(),
            ..Settings::default()
        };
        assert!(settings.identity_base_url().is_err());
    }

    #[test]
    fn nested_tables_are_reported() {
        let mut settings = Settings::default();
        assert!(settings.apply_file("[identity]\nurl = \"x\"").is_err());
    }

    #[test]
    fn loads_file_from_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("client.toml");
        fs::write(&path, "home_route = \"/feed\"\n").expect("write");
        let settings = load_settings_from(&path).expect("load");
        assert_eq!(settings.home_route, "/feed");
    }
}
