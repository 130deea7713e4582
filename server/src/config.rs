use serde::{Deserialize, Serialize};

/// A pre-shared token for local development and tests; maps straight to an
/// identity without calling the verifier.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StaticToken {
    pub token: String,
    pub user_id: i64,
    pub email: String,
    pub role: liga_db::users::Role,
}

#[derive(Clone, Debug, Deserialize, Serialize, Default)]
pub struct AccessControl {
    #[serde(default)]
    pub insecure_static_tokens: Vec<StaticToken>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ServerConfig {
    pub port: u16,
    pub auth_api_url: String,
    // Offset of the league's wall clock; acta timestamps are rendered in it.
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i8,

    #[serde(default)]
    pub access_control: AccessControl,
}

fn default_utc_offset_hours() -> i8 {
    -5
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server_config: ServerConfig,
    pub stats_config: crate::stats::Config,
    pub db_path: String,
}

pub enum Insecure {
    Deny,
    Allow,
}

pub fn validate(cfg: &Config, insecure: Insecure) -> Result<(), String> {
    match insecure {
        Insecure::Allow => {}
        Insecure::Deny => {
            if !cfg
                .server_config
                .access_control
                .insecure_static_tokens
                .is_empty()
            {
                return Err("insecure_static_tokens are not allowed in secure mode".to_owned());
            }
        }
    }
    if !(-14..=14).contains(&cfg.server_config.utc_offset_hours) {
        return Err(format!(
            "utc_offset_hours out of range: {}",
            cfg.server_config.utc_offset_hours
        ));
    }
    Ok(())
}
