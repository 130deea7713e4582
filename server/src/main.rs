use anyhow::{bail, Context};

use liga_server::config::{self, Config};
use liga_server::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_module("sqlx", log::LevelFilter::Error)
        .init();
    let mut args = std::env::args().skip(1);
    let Some(config_path) = args.next() else {
        bail!("config file must be specified as the first arg");
    };
    let mut insecure = config::Insecure::Deny;
    for flag in args {
        match flag.as_str() {
            "--insecure" => insecure = config::Insecure::Allow,
            _ => bail!("Unrecognized flag: {flag}"),
        }
    }
    let raw = tokio::fs::read_to_string(&config_path)
        .await
        .context(format!("Failed to read config file {config_path}"))?;
    let config: Config = toml::from_str(&raw).context("Failed to parse config")?;
    config::validate(&config, insecure)
        .map_err(|e| anyhow::anyhow!("Config validation failed: {e}"))?;
    server::run(config).await
}
