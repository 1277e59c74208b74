use anyhow::{Context, Result};
use clap::Parser;
use std::{env, fmt, str::FromStr};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// Shared secret used to validate access tokens.
    pub jwt_secret: String,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_url", &self.database_url)
            .field("max_connections", &self.max_connections)
            .field("jwt_secret", &"***")
            .finish()
    }
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Multi-tenant gateway for S3-compatible buckets")]
pub struct Args {
    /// Host to bind to (overrides WEB_S3_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides WEB_S3_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides WEB_S3_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Connection pool size (overrides WEB_S3_MAX_CONNECTIONS)
    #[arg(long)]
    pub max_connections: Option<u32>,

    /// Secret for validating access tokens (overrides WEB_S3_JWT_SECRET)
    #[arg(long)]
    pub jwt_secret: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        Ok((Self::merge(args, |name| env::var(name))?, migrate))
    }

    /// Merge CLI args over values looked up with `var`; CLI wins.
    pub fn merge<F>(args: Args, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let env_host = var("WEB_S3_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = parse_var(&var, "WEB_S3_PORT", 8080)?;
        let env_db = var("WEB_S3_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/web_s3.db?mode=rwc".into());
        let env_max_connections = parse_var(&var, "WEB_S3_MAX_CONNECTIONS", 5)?;
        let env_secret = var("WEB_S3_JWT_SECRET").ok();

        let jwt_secret = args
            .jwt_secret
            .or(env_secret)
            .filter(|secret| !secret.is_empty())
            .context("a token secret is required (--jwt-secret or WEB_S3_JWT_SECRET)")?;

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.unwrap_or(env_db),
            max_connections: args.max_connections.unwrap_or(env_max_connections),
            jwt_secret,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<F, T>(var: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Result<String, env::VarError>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(name) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, env::VarError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned().ok_or(env::VarError::NotPresent)
    }

    #[test]
    fn env_supplies_defaults_and_cli_wins() {
        let args = Args {
            port: Some(9000),
            ..Default::default()
        };
        let cfg = AppConfig::merge(
            args,
            lookup(&[("WEB_S3_PORT", "7000"), ("WEB_S3_JWT_SECRET", "k")]),
        )
        .unwrap();

        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.max_connections, 5);
        assert_eq!(cfg.addr(), "0.0.0.0:9000");
        assert!(!format!("{:?}", cfg).contains("\"k\""));
    }

    #[test]
    fn bad_port_and_missing_secret_fail() {
        assert!(
            AppConfig::merge(
                Args::default(),
                lookup(&[("WEB_S3_PORT", "nope"), ("WEB_S3_JWT_SECRET", "k")])
            )
            .is_err()
        );
        assert!(AppConfig::merge(Args::default(), lookup(&[])).is_err());
    }
}
