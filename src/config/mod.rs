//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{collections::HashSet, net::SocketAddr, num::NonZeroU32, str::FromStr, time::Duration};

use chrono_tz::Tz;
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::application::blog::{DEFAULT_PAGINATION, DEFAULT_TRUNCWORDS_COUNT};
use crate::application::urls::BlogNamespace;
use crate::domain::types::LanguageCode;

pub use cli::{CliArgs, Command, DatabaseOverride, MigrateArgs, ServeArgs, ServeOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "cms-blog";
const ENV_PREFIX: &str = "CMS_BLOG";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_SITE_TITLE: &str = "Blog";
const DEFAULT_LANGUAGE: &str = "en";
const DEFAULT_NAMESPACE_NAME: &str = "blog";
const DEFAULT_NAMESPACE_PREFIX: &str = "/blog";
const SHA256_LEN: usize = 32;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub blog: BlogSettings,
    pub auth: AuthSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct BlogSettings {
    pub site_title: String,
    pub pagination: NonZeroU32,
    pub truncwords_count: usize,
    pub default_language: LanguageCode,
    pub languages: Vec<LanguageCode>,
    pub timezone: Tz,
    pub namespaces: Vec<BlogNamespace>,
}

#[derive(Debug, Clone, Default)]
pub struct AuthSettings {
    /// SHA-256 digests of bearer tokens that grant staff visibility.
    pub staff_token_digests: Vec<Vec<u8>>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("blog.languages")
            .with_list_parse_key("auth.staff_token_sha256")
            .try_parsing(true),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Migrate(args)) => raw.apply_database_override(&args.database),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    blog: RawBlogSettings,
    auth: RawAuthSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(pagination) = overrides.blog_pagination {
            self.blog.pagination = Some(pagination);
        }
        if let Some(language) = overrides.blog_default_language.as_ref() {
            self.blog.default_language = Some(language.clone());
        }
        if let Some(timezone) = overrides.blog_timezone.as_ref() {
            self.blog.timezone = Some(timezone.clone());
        }

        self.apply_database_override(&overrides.database);
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            blog,
            auth,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            blog: build_blog_settings(blog)?,
            auth: build_auth_settings(auth)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = database.url.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    Ok(DatabaseSettings {
        url,
        max_connections,
    })
}

fn build_blog_settings(blog: RawBlogSettings) -> Result<BlogSettings, LoadError> {
    let site_title = blog
        .site_title
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| DEFAULT_SITE_TITLE.to_string());

    let pagination = non_zero_u32(
        blog.pagination.unwrap_or(DEFAULT_PAGINATION).into(),
        "blog.pagination",
    )?;

    let truncwords_count = match blog.truncwords_count {
        Some(0) => {
            return Err(LoadError::invalid(
                "blog.truncwords_count",
                "must be greater than zero",
            ));
        }
        Some(count) => usize::try_from(count).map_err(|_| {
            LoadError::invalid(
                "blog.truncwords_count",
                "value exceeds supported range for usize",
            )
        })?,
        None => DEFAULT_TRUNCWORDS_COUNT,
    };

    let default_language = parse_language(
        blog.default_language.as_deref().unwrap_or(DEFAULT_LANGUAGE),
        "blog.default_language",
    )?;

    let languages = blog
        .languages
        .unwrap_or_default()
        .iter()
        .map(|raw| parse_language(raw, "blog.languages"))
        .collect::<Result<Vec<_>, _>>()?;

    let timezone = match blog.timezone {
        Some(name) => Tz::from_str(name.trim()).map_err(|err| {
            LoadError::invalid("blog.timezone", format!("unknown timezone `{name}`: {err}"))
        })?,
        None => Tz::UTC,
    };

    let namespaces = build_namespaces(blog.namespaces)?;

    Ok(BlogSettings {
        site_title,
        pagination,
        truncwords_count,
        default_language,
        languages,
        timezone,
        namespaces,
    })
}

fn build_namespaces(raw: Option<Vec<RawNamespace>>) -> Result<Vec<BlogNamespace>, LoadError> {
    let Some(raw) = raw.filter(|entries| !entries.is_empty()) else {
        return Ok(vec![BlogNamespace::new(
            DEFAULT_NAMESPACE_NAME,
            DEFAULT_NAMESPACE_PREFIX,
        )]);
    };

    let mut names = HashSet::new();
    let mut prefixes = HashSet::new();
    let mut namespaces = Vec::with_capacity(raw.len());

    for entry in raw {
        let name = entry.name.unwrap_or_default().trim().to_string();
        if name.is_empty() {
            return Err(LoadError::invalid(
                "blog.namespaces",
                "every namespace needs a name",
            ));
        }

        let prefix = entry.prefix.unwrap_or_default();
        let prefix = prefix.trim();
        if !prefix.is_empty() && !prefix.starts_with('/') {
            return Err(LoadError::invalid(
                "blog.namespaces",
                format!("prefix `{prefix}` of namespace `{name}` must start with `/`"),
            ));
        }

        let namespace = BlogNamespace::new(name, prefix);
        if !names.insert(namespace.name.clone()) {
            return Err(LoadError::invalid(
                "blog.namespaces",
                format!("namespace `{}` is declared twice", namespace.name),
            ));
        }
        if !prefixes.insert(namespace.prefix.clone()) {
            return Err(LoadError::invalid(
                "blog.namespaces",
                format!("prefix `{}` is mounted twice", namespace.prefix),
            ));
        }
        namespaces.push(namespace);
    }

    Ok(namespaces)
}

fn build_auth_settings(auth: RawAuthSettings) -> Result<AuthSettings, LoadError> {
    let staff_token_digests = auth
        .staff_token_sha256
        .unwrap_or_default()
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(|value| {
            let digest = hex::decode(value).map_err(|err| {
                LoadError::invalid("auth.staff_token_sha256", format!("not hex: {err}"))
            })?;
            if digest.len() != SHA256_LEN {
                return Err(LoadError::invalid(
                    "auth.staff_token_sha256",
                    format!("expected {SHA256_LEN} bytes, got {}", digest.len()),
                ));
            }
            Ok(digest)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AuthSettings {
        staff_token_digests,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawBlogSettings {
    site_title: Option<String>,
    pagination: Option<u32>,
    truncwords_count: Option<u64>,
    default_language: Option<String>,
    languages: Option<Vec<String>>,
    timezone: Option<String>,
    namespaces: Option<Vec<RawNamespace>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawNamespace {
    name: Option<String>,
    prefix: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAuthSettings {
    staff_token_sha256: Option<Vec<String>>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn parse_language(raw: &str, key: &'static str) -> Result<LanguageCode, LoadError> {
    LanguageCode::parse(raw).map_err(|err| LoadError::invalid(key, err.to_string()))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[cfg(test)]
mod tests;
