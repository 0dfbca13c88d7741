//! Configuration loading and route table selection.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::environment::Environment;
use crate::config::schema::EdgeConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::routing::RouteTable;

/// Fatal startup error. Any of these keeps the server from binding.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("unknown deployment environment `{name}` (configured: {})", .known.join(", "))]
    UnknownEnvironment { name: String, known: Vec<String> },

    #[error("environment `{0}` has no routes")]
    EmptyRouteTable(Environment),

    #[error("invalid upstream target `{target}` for `{prefix}`")]
    InvalidUpstream { prefix: String, target: String },

    #[error("static asset root {} is not a directory", .0.display())]
    MissingAssetRoot(PathBuf),

    #[error("entry document {} does not exist", .0.display())]
    MissingEntryDocument(PathBuf),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<EdgeConfig, ConfigurationError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<EdgeConfig, ConfigurationError> {
    let config: EdgeConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigurationError::Validation)?;
    Ok(config)
}

/// Select the route table for `environment`.
///
/// Fails when the environment is not configured at all, or is configured
/// with no routes.
pub fn load_route_table(
    config: &EdgeConfig,
    environment: &Environment,
) -> Result<RouteTable, ConfigurationError> {
    let entries = config
        .environments
        .iter()
        .find(|(name, _)| Environment::new(name.as_str()) == *environment)
        .map(|(_, env_config)| env_config.routes.as_slice())
        .ok_or_else(|| ConfigurationError::UnknownEnvironment {
            name: environment.to_string(),
            known: config.environments.keys().cloned().collect(),
        })?;

    if entries.is_empty() {
        return Err(ConfigurationError::EmptyRouteTable(environment.clone()));
    }

    RouteTable::new(environment.clone(), entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [listener]
        port = 9100

        [environments.staging]
        routes = [
            { path_prefix = "/api/", target = "http://10.0.0.5:8000", rewrite = { pattern = "^/api", replacement = "" } },
            { path_prefix = "/socket/", target = "http://10.0.0.5:8001", websocket = true },
        ]

        [environments.qa]
        routes = []
    "#;

    #[test]
    fn parses_environment_tables() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.listener.port, 9100);
        assert_eq!(config.static_files.entry_document, "index.html");

        let table = load_route_table(&config, &Environment::new("pre")).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.environment().as_str(), "pre");
    }

    #[test]
    fn every_builtin_environment_loads() {
        let config = EdgeConfig::default();
        for name in ["dev", "pre", "prod", "development", "production"] {
            assert!(load_route_table(&config, &Environment::new(name)).is_ok(), "{name}");
        }
    }

    #[test]
    fn unknown_environment_is_fatal() {
        let err = load_route_table(&EdgeConfig::default(), &Environment::new("moon")).unwrap_err();
        match err {
            ConfigurationError::UnknownEnvironment { name, known } => {
                assert_eq!(name, "moon");
                assert_eq!(known, vec!["dev", "pre", "prod"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_environment_is_fatal() {
        let config = parse_config(SAMPLE).unwrap();
        let err = load_route_table(&config, &Environment::new("qa")).unwrap_err();
        assert!(matches!(err, ConfigurationError::EmptyRouteTable(_)));
    }

    #[test]
    fn invalid_file_reports_validation_errors() {
        let err = parse_config(
            r#"
            [environments.dev]
            routes = [
                { path_prefix = "/api", target = "http://a:1" },
                { path_prefix = "/api/v1", target = "ftp://b" },
            ]
            "#,
        )
        .unwrap_err();
        match err {
            ConfigurationError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn aliased_environment_tables_are_rejected() {
        let err = parse_config(
            r#"
            [environments.dev]
            routes = [{ path_prefix = "/api/", target = "http://a:1" }]

            [environments.development]
            routes = [{ path_prefix = "/api/", target = "http://b:1" }]
            "#,
        )
        .unwrap_err();
        match err {
            ConfigurationError::Validation(errors) => {
                assert!(matches!(errors[0], ValidationError::DuplicateEnvironment { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigurationError::Io { .. }));
    }
}
