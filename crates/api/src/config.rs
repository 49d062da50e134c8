//! Server configuration loaded from environment variables.

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// An upstream reachable as `url:port`.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub url: String,
    pub port: i64,
}

#[derive(Debug, Clone)]
pub struct KeycloakConfig {
    pub url: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub mailpit_url: String,
    pub from: String,
    pub subject: String,
    pub text: String,
}

/// Service configuration.
///
/// All fields have defaults suitable for local development; override via
/// environment variables in production.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Tracing filter fallback when `RUST_LOG` is unset.
    pub logger_level: String,
    /// Route prefix the whole API is mounted under (may be empty).
    pub url_prefix: String,
    pub server_port: u16,
    pub debug: bool,
    /// Rendering engine endpoint.
    pub jsreport: EndpointConfig,
    /// Time-series service and device inventory share this host pair.
    pub snrgy: EndpointConfig,
    pub keycloak: KeycloakConfig,
    pub mail: MailConfig,
    /// Scheduler tick, e.g. `1m`.
    pub scheduler_ticker_duration: String,
    /// Persistence DSN.
    pub database_url: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                         |
    /// |------------------------------|---------------------------------|
    /// | `LOGGER_LEVEL`               | `info`                          |
    /// | `URL_PREFIX`                 | (empty)                         |
    /// | `SERVER_PORT`                | `8080`                          |
    /// | `DEBUG`                      | `false`                         |
    /// | `JSREPORT_URL` / `_PORT`     | `http://localhost` / `5488`     |
    /// | `SNRGY_URL` / `_PORT`        | `http://localhost` / `80`       |
    /// | `KEYCLOAK_URL`               | `http://localhost`              |
    /// | `KEYCLOAK_CLIENT_ID`         | `reporting-service`             |
    /// | `KEYCLOAK_CLIENT_SECRET`     | `reporting-service`             |
    /// | `MAILPIT_URL`                | `http://mailpit.notifier:8025`  |
    /// | `EMAIL_FROM`                 | `reporting-service@localhost`   |
    /// | `EMAIL_SUBJECT`              | `Report`                        |
    /// | `EMAIL_TEXT`                 | `Report attached to this email` |
    /// | `SCHEDULER_TICKER_DURATION`  | `1m`                            |
    /// | `DATABASE_URL`               | `sqlite://tabula.db`            |
    pub fn from_env() -> Self {
        let server_port: u16 = env_or("SERVER_PORT", "8080")
            .parse()
            .expect("SERVER_PORT must be a valid u16");
        let jsreport_port: i64 = env_or("JSREPORT_PORT", "5488")
            .parse()
            .expect("JSREPORT_PORT must be a valid i64");
        let snrgy_port: i64 = env_or("SNRGY_PORT", "80")
            .parse()
            .expect("SNRGY_PORT must be a valid i64");

        Self {
            logger_level: env_or("LOGGER_LEVEL", "info"),
            url_prefix: env_or("URL_PREFIX", ""),
            server_port,
            debug: env_or("DEBUG", "false") == "true",
            jsreport: EndpointConfig {
                url: env_or("JSREPORT_URL", "http://localhost"),
                port: jsreport_port,
            },
            snrgy: EndpointConfig {
                url: env_or("SNRGY_URL", "http://localhost"),
                port: snrgy_port,
            },
            keycloak: KeycloakConfig {
                url: env_or("KEYCLOAK_URL", "http://localhost"),
                client_id: env_or("KEYCLOAK_CLIENT_ID", "reporting-service"),
                client_secret: env_or("KEYCLOAK_CLIENT_SECRET", "reporting-service"),
            },
            mail: MailConfig {
                mailpit_url: env_or("MAILPIT_URL", "http://mailpit.notifier:8025"),
                from: env_or("EMAIL_FROM", "reporting-service@localhost"),
                subject: env_or("EMAIL_SUBJECT", "Report"),
                text: env_or("EMAIL_TEXT", "Report attached to this email"),
            },
            scheduler_ticker_duration: env_or("SCHEDULER_TICKER_DURATION", "1m"),
            database_url: env_or("DATABASE_URL", "sqlite://tabula.db"),
        }
    }
}
