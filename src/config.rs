use std::path::Path;

use anyhow::{Context, Result, bail};

/// Paths probed for the connection file dropped next to the service in the
/// multi-container setup.
const DB_CONNECTION_TXT_CANDIDATES: &[&str] = &[
    "db_connection.txt",
    "database/db_connection.txt",
    "../database/db_connection.txt",
];

pub const DEFAULT_WEBHOOK_SECRET: &str = "dev_webhook_secret";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    /// Allowed CORS origins. Empty means allow any origin.
    pub cors_allow_origins: Vec<String>,
    pub webhook_secret: String,
    /// Public base URL of this deployment, used when the service calls back
    /// into itself.
    pub site_url: Option<String>,
}

pub fn load() -> Result<AppConfig> {
    let port = match std::env::var("PORT") {
        Ok(raw) => raw
            .parse::<u16>()
            .with_context(|| format!("PORT is not a valid port number: {raw}"))?,
        Err(_) => 8000,
    };

    Ok(AppConfig {
        database_url: resolve_database_url()?,
        port,
        cors_allow_origins: parse_cors_origins(
            &std::env::var("CORS_ALLOW_ORIGINS").unwrap_or_default(),
        ),
        webhook_secret: std::env::var("PAYMENT_WEBHOOK_SECRET")
            .unwrap_or_else(|_| DEFAULT_WEBHOOK_SECRET.to_string()),
        site_url: std::env::var("SITE_URL")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty()),
    })
}

/// Resolve the database URL from `DATABASE_URL`, falling back to the first
/// readable `db_connection.txt` candidate. Missing both is a startup failure.
fn resolve_database_url() -> Result<String> {
    if let Ok(url) = std::env::var("DATABASE_URL")
        && !url.is_empty()
    {
        return Ok(url);
    }

    for candidate in DB_CONNECTION_TXT_CANDIDATES {
        let path = Path::new(candidate);
        if !path.is_file() {
            continue;
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {candidate}"))?;
        if let Some(url) = parse_db_connection_line(&text) {
            return Ok(url);
        }
    }

    bail!(
        "DATABASE_URL is not set and db_connection.txt could not be read or parsed. \
         Set DATABASE_URL or provide db_connection.txt next to the service."
    )
}

/// Accepts either `psql <url>` or a bare `postgres[ql]://` URL line.
fn parse_db_connection_line(text: &str) -> Option<String> {
    let raw = text.trim();
    if raw.is_empty() {
        return None;
    }

    let parts: Vec<&str> = raw.split_whitespace().collect();
    let candidate = if parts.len() == 1 {
        parts[0]
    } else if parts[0].eq_ignore_ascii_case("psql") {
        parts[1]
    } else {
        parts
            .iter()
            .copied()
            .find(|p| p.starts_with("postgresql://"))?
    };

    if candidate.starts_with("postgresql://") || candidate.starts_with("postgres://") {
        Some(candidate.to_string())
    } else {
        None
    }
}

/// Comma-separated origin list. Unset, blank, or `*` entries mean allow-all,
/// represented as an empty list.
fn parse_cors_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();

    if origins.iter().any(|o| o == "*") {
        return Vec::new();
    }
    origins
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_psql_prefixed_connection_line() {
        let url = parse_db_connection_line("psql postgresql://app:secret@db:5432/gourmet\n");
        assert_eq!(
            url.as_deref(),
            Some("postgresql://app:secret@db:5432/gourmet")
        );
    }

    #[test]
    fn parses_bare_url_line() {
        let url = parse_db_connection_line("postgres://app@localhost/gourmet");
        assert_eq!(url.as_deref(), Some("postgres://app@localhost/gourmet"));
    }

    #[test]
    fn picks_postgres_url_out_of_noise() {
        let url = parse_db_connection_line("connect with postgresql://db/gourmet please");
        assert_eq!(url.as_deref(), Some("postgresql://db/gourmet"));
    }

    #[test]
    fn rejects_lines_without_a_url() {
        assert_eq!(parse_db_connection_line(""), None);
        assert_eq!(parse_db_connection_line("mysql://nope"), None);
        assert_eq!(parse_db_connection_line("psql"), None);
    }

    #[test]
    fn cors_list_is_split_and_trimmed() {
        let origins = parse_cors_origins("http://localhost:3000, https://app.example.com ,");
        assert_eq!(
            origins,
            vec!["http://localhost:3000", "https://app.example.com"]
        );
    }

    #[test]
    fn cors_wildcard_and_blank_mean_allow_all() {
        assert!(parse_cors_origins("").is_empty());
        assert!(parse_cors_origins("*").is_empty());
        assert!(parse_cors_origins("http://a.example, *").is_empty());
    }
}
