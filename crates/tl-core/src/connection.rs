//! Connection descriptors for the migration backend.
//!
//! A descriptor renders as `<scheme>://<endpoint><database>?<options>` where
//! the options are always the same four keys, sorted by key. Identical inputs
//! must render to identical bytes so that repeated reconciliation passes never
//! report a spurious difference.
//!
//! Values are not URL-encoded; callers must not pass values containing `?`,
//! `&` or `=`.

use crate::error::{CoreError, CoreResult};
use std::collections::BTreeMap;
use std::fmt;

pub const QUERY_MODE_KEY: &str = "go_query_mode";
pub const FAKE_TX_KEY: &str = "go_fake_tx";
pub const QUERY_BIND_KEY: &str = "go_query_bind";
pub const TOKEN_KEY: &str = "token";

const SCRIPTING: &str = "scripting";
const QUERY_BIND: &str = "declare,numeric";
const REDACTED: &str = "***";

/// Transport scheme of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// TLS-secured gRPC (default)
    Grpcs,
    /// Plaintext gRPC
    Grpc,
}

impl Scheme {
    /// `None` and `Some(true)` select TLS; only an explicit `false` disables it.
    pub fn from_tls(tls_enabled: Option<bool>) -> Self {
        match tls_enabled {
            Some(false) => Scheme::Grpc,
            _ => Scheme::Grpcs,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Grpcs => "grpcs",
            Scheme::Grpc => "grpc",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed form of a connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub scheme: Scheme,
    pub endpoint: String,
    pub database: String,
    pub options: BTreeMap<String, String>,
}

impl ConnectionDescriptor {
    /// Build the descriptor for a database, authenticated with `token`.
    pub fn build(endpoint: &str, database: &str, token: &str, tls_enabled: Option<bool>) -> Self {
        let options = [
            (QUERY_MODE_KEY, SCRIPTING),
            (FAKE_TX_KEY, SCRIPTING),
            (QUERY_BIND_KEY, QUERY_BIND),
            (TOKEN_KEY, token),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            scheme: Scheme::from_tls(tls_enabled),
            endpoint: endpoint.to_string(),
            database: database.to_string(),
            options,
        }
    }

    /// Render the full connection string, token included.
    pub fn to_connection_string(&self) -> String {
        self.render(|_, v| v)
    }

    /// Render with the token masked, for logs and error messages.
    pub fn redacted(&self) -> String {
        self.render(|k, v| if k == TOKEN_KEY { REDACTED } else { v })
    }

    /// The credential token carried in the options, if any.
    pub fn token(&self) -> Option<&str> {
        self.options.get(TOKEN_KEY).map(String::as_str)
    }

    /// `<endpoint><database>`, the part that identifies the target database.
    pub fn address(&self) -> String {
        format!("{}{}", self.endpoint, self.database)
    }

    fn render<'a>(&'a self, value: impl Fn(&'a str, &'a str) -> &'a str) -> String {
        let query = join_sorted_options(
            self.options
                .iter()
                .map(|(k, v)| (k.as_str(), value(k.as_str(), v.as_str()))),
        );
        format!(
            "{}://{}{}?{}",
            self.scheme, self.endpoint, self.database, query
        )
    }

    /// Parse a connection string produced by [`to_connection_string`](Self::to_connection_string).
    pub fn parse(input: &str) -> CoreResult<Self> {
        let invalid = |reason: &str| CoreError::InvalidDescriptor {
            reason: reason.to_string(),
        };

        let (scheme, rest) = input
            .split_once("://")
            .ok_or_else(|| invalid("missing '://' after the scheme"))?;
        let scheme = match scheme {
            "grpcs" => Scheme::Grpcs,
            "grpc" => Scheme::Grpc,
            _ => return Err(invalid("scheme must be 'grpc' or 'grpcs'")),
        };

        let (address, query) = rest.split_once('?').unwrap_or((rest, ""));
        let (endpoint, database) = match address.find('/') {
            Some(idx) => address.split_at(idx),
            None => (address, ""),
        };
        if endpoint.is_empty() {
            return Err(invalid("endpoint is empty"));
        }

        let mut options = BTreeMap::new();
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| invalid("option without '='"))?;
            options.insert(key.to_string(), value.to_string());
        }

        Ok(Self {
            scheme,
            endpoint: endpoint.to_string(),
            database: database.to_string(),
            options,
        })
    }
}

/// The Display form never includes the token.
impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

/// Join `k=v` pairs with `&`, sorted by key regardless of input order.
fn join_sorted_options<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    let mut pairs: Vec<(&str, &str)> = pairs.collect();
    pairs.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let mut query = String::new();
    for (key, value) in pairs {
        if !query.is_empty() {
            query.push('&');
        }
        query.push_str(key);
        query.push('=');
        query.push_str(value);
    }
    query
}

/// Build the connection string for a database in one call.
pub fn build_connection_string(
    endpoint: &str,
    database: &str,
    token: &str,
    tls_enabled: Option<bool>,
) -> String {
    ConnectionDescriptor::build(endpoint, database, token, tls_enabled).to_connection_string()
}

#[cfg(test)]
#[path = "connection_test.rs"]
mod tests;
