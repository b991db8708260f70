//! Client identity extraction and sanitization.
//!
//! The client id rides on the `x-client-id` request header. It is optional:
//! absent or unusable ids collapse to `"unknown"` and get the default rate
//! bucket. Bearer tokens map to configured [`AuthClient`]s; the mapping is
//! frozen after startup.

use std::collections::HashMap;

/// Request header carrying the caller-supplied client id.
pub const CLIENT_ID_HEADER: &str = "x-client-id";

/// Client id used when the header is absent or sanitizes to nothing.
pub const UNKNOWN_CLIENT_ID: &str = "unknown";

/// A configured API consumer with its rate-limit budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthClient {
    pub client_id: String,
    pub rcu_per_second: u32,
    pub burst: u32,
}

/// Token-keyed map of configured clients; read-only after construction.
#[derive(Debug, Clone, Default)]
pub struct AuthClients {
    by_token: HashMap<String, AuthClient>,
}

impl AuthClients {
    pub fn new(clients: impl IntoIterator<Item = (String, AuthClient)>) -> Self {
        Self { by_token: clients.into_iter().collect() }
    }

    pub fn by_token(&self, token: &str) -> Option<&AuthClient> {
        self.by_token.get(token)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AuthClient> {
        self.by_token.values()
    }
}

/// Per-request client identity, attached by the admission layer and recovered
/// by handlers.
#[derive(Debug, Clone)]
pub struct ClientContext {
    client_id: String,
}

impl ClientContext {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self { client_id: client_id.into() }
    }

    pub fn unknown() -> Self {
        Self::new(UNKNOWN_CLIENT_ID)
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Builds the context from gRPC request metadata. Used by handlers when
    /// the admission layer did not run (e.g. direct trait-level calls).
    pub fn from_metadata(metadata: &tonic::metadata::MetadataMap) -> Self {
        let client_id = metadata
            .get(CLIENT_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(sanitize_client_id)
            .unwrap_or_else(|| UNKNOWN_CLIENT_ID.to_string());
        Self { client_id }
    }
}

impl Default for ClientContext {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Reads and sanitizes the client id from raw HTTP headers; the admission
/// layer sees requests before they become gRPC requests.
pub fn client_id_from_headers(headers: &http::HeaderMap) -> String {
    headers
        .get(CLIENT_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(sanitize_client_id)
        .unwrap_or_else(|| UNKNOWN_CLIENT_ID.to_string())
}

/// Extracts a bearer token from the `authorization` header, if any.
pub fn bearer_token(headers: &http::HeaderMap) -> Option<&str> {
    headers
        .get(http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Caller identity plus how it was established.
///
/// Only a bearer token proves the identity; the `x-client-id` header is a
/// self-declared label for metrics and logs. Admission must never grant a
/// configured rate budget on the strength of the header alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedClient {
    pub client_id: String,
    /// True when the identity came from a configured bearer token rather
    /// than the caller-supplied header.
    pub authenticated: bool,
}

/// Resolves the caller identity: a bearer token matching a configured
/// client is authoritative; otherwise the sanitized `x-client-id` header
/// labels the caller, unauthenticated. Callers with neither stay `unknown`.
pub fn resolve_client(headers: &http::HeaderMap, clients: &AuthClients) -> ResolvedClient {
    if let Some(client) = bearer_token(headers).and_then(|token| clients.by_token(token)) {
        return ResolvedClient { client_id: client.client_id.clone(), authenticated: true };
    }
    ResolvedClient { client_id: client_id_from_headers(headers), authenticated: false }
}

/// Normalizes a caller-supplied client id into a metrics-safe label.
///
/// Leading/trailing whitespace is dropped, everything after the first `:` is
/// discarded (session suffixes), letters are lowercased, inner whitespace
/// becomes `_`, and any character outside letters, digits, `_`, `-` and `/`
/// is removed. Ids that sanitize to nothing become [`UNKNOWN_CLIENT_ID`].
pub fn sanitize_client_id(raw: &str) -> String {
    let head = raw.trim().split(':').next().unwrap_or_default();
    if head.is_empty() {
        return UNKNOWN_CLIENT_ID.to_string();
    }

    let mut sanitized = String::with_capacity(head.len());
    for c in head.chars() {
        if c.is_whitespace() {
            sanitized.push('_');
        } else if c.is_alphabetic() {
            sanitized.extend(c.to_lowercase());
        } else if c.is_numeric() || matches!(c, '_' | '-' | '/') {
            sanitized.push(c);
        }
    }

    if sanitized.is_empty() {
        UNKNOWN_CLIENT_ID.to_string()
    } else {
        sanitized
    }
}
