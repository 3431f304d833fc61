//! HTTP client for TheMealDB JSON API.
//!
//! All remote access goes through `ApiClient`; no other module issues
//! requests. Connection-level failures (timeout, name resolution) are
//! retried with a jittered back-off, HTTP error statuses are not.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::Rng;
use serde_json::Value;

/// Base URL for TheMealDB.
pub const API_ENDPOINT: &str = "https://www.themealdb.com/api/json";

/// The well-known development key. Usable, but never persisted.
pub const DEV_KEY: &str = "1";

/// File name of the persisted credential, under the home directory.
const KEY_FILE_NAME: &str = ".Mealdbkey";

const ACCEPTED_VERSIONS: [&str; 2] = ["1", "2"];
const MAX_ATTEMPTS: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(25);

/// Errors raised by `ApiClient`.
#[derive(Debug)]
pub enum ApiError {
    /// Version selector outside the accepted set
    InvalidVersion(String),
    /// Empty API key
    MissingKey,
    /// Attempted to persist the development key
    DevKeyNotSavable,
    /// Persisted credential file is malformed
    KeyFile(String),
    /// Connection-level failure that survived all retry attempts
    Network(String),
    /// Non-2xx HTTP response
    HttpStatus {
        url: String,
        status: u16,
        body: String,
    },
    /// 2xx response whose body violates the API contract
    BadResponse(String),
    /// Credential file I/O failure
    Io(std::io::Error),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidVersion(version) => {
                write!(f, "API version must be 1 or 2, got `{}`", version)
            }
            ApiError::MissingKey => write!(f, "API key must not be empty"),
            ApiError::DevKeyNotSavable => write!(f, "cannot save the development key"),
            ApiError::KeyFile(detail) => write!(f, "malformed key file: {}", detail),
            ApiError::Network(detail) => {
                write!(f, "failed to reach meal server: {}", detail)
            }
            ApiError::HttpStatus { url, status, body } => {
                write!(f, "`{}` returned status {}: {}", url, status, body)
            }
            ApiError::BadResponse(detail) => write!(f, "unexpected API response: {}", detail),
            ApiError::Io(e) => write!(f, "key file I/O error: {}", e),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// Outcome of one transport-level GET. Only the first two variants are
/// transient and eligible for retry.
#[derive(Debug)]
pub enum TransportError {
    Timeout,
    Connect(String),
    Other(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Timeout => write!(f, "request timed out"),
            TransportError::Connect(detail) => write!(f, "connection failed: {}", detail),
            TransportError::Other(detail) => write!(f, "{}", detail),
        }
    }
}

/// A raw HTTP response, status not yet interpreted.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Seam between the client and the wire, so tests can script outcomes.
pub trait Transport {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

/// Production transport over `reqwest`'s blocking client.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let response = self.client.get(url).send().map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(classify)?;
        Ok(HttpResponse { status, body })
    }
}

fn classify(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else {
        TransportError::Other(error.to_string())
    }
}

/// Client for one key/version pair against TheMealDB.
pub struct ApiClient {
    key: String,
    version: String,
    base_url: String,
    transport: Box<dyn Transport>,
    sleep: Box<dyn Fn(Duration)>,
}

impl ApiClient {
    /// Creates a client. `version` must be `"1"` or `"2"`; the development
    /// key is accepted with a warning.
    pub fn new(key: &str, version: &str) -> Result<Self, ApiError> {
        let transport = HttpTransport::new().map_err(|e| ApiError::Network(e.to_string()))?;
        Self::with_transport(key, version, Box::new(transport), Box::new(std::thread::sleep))
    }

    pub(crate) fn with_transport(
        key: &str,
        version: &str,
        transport: Box<dyn Transport>,
        sleep: Box<dyn Fn(Duration)>,
    ) -> Result<Self, ApiError> {
        if !ACCEPTED_VERSIONS.contains(&version) {
            return Err(ApiError::InvalidVersion(version.to_string()));
        }
        if key.trim().is_empty() {
            return Err(ApiError::MissingKey);
        }
        if key == DEV_KEY {
            tracing::warn!("API key `1` is only for development");
        }
        let base_url = format!("{}/v{}/{}/", API_ENDPOINT, version, key);
        Ok(Self {
            key: key.to_string(),
            version: version.to_string(),
            base_url,
            transport,
            sleep,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Search meals by name: `search.php?s={name}`.
    pub fn search_meals_by_name(&self, name: &str) -> Result<Value, ApiError> {
        self.call(&format!("search.php?s={}", urlencoding::encode(name)))
    }

    /// Full meal details by id: `lookup.php?i={id}`.
    pub fn meal_by_id(&self, id: &str) -> Result<Value, ApiError> {
        self.call(&format!("lookup.php?i={}", urlencoding::encode(id)))
    }

    /// One random complete meal: `random.php`.
    pub fn random_meal(&self) -> Result<Value, ApiError> {
        self.call("random.php")
    }

    /// Category name list: `list.php?c=list`.
    pub fn meal_categories(&self) -> Result<Value, ApiError> {
        self.call("list.php?c=list")
    }

    /// Meals by primary ingredient: `filter.php?i={ingredient}`.
    pub fn search_by_ingredient(&self, ingredient: &str) -> Result<Value, ApiError> {
        self.call(&format!("filter.php?i={}", urlencoding::encode(ingredient)))
    }

    /// Meals in a category: `filter.php?c={category}`.
    pub fn meals_by_category(&self, category: &str) -> Result<Value, ApiError> {
        self.call(&format!("filter.php?c={}", urlencoding::encode(category)))
    }

    fn call(&self, operation: &str) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, operation);
        let response = self.get_with_retry(&url)?;
        if !(200..300).contains(&response.status) {
            return Err(ApiError::HttpStatus {
                url,
                status: response.status,
                body: response.body,
            });
        }
        let parsed: Value = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::BadResponse(format!("body is not valid JSON: {}", e)))?;
        validate(&parsed)?;
        Ok(parsed)
    }

    /// Bounded retry loop: transient transport failures get up to
    /// `MAX_ATTEMPTS` tries with a random 1-3 s sleep in between.
    fn get_with_retry(&self, url: &str) -> Result<HttpResponse, ApiError> {
        let mut attempt = 1;
        loop {
            match self.transport.get(url) {
                Ok(response) => return Ok(response),
                Err(error @ (TransportError::Timeout | TransportError::Connect(_)))
                    if attempt < MAX_ATTEMPTS =>
                {
                    tracing::warn!(attempt, "failed to reach meal server, retrying: {}", error);
                    let secs = rand::rng().random_range(1..=3);
                    (self.sleep)(Duration::from_secs(secs));
                    attempt += 1;
                }
                Err(error) => return Err(ApiError::Network(error.to_string())),
            }
        }
    }

    /// Whether the credential may be written to disk.
    pub fn can_save(&self) -> bool {
        self.key != DEV_KEY
    }

    /// Default credential path: `~/.Mealdbkey`.
    pub fn default_key_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(KEY_FILE_NAME)
    }

    /// Writes `version: {v}\nkey: {k}`, overwriting any existing file.
    pub fn save(&self, path: &Path) -> Result<(), ApiError> {
        if !self.can_save() {
            return Err(ApiError::DevKeyNotSavable);
        }
        fs::write(path, format!("version: {}\nkey: {}", self.version, self.key))
            .map_err(ApiError::Io)
    }

    /// Reconstructs a client from a file written by `save`. The format is
    /// exact: four whitespace-separated tokens with `version:` and `key:`
    /// markers in positions 0 and 2.
    pub fn load(path: &Path) -> Result<Self, ApiError> {
        if !path.exists() {
            return Err(ApiError::KeyFile(format!(
                "{} does not exist",
                path.display()
            )));
        }
        let raw = fs::read_to_string(path).map_err(ApiError::Io)?;
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        if tokens.len() != 4 {
            return Err(ApiError::KeyFile(format!(
                "expected 4 fields, found {}",
                tokens.len()
            )));
        }
        if tokens[0] != "version:" {
            return Err(ApiError::KeyFile(format!(
                "expected `version:` marker, found `{}`",
                tokens[0]
            )));
        }
        if tokens[2] != "key:" {
            return Err(ApiError::KeyFile(format!(
                "expected `key:` marker, found `{}`",
                tokens[2]
            )));
        }
        Self::new(tokens[3], tokens[1])
    }
}

fn validate(data: &Value) -> Result<(), ApiError> {
    let object = data
        .as_object()
        .ok_or_else(|| ApiError::BadResponse(format!("response is not a JSON object: {}", data)))?;
    if !object.contains_key("meals") {
        return Err(ApiError::BadResponse(
            "response missing `meals` entry".to_string(),
        ));
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::testing::{scripted_client, ScriptedTransport};
    use super::*;
    use tempfile::tempdir;

    const EMPTY_OK: &str = r#"{"meals":null}"#;

    #[test]
    fn test_rejects_unknown_version() {
        let result = ApiClient::new("somekey", "3");
        assert!(matches!(result, Err(ApiError::InvalidVersion(_))));
    }

    #[test]
    fn test_rejects_empty_key() {
        let result = ApiClient::new("  ", "1");
        assert!(matches!(result, Err(ApiError::MissingKey)));
    }

    #[test]
    fn test_query_urls_and_encoding() {
        let transport = ScriptedTransport::new()
            .respond(200, EMPTY_OK)
            .respond(200, EMPTY_OK)
            .respond(200, EMPTY_OK);
        let requests = transport.requests();
        let (client, _) = scripted_client(transport);

        client.search_meals_by_name("spicy arrabiata").unwrap();
        client.meal_by_id("52772").unwrap();
        client.search_by_ingredient("chicken breast").unwrap();

        let requests = requests.borrow();
        assert_eq!(
            requests[0],
            "https://www.themealdb.com/api/json/v1/testkey/search.php?s=spicy%20arrabiata"
        );
        assert_eq!(
            requests[1],
            "https://www.themealdb.com/api/json/v1/testkey/lookup.php?i=52772"
        );
        assert_eq!(
            requests[2],
            "https://www.themealdb.com/api/json/v1/testkey/filter.php?i=chicken%20breast"
        );
    }

    #[test]
    fn test_succeeds_after_transient_failures() {
        let transport = ScriptedTransport::new()
            .fail(TransportError::Timeout)
            .fail(TransportError::Timeout)
            .respond(200, EMPTY_OK);
        let requests = transport.requests();
        let (client, sleeps) = scripted_client(transport);

        let value = client.random_meal().unwrap();
        assert!(value.get("meals").is_some());
        assert_eq!(requests.borrow().len(), 3);
        assert_eq!(sleeps.get(), 2);
    }

    #[test]
    fn test_gives_up_after_three_attempts() {
        let transport = ScriptedTransport::new()
            .fail(TransportError::Timeout)
            .fail(TransportError::Connect("dns".to_string()))
            .fail(TransportError::Timeout);
        let requests = transport.requests();
        let (client, sleeps) = scripted_client(transport);

        let result = client.random_meal();
        assert!(matches!(result, Err(ApiError::Network(_))));
        assert_eq!(requests.borrow().len(), 3);
        assert_eq!(sleeps.get(), 2);
    }

    #[test]
    fn test_http_error_is_not_retried() {
        let transport = ScriptedTransport::new().respond(404, "not found");
        let requests = transport.requests();
        let (client, sleeps) = scripted_client(transport);

        let result = client.random_meal();
        match result {
            Err(ApiError::HttpStatus { status, body, .. }) => {
                assert_eq!(status, 404);
                assert_eq!(body, "not found");
            }
            other => panic!("expected HttpStatus error, got {:?}", other.map(|_| ())),
        }
        assert_eq!(requests.borrow().len(), 1);
        assert_eq!(sleeps.get(), 0);
    }

    #[test]
    fn test_non_transient_transport_error_is_not_retried() {
        let transport =
            ScriptedTransport::new().fail(TransportError::Other("body read failed".to_string()));
        let requests = transport.requests();
        let (client, sleeps) = scripted_client(transport);

        assert!(matches!(client.random_meal(), Err(ApiError::Network(_))));
        assert_eq!(requests.borrow().len(), 1);
        assert_eq!(sleeps.get(), 0);
    }

    #[test]
    fn test_rejects_body_without_meals_entry() {
        let transport = ScriptedTransport::new().respond(200, r#"{"categories":[]}"#);
        let (client, _) = scripted_client(transport);
        assert!(matches!(
            client.meal_categories(),
            Err(ApiError::BadResponse(_))
        ));
    }

    #[test]
    fn test_rejects_non_object_body() {
        let transport = ScriptedTransport::new().respond(200, "[1,2,3]");
        let (client, _) = scripted_client(transport);
        assert!(matches!(
            client.meal_categories(),
            Err(ApiError::BadResponse(_))
        ));
    }

    #[test]
    fn test_key_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".Mealdbkey");

        let (client, _) = scripted_client(ScriptedTransport::new());
        client.save(&path).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "version: 1\nkey: testkey"
        );

        let loaded = ApiClient::load(&path).unwrap();
        assert_eq!(loaded.version(), "1");
        assert!(loaded.can_save());
    }

    #[test]
    fn test_dev_key_cannot_be_saved() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".Mealdbkey");
        let client = ApiClient::with_transport(
            DEV_KEY,
            "1",
            Box::new(ScriptedTransport::new()),
            Box::new(|_| {}),
        )
        .unwrap();
        assert!(!client.can_save());
        assert!(matches!(
            client.save(&path),
            Err(ApiError::DevKeyNotSavable)
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_load_rejects_missing_file() {
        let dir = tempdir().unwrap();
        let result = ApiClient::load(&dir.path().join("nope"));
        assert!(matches!(result, Err(ApiError::KeyFile(_))));
    }

    #[test]
    fn test_load_rejects_wrong_token_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".Mealdbkey");
        std::fs::write(&path, "version: 1 key: abc extra").unwrap();
        assert!(matches!(ApiClient::load(&path), Err(ApiError::KeyFile(_))));
    }

    #[test]
    fn test_load_rejects_wrong_markers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".Mealdbkey");
        std::fs::write(&path, "ver: 1 key: abc").unwrap();
        assert!(matches!(ApiClient::load(&path), Err(ApiError::KeyFile(_))));

        std::fs::write(&path, "version: 1 k: abc").unwrap();
        assert!(matches!(ApiClient::load(&path), Err(ApiError::KeyFile(_))));
    }
}
