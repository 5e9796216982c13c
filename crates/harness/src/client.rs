//! HTTP client adapter for the system under test

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HarnessError, HarnessResult, StepError};
use crate::role::{Role, TokenTable};

/// HTTP verbs the harness can issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(HarnessError::SpecParse(format!("unsupported HTTP method: {}", s))),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One request to the SUT, with the path relative to the base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub role: Role,
    pub body: Option<String>,
    pub follow_redirects: bool,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>, role: Role) -> Self {
        Self {
            method,
            path: path.into(),
            role,
            body: None,
            follow_redirects: true,
        }
    }

    pub fn get(path: impl Into<String>, role: Role) -> Self {
        Self::new(HttpMethod::Get, path, role)
    }

    pub fn post(path: impl Into<String>, role: Role, body: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path, role).with_body(body)
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Leave 3xx responses unresolved so they can be asserted directly
    pub fn no_follow(mut self) -> Self {
        self.follow_redirects = false;
        self
    }
}

/// Status and fully-read body of a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Compare the status code exactly; 200 does not satisfy 201.
    pub fn expect_status(&self, expected: u16) -> Result<(), StepError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(StepError::UnexpectedStatus {
                expected,
                actual: self.status,
            })
        }
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends requests to the SUT as a given role.
///
/// Holds two underlying clients so redirect handling is chosen per request.
/// There are no retries.
pub struct ApiClient {
    base_url: String,
    tokens: TokenTable,
    follow: reqwest::Client,
    no_follow: reqwest::Client,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        tokens: TokenTable,
        timeout: Duration,
    ) -> HarnessResult<Self> {
        let follow = reqwest::Client::builder().timeout(timeout).build()?;
        let no_follow = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
            follow,
            no_follow,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path relative to the base
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Send one request and read the whole body.
    ///
    /// The status code is returned as-is; callers decide what they expected.
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, StepError> {
        let token = self.tokens.resolve(request.role)?;
        let url = self.url(&request.path);

        let client = if request.follow_redirects {
            &self.follow
        } else {
            &self.no_follow
        };

        let mut builder = client.request(request.method.into(), &url);
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = request.body.as_deref().filter(|b| !b.is_empty()) {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_string());
        }

        debug!("{} {} as {}", request.method, url, request.role);
        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();
        debug!("{} {} -> {} ({} bytes)", request.method, url, status, body.len());

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, TokenTable::new(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_url_joining() {
        let c = client("http://sut:3005/");
        assert_eq!(c.base_url(), "http://sut:3005");
        assert_eq!(c.url("/projects/2"), "http://sut:3005/projects/2");
        assert_eq!(c.url("hello"), "http://sut:3005/hello");
    }

    #[test]
    fn test_expect_status_is_exact() {
        let resp = ApiResponse { status: 200, body: Vec::new() };
        assert!(resp.expect_status(200).is_ok());
        assert_eq!(
            resp.expect_status(201),
            Err(StepError::UnexpectedStatus { expected: 201, actual: 200 })
        );
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("delete".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
        assert!("TRACE".parse::<HttpMethod>().is_err());
        assert_eq!(serde_yaml::from_str::<HttpMethod>("PUT").unwrap(), HttpMethod::Put);
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_sending() {
        // Nothing listens here; the credential check must fail first.
        let c = client("http://127.0.0.1:9");
        let err = c.send(&ApiRequest::get("/projects", Role::Admin)).await.unwrap_err();
        assert!(matches!(err, StepError::Configuration(_)));
    }
}
