// API client module: contains a small blocking HTTP client that talks
// to the youth-study platform. One client is built per run; every
// endpoint the pipeline touches lives here, each split into a transport
// wrapper and a pure parsing function so the protocol quirks stay unit
// testable without a network.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::profile::GroupProfile;

/// Default platform base URL; override with `YOUTHSTUDY_API_BASE`.
const DEFAULT_API_BASE: &str = "https://qcsh.h5yunban.com/youth-learning/cgi-bin";

/// The platform's fixed WeChat application id. Part of the login
/// callback contract, not a secret.
const WECHAT_APP_ID: &str = "wxa693f4127cc93fad";

/// Default per-request timeout; override with
/// `YOUTHSTUDY_HTTP_TIMEOUT_SECS`.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The login callback is an HTML/script page, not JSON; it embeds the
/// token in a snippet of the form `('accessToken', '<token>')`.
static ACCESS_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\('accessToken', '(.+?)'\)").expect("valid regex"));

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("login callback request failed")]
    Transport(#[source] reqwest::Error),
    #[error("no accessToken marker in the login callback response")]
    TokenMissing,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {endpoint} failed")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned HTTP {status}")]
    Http {
        endpoint: &'static str,
        status: StatusCode,
    },
    #[error("{endpoint} returned malformed JSON")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{endpoint} response is missing `{field}`")]
    MissingField {
        endpoint: &'static str,
        field: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("course uri {0:?} has no path to derive the certificate from")]
    MalformedUri(String),
    #[error("certificate request failed")]
    Transport(#[source] reqwest::Error),
    #[error("certificate endpoint returned HTTP {0}")]
    Http(StatusCode),
    #[error("could not write the certificate image")]
    Io(#[from] std::io::Error),
}

/// The currently assignable course. `id` stays a `serde_json::Value`
/// because the backend returns an int but keeping it flexible avoids
/// parsing issues; the join call sends it back as-is.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CourseRecord {
    pub id: Value,
    pub uri: String,
}

/// Business outcome of the join call, distinct from transport errors:
/// the platform answered, and either accepted or rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Success,
    Failure { status: i64 },
}

/// Request body for the join call: the enrollment fields plus the
/// course id, exactly as the platform expects them.
#[derive(Serialize)]
struct JoinRequest<'a> {
    #[serde(flatten)]
    profile: &'a GroupProfile,
    course: &'a Value,
}

/// Simple API client that holds a reqwest blocking client and the base
/// URL of the platform gateway. The access token is per-run state and
/// travels as an argument, not as client state.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create an ApiClient configured from the environment variables
    /// `YOUTHSTUDY_API_BASE` and `YOUTHSTUDY_HTTP_TIMEOUT_SECS`, with
    /// the real platform and a 30 second timeout as the defaults.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("YOUTHSTUDY_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.into());
        let timeout = std::env::var("YOUTHSTUDY_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient { client, base_url })
    }

    /// Exchange the account id for a per-run access token via the
    /// unauthenticated login callback.
    pub fn exchange(&self, account_id: &str) -> Result<String, AuthError> {
        let url = format!("{}/login/we-chat/callback", self.base_url);
        let res = self
            .client
            .get(&url)
            .query(&[("appid", WECHAT_APP_ID), ("openid", account_id)])
            .send()
            .map_err(AuthError::Transport)?;
        let body = res.text().map_err(AuthError::Transport)?;
        extract_access_token(&body)
    }

    /// Fetch the currently assignable course. Always live, never cached.
    pub fn current_course(&self, token: &str) -> Result<CourseRecord, ApiError> {
        let body = self.get_text("course/current", "/common-api/course/current", token)?;
        parse_current_course(&body)
    }

    /// Fetch the raw last-info response body. Parsing is the profile
    /// module's concern, since it has a soft-failure path.
    pub fn last_info(&self, token: &str) -> Result<String, ApiError> {
        self.get_text("course/last-info", "/user-api/course/last-info", token)
    }

    /// Submit the course completion on the user's behalf.
    pub fn join(
        &self,
        token: &str,
        profile: &GroupProfile,
        course_id: &Value,
    ) -> Result<SubmissionOutcome, ApiError> {
        const ENDPOINT: &str = "course/join";
        let url = format!("{}/user-api/course/join", self.base_url);
        let res = self
            .client
            .post(&url)
            .query(&[("accessToken", token)])
            .json(&JoinRequest {
                profile,
                course: course_id,
            })
            .send()
            .map_err(|source| ApiError::Transport {
                endpoint: ENDPOINT,
                source,
            })?;
        let status = res.status();
        if !status.is_success() {
            return Err(ApiError::Http {
                endpoint: ENDPOINT,
                status,
            });
        }
        let body = res.text().map_err(|source| ApiError::Transport {
            endpoint: ENDPOINT,
            source,
        })?;
        parse_join_status(&body)
    }

    /// Download the completion certificate that belongs to `course_uri`
    /// into `dest`, overwriting a previous file.
    pub fn download_certificate(&self, course_uri: &str, dest: &Path) -> Result<(), DownloadError> {
        let url = certificate_url(course_uri)?;
        let res = self
            .client
            .get(&url)
            .send()
            .map_err(DownloadError::Transport)?;
        let status = res.status();
        if !status.is_success() {
            return Err(DownloadError::Http(status));
        }
        let bytes = res.bytes().map_err(DownloadError::Transport)?;
        fs::write(dest, &bytes)?;
        Ok(())
    }

    fn get_text(
        &self,
        endpoint: &'static str,
        path: &str,
        token: &str,
    ) -> Result<String, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let res = self
            .client
            .get(&url)
            .query(&[("accessToken", token)])
            .send()
            .map_err(|source| ApiError::Transport { endpoint, source })?;
        let status = res.status();
        if !status.is_success() {
            return Err(ApiError::Http { endpoint, status });
        }
        res.text()
            .map_err(|source| ApiError::Transport { endpoint, source })
    }
}

/// Pull the access token out of the login callback body. First match
/// wins; a body without the marker is a typed failure, never a panic.
pub fn extract_access_token(body: &str) -> Result<String, AuthError> {
    ACCESS_TOKEN_RE
        .captures(body)
        .map(|caps| caps[1].to_string())
        .ok_or(AuthError::TokenMissing)
}

/// Decode a current-course body into `result.{id,uri}`.
pub fn parse_current_course(body: &str) -> Result<CourseRecord, ApiError> {
    const ENDPOINT: &str = "course/current";
    #[derive(Deserialize)]
    struct Envelope {
        result: CourseRecord,
    }
    let envelope: Envelope = serde_json::from_str(body).map_err(|source| ApiError::Decode {
        endpoint: ENDPOINT,
        source,
    })?;
    Ok(envelope.result)
}

/// Decode a join response body. `status` must be present and integral;
/// exactly 200 counts as success, everything else is a rejection.
pub fn parse_join_status(body: &str) -> Result<SubmissionOutcome, ApiError> {
    const ENDPOINT: &str = "course/join";
    let json: Value = serde_json::from_str(body).map_err(|source| ApiError::Decode {
        endpoint: ENDPOINT,
        source,
    })?;
    let status = json
        .get("status")
        .and_then(Value::as_i64)
        .ok_or(ApiError::MissingField {
            endpoint: ENDPOINT,
            field: "status",
        })?;
    if status == 200 {
        Ok(SubmissionOutcome::Success)
    } else {
        Ok(SubmissionOutcome::Failure { status })
    }
}

/// Derive the certificate image URL: the course uri up to (excluding)
/// its final path segment, plus `images/end.jpg`.
pub fn certificate_url(course_uri: &str) -> Result<String, DownloadError> {
    let (parent, _) = course_uri
        .rsplit_once('/')
        .ok_or_else(|| DownloadError::MalformedUri(course_uri.to_string()))?;
    Ok(format!("{parent}/images/end.jpg"))
}
