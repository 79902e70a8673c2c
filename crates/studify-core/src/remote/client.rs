//! HTTP client for the hosted database and the stats service.

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use url::Url;

use super::UserStats;
use crate::error::{RemoteError, SinkError};
use crate::session::{SessionLog, SessionStore};

const SESSIONS_TABLE: &str = "pomodoro_sessions";

/// Row shape of the `pomodoro_sessions` table.
#[derive(Serialize)]
struct SessionRow<'a> {
    user_id: &'a str,
    subject: Option<&'a str>,
    duration_mins: u32,
    started_at: String,
    completed_at: String,
    was_completed: bool,
}

impl<'a> From<&'a SessionLog> for SessionRow<'a> {
    fn from(log: &'a SessionLog) -> Self {
        Self {
            user_id: &log.user_id,
            subject: log.subject.as_deref(),
            duration_mins: log.duration_minutes,
            started_at: log.started_at.to_rfc3339(),
            completed_at: log.completed_at.to_rfc3339(),
            was_completed: log.was_completed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RestClient {
    http: Client,
    database_url: Option<Url>,
    stats_url: Url,
    anon_key: String,
    access_token: Option<String>,
}

impl RestClient {
    /// `database_url` may be omitted when only the stats service is used.
    ///
    /// # Errors
    /// Returns an error if either URL does not parse.
    pub fn new(
        database_url: Option<&str>,
        stats_url: &str,
        anon_key: impl Into<String>,
        access_token: Option<String>,
    ) -> Result<Self, RemoteError> {
        let database_url = database_url.map(parse_base).transpose()?;
        Ok(Self {
            http: Client::new(),
            database_url,
            stats_url: parse_base(stats_url)?,
            anon_key: anon_key.into(),
            access_token,
        })
    }

    fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.anon_key)
    }

    fn with_auth(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
    }

    /// Insert one row into `pomodoro_sessions`.
    ///
    /// # Errors
    /// `Unreachable` on transport failure, `Rejected` on any non-2xx reply.
    pub async fn insert_session(&self, log: &SessionLog) -> Result<(), SinkError> {
        let base = self
            .database_url
            .as_ref()
            .ok_or_else(|| SinkError::Unreachable("database URL not configured".into()))?;
        let url = base
            .join(&format!("rest/v1/{SESSIONS_TABLE}"))
            .map_err(|e| SinkError::Unreachable(e.to_string()))?;

        let resp = self
            .with_auth(self.http.post(url))
            .header("Prefer", "return=minimal")
            .json(&SessionRow::from(log))
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(SinkError::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    /// Fetch aggregated totals for `user_id`. The token must belong to that user.
    ///
    /// # Errors
    /// `Unauthorized` on 401, `Forbidden` on 403, `Status` on other failures.
    pub async fn fetch_stats(&self, user_id: &str) -> Result<UserStats, RemoteError> {
        let token = self
            .access_token
            .as_deref()
            .ok_or_else(|| RemoteError::Unauthorized("no access token configured".into()))?;
        let mut url = self.stats_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::InvalidUrl {
                url: self.stats_url.to_string(),
                message: "cannot be a base".into(),
            })?
            .pop_if_empty()
            .extend(["api", "stats", user_id]);

        let resp = self.http.get(url).bearer_auth(token).send().await?;
        match resp.status() {
            s if s.is_success() => Ok(resp.json::<UserStats>().await?),
            StatusCode::UNAUTHORIZED => {
                let body = resp.text().await.unwrap_or_default();
                Err(RemoteError::Unauthorized(error_message(&body)))
            }
            StatusCode::FORBIDDEN => Err(RemoteError::Forbidden),
            status => Err(RemoteError::Status {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            }),
        }
    }

    /// `true` when the stats service answers `{"status": "ok"}`.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-2xx reply.
    pub async fn health(&self) -> Result<bool, RemoteError> {
        let url = self
            .stats_url
            .join("api/health")
            .map_err(|e| RemoteError::InvalidUrl {
                url: self.stats_url.to_string(),
                message: e.to_string(),
            })?;
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }
        let body: serde_json::Value = resp.json().await?;
        Ok(body["status"] == "ok")
    }
}

impl SessionStore for RestClient {
    async fn insert_session(&self, log: &SessionLog) -> Result<(), SinkError> {
        RestClient::insert_session(self, log).await
    }
}

/// Parse a base URL, making sure it ends with `/` so `join` appends.
fn parse_base(raw: &str) -> Result<Url, RemoteError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&with_slash).map_err(|e| RemoteError::InvalidUrl {
        url: raw.to_string(),
        message: e.to_string(),
    })
}

/// Pull `error` out of a `{"error": "..."}` body, or return the body as is.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_urls_gain_trailing_slash() {
        let url = parse_base("https://db.example.com/project").unwrap();
        assert_eq!(
            url.join("rest/v1/pomodoro_sessions").unwrap().as_str(),
            "https://db.example.com/project/rest/v1/pomodoro_sessions"
        );
        assert!(parse_base("not a url").is_err());
    }

    #[test]
    fn error_message_prefers_json_field() {
        assert_eq!(error_message(r#"{"error":"Invalid or expired token"}"#), "Invalid or expired token");
        assert_eq!(error_message("plain"), "plain");
    }

    #[test]
    fn session_row_uses_table_columns() {
        let now = chrono::Utc::now();
        let log = SessionLog {
            user_id: "u1".into(),
            subject: None,
            duration_minutes: 25,
            started_at: now,
            completed_at: now,
            was_completed: true,
        };
        let json = serde_json::to_value(SessionRow::from(&log)).unwrap();
        assert_eq!(json["duration_mins"], 25);
        assert!(json["subject"].is_null());
        assert_eq!(json["was_completed"], true);
    }
}
