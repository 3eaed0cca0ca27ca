//! Event-log service client
//!
//! The target streams tagged audit events here; correctness probes query
//! them back by user or trade id. The steady-state scheduler never touches
//! this service.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::BackofficeError;

/// Tags the target is required to emit
pub mod tags {
    pub const SIGNUP: &str = "signup";
    pub const SIGNIN: &str = "signin";
    pub const BUY_ORDER: &str = "buy.order";
    pub const SELL_ORDER: &str = "sell.order";
    pub const BUY_ERROR: &str = "buy.error";
    pub const BUY_DELETE: &str = "buy.delete";
    pub const SELL_DELETE: &str = "sell.delete";
    pub const TRADE: &str = "trade";
    pub const BUY_TRADE: &str = "buy.trade";
    pub const SELL_TRADE: &str = "sell.trade";
}

/// One tagged event from the log stream
#[derive(Debug, Clone, Deserialize)]
pub struct LogEntry {
    pub tag: String,
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl LogEntry {
    /// Decode the payload as a concrete shape
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.clone())
    }
}

/// Client for the event-log back-office service
#[derive(Debug, Clone)]
pub struct LogClient {
    endpoint: Url,
    app_id: String,
    http: reqwest::Client,
}

impl LogClient {
    pub fn new(endpoint: &str, app_id: impl Into<String>) -> Result<Self, BackofficeError> {
        Ok(Self {
            endpoint: Url::parse(endpoint)?,
            app_id: app_id.into(),
            http: reqwest::Client::new(),
        })
    }

    /// App id the target identifies itself with against the log service
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Reset the log store before a run
    pub async fn initialize(&self) -> Result<(), BackofficeError> {
        let context = "eventlog POST /initialize";
        let url = self.endpoint.join("/initialize")?;
        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|source| BackofficeError::Transport {
                context: context.to_string(),
                source,
            })?;
        let status = response.status().as_u16();
        if status != 200 {
            let message = response.text().await.unwrap_or_default();
            return Err(BackofficeError::Rejected {
                context: context.to_string(),
                status,
                message,
            });
        }
        Ok(())
    }

    /// Events recorded for one user
    pub async fn user_logs(&self, user_id: i64) -> Result<Vec<LogEntry>, BackofficeError> {
        self.logs(&[("user_id", user_id.to_string())]).await
    }

    /// Events recorded for one trade
    pub async fn trade_logs(&self, trade_id: i64) -> Result<Vec<LogEntry>, BackofficeError> {
        self.logs(&[("trade_id", trade_id.to_string())]).await
    }

    async fn logs(&self, query: &[(&str, String)]) -> Result<Vec<LogEntry>, BackofficeError> {
        let context = "eventlog GET /logs";
        let mut url = self.endpoint.join("/logs")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("app_id", &self.app_id);
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| BackofficeError::Transport {
                context: context.to_string(),
                source,
            })?;
        let status = response.status().as_u16();
        if status != 200 {
            let message = response.text().await.unwrap_or_default();
            return Err(BackofficeError::Rejected {
                context: context.to_string(),
                status,
                message,
            });
        }
        response
            .json()
            .await
            .map_err(|source| BackofficeError::Decode {
                context: context.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn user_logs_are_fetched_with_the_app_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/logs"))
            .and(query_param("app_id", "app-9"))
            .and(query_param("user_id", "12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "tag": "signup",
                    "time": "2026-01-01T00:00:00Z",
                    "data": {"name": "casey", "bank_id": "tb-1", "user_id": 12},
                }
            ])))
            .mount(&server)
            .await;

        let log = LogClient::new(&server.uri(), "app-9").unwrap();
        let entries = log.user_logs(12).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tag, tags::SIGNUP);

        #[derive(Deserialize)]
        struct Signup {
            user_id: i64,
        }
        let signup: Signup = entries[0].data_as().unwrap();
        assert_eq!(signup.user_id, 12);
    }

    #[tokio::test]
    async fn initialize_must_succeed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/initialize"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let log = LogClient::new(&server.uri(), "app-9").unwrap();
        assert!(log.initialize().await.is_err());
    }
}
