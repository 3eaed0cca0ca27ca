//! Bank service client
//!
//! Accounts are keyed by bank id. The benchmarker registers ids ahead of
//! demand and funds scenarios through `add_credit`; probes can cross-check
//! settlement through `credit`.

use serde::Deserialize;
use url::Url;

use crate::BackofficeError;

#[derive(Debug, Deserialize, Default)]
struct BankResponse {
    #[serde(default)]
    error: String,
}

/// Client for the bank back-office service
#[derive(Debug, Clone)]
pub struct BankClient {
    endpoint: Url,
    app_id: String,
    http: reqwest::Client,
}

impl BankClient {
    pub fn new(endpoint: &str, app_id: impl Into<String>) -> Result<Self, BackofficeError> {
        Ok(Self {
            endpoint: Url::parse(endpoint)?,
            app_id: app_id.into(),
            http: reqwest::Client::new(),
        })
    }

    /// App id the target identifies itself with against the bank
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Register a new bank id
    pub async fn register(&self, bank_id: &str) -> Result<(), BackofficeError> {
        self.post("/register", &serde_json::json!({ "bank_id": bank_id }))
            .await
    }

    /// Credit an account
    pub async fn add_credit(&self, bank_id: &str, amount: i64) -> Result<(), BackofficeError> {
        self.post(
            "/add_credit",
            &serde_json::json!({ "bank_id": bank_id, "price": amount }),
        )
        .await
    }

    /// Current balance of an account
    pub async fn credit(&self, bank_id: &str) -> Result<i64, BackofficeError> {
        #[derive(Deserialize)]
        struct CreditResponse {
            credit: i64,
        }

        let context = "bank GET /credit";
        let mut url = self.endpoint.join("/credit")?;
        url.query_pairs_mut().append_pair("bank_id", bank_id);
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
        let body: CreditResponse =
            response
                .json()
                .await
                .map_err(|source| BackofficeError::Decode {
                    context: context.to_string(),
                    source,
                })?;
        Ok(body.credit)
    }

    async fn post(&self, path: &str, payload: &serde_json::Value) -> Result<(), BackofficeError> {
        let context = format!("bank POST {path}");
        let url = self.endpoint.join(path)?;
        let response = self
            .http
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|source| BackofficeError::Transport {
                context: context.clone(),
                source,
            })?;
        let status = response.status().as_u16();
        let body: BankResponse = response
            .json()
            .await
            .map_err(|source| BackofficeError::Decode {
                context: context.clone(),
                source,
            })?;
        if status == 200 {
            return Ok(());
        }
        Err(BackofficeError::Rejected {
            context,
            status,
            message: body.error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn register_and_fund_an_account() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/register"))
            .and(body_json(serde_json::json!({"bank_id": "tb-77"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/add_credit"))
            .and(body_json(serde_json::json!({"bank_id": "tb-77", "price": 30000})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let bank = BankClient::new(&server.uri(), "app-1").unwrap();
        bank.register("tb-77").await.unwrap();
        bank.add_credit("tb-77", 30_000).await.unwrap();
    }

    #[tokio::test]
    async fn rejections_carry_the_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/register"))
            .respond_with(
                ResponseTemplate::new(409)
                    .set_body_json(serde_json::json!({"error": "duplicate bank_id"})),
            )
            .mount(&server)
            .await;

        let bank = BankClient::new(&server.uri(), "app-1").unwrap();
        let err = bank.register("tb-77").await.unwrap_err();
        assert!(matches!(err, BackofficeError::Rejected { status: 409, .. }));
        assert!(err.to_string().contains("duplicate bank_id"));
    }

    #[tokio::test]
    async fn credit_reads_the_balance() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/credit"))
            .and(query_param("bank_id", "tb-77"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"credit": 1200})))
            .mount(&server)
            .await;

        let bank = BankClient::new(&server.uri(), "app-1").unwrap();
        assert_eq!(bank.credit("tb-77").await.unwrap(), 1200);
    }
}
