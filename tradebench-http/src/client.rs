//! The resilient per-user client
//!
//! One instance per simulated user: cookie-backed session, credentials, a
//! conditional-request cache and latency counters. Requests retry on 5xx
//! and transport failures at a fixed interval; once the cumulative elapsed
//! time of a call crosses the retirement budget the client retires
//! permanently and every further call fails without touching the network.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use tradebench_config::ClientConfig;
use tradebench_core::{
    BenchError, InfoResponse, Order, OrderActionResponse, RunSignal, TradeKind, User,
};

use crate::cache::{CacheStore, CachedEntry};
use crate::statics::{default_assets, hash_bytes, StaticAsset};
use crate::stats::{ElapsedStats, RequestCategory};

/// Identity a client signs up and signs in with
#[derive(Debug, Clone)]
pub struct Credentials {
    pub bank_id: String,
    pub name: String,
    pub password: String,
}

/// Response bytes plus the metadata the endpoints care about
struct Fetched {
    status: u16,
    body: Vec<u8>,
    /// SHA-256 of the body, computed for cacheable 200 GETs
    hash: Option<String>,
}

impl Fetched {
    fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Resilient HTTP session of one simulated user
pub struct Client {
    base: Url,
    http: reqwest::Client,
    creds: Mutex<Credentials>,
    user_id: AtomicI64,
    retired: AtomicBool,
    retire_after: Duration,
    retry_interval: Duration,
    cache: CacheStore,
    stats: ElapsedStats,
    assets: Vec<StaticAsset>,
    top_loads: AtomicU32,
}

impl Client {
    pub fn new(base: &str, creds: Credentials, config: &ClientConfig) -> Result<Self, BenchError> {
        Self::with_request_timeout(base, creds, config, config.timeout)
    }

    /// Like [`Client::new`] but with an explicit per-request timeout, used
    /// for the long-running one-shot `/initialize` call
    pub fn with_request_timeout(
        base: &str,
        creds: Credentials,
        config: &ClientConfig,
        timeout: Duration,
    ) -> Result<Self, BenchError> {
        let base = Url::parse(base)?;
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|source| BenchError::Transport {
                context: "building http client".to_string(),
                source,
            })?;
        Ok(Self {
            base,
            http,
            creds: Mutex::new(creds),
            user_id: AtomicI64::new(0),
            retired: AtomicBool::new(false),
            retire_after: config.retire_after,
            retry_interval: config.retry_interval,
            cache: CacheStore::new(),
            stats: ElapsedStats::new(),
            assets: default_assets(),
            top_loads: AtomicU32::new(0),
        })
    }

    /// Replace the static-asset manifest verified by [`Client::top`]
    pub fn set_assets(&mut self, assets: Vec<StaticAsset>) {
        self.assets = assets;
    }

    pub fn bank_id(&self) -> String {
        self.creds.lock().bank_id.clone()
    }

    pub fn name(&self) -> String {
        self.creds.lock().name.clone()
    }

    pub fn password(&self) -> String {
        self.creds.lock().password.clone()
    }

    /// Swap the password used by subsequent sign-in attempts
    pub fn set_password(&self, password: String) {
        self.creds.lock().password = password;
    }

    pub fn user_id(&self) -> i64 {
        self.user_id.load(Ordering::Acquire)
    }

    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> &ElapsedStats {
        &self.stats
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn retire(&self) {
        self.retired.store(true, Ordering::Release);
    }

    /// Send a request, retrying 5xx and transport failures until the call
    /// either completes or the cumulative elapsed time crosses the
    /// retirement budget.
    async fn dispatch(
        &self,
        ctx: &RunSignal,
        category: RequestCategory,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<reqwest::Response, BenchError> {
        if self.is_retired() {
            return Err(BenchError::AlreadyRetired);
        }
        let started = Instant::now();
        loop {
            let attempt = request
                .try_clone()
                .ok_or_else(|| BenchError::Assertion(format!("{context}: request not retryable")))?;
            let sent = tokio::select! {
                _ = ctx.over() => return Err(ctx.as_error()),
                sent = attempt.send() => sent,
            };
            match sent {
                Ok(response) => {
                    let elapsed = started.elapsed();
                    self.stats.record(category, elapsed);
                    if self.retire_after < elapsed {
                        self.retire();
                        return Err(BenchError::RetireTimeout {
                            elapsed,
                            reason: "response time over the retirement budget".to_string(),
                        });
                    }
                    if response.status().as_u16() < 500 {
                        return Ok(response);
                    }
                    let status = response.status().as_u16();
                    match response.text().await {
                        Ok(body) => debug!(context, status, body = %body, "retrying after server error"),
                        Err(err) => debug!(context, status, %err, "retrying; body read failed"),
                    }
                }
                Err(err) => {
                    let elapsed = started.elapsed();
                    if self.retire_after <= elapsed {
                        self.retire();
                        return Err(BenchError::RetireTimeout {
                            elapsed,
                            reason: err.to_string(),
                        });
                    }
                    warn!(context, elapsed_ms = elapsed.as_millis() as u64, %err, "transport error, retrying");
                }
            }
            tokio::select! {
                _ = ctx.over() => return Err(ctx.as_error()),
                _ = sleep(self.retry_interval) => {}
            }
        }
    }

    async fn read_body(&self, response: reqwest::Response, context: &str) -> Result<(u16, Vec<u8>), BenchError> {
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|source| BenchError::Transport {
                context: format!("{context}: body read failed"),
                source,
            })?;
        Ok((status, body.to_vec()))
    }

    async fn get(
        &self,
        ctx: &RunSignal,
        path: &str,
        query: &[(&str, String)],
        category: RequestCategory,
        context: &str,
    ) -> Result<Fetched, BenchError> {
        let mut url = self.base.join(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        let key = url.to_string();
        let mut request = self.http.get(url);
        if let Some(entry) = self.cache.get(&key) {
            request = entry.apply(request);
        }
        let response = self.dispatch(ctx, category, request, context).await?;
        let headers = response.headers().clone();
        let (status, body) = self.read_body(response, context).await?;
        let mut hash = None;
        if status == 200 {
            if let Some(entry) = CachedEntry::from_headers(&headers) {
                self.cache.set(key, entry);
            }
            hash = Some(hash_bytes(&body));
        }
        Ok(Fetched { status, body, hash })
    }

    async fn post_form(
        &self,
        ctx: &RunSignal,
        path: &str,
        form: &[(&str, String)],
        context: &str,
    ) -> Result<Fetched, BenchError> {
        let url = self.base.join(path)?;
        let request = self.http.post(url).form(form);
        let response = self
            .dispatch(ctx, RequestCategory::ApiWrite, request, context)
            .await?;
        let (status, body) = self.read_body(response, context).await?;
        Ok(Fetched { status, body, hash: None })
    }

    async fn delete(&self, ctx: &RunSignal, path: &str, context: &str) -> Result<Fetched, BenchError> {
        let url = self.base.join(path)?;
        let request = self.http.delete(url);
        let response = self
            .dispatch(ctx, RequestCategory::ApiWrite, request, context)
            .await?;
        let (status, body) = self.read_body(response, context).await?;
        Ok(Fetched { status, body, hash: None })
    }

    fn decode<T: serde::de::DeserializeOwned>(&self, fetched: &Fetched, context: &str) -> Result<T, BenchError> {
        serde_json::from_slice(&fetched.body).map_err(|source| BenchError::Decode {
            context: context.to_string(),
            source,
        })
    }

    /// `POST /initialize` — wire the target to its back-office services
    pub async fn initialize(
        &self,
        ctx: &RunSignal,
        bank_url: &str,
        bank_appid: &str,
        log_url: &str,
        log_appid: &str,
    ) -> Result<(), BenchError> {
        let form = [
            ("bank_endpoint", bank_url.to_string()),
            ("bank_appid", bank_appid.to_string()),
            ("log_endpoint", log_url.to_string()),
            ("log_appid", log_appid.to_string()),
        ];
        let res = self.post_form(ctx, "/initialize", &form, "POST /initialize").await?;
        if res.status == 200 {
            return Ok(());
        }
        Err(BenchError::status("POST /initialize failed", res.status, &res.body_text()))
    }

    /// `POST /signup`
    pub async fn signup(&self, ctx: &RunSignal) -> Result<(), BenchError> {
        let form = {
            let creds = self.creds.lock();
            [
                ("name", creds.name.clone()),
                ("bank_id", creds.bank_id.clone()),
                ("password", creds.password.clone()),
            ]
        };
        let res = self.post_form(ctx, "/signup", &form, "POST /signup").await?;
        if res.status == 200 {
            return Ok(());
        }
        Err(BenchError::status("POST /signup failed", res.status, &res.body_text()))
    }

    /// `POST /signin` — verifies the target echoes the right identity
    pub async fn signin(&self, ctx: &RunSignal) -> Result<(), BenchError> {
        let (form, expected_name) = {
            let creds = self.creds.lock();
            (
                [
                    ("bank_id", creds.bank_id.clone()),
                    ("password", creds.password.clone()),
                ],
                creds.name.clone(),
            )
        };
        let res = self.post_form(ctx, "/signin", &form, "POST /signin").await?;
        if res.status != 200 {
            return Err(BenchError::status("POST /signin failed", res.status, &res.body_text()));
        }
        let user: User = self.decode(&res, "POST /signin")?;
        if user.name != expected_name {
            return Err(BenchError::Assertion(format!(
                "POST /signin returned name [{}], expected [{}]",
                user.name, expected_name
            )));
        }
        if user.id == 0 {
            return Err(BenchError::Assertion("POST /signin returned zero id".to_string()));
        }
        self.user_id.store(user.id, Ordering::Release);
        Ok(())
    }

    /// `POST /signout`
    pub async fn signout(&self, ctx: &RunSignal) -> Result<(), BenchError> {
        let res = self.post_form(ctx, "/signout", &[], "POST /signout").await?;
        if res.status == 200 {
            return Ok(());
        }
        Err(BenchError::status("POST /signout failed", res.status, &res.body_text()))
    }

    /// Sweep the top page and every static asset, verifying content hashes.
    /// Conditional replays answered with 304 are accepted from the second
    /// sweep on.
    pub async fn top(&self, ctx: &RunSignal) -> Result<(), BenchError> {
        let loads = self.top_loads.fetch_add(1, Ordering::AcqRel) + 1;
        for asset in &self.assets {
            let context = format!("GET {}", asset.path);
            let res = self
                .get(ctx, &asset.path, &[], RequestCategory::StaticGet, &context)
                .await?;
            match res.status {
                200 => {
                    if res.hash.as_deref() != Some(asset.sha256.as_str()) {
                        return Err(BenchError::Assertion(format!(
                            "GET {} content is modified",
                            asset.path
                        )));
                    }
                }
                304 if loads > 1 => {}
                status => {
                    return Err(BenchError::status(
                        format!("{context} failed"),
                        status,
                        &res.body_text(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// `GET /info?cursor=` — market snapshot plus the caller's traded orders
    pub async fn info(&self, ctx: &RunSignal, cursor: i64) -> Result<InfoResponse, BenchError> {
        let query = [("cursor", cursor.to_string())];
        let res = self
            .get(ctx, "/info", &query, RequestCategory::ApiGet, "GET /info")
            .await?;
        if res.status != 200 {
            return Err(BenchError::status("GET /info failed", res.status, &res.body_text()));
        }
        let info: InfoResponse = self.decode(&res, "GET /info")?;
        if info.cursor == 0 {
            return Err(BenchError::Assertion("GET /info cursor is zero".to_string()));
        }
        self.verify_my_orders("GET /info", &info.traded_orders)?;
        Ok(info)
    }

    /// `POST /orders` — returns the order as the caller knows it locally
    pub async fn add_order(
        &self,
        ctx: &RunSignal,
        kind: TradeKind,
        amount: i64,
        price: i64,
    ) -> Result<Order, BenchError> {
        let form = [
            ("type", kind.as_str().to_string()),
            ("amount", amount.to_string()),
            ("price", price.to_string()),
        ];
        let res = self.post_form(ctx, "/orders", &form, "POST /orders").await?;
        if res.status != 200 {
            return Err(BenchError::status("POST /orders failed", res.status, &res.body_text()));
        }
        let action: OrderActionResponse = self.decode(&res, "POST /orders")?;
        if action.id == 0 {
            return Err(BenchError::Assertion(
                "POST /orders succeeded but returned no id".to_string(),
            ));
        }
        Ok(Order {
            id: action.id,
            kind,
            user_id: self.user_id(),
            amount,
            price,
            closed_at: None,
            trade_id: 0,
            created_at: None,
            user: None,
            trade: None,
        })
    }

    /// `GET /orders`
    pub async fn get_orders(&self, ctx: &RunSignal) -> Result<Vec<Order>, BenchError> {
        let res = self
            .get(ctx, "/orders", &[], RequestCategory::ApiGet, "GET /orders")
            .await?;
        if res.status != 200 {
            return Err(BenchError::status("GET /orders failed", res.status, &res.body_text()));
        }
        let orders: Vec<Order> = self.decode(&res, "GET /orders")?;
        self.verify_my_orders("GET /orders", &orders)?;
        Ok(orders)
    }

    /// `DELETE /order/:id`
    pub async fn delete_order(&self, ctx: &RunSignal, id: i64) -> Result<(), BenchError> {
        let path = format!("/order/{id}");
        let context = format!("DELETE {path}");
        let res = self.delete(ctx, &path, &context).await?;
        if res.status != 200 {
            return Err(BenchError::status(
                format!("{context} failed"),
                res.status,
                &res.body_text(),
            ));
        }
        let action: OrderActionResponse = self.decode(&res, &context)?;
        if action.id != id {
            return Err(BenchError::Assertion(format!(
                "{context} returned id {}, requested {id}",
                action.id
            )));
        }
        Ok(())
    }

    /// Contract checks applied to every order listing the target returns
    /// for this user: ownership, embedded user, embedded trade when traded,
    /// and stable created_at ordering.
    fn verify_my_orders(&self, context: &str, orders: &[Order]) -> Result<(), BenchError> {
        let my_id = self.user_id();
        let my_name = self.name();
        let mut last_created = None;
        for order in orders {
            if order.user_id != my_id {
                return Err(BenchError::Assertion(format!(
                    "{context} returned an order that is not mine [id:{}, user_id:{}]",
                    order.id, order.user_id
                )));
            }
            let user = order.user.as_ref().ok_or_else(|| {
                BenchError::Assertion(format!(
                    "{context} returned an order without its embedded user [id:{}]",
                    order.id
                ))
            })?;
            if user.name != my_name {
                return Err(BenchError::Assertion(format!(
                    "{context} returned an order whose user is not me [id:{}]",
                    order.id
                )));
            }
            if order.trade_id != 0 && order.trade.is_none() {
                return Err(BenchError::Assertion(format!(
                    "{context} returned a traded order without its embedded trade [id:{}]",
                    order.id
                )));
            }
            let created = order.created_at.ok_or_else(|| {
                BenchError::Assertion(format!(
                    "{context} returned an order without created_at [id:{}]",
                    order.id
                ))
            })?;
            if let Some(previous) = last_created {
                if created < previous {
                    return Err(BenchError::Assertion(format!(
                        "{context} order listing is not sorted by created_at"
                    )));
                }
            }
            last_created = Some(created);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(2),
            init_timeout: Duration::from_secs(2),
            retire_after: Duration::from_millis(500),
            retry_interval: Duration::from_millis(20),
            ..Default::default()
        }
    }

    fn test_creds() -> Credentials {
        Credentials {
            bank_id: "tb-0001".to_string(),
            name: "casey trader".to_string(),
            password: "hunter2hunter2".to_string(),
        }
    }

    fn client_for(server: &MockServer, config: &ClientConfig) -> Client {
        Client::new(&server.uri(), test_creds(), config).unwrap()
    }

    #[tokio::test]
    async fn retries_server_errors_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/signup"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(3)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/signup"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client_for(&server, &test_config());
        let ctx = RunSignal::new();
        client.signup(&ctx).await.unwrap();

        // Three 503s plus the final 200.
        assert_eq!(server.received_requests().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn slow_responses_retire_the_client_permanently() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/signup"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
            .mount(&server)
            .await;

        let config = ClientConfig {
            retire_after: Duration::from_millis(100),
            ..test_config()
        };
        let client = client_for(&server, &config);
        let ctx = RunSignal::new();

        let err = client.signup(&ctx).await.unwrap_err();
        assert!(matches!(err, BenchError::RetireTimeout { .. }));
        assert!(client.is_retired());

        // Retired clients fail fast with no network attempt.
        let err = client.signup(&ctx).await.unwrap_err();
        assert!(matches!(err, BenchError::AlreadyRetired));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cancellation_interrupts_retry_sleep() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/signup"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let config = ClientConfig {
            retire_after: Duration::from_secs(30),
            retry_interval: Duration::from_secs(30),
            ..test_config()
        };
        let client = client_for(&server, &config);
        let ctx = RunSignal::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            canceller.expire();
        });

        let err = client.signup(&ctx).await.unwrap_err();
        assert!(matches!(err, BenchError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn top_verifies_hashes_and_replays_conditionally() {
        let server = MockServer::start().await;
        let body = b"<html>exchange</html>".to_vec();
        let digest = hash_bytes(&body);

        // First sweep: 200 with an ETag. Second sweep must replay the
        // validator and may be answered with 304.
        Mock::given(method("GET"))
            .and(path("/"))
            .and(header("If-None-Match", "\"v1\""))
            .respond_with(ResponseTemplate::new(304))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(body.clone())
                    .insert_header("ETag", "\"v1\""),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut client = client_for(&server, &test_config());
        client.set_assets(vec![StaticAsset {
            path: "/".to_string(),
            size: 21,
            sha256: digest,
        }]);

        let ctx = RunSignal::new();
        client.top(&ctx).await.unwrap();
        client.top(&ctx).await.unwrap();
    }

    #[tokio::test]
    async fn top_rejects_modified_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"tampered".to_vec()))
            .mount(&server)
            .await;

        let mut client = client_for(&server, &test_config());
        client.set_assets(vec![StaticAsset::new(
            "/",
            8,
            "0000000000000000000000000000000000000000000000000000000000000000",
        )]);

        let ctx = RunSignal::new();
        let err = client.top(&ctx).await.unwrap_err();
        assert!(matches!(err, BenchError::Assertion(_)));
    }

    #[tokio::test]
    async fn signin_checks_the_echoed_identity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/signin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 41,
                "name": "casey trader",
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, &test_config());
        let ctx = RunSignal::new();
        client.signin(&ctx).await.unwrap();
        assert_eq!(client.user_id(), 41);
    }

    #[tokio::test]
    async fn signin_rejects_a_foreign_identity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/signin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 41,
                "name": "somebody else",
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, &test_config());
        let ctx = RunSignal::new();
        let err = client.signin(&ctx).await.unwrap_err();
        assert!(matches!(err, BenchError::Assertion(_)));
    }

    #[tokio::test]
    async fn bad_credentials_surface_the_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/signin"))
            .respond_with(ResponseTemplate::new(404).set_body_string("unknown bank id"))
            .mount(&server)
            .await;

        let client = client_for(&server, &test_config());
        let ctx = RunSignal::new();
        let err = client.signin(&ctx).await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
    }

    #[tokio::test]
    async fn order_listing_without_embedded_user_is_a_contract_violation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/signin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 9,
                "name": "casey trader",
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "id": 1,
                "type": "sell",
                "user_id": 9,
                "amount": 1,
                "price": 100,
                "created_at": "2026-01-01T00:00:00Z",
            }])))
            .mount(&server)
            .await;

        let client = client_for(&server, &test_config());
        let ctx = RunSignal::new();
        client.signin(&ctx).await.unwrap();
        let err = client.get_orders(&ctx).await.unwrap_err();
        assert!(matches!(err, BenchError::Assertion(_)));
    }

    #[tokio::test]
    async fn add_order_returns_the_local_view() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 77})))
            .mount(&server)
            .await;

        let client = client_for(&server, &test_config());
        let ctx = RunSignal::new();
        let order = client.add_order(&ctx, TradeKind::Buy, 3, 120).await.unwrap();
        assert_eq!(order.id, 77);
        assert_eq!(order.kind, TradeKind::Buy);
        assert_eq!(order.amount, 3);
        assert_eq!(order.price, 120);
    }

    #[tokio::test]
    async fn info_requires_a_cursor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "cursor": 0,
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, &test_config());
        let ctx = RunSignal::new();
        let err = client.info(&ctx, 0).await.unwrap_err();
        assert!(matches!(err, BenchError::Assertion(_)));
    }

    #[tokio::test]
    async fn latency_is_accounted_per_category() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "cursor": 5,
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, &test_config());
        let ctx = RunSignal::new();
        client.info(&ctx, 0).await.unwrap();
        let snapshot = client.stats().snapshot();
        assert_eq!(snapshot.api_get.count, 1);
        assert_eq!(snapshot.api_write.count, 0);
    }
}
