//! Correctness probes
//!
//! One-shot validations that use the same resilient client as the load
//! scenarios but never enter the concurrent scheduler. The full
//! transactional audit lives outside this crate; the smoke probe checks
//! that the target is minimally correct before load is worth generating.

use async_trait::async_trait;

use tradebench_config::ClientConfig;
use tradebench_core::RunSignal;
use tradebench_http::{Client, Credentials, StaticAsset};

use crate::error::EngineError;

/// A one-shot correctness probe
#[async_trait]
pub trait Probe: Send + Sync {
    async fn run(&self, ctx: &RunSignal) -> Result<(), EngineError>;
}

/// Minimal end-to-end check: static sweep, market snapshot, account
/// round-trip, credential rejection
pub struct SmokeProbe {
    app_url: String,
    client_config: ClientConfig,
    credentials: Credentials,
    assets: Option<Vec<StaticAsset>>,
}

impl SmokeProbe {
    pub fn new(app_url: &str, client_config: ClientConfig, credentials: Credentials) -> Self {
        Self {
            app_url: app_url.to_string(),
            client_config,
            credentials,
            assets: None,
        }
    }

    /// Override the static-asset manifest the probe verifies
    pub fn with_assets(mut self, assets: Vec<StaticAsset>) -> Self {
        self.assets = Some(assets);
        self
    }
}

#[async_trait]
impl Probe for SmokeProbe {
    async fn run(&self, ctx: &RunSignal) -> Result<(), EngineError> {
        let fail = |what: &str, detail: String| EngineError::PreTest(format!("{what}: {detail}"));

        let mut client = Client::new(&self.app_url, self.credentials.clone(), &self.client_config)
            .map_err(|err| fail("client construction", err.to_string()))?;
        if let Some(assets) = &self.assets {
            client.set_assets(assets.clone());
        }

        client
            .top(ctx)
            .await
            .map_err(|err| fail("top page", err.to_string()))?;
        client
            .info(ctx, 0)
            .await
            .map_err(|err| fail("market snapshot", err.to_string()))?;
        client
            .signup(ctx)
            .await
            .map_err(|err| fail("signup", err.to_string()))?;

        // A wrong password must be rejected before the real sign-in.
        let password = self.credentials.password.clone();
        client.set_password(format!("{password}-wrong"));
        match client.signin(ctx).await {
            Err(err) if matches!(err.status_code(), Some(403) | Some(404)) => {}
            Err(err) => {
                return Err(fail(
                    "sign-in with a bad password",
                    format!("unexpected failure: {err}"),
                ))
            }
            Ok(()) => {
                return Err(EngineError::PreTest(
                    "sign-in succeeded with a wrong password".to_string(),
                ))
            }
        }
        client.set_password(password);

        client
            .signin(ctx)
            .await
            .map_err(|err| fail("sign-in", err.to_string()))?;
        let orders = client
            .get_orders(ctx)
            .await
            .map_err(|err| fail("order listing", err.to_string()))?;
        if !orders.is_empty() {
            return Err(EngineError::PreTest(
                "a freshly created account already has orders".to_string(),
            ));
        }
        client
            .signout(ctx)
            .await
            .map_err(|err| fail("sign-out", err.to_string()))?;
        Ok(())
    }
}
