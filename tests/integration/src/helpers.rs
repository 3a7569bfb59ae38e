//! Test helpers for integration tests
//!
//! [`TestServer`] runs the full application (middleware, sweeper, local event
//! bus, in-process store) on `127.0.0.1:0` and stops it when dropped.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    tungstenite::{client::IntoClientRequest, http::HeaderValue},
    MaybeTlsStream, WebSocketStream,
};
use vibe_api::Server;
use vibe_common::{AppConfig, JwtService, MatchSettings};
use vibe_core::UserId;

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

pub type EventSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A caller with a valid access token
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: UserId,
    pub token: String,
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    jwt: JwtService,
    shutdown: Option<oneshot::Sender<()>>,
    _handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        Self::start_with_settings(MatchSettings::default()).await
    }

    pub async fn start_with_settings(settings: MatchSettings) -> Result<Self> {
        Self::start_with_config(test_config(settings)).await
    }

    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        let jwt = JwtService::new(
            &config.jwt.secret,
            config.jwt.audience.clone(),
            config.jwt.access_token_expiry,
        );

        let server = Server::bind(config).await?;
        let addr = server.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let stop = async {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = server.serve(stop).await {
                eprintln!("test server failed: {e}");
            }
        });

        let client = Client::builder().timeout(Duration::from_secs(40)).build()?;

        Ok(Self {
            addr,
            client,
            jwt,
            shutdown: Some(shutdown_tx),
            _handle: handle,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// A fresh identity with a token the server accepts
    pub fn user(&self) -> Result<TestUser> {
        let id = UserId::random();
        let token = self.jwt.issue_access_token(id)?;
        Ok(TestUser { id, token })
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        Ok(self.client.get(self.url(path)).send().await?)
    }

    pub async fn get_auth(&self, path: &str, user: &TestUser) -> Result<Response> {
        Ok(self
            .client
            .get(self.url(path))
            .bearer_auth(&user.token)
            .send()
            .await?)
    }

    pub async fn post_auth<T: Serialize>(
        &self,
        path: &str,
        user: &TestUser,
        body: &T,
    ) -> Result<Response> {
        Ok(self
            .client
            .post(self.url(path))
            .bearer_auth(&user.token)
            .json(body)
            .send()
            .await?)
    }

    /// POST without a body, for action endpoints
    pub async fn act(&self, path: &str, user: &TestUser) -> Result<Response> {
        Ok(self
            .client
            .post(self.url(path))
            .bearer_auth(&user.token)
            .send()
            .await?)
    }

    pub async fn delete_auth(&self, path: &str, user: &TestUser) -> Result<Response> {
        Ok(self
            .client
            .delete(self.url(path))
            .bearer_auth(&user.token)
            .send()
            .await?)
    }

    /// Open the caller's match event socket
    pub async fn events(&self, user: &TestUser) -> Result<EventSocket> {
        let mut request = format!("ws://{}/api/v1/match/events", self.addr).into_client_request()?;
        request.headers_mut().insert(
            "Authorization",
            HeaderValue::from_str(&format!("Bearer {}", user.token))?,
        );
        let (socket, _) = tokio_tungstenite::connect_async(request).await?;
        Ok(socket)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Standalone configuration with a limiter loose enough for test bursts
pub fn test_config(settings: MatchSettings) -> AppConfig {
    let mut config = AppConfig::standalone(0, TEST_JWT_SECRET);
    config.rate_limit.requests_per_second = 1000;
    config.rate_limit.burst = 1000;
    config.matching = settings;
    config
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(
    response: Response,
    expected_status: StatusCode,
) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!("Expected status {expected_status}, got {status}. Body: {body}");
    }
    Ok(response.json().await?)
}

/// Assert response status without parsing body
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!("Expected status {expected_status}, got {status}. Body: {body}");
    }
    Ok(())
}
