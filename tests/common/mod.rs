#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use athlete_metrics_api::{app, auth::TokenService, AppState};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};

pub const TEST_SECRET: &str = "integration-secret";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: Client,
}

impl TestServer {
    /// Boots the router over a fresh in-memory store on an unused port
    pub async fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        let state = AppState::in_memory(TokenService::new(TEST_SECRET, 24));

        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        let server = Self {
            port,
            base_url,
            client: Client::new(),
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(token)
    }

    pub fn post(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(token)
    }

    pub fn put(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.put(self.url(path)).bearer_auth(token)
    }

    pub fn delete(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(token)
    }

    /// Registers a user and returns (token, user json)
    pub async fn register(&self, email: &str, name: &str, role: &str) -> Result<(String, Value)> {
        let res = self
            .client
            .post(self.url("/auth/register"))
            .json(&profile(email, name, Some(role)))
            .send()
            .await?;
        anyhow::ensure!(
            res.status() == StatusCode::CREATED,
            "register {} failed with {}",
            email,
            res.status()
        );

        let body: Value = res.json().await?;
        let token = body["token"]
            .as_str()
            .context("register response has no token")?
            .to_string();
        Ok((token, body["user"].clone()))
    }
}

pub fn profile(email: &str, name: &str, role: Option<&str>) -> Value {
    let mut body = json!({
        "email": email,
        "password": "correct-horse",
        "name": name,
        "gender": "female",
        "age": 27,
        "country": "Portugal"
    });
    if let Some(role) = role {
        body["role"] = json!(role);
    }
    body
}
