#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use contact_api::config::{AppConfig, StoreBackend};
use contact_api::database::models::NewUser;
use contact_api::database::{DatabaseManager, PgStore};
use contact_api::state::AppState;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // The in-memory store keeps the suite independent of a running PostgreSQL
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_contact-api"));
        cmd.arg("serve")
            .env("CONTACT_API_PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("STORE_BACKEND", "memory")
            .env("SECURITY_BCRYPT_COST", "4")
            .env("RUST_LOG", "contact_api=warn")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// JSON client bound to the shared server, optionally carrying a bearer token
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    token: Option<String>,
}

impl ApiClient {
    pub async fn anonymous() -> Result<Self> {
        let server = ensure_server().await?;
        Ok(Self {
            base_url: server.base_url.clone(),
            http: reqwest::Client::new(),
            token: None,
        })
    }

    /// Registers a fresh user and logs in as them
    pub async fn user(name: &str) -> Result<(Self, String)> {
        let mut client = Self::anonymous().await?;
        let email = unique_email(name);

        let (status, body) = client
            .post("/auth/register", json!({"name": name, "email": email, "password": "secret123"}))
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "register failed: {} {}", status, body);

        let (status, body) = client
            .post("/auth/login", json!({"email": email, "password": "secret123"}))
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed: {} {}", status, body);

        let token = body["data"]["token"].as_str().context("login returned no token")?;
        client.token = Some(token.to_string());
        Ok((client, email))
    }

    pub fn with_token(&self, token: &str) -> Self {
        Self {
            base_url: self.base_url.clone(),
            http: self.http.clone(),
            token: Some(token.to_string()),
        }
    }

    pub async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut request = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    pub async fn get(&self, path: &str) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(StatusCode, Value)> {
        self.send(Method::DELETE, path, None).await
    }

    /// Creates a contact and returns its id
    pub async fn contact(&self, name: &str) -> Result<String> {
        let (status, body) = self
            .post(
                "/user/contacts",
                json!({"name": name, "email": unique_email(name), "phone": "555-0100"}),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create contact failed: {} {}", status, body);
        id_of(&body)
    }

    /// Creates a tag and returns its id
    pub async fn tag(&self, name: &str) -> Result<String> {
        let (status, body) = self.post("/user/tags", json!({"name": name})).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create tag failed: {} {}", status, body);
        id_of(&body)
    }
}

pub fn unique_email(name: &str) -> String {
    format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4().simple())
}

pub fn id_of(body: &Value) -> Result<String> {
    body["data"]["id"]
        .as_str()
        .map(str::to_string)
        .context("response has no data.id")
}

static SCHEMA_READY: Lazy<tokio::sync::Mutex<bool>> = Lazy::new(|| tokio::sync::Mutex::new(false));

/// Services over a `PgStore` when `DATABASE_URL` is set (read from `.env`
/// too), `None` otherwise so PostgreSQL tests can skip.
pub async fn pg_state() -> Result<Option<AppState>> {
    let _ = dotenvy::dotenv();
    let Some(url) = std::env::var("DATABASE_URL").ok().filter(|u| !u.trim().is_empty()) else {
        eprintln!("DATABASE_URL not set, skipping PostgreSQL store tests");
        return Ok(None);
    };

    let mut config = AppConfig::development();
    config.database.backend = StoreBackend::Postgres;
    config.database.url = Some(url);
    config.database.max_connections = 4;
    config.security.bcrypt_cost = 4;

    let pool = DatabaseManager::connect(&config.database).await?;
    {
        // Concurrent CREATE ... IF NOT EXISTS can still collide, so migrate once
        let mut ready = SCHEMA_READY.lock().await;
        if !*ready {
            DatabaseManager::migrate(&pool).await?;
            *ready = true;
        }
    }

    let state = AppState::new(Arc::new(PgStore::new(pool)), &config)?;
    Ok(Some(state))
}

/// Inserts a user with a unique email straight into the store
pub async fn pg_user(state: &AppState, name: &str) -> Result<Uuid> {
    let user = state
        .store
        .insert_user(NewUser {
            name: name.to_string(),
            email: unique_email(name),
            password_hash: "unused".to_string(),
        })
        .await?;
    Ok(user.id)
}
