//! Shared fixtures for sync integration tests: an in-memory store and a
//! stub registry that remembers the clients it was sent.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use partition_core::error::PartitionResult;
use partition_core::models::tenant::{CreateTenant, Tenant};
use partition_core::queue::Publisher;
use partition_core::repository::TenantRepository;
use partition_db::repository::{SurrealPartitionRepository, SurrealTenantRepository};
use partition_sync::config::SyncConfig;
use partition_sync::registry::{Method, RegistryClient, RegistryResponse};
use serde_json::Value;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

pub type Db = surrealdb::engine::local::Db;

pub const ADMIN_URL: &str = "http://registry.test/admin";

pub fn config() -> SyncConfig {
    SyncConfig {
        registry_admin_url: ADMIN_URL.into(),
        ..Default::default()
    }
}

/// Spin up in-memory DB, run migrations, create a tenant.
pub async fn setup() -> (Surreal<Db>, Tenant) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    partition_db::run_migrations(&db).await.unwrap();

    let tenant = SurrealTenantRepository::new(db.clone())
        .save(Tenant::new(CreateTenant {
            name: "Tenant T".into(),
            ..Default::default()
        }))
        .await
        .unwrap();

    (db, tenant)
}

pub fn partitions(db: &Surreal<Db>) -> SurrealPartitionRepository<Db> {
    SurrealPartitionRepository::new(db.clone())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct RegistryState {
    clients: HashMap<String, Value>,
    calls: Vec<Call>,
    write_failure: Option<(u16, String)>,
    create_response: Option<String>,
}

/// Registry double keyed on `client_id`. POST echoes the stored client
/// with status 201, PUT with 200; unknown ids answer 404.
#[derive(Clone, Default)]
pub struct StubRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl StubRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every POST/PUT answer `status` with `body`.
    pub fn fail_writes(&self, status: u16, body: &str) {
        self.state.lock().unwrap().write_failure = Some((status, body.to_string()));
    }

    /// Replace the POST response body verbatim.
    pub fn respond_to_create_with(&self, body: &str) {
        self.state.lock().unwrap().create_response = Some(body.to_string());
    }

    pub fn insert_client(&self, client_id: &str, client: Value) {
        self.state
            .lock()
            .unwrap()
            .clients
            .insert(client_id.to_string(), client);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn methods(&self) -> Vec<Method> {
        self.calls().into_iter().map(|c| c.method).collect()
    }

    pub fn client(&self, client_id: &str) -> Option<Value> {
        self.state.lock().unwrap().clients.get(client_id).cloned()
    }

    pub fn client_count(&self) -> usize {
        self.state.lock().unwrap().clients.len()
    }

    fn respond(&self, method: Method, url: &str, body: Option<&Value>) -> RegistryResponse {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call {
            method,
            url: url.to_string(),
            body: body.cloned(),
        });

        let collection = format!("{ADMIN_URL}/clients");
        let client_id = url
            .strip_prefix(&collection)
            .map(|rest| rest.trim_start_matches('/').to_string())
            .unwrap_or_default();

        if matches!(method, Method::Post | Method::Put) {
            if let Some((status, body)) = state.write_failure.clone() {
                return reply(status, body);
            }
        }

        match method {
            Method::Get => match state.clients.get(&client_id) {
                Some(client) => reply(200, client.to_string()),
                None => reply(404, r#"{"error":"not_found"}"#.into()),
            },
            Method::Post => {
                let client = body.cloned().unwrap_or(Value::Null);
                let id = client["client_id"].as_str().unwrap_or_default().to_string();
                if state.clients.contains_key(&id) {
                    return reply(409, r#"{"error":"conflict"}"#.into());
                }
                state.clients.insert(id, client.clone());
                match state.create_response.clone() {
                    Some(body) => reply(201, body),
                    None => reply(201, client.to_string()),
                }
            }
            Method::Put => {
                if !state.clients.contains_key(&client_id) {
                    return reply(404, r#"{"error":"not_found"}"#.into());
                }
                let mut client = body.cloned().unwrap_or(Value::Null);
                client["client_id"] = Value::String(client_id.clone());
                state.clients.insert(client_id, client.clone());
                reply(200, client.to_string())
            }
            Method::Delete => match state.clients.remove(&client_id) {
                Some(_) => reply(204, String::new()),
                None => reply(404, r#"{"error":"not_found"}"#.into()),
            },
        }
    }
}

fn reply(status: u16, body: String) -> RegistryResponse {
    RegistryResponse {
        status,
        body: body.into_bytes(),
    }
}

impl RegistryClient for StubRegistry {
    async fn invoke(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> PartitionResult<RegistryResponse> {
        Ok(self.respond(method, url, body))
    }
}

/// Publisher that keeps every message in memory.
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    messages: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl RecordingPublisher {
    pub fn messages(&self) -> Vec<(String, Vec<u8>)> {
        self.messages.lock().unwrap().clone()
    }
}

impl Publisher for RecordingPublisher {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> PartitionResult<()> {
        self.messages
            .lock()
            .unwrap()
            .push((topic.to_string(), payload));
        Ok(())
    }
}
