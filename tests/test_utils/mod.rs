//! Test utilities for database and API testing.
//!
//! Sets up an in-memory SQLite database with all migrations applied, seeds
//! accounts, and drives the router with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{
        Method, Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};
use jobdesk::{
    blob::{BlobError, BlobStore},
    config::AppConfig,
    repositories::{
        DirectoryRepository, ProfileRepository, directory::NewDirectoryEntry,
        profile::NewProfile,
    },
    server::{AppState, create_app},
    session::DbIdentityProvider,
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use serde_json::Value;
use tower::ServiceExt;

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

fn permission_json(permissions: &[(&str, bool)]) -> Value {
    Value::Object(
        permissions
            .iter()
            .map(|(name, granted)| (name.to_string(), Value::Bool(*granted)))
            .collect(),
    )
}

/// Writes a profile document for `uid`.
pub async fn insert_profile(
    db: &DatabaseConnection,
    uid: &str,
    role: &str,
    first_name: Option<&str>,
    permissions: &[(&str, bool)],
) -> Result<()> {
    ProfileRepository::new(db)
        .upsert(NewProfile {
            uid: uid.to_string(),
            email: None,
            first_name: first_name.map(str::to_string),
            last_name: None,
            role: role.to_string(),
            permissions: permission_json(permissions),
        })
        .await?;
    Ok(())
}

/// Adds a short-code directory entry without a profile.
pub async fn insert_directory_entry(
    db: &DatabaseConnection,
    code: &str,
    uid: &str,
    password: &str,
    status: &str,
) -> Result<()> {
    DirectoryRepository::new(db)
        .create(NewDirectoryEntry {
            code: code.to_string(),
            uid: uid.to_string(),
            password: password.to_string(),
            status: status.to_string(),
            display_name: None,
        })
        .await?;
    Ok(())
}

/// Adds an active RM with a directory entry and an `rms` profile.
pub async fn insert_rm(
    db: &DatabaseConnection,
    code: &str,
    password: &str,
    permissions: &[(&str, bool)],
) -> Result<String> {
    let uid = format!("uid-{}", code.to_lowercase());
    insert_directory_entry(db, code, &uid, password, "active").await?;
    insert_profile(db, &uid, "rms", Some(code), permissions).await?;
    Ok(uid)
}

/// Adds a provider account and a `superadmin` profile.
pub async fn insert_superadmin(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
    permissions: &[(&str, bool)],
) -> Result<String> {
    let uid = DbIdentityProvider::new(db.clone())
        .ensure_account(email, password)
        .await?;
    insert_profile(db, &uid, "superadmin", Some("Admin"), permissions).await?;
    Ok(uid)
}

/// Blob store that records deletions instead of performing them.
#[derive(Debug, Default)]
pub struct RecordingBlobStore {
    deleted: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingBlobStore {
    pub fn failing() -> Self {
        Self {
            deleted: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobStore for RecordingBlobStore {
    async fn delete(&self, document_url: &str) -> Result<(), BlobError> {
        self.deleted.lock().unwrap().push(document_url.to_string());
        if self.fail {
            return Err(BlobError::Status(500));
        }
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub blobs: Arc<RecordingBlobStore>,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        Self::with_blob_store(RecordingBlobStore::default()).await
    }

    pub async fn with_blob_store(blobs: RecordingBlobStore) -> Result<Self> {
        let db = setup_test_db().await?;
        let blobs = Arc::new(blobs);
        let state = AppState::new(AppConfig::default(), db)?.with_blob_store(blobs.clone());
        Ok(Self {
            router: create_app(state.clone()),
            state,
            blobs,
        })
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.state.db
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    pub async fn try_login(&self, identifier: &str, password: &str) -> (StatusCode, Value) {
        let body = serde_json::json!({ "identifier": identifier, "password": password });
        self.request(Method::POST, "/api/v1/auth/login", None, Some(body))
            .await
    }

    /// Logs in and returns the bearer token, panicking on failure.
    pub async fn login(&self, identifier: &str, password: &str) -> String {
        let (status, body) = self.try_login(identifier, password).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }
}

/// A minimal valid job form.
pub fn job_form(shipment_type: &str, shipper: &str) -> Value {
    serde_json::json!({
        "shipmentType": shipment_type,
        "mode": "Sea",
        "shipperDetails": shipper,
        "consigneeDetails": "ACME IMPORTS",
        "portOfLoading": "NHAVA SHEVA",
        "containerFlightNumbers": ["MSCU1234567", "", "MSCU7654321"]
    })
}
