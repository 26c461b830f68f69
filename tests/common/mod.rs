#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use certdesk_api::app::{router, AppState};
use certdesk_api::auth::{generate_jwt, Claims};
use certdesk_api::config;
use certdesk_api::database::models::{Location, LocationId, NewLocation, NewUser, User};
use certdesk_api::database::{AccessStore, LocationStore, MemoryStore};

/// Router and services over a fresh in-memory store, seeded with the
/// default applications, roles and admin account.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub state: AppState,
    pub router: Router,
    pub admin: User,
}

impl TestApp {
    pub async fn seeded() -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone());
        state.seeder().run().await?;

        let admin = store
            .find_user_by_email(&config::config().seed.admin_email)
            .await?
            .context("seeded admin missing")?;

        Ok(Self {
            router: router(state.clone()),
            store,
            state,
            admin,
        })
    }

    pub async fn add_user(&self, email: &str) -> Result<User> {
        Ok(self
            .store
            .insert_user(&NewUser {
                email: email.to_string(),
                password_hash: String::new(),
                first_name: Some("Test".to_string()),
                last_name: Some("User".to_string()),
            })
            .await?)
    }

    pub async fn add_location(&self, name: &str, parent: Option<LocationId>) -> Result<Location> {
        Ok(self
            .store
            .insert_location(&NewLocation::named(name, parent), Some(self.admin.id))
            .await?)
    }

    /// Plant A > Line 1 > Station 1
    pub async fn plant(&self) -> Result<(Location, Location, Location)> {
        let plant = self.add_location("Plant A", None).await?;
        let line = self.add_location("Line 1", Some(plant.id)).await?;
        let station = self.add_location("Station 1", Some(line.id)).await?;
        Ok((plant, line, station))
    }

    pub fn token_for(&self, user: &User) -> String {
        generate_jwt(&Claims::for_user(user)).expect("token generation")
    }

    pub fn admin_token(&self) -> String {
        self.token_for(&self.admin)
    }

    /// Send a request through the full router; returns status and parsed
    /// body (`Value::Null` when the body is empty).
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).with_context(|| format!("non-JSON body from {}", path))?
        };
        Ok((status, value))
    }

    pub async fn get(&self, path: &str) -> Result<(StatusCode, Value)> {
        let token = self.admin_token();
        self.send(Method::GET, path, Some(&token), None).await
    }
}

pub fn names(values: &Value) -> Vec<String> {
    values
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["location_name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
