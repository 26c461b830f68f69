//! PgStore against a real database. Each test works in its own schema and
//! drops it afterwards. Skipped when DATABASE_URL is not set.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Executor;

use certdesk_api::app::AppState;
use certdesk_api::config;
use certdesk_api::database::models::{LocationPatch, NewLocation, NewUser};
use certdesk_api::database::{AccessStore, LocationStore, PgStore};
use certdesk_api::services::{LocationError, UserError};

const SCHEMA_SQL: &str = include_str!("../sql/schema.sql");

struct TestDb {
    admin: PgPool,
    schema: String,
    store: Arc<PgStore>,
    state: AppState,
}

impl TestDb {
    async fn open(tag: &str) -> Result<Option<Self>> {
        let _ = dotenvy::dotenv();
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping {}", tag);
            return Ok(None);
        };

        let schema = format!("certdesk_test_{}_{}", tag, std::process::id());
        let admin = PgPool::connect(&url).await?;
        admin
            .execute(format!("DROP SCHEMA IF EXISTS {schema} CASCADE; CREATE SCHEMA {schema}").as_str())
            .await?;

        let search_path = format!("SET search_path TO {schema}");
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .after_connect(move |conn, _meta| {
                let search_path = search_path.clone();
                Box::pin(async move {
                    conn.execute(search_path.as_str()).await?;
                    Ok(())
                })
            })
            .connect(&url)
            .await?;
        pool.execute(SCHEMA_SQL).await.context("applying sql/schema.sql")?;

        let store = Arc::new(PgStore::new(pool));
        let state = AppState::new(store.clone());
        Ok(Some(Self {
            admin,
            schema,
            store,
            state,
        }))
    }

    async fn close(self) -> Result<()> {
        self.admin
            .execute(format!("DROP SCHEMA IF EXISTS {} CASCADE", self.schema).as_str())
            .await?;
        Ok(())
    }
}

#[tokio::test]
async fn plant_scenario_round_trips_through_postgres() -> Result<()> {
    let Some(db) = TestDb::open("plant").await? else {
        return Ok(());
    };
    let locations = &db.state.locations;

    let plant = locations
        .create(
            NewLocation {
                latitude: Some(18.52),
                longitude: Some(73.85),
                city: Some("Pune".to_string()),
                ..NewLocation::named("Plant A", None)
            },
            None,
        )
        .await?;
    let line = locations.create(NewLocation::named("Line 1", Some(plant.id)), None).await?;
    let station = locations.create(NewLocation::named("Station 1", Some(line.id)), None).await?;

    let roots = locations.find_root_locations().await?;
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].id, plant.id);

    let descendants: Vec<_> = locations
        .get_location_descendants(plant.id)
        .await?
        .into_iter()
        .map(|l| l.id)
        .collect();
    assert_eq!(descendants, vec![line.id, station.id]);

    let ancestors: Vec<_> = locations
        .get_location_ancestors(station.id)
        .await?
        .into_iter()
        .map(|l| l.id)
        .collect();
    assert_eq!(ancestors, vec![line.id, plant.id]);

    let detail = locations.find_one(station.id).await?;
    assert_eq!(detail.full_location_path, "Plant A > Line 1 > Station 1");

    let boxed = locations.within_bounds(19.0, 74.0, 18.0, 73.0).await?;
    assert_eq!(boxed.len(), 1);

    // Every column goes through the UPDATE, including explicit clears
    let patch: LocationPatch = serde_json::from_value(serde_json::json!({
        "description": "Main plant",
        "latitude": null,
        "company_id": 7
    }))?;
    let updated = locations.update(plant.id, patch, None).await?;
    assert_eq!(updated.description.as_deref(), Some("Main plant"));
    assert_eq!(updated.latitude, None);
    assert_eq!(updated.longitude, Some(73.85));
    assert_eq!(updated.company_id, Some(7));
    assert_eq!(updated.city.as_deref(), Some("Pune"));

    assert!(matches!(
        locations.update(plant.id, LocationPatch::reparent(Some(station.id)), None).await,
        Err(LocationError::CycleDetected { .. })
    ));
    assert!(matches!(
        locations.remove(line.id, None).await,
        Err(LocationError::HasChildren(_))
    ));

    locations.remove(station.id, None).await?;
    assert!(db.store.find_location(station.id).await?.is_none());
    assert_eq!(db.store.load_locations().await?.len(), 2);

    db.close().await
}

#[tokio::test]
async fn seeding_twice_is_idempotent_on_postgres() -> Result<()> {
    let Some(db) = TestDb::open("seed").await? else {
        return Ok(());
    };

    let first = db.state.seeder().run().await?;
    assert_eq!(first.applications, 9);
    assert_eq!(first.roles, 3);
    assert_eq!(first.users, 1);

    let second = db.state.seeder().run().await?;
    assert!(second.is_empty(), "unexpected inserts: {:?}", second);

    // Case-insensitive role names resolve to the seeded row
    let (role, created) = db.store.ensure_role("administrator").await?;
    assert!(!created);
    assert_eq!(role.role_name, "Administrator");

    let admin = db
        .store
        .find_user_by_email(&config::config().seed.admin_email.to_uppercase())
        .await?
        .context("seeded admin missing")?;
    let menu = db.state.users.get_user_menu(admin.id).await?;
    let top: Vec<&str> = menu.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(top, vec!["Setup", "Certification", "Audit"]);

    db.close().await
}

#[tokio::test]
async fn role_replacement_is_transactional_on_postgres() -> Result<()> {
    let Some(db) = TestDb::open("roles").await? else {
        return Ok(());
    };
    db.state.seeder().run().await?;
    let users = &db.state.users;

    let user = db
        .store
        .insert_user(&NewUser {
            email: "ops@certdesk.local".to_string(),
            password_hash: String::new(),
            first_name: None,
            last_name: None,
        })
        .await?;

    let assigned = users
        .assign_roles(user.id, &["manager".to_string(), "User".to_string(), "USER".to_string()])
        .await?;
    let names: Vec<&str> = assigned.iter().map(|r| r.role_name.as_str()).collect();
    assert_eq!(names, vec!["Manager", "User"]);
    assert!(users.get_user_menu(user.id).await?.is_empty());

    users.assign_roles(user.id, &["Administrator".to_string()]).await?;
    assert_eq!(users.user_roles(user.id).await?.len(), 1);
    assert_eq!(users.get_user_menu(user.id).await?.len(), 3);

    assert!(matches!(
        users.assign_roles(user.id, &["Auditor".to_string()]).await,
        Err(UserError::UnknownRoles(_))
    ));
    assert_eq!(users.user_roles(user.id).await?[0].role_name, "Administrator");

    users.assign_roles(user.id, &[]).await?;
    assert!(users.user_roles(user.id).await?.is_empty());
    assert!(users.get_user_menu(user.id).await?.is_empty());

    db.close().await
}
