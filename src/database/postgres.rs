use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;

use super::manager::{DatabaseError, DatabaseManager};
use super::models::{
    Application, ApplicationId, Lifecycle, Location, LocationId, NewApplication, NewLocation,
    NewUser, Role, RoleId, User, UserId,
};
use super::store::{AccessStore, HealthCheck, LocationStore};

const LOCATION_COLUMNS: &str = r#"
    id, location_name, location_code, address, city, state, pin_code, country,
    latitude, longitude, location_type, contact_person, contact_number, contact_email,
    description, is_active, parent_location_id, company_id,
    created_by, created_at, updated_by, updated_at, deleted_by, deleted_at
"#;

const USER_COLUMNS: &str = r#"
    id, email, password_hash, first_name, last_name, is_active, last_login_at,
    created_at, deleted_by, deleted_at
"#;

const APPLICATION_COLUMNS: &str = r#"
    id, application_name, parent, is_group, url, icon_image_url, icon_class, area_name
"#;

/// Postgres-backed implementation of every store port
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build a store over the shared pool from `DatabaseManager`
    pub async fn connect() -> Result<Self, DatabaseError> {
        Ok(Self::new(DatabaseManager::pool().await?))
    }
}

// Internal row types for SQLx mapping
#[derive(Debug, FromRow)]
struct LocationRow {
    id: i32,
    location_name: String,
    location_code: Option<String>,
    address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    pin_code: Option<String>,
    country: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    location_type: Option<String>,
    contact_person: Option<String>,
    contact_number: Option<String>,
    contact_email: Option<String>,
    description: Option<String>,
    is_active: bool,
    parent_location_id: Option<i32>,
    company_id: Option<i32>,
    created_by: Option<i32>,
    created_at: DateTime<Utc>,
    updated_by: Option<i32>,
    updated_at: DateTime<Utc>,
    deleted_by: Option<i32>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Location {
            id: row.id,
            location_name: row.location_name,
            location_code: row.location_code,
            address: row.address,
            city: row.city,
            state: row.state,
            pin_code: row.pin_code,
            country: row.country,
            latitude: row.latitude,
            longitude: row.longitude,
            location_type: row.location_type,
            contact_person: row.contact_person,
            contact_number: row.contact_number,
            contact_email: row.contact_email,
            description: row.description,
            is_active: row.is_active,
            parent_location_id: row.parent_location_id,
            company_id: row.company_id,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_by: row.updated_by,
            updated_at: row.updated_at,
            lifecycle: Lifecycle::from_columns(row.deleted_at, row.deleted_by),
        }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i32,
    email: String,
    password_hash: String,
    first_name: Option<String>,
    last_name: Option<String>,
    is_active: bool,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    deleted_by: Option<i32>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            is_active: row.is_active,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
            lifecycle: Lifecycle::from_columns(row.deleted_at, row.deleted_by),
        }
    }
}

#[derive(Debug, FromRow)]
struct ApplicationRow {
    id: i32,
    application_name: String,
    parent: Option<i32>,
    is_group: bool,
    url: Option<String>,
    icon_image_url: Option<String>,
    icon_class: Option<String>,
    area_name: String,
}

impl From<ApplicationRow> for Application {
    fn from(row: ApplicationRow) -> Self {
        Application {
            id: row.id,
            application_name: row.application_name,
            parent: row.parent,
            is_group: row.is_group,
            url: row.url,
            icon_image_url: row.icon_image_url,
            icon_class: row.icon_class,
            area_name: row.area_name,
        }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: i32,
    role_name: String,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Role {
            id: row.id,
            role_name: row.role_name,
        }
    }
}

#[async_trait]
impl LocationStore for PgStore {
    async fn load_locations(&self) -> Result<Vec<Location>, DatabaseError> {
        let query = format!(
            "SELECT {LOCATION_COLUMNS} FROM locations
             WHERE deleted_at IS NULL
             ORDER BY created_at DESC, id DESC"
        );
        let rows: Vec<LocationRow> = sqlx::query_as(&query).fetch_all(&self.pool).await?;
        debug!("Loaded {} live locations", rows.len());
        Ok(rows.into_iter().map(Location::from).collect())
    }

    async fn find_location(&self, id: LocationId) -> Result<Option<Location>, DatabaseError> {
        let query = format!(
            "SELECT {LOCATION_COLUMNS} FROM locations WHERE id = $1 AND deleted_at IS NULL"
        );
        let row: Option<LocationRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Location::from))
    }

    async fn insert_location(
        &self,
        draft: &NewLocation,
        created_by: Option<UserId>,
    ) -> Result<Location, DatabaseError> {
        let query = format!(
            r#"
            INSERT INTO locations (
                location_name, location_code, address, city, state, pin_code, country,
                latitude, longitude, location_type, contact_person, contact_number,
                contact_email, description, is_active, parent_location_id, company_id,
                created_by, updated_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $18)
            RETURNING {LOCATION_COLUMNS}
            "#
        );
        let row: LocationRow = sqlx::query_as(&query)
            .bind(draft.location_name.trim())
            .bind(&draft.location_code)
            .bind(&draft.address)
            .bind(&draft.city)
            .bind(&draft.state)
            .bind(&draft.pin_code)
            .bind(&draft.country)
            .bind(draft.latitude)
            .bind(draft.longitude)
            .bind(&draft.location_type)
            .bind(&draft.contact_person)
            .bind(&draft.contact_number)
            .bind(&draft.contact_email)
            .bind(&draft.description)
            .bind(draft.is_active.unwrap_or(true))
            .bind(draft.parent_location_id)
            .bind(draft.company_id)
            .bind(created_by)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn update_location(&self, location: &Location) -> Result<Location, DatabaseError> {
        let query = format!(
            r#"
            UPDATE locations SET
                location_name = $2, location_code = $3, address = $4, city = $5, state = $6,
                pin_code = $7, country = $8, latitude = $9, longitude = $10,
                location_type = $11, contact_person = $12, contact_number = $13,
                contact_email = $14, description = $15, is_active = $16,
                parent_location_id = $17, company_id = $18, updated_by = $19,
                updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {LOCATION_COLUMNS}
            "#
        );
        let row: Option<LocationRow> = sqlx::query_as(&query)
            .bind(location.id)
            .bind(&location.location_name)
            .bind(&location.location_code)
            .bind(&location.address)
            .bind(&location.city)
            .bind(&location.state)
            .bind(&location.pin_code)
            .bind(&location.country)
            .bind(location.latitude)
            .bind(location.longitude)
            .bind(&location.location_type)
            .bind(&location.contact_person)
            .bind(&location.contact_number)
            .bind(&location.contact_email)
            .bind(&location.description)
            .bind(location.is_active)
            .bind(location.parent_location_id)
            .bind(location.company_id)
            .bind(location.updated_by)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Location::from)
            .ok_or_else(|| DatabaseError::NotFound(format!("Location {} not found", location.id)))
    }

    async fn soft_delete_location(
        &self,
        id: LocationId,
        deleted_by: Option<UserId>,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE locations SET deleted_at = $2, deleted_by = $3
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(at)
        .bind(deleted_by)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Location {} not found", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl AccessStore for PgStore {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, DatabaseError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL");
        let row: Option<UserRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1) AND deleted_at IS NULL"
        );
        let row: Option<UserRow> = sqlx::query_as(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn insert_user(&self, user: &NewUser) -> Result<User, DatabaseError> {
        let query = format!(
            "INSERT INTO users (email, password_hash, first_name, last_name, is_active)
             VALUES ($1, $2, $3, $4, true)
             RETURNING {USER_COLUMNS}"
        );
        let row: UserRow = sqlx::query_as(&query)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn roles_for_user(&self, user_id: UserId) -> Result<Vec<Role>, DatabaseError> {
        let rows: Vec<RoleRow> = sqlx::query_as(
            "SELECT DISTINCT r.id, r.role_name
             FROM roles r
             JOIN user_role_mappings m ON m.role_id = r.id
             WHERE m.user_id = $1
             ORDER BY r.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn list_roles(&self) -> Result<Vec<Role>, DatabaseError> {
        let rows: Vec<RoleRow> = sqlx::query_as("SELECT id, role_name FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn replace_user_roles(
        &self,
        user_id: UserId,
        role_ids: &[RoleId],
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_role_mappings WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for role_id in role_ids {
            sqlx::query("INSERT INTO user_role_mappings (user_id, role_id) VALUES ($1, $2)")
                .bind(user_id)
                .bind(*role_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn permitted_applications(
        &self,
        role_ids: &[RoleId],
    ) -> Result<Vec<Application>, DatabaseError> {
        if role_ids.is_empty() {
            return Ok(vec![]);
        }
        let query = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications
             WHERE id IN (
                 SELECT application_id FROM role_application_permissions
                 WHERE role_id = ANY($1)
             )
             ORDER BY id"
        );
        let rows: Vec<ApplicationRow> = sqlx::query_as(&query)
            .bind(role_ids.to_vec())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Application::from).collect())
    }

    async fn ensure_application(
        &self,
        app: &NewApplication,
    ) -> Result<(Application, bool), DatabaseError> {
        let query = format!(
            "INSERT INTO applications (application_name, parent, is_group, url, icon_image_url, icon_class, area_name)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (application_name) DO NOTHING
             RETURNING {APPLICATION_COLUMNS}"
        );
        let inserted: Option<ApplicationRow> = sqlx::query_as(&query)
            .bind(&app.application_name)
            .bind(app.parent)
            .bind(app.is_group)
            .bind(&app.url)
            .bind(&app.icon_image_url)
            .bind(&app.icon_class)
            .bind(&app.area_name)
            .fetch_optional(&self.pool)
            .await?;
        if let Some(row) = inserted {
            return Ok((row.into(), true));
        }

        let query = format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE application_name = $1");
        let row: ApplicationRow = sqlx::query_as(&query)
            .bind(&app.application_name)
            .fetch_one(&self.pool)
            .await?;
        Ok((row.into(), false))
    }

    async fn ensure_role(&self, role_name: &str) -> Result<(Role, bool), DatabaseError> {
        let inserted: Option<RoleRow> = sqlx::query_as(
            "INSERT INTO roles (role_name) VALUES ($1)
             ON CONFLICT ((LOWER(role_name))) DO NOTHING
             RETURNING id, role_name",
        )
        .bind(role_name)
        .fetch_optional(&self.pool)
        .await?;
        if let Some(row) = inserted {
            return Ok((row.into(), true));
        }

        let row: RoleRow = sqlx::query_as("SELECT id, role_name FROM roles WHERE LOWER(role_name) = LOWER($1)")
            .bind(role_name)
            .fetch_one(&self.pool)
            .await?;
        Ok((row.into(), false))
    }

    async fn ensure_permission(
        &self,
        role_id: RoleId,
        application_id: ApplicationId,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO role_application_permissions (role_id, application_id)
             VALUES ($1, $2)
             ON CONFLICT (role_id, application_id) DO NOTHING",
        )
        .bind(role_id)
        .bind(application_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ensure_user_role(&self, user_id: UserId, role_id: RoleId) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO user_role_mappings (user_id, role_id)
             VALUES ($1, $2)
             ON CONFLICT (user_id, role_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(role_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl HealthCheck for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
