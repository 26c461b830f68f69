//! Storage ports consumed by the services.
//!
//! `PgStore` backs them with Postgres; `MemoryStore` keeps everything in
//! process for tests and local tooling.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::manager::DatabaseError;
use super::models::{
    Application, ApplicationId, Location, LocationId, NewApplication, NewLocation, NewUser, Role, RoleId, User,
    UserId,
};

#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Every location that is not soft-deleted, newest first
    /// (`created_at DESC, id DESC`).
    async fn load_locations(&self) -> Result<Vec<Location>, DatabaseError>;

    /// A live location by id
    async fn find_location(&self, id: LocationId) -> Result<Option<Location>, DatabaseError>;

    async fn insert_location(
        &self,
        draft: &NewLocation,
        created_by: Option<UserId>,
    ) -> Result<Location, DatabaseError>;

    /// Persist every mutable column of `location`, stamping `updated_at`
    async fn update_location(&self, location: &Location) -> Result<Location, DatabaseError>;

    async fn soft_delete_location(
        &self,
        id: LocationId,
        deleted_by: Option<UserId>,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait AccessStore: Send + Sync {
    /// A live (not soft-deleted) user by id
    async fn find_user(&self, id: UserId) -> Result<Option<User>, DatabaseError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    async fn insert_user(&self, user: &NewUser) -> Result<User, DatabaseError>;

    /// Roles mapped to the user, ordered by role id
    async fn roles_for_user(&self, user_id: UserId) -> Result<Vec<Role>, DatabaseError>;

    async fn list_roles(&self) -> Result<Vec<Role>, DatabaseError>;

    /// Drop every mapping for the user and insert `role_ids`, atomically
    async fn replace_user_roles(
        &self,
        user_id: UserId,
        role_ids: &[RoleId],
    ) -> Result<(), DatabaseError>;

    /// Distinct applications granted to any of `role_ids`, ordered by id
    async fn permitted_applications(
        &self,
        role_ids: &[RoleId],
    ) -> Result<Vec<Application>, DatabaseError>;

    /// Find by name or create; the flag reports whether a row was inserted
    async fn ensure_application(
        &self,
        app: &NewApplication,
    ) -> Result<(Application, bool), DatabaseError>;

    async fn ensure_role(&self, role_name: &str) -> Result<(Role, bool), DatabaseError>;

    async fn ensure_permission(
        &self,
        role_id: RoleId,
        application_id: ApplicationId,
    ) -> Result<bool, DatabaseError>;

    async fn ensure_user_role(&self, user_id: UserId, role_id: RoleId) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> Result<(), DatabaseError>;
}
