//! In-process store used by the test suites and for local experiments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::manager::DatabaseError;
use super::models::{
    Application, ApplicationId, Lifecycle, Location, LocationId, NewApplication, NewLocation,
    NewUser, Role, RoleId, User, UserId,
};
use super::store::{AccessStore, HealthCheck, LocationStore};

#[derive(Default)]
struct MemoryState {
    locations: Vec<Location>,
    users: Vec<User>,
    roles: Vec<Role>,
    applications: Vec<Application>,
    permissions: BTreeSet<(RoleId, ApplicationId)>,
    user_roles: BTreeSet<(UserId, RoleId)>,
    next_id: i32,
}

impl MemoryState {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Soft-delete a user directly; there is no service-level operation for it.
    pub async fn soft_delete_user(&self, id: UserId, deleted_by: Option<UserId>) {
        let mut state = self.state.write().await;
        if let Some(user) = state.users.iter_mut().find(|u| u.id == id) {
            user.lifecycle = Lifecycle::SoftDeleted {
                at: Utc::now(),
                by: deleted_by,
            };
        }
    }
}

#[async_trait]
impl LocationStore for MemoryStore {
    async fn load_locations(&self) -> Result<Vec<Location>, DatabaseError> {
        let state = self.state.read().await;
        let mut live: Vec<Location> = state
            .locations
            .iter()
            .filter(|l| l.lifecycle.is_active())
            .cloned()
            .collect();
        live.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(live)
    }

    async fn find_location(&self, id: LocationId) -> Result<Option<Location>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .locations
            .iter()
            .find(|l| l.id == id && l.lifecycle.is_active())
            .cloned())
    }

    async fn insert_location(
        &self,
        draft: &NewLocation,
        created_by: Option<UserId>,
    ) -> Result<Location, DatabaseError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let location = Location {
            id: state.next_id(),
            location_name: draft.location_name.trim().to_string(),
            location_code: draft.location_code.clone(),
            address: draft.address.clone(),
            city: draft.city.clone(),
            state: draft.state.clone(),
            pin_code: draft.pin_code.clone(),
            country: draft.country.clone(),
            latitude: draft.latitude,
            longitude: draft.longitude,
            location_type: draft.location_type.clone(),
            contact_person: draft.contact_person.clone(),
            contact_number: draft.contact_number.clone(),
            contact_email: draft.contact_email.clone(),
            description: draft.description.clone(),
            is_active: draft.is_active.unwrap_or(true),
            parent_location_id: draft.parent_location_id,
            company_id: draft.company_id,
            created_by,
            created_at: now,
            updated_by: created_by,
            updated_at: now,
            lifecycle: Lifecycle::Active,
        };
        state.locations.push(location.clone());
        Ok(location)
    }

    async fn update_location(&self, location: &Location) -> Result<Location, DatabaseError> {
        let mut state = self.state.write().await;
        let stored = state
            .locations
            .iter_mut()
            .find(|l| l.id == location.id && l.lifecycle.is_active())
            .ok_or_else(|| DatabaseError::NotFound(format!("Location {} not found", location.id)))?;

        let created_by = stored.created_by;
        let created_at = stored.created_at;
        *stored = Location {
            created_by,
            created_at,
            updated_at: Utc::now(),
            lifecycle: Lifecycle::Active,
            ..location.clone()
        };
        Ok(stored.clone())
    }

    async fn soft_delete_location(
        &self,
        id: LocationId,
        deleted_by: Option<UserId>,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let mut state = self.state.write().await;
        let stored = state
            .locations
            .iter_mut()
            .find(|l| l.id == id && l.lifecycle.is_active())
            .ok_or_else(|| DatabaseError::NotFound(format!("Location {} not found", id)))?;
        stored.lifecycle = Lifecycle::SoftDeleted { at, by: deleted_by };
        Ok(())
    }
}

#[async_trait]
impl AccessStore for MemoryStore {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.id == id && u.lifecycle.is_active())
            .cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email) && u.lifecycle.is_active())
            .cloned())
    }

    async fn insert_user(&self, user: &NewUser) -> Result<User, DatabaseError> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(DatabaseError::QueryError(format!(
                "duplicate email: {}",
                user.email
            )));
        }
        let user = User {
            id: state.next_id(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
            lifecycle: Lifecycle::Active,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn roles_for_user(&self, user_id: UserId) -> Result<Vec<Role>, DatabaseError> {
        let state = self.state.read().await;
        let mut roles: Vec<Role> = state
            .roles
            .iter()
            .filter(|r| state.user_roles.contains(&(user_id, r.id)))
            .cloned()
            .collect();
        roles.sort_by_key(|r| r.id);
        Ok(roles)
    }

    async fn list_roles(&self) -> Result<Vec<Role>, DatabaseError> {
        let state = self.state.read().await;
        let mut roles = state.roles.clone();
        roles.sort_by_key(|r| r.id);
        Ok(roles)
    }

    async fn replace_user_roles(
        &self,
        user_id: UserId,
        role_ids: &[RoleId],
    ) -> Result<(), DatabaseError> {
        let mut state = self.state.write().await;
        state.user_roles.retain(|(user, _)| *user != user_id);
        for role_id in role_ids {
            state.user_roles.insert((user_id, *role_id));
        }
        Ok(())
    }

    async fn permitted_applications(
        &self,
        role_ids: &[RoleId],
    ) -> Result<Vec<Application>, DatabaseError> {
        let state = self.state.read().await;
        let granted: BTreeSet<ApplicationId> = state
            .permissions
            .iter()
            .filter(|(role, _)| role_ids.contains(role))
            .map(|(_, app)| *app)
            .collect();
        let mut apps: Vec<Application> = state
            .applications
            .iter()
            .filter(|a| granted.contains(&a.id))
            .cloned()
            .collect();
        apps.sort_by_key(|a| a.id);
        Ok(apps)
    }

    async fn ensure_application(
        &self,
        app: &NewApplication,
    ) -> Result<(Application, bool), DatabaseError> {
        let mut state = self.state.write().await;
        if let Some(existing) = state
            .applications
            .iter()
            .find(|a| a.application_name == app.application_name)
        {
            return Ok((existing.clone(), false));
        }
        let created = Application {
            id: state.next_id(),
            application_name: app.application_name.clone(),
            parent: app.parent,
            is_group: app.is_group,
            url: app.url.clone(),
            icon_image_url: app.icon_image_url.clone(),
            icon_class: app.icon_class.clone(),
            area_name: app.area_name.clone(),
        };
        state.applications.push(created.clone());
        Ok((created, true))
    }

    async fn ensure_role(&self, role_name: &str) -> Result<(Role, bool), DatabaseError> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.roles.iter().find(|r| r.is_named(role_name)) {
            return Ok((existing.clone(), false));
        }
        let created = Role {
            id: state.next_id(),
            role_name: role_name.to_string(),
        };
        state.roles.push(created.clone());
        Ok((created, true))
    }

    async fn ensure_permission(
        &self,
        role_id: RoleId,
        application_id: ApplicationId,
    ) -> Result<bool, DatabaseError> {
        let mut state = self.state.write().await;
        Ok(state.permissions.insert((role_id, application_id)))
    }

    async fn ensure_user_role(&self, user_id: UserId, role_id: RoleId) -> Result<bool, DatabaseError> {
        let mut state = self.state.write().await;
        Ok(state.user_roles.insert((user_id, role_id)))
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
