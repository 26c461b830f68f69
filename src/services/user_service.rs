use std::sync::Arc;
use tracing::{debug, info};

use crate::database::manager::DatabaseError;
use crate::database::models::{Role, RoleId, User, UserId};
use crate::database::store::AccessStore;
use crate::services::menu::{build_menu, MenuItem};

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("User with ID {0} not found")]
    NotFound(UserId),
    #[error("Unknown roles: {}", .0.join(", "))]
    UnknownRoles(Vec<String>),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Role assignment and role-filtered menu resolution.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn AccessStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn AccessStore>) -> Self {
        Self { store }
    }

    async fn require_user(&self, user_id: UserId) -> Result<User, UserError> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or(UserError::NotFound(user_id))
    }

    /// The navigation menu visible to `user_id`.
    ///
    /// Unknown or soft-deleted users are `NotFound`; a known user without any
    /// role gets an empty menu.
    pub async fn get_user_menu(&self, user_id: UserId) -> Result<Vec<MenuItem>, UserError> {
        self.require_user(user_id).await?;

        let role_ids: Vec<RoleId> = self
            .store
            .roles_for_user(user_id)
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();
        if role_ids.is_empty() {
            debug!("User {} has no roles; empty menu", user_id);
            return Ok(vec![]);
        }

        let granted = self.store.permitted_applications(&role_ids).await?;
        debug!(
            "User {} holds roles {:?} granting {} applications",
            user_id,
            role_ids,
            granted.len()
        );
        Ok(build_menu(&granted))
    }

    pub async fn user_roles(&self, user_id: UserId) -> Result<Vec<Role>, UserError> {
        self.require_user(user_id).await?;
        Ok(self.store.roles_for_user(user_id).await?)
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, UserError> {
        Ok(self.store.list_roles().await?)
    }

    /// Replace the user's roles with `role_names` (matched case-insensitively).
    /// Any unknown name aborts the whole assignment; an empty list clears
    /// every role.
    pub async fn assign_roles(&self, user_id: UserId, role_names: &[String]) -> Result<Vec<Role>, UserError> {
        self.require_user(user_id).await?;

        let all_roles = self.store.list_roles().await?;
        let mut selected: Vec<Role> = Vec::new();
        let mut unknown = Vec::new();
        for name in role_names {
            match all_roles.iter().find(|r| r.is_named(name)) {
                Some(role) if !selected.iter().any(|s| s.id == role.id) => selected.push(role.clone()),
                Some(_) => {}
                None => unknown.push(name.clone()),
            }
        }
        if !unknown.is_empty() {
            return Err(UserError::UnknownRoles(unknown));
        }

        selected.sort_by_key(|r| r.id);
        let role_ids: Vec<RoleId> = selected.iter().map(|r| r.id).collect();
        self.store.replace_user_roles(user_id, &role_ids).await?;

        info!(
            "Assigned roles [{}] to user {}",
            selected.iter().map(|r| r.role_name.as_str()).collect::<Vec<_>>().join(", "),
            user_id
        );
        Ok(selected)
    }
}
