use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::database::manager::DatabaseError;
use crate::database::models::{Location, LocationId, LocationPatch, LocationQuery, NewLocation, UserId};
use crate::database::store::LocationStore;
use crate::services::location_tree::{LocationNode, LocationTree};

#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location with ID {0} not found")]
    NotFound(LocationId),
    #[error("Parent location with ID {0} not found")]
    ParentNotFound(LocationId),
    #[error("Location {location} cannot be moved under {parent}: it would become its own ancestor")]
    CycleDetected {
        location: LocationId,
        parent: LocationId,
    },
    #[error("Location {0} still has child locations")]
    HasChildren(LocationId),
    #[error("Invalid location data")]
    Validation(HashMap<String, String>),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// A single location together with its root-to-node path label.
#[derive(Debug, Clone, Serialize)]
pub struct LocationDetail {
    #[serde(flatten)]
    pub location: Location,
    pub full_location_path: String,
}

/// Location administration plus the hierarchy queries.
///
/// Every read loads the live forest once and answers from the in-memory
/// index, so one request costs one round-trip regardless of tree depth.
#[derive(Clone)]
pub struct LocationService {
    store: Arc<dyn LocationStore>,
}

impl LocationService {
    pub fn new(store: Arc<dyn LocationStore>) -> Self {
        Self { store }
    }

    async fn tree(&self) -> Result<LocationTree, LocationError> {
        Ok(LocationTree::build(self.store.load_locations().await?))
    }

    pub async fn find_root_locations(&self) -> Result<Vec<Location>, LocationError> {
        let tree = self.tree().await?;
        Ok(tree.roots().into_iter().cloned().collect())
    }

    pub async fn find_child_locations(&self, parent_id: LocationId) -> Result<Vec<Location>, LocationError> {
        let tree = self.tree().await?;
        Ok(tree.children(parent_id).into_iter().cloned().collect())
    }

    pub async fn get_location_descendants(&self, id: LocationId) -> Result<Vec<Location>, LocationError> {
        let tree = self.tree().await?;
        let found = tree.descendants(id).ok_or(LocationError::NotFound(id))?;
        Ok(found.into_iter().cloned().collect())
    }

    /// Nearest parent first, root last.
    pub async fn get_location_ancestors(&self, id: LocationId) -> Result<Vec<Location>, LocationError> {
        let tree = self.tree().await?;
        let chain = tree.ancestors(id).ok_or(LocationError::NotFound(id))?;
        Ok(chain.into_iter().cloned().collect())
    }

    pub async fn get_location_hierarchy(&self) -> Result<Vec<LocationNode>, LocationError> {
        Ok(self.tree().await?.hierarchy())
    }

    pub async fn find_one(&self, id: LocationId) -> Result<LocationDetail, LocationError> {
        let tree = self.tree().await?;
        let location = tree.get(id).cloned().ok_or(LocationError::NotFound(id))?;
        let full_location_path = tree.full_path(id).unwrap_or_else(|| location.location_name.clone());
        Ok(LocationDetail {
            location,
            full_location_path,
        })
    }

    pub async fn list(&self, query: &LocationQuery) -> Result<Vec<Location>, LocationError> {
        let locations = self.store.load_locations().await?;
        Ok(locations.into_iter().filter(|l| query.matches(l)).collect())
    }

    pub async fn within_bounds(
        &self,
        ne_lat: f64,
        ne_lng: f64,
        sw_lat: f64,
        sw_lng: f64,
    ) -> Result<Vec<Location>, LocationError> {
        let locations = self.store.load_locations().await?;
        Ok(locations
            .into_iter()
            .filter(|l| l.within_bounds(ne_lat, ne_lng, sw_lat, sw_lng))
            .collect())
    }

    pub async fn create(&self, draft: NewLocation, actor: Option<UserId>) -> Result<Location, LocationError> {
        draft.validate().map_err(LocationError::Validation)?;

        if let Some(parent_id) = draft.parent_location_id {
            if self.store.find_location(parent_id).await?.is_none() {
                return Err(LocationError::ParentNotFound(parent_id));
            }
        }

        let location = self.store.insert_location(&draft, actor).await?;
        info!("Created location {} ({})", location.id, location.location_name);
        Ok(location)
    }

    /// Partial update. A parent change is checked against the current tree
    /// before anything is written.
    pub async fn update(
        &self,
        id: LocationId,
        patch: LocationPatch,
        actor: Option<UserId>,
    ) -> Result<Location, LocationError> {
        patch.validate().map_err(LocationError::Validation)?;

        let tree = self.tree().await?;
        let mut location = tree.get(id).cloned().ok_or(LocationError::NotFound(id))?;

        if let Some(Some(parent_id)) = patch.parent_location_id {
            if location.parent_location_id != Some(parent_id) {
                if tree.get(parent_id).is_none() {
                    return Err(LocationError::ParentNotFound(parent_id));
                }
                if tree.would_create_cycle(id, parent_id) {
                    warn!("Rejected re-parenting location {} under {}: cycle", id, parent_id);
                    return Err(LocationError::CycleDetected {
                        location: id,
                        parent: parent_id,
                    });
                }
            }
        }

        location.apply(patch);
        location.updated_by = actor;
        let saved = self.store.update_location(&location).await?;
        info!("Updated location {}", id);
        Ok(saved)
    }

    /// Soft delete. Refused while live children remain so no location is
    /// ever left pointing at a hidden parent.
    pub async fn remove(&self, id: LocationId, actor: Option<UserId>) -> Result<(), LocationError> {
        let tree = self.tree().await?;
        if tree.get(id).is_none() {
            return Err(LocationError::NotFound(id));
        }
        if !tree.children(id).is_empty() {
            return Err(LocationError::HasChildren(id));
        }

        match self.store.soft_delete_location(id, actor, Utc::now()).await {
            Ok(()) => {
                info!("Soft-deleted location {} (by {:?})", id, actor);
                Ok(())
            }
            Err(DatabaseError::NotFound(_)) => Err(LocationError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }
}
