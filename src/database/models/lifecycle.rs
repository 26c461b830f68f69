use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// Soft-delete state shared by every audited record.
///
/// Storage keeps this as a nullable `deleted_at` / `deleted_by` pair; a row is
/// soft-deleted exactly when `deleted_at` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Lifecycle {
    #[default]
    Active,
    SoftDeleted {
        at: DateTime<Utc>,
        by: Option<UserId>,
    },
}

impl Lifecycle {
    pub fn from_columns(deleted_at: Option<DateTime<Utc>>, deleted_by: Option<UserId>) -> Self {
        match deleted_at {
            Some(at) => Lifecycle::SoftDeleted { at, by: deleted_by },
            None => Lifecycle::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Lifecycle::Active)
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Lifecycle::Active => None,
            Lifecycle::SoftDeleted { at, .. } => Some(*at),
        }
    }

    pub fn deleted_by(&self) -> Option<UserId> {
        match self {
            Lifecycle::Active => None,
            Lifecycle::SoftDeleted { by, .. } => *by,
        }
    }
}
