//! Idempotent seeding of navigation applications, default roles and the
//! administrator account. Every step is find-or-create by natural key, so the
//! seeder runs on every boot.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::auth::{hash_password, PasswordError};
use crate::config::SeedConfig;
use crate::database::manager::DatabaseError;
use crate::database::models::{Application, NewApplication, NewUser, Role};
use crate::database::store::AccessStore;

pub const ADMIN_ROLE: &str = "Administrator";
pub const DEFAULT_ROLES: [&str; 3] = [ADMIN_ROLE, "Manager", "User"];

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Could not hash admin password: {0}")]
    Password(#[from] PasswordError),
    #[error("No admin password configured for {0}; set SEED_ADMIN_PASSWORD")]
    MissingAdminPassword(String),
}

/// What a seeding run actually inserted.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub applications: usize,
    pub roles: usize,
    pub permissions: usize,
    pub users: usize,
    pub user_roles: usize,
}

impl SeedReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

struct MenuSeed {
    top: NewApplication,
    children: Vec<NewApplication>,
}

fn default_menu() -> Vec<MenuSeed> {
    vec![
        MenuSeed {
            top: NewApplication::new("Setup", "/setup", "Setup").icon("fa fa-cogs").group(),
            children: vec![
                NewApplication::new("Company Details", "/setup/company", "Setup").icon("fa fa-building"),
                NewApplication::new("Letter Head", "/setup/letter-head", "Setup").icon("fa fa-file-text"),
                NewApplication::new("User Management", "/setup/users", "Setup").icon("fa fa-users"),
            ],
        },
        MenuSeed {
            top: NewApplication::new("Certification", "/certification", "Certification")
                .icon("fa fa-certificate")
                .group(),
            children: vec![
                NewApplication::new("Certificates", "/certification/certificates", "Certification")
                    .icon("fa fa-id-card"),
                NewApplication::new("Equipment", "/certification/equipment", "Certification").icon("fa fa-wrench"),
                NewApplication::new("Locations", "/certification/locations", "Certification")
                    .icon("fa fa-map-marker"),
            ],
        },
        MenuSeed {
            top: NewApplication::new("Audit", "/audit", "Audit").icon("fa fa-history"),
            children: vec![],
        },
    ]
}

pub struct Seeder {
    store: Arc<dyn AccessStore>,
    config: SeedConfig,
}

impl Seeder {
    pub fn new(store: Arc<dyn AccessStore>, config: SeedConfig) -> Self {
        Self { store, config }
    }

    pub async fn run(&self) -> Result<SeedReport, SeedError> {
        info!("Seeding applications, roles and admin account");
        let mut report = SeedReport::default();

        let applications = self.seed_applications(&mut report).await?;
        let roles = self.seed_roles(&mut report).await?;

        if let Some(admin) = roles.iter().find(|r| r.is_named(ADMIN_ROLE)) {
            for app in &applications {
                if self.store.ensure_permission(admin.id, app.id).await? {
                    debug!("Granted {} -> {}", admin.role_name, app.application_name);
                    report.permissions += 1;
                }
            }
            self.seed_admin(admin, &mut report).await?;
        }

        if report.is_empty() {
            info!("Seed data already present");
        } else {
            info!("Seeding complete: {:?}", report);
        }
        Ok(report)
    }

    async fn seed_applications(&self, report: &mut SeedReport) -> Result<Vec<Application>, SeedError> {
        let mut saved = Vec::new();
        for seed in default_menu() {
            let parent = self.ensure_application(&seed.top, report).await?;
            let parent_id = parent.id;
            saved.push(parent);
            for child in seed.children {
                saved.push(self.ensure_application(&child.under(parent_id), report).await?);
            }
        }
        Ok(saved)
    }

    async fn ensure_application(
        &self,
        app: &NewApplication,
        report: &mut SeedReport,
    ) -> Result<Application, SeedError> {
        let (saved, created) = self.store.ensure_application(app).await?;
        if created {
            debug!("Created application {} ({})", saved.application_name, saved.id);
            report.applications += 1;
        }
        Ok(saved)
    }

    async fn seed_roles(&self, report: &mut SeedReport) -> Result<Vec<Role>, SeedError> {
        let mut saved = Vec::new();
        for name in DEFAULT_ROLES {
            let (role, created) = self.store.ensure_role(name).await?;
            if created {
                debug!("Created role {}", role.role_name);
                report.roles += 1;
            }
            saved.push(role);
        }
        Ok(saved)
    }

    async fn seed_admin(&self, admin_role: &Role, report: &mut SeedReport) -> Result<(), SeedError> {
        let email = self.config.admin_email.trim().to_lowercase();
        let user = match self.store.find_user_by_email(&email).await? {
            Some(user) => user,
            None => {
                if self.config.admin_password.is_empty() {
                    return Err(SeedError::MissingAdminPassword(email));
                }
                let user = self
                    .store
                    .insert_user(&NewUser {
                        email,
                        password_hash: hash_password(&self.config.admin_password)?,
                        first_name: Some(self.config.admin_first_name.clone()),
                        last_name: Some(self.config.admin_last_name.clone()),
                    })
                    .await?;
                info!("Created admin user {} ({})", user.email, user.id);
                report.users += 1;
                user
            }
        };

        if self.store.ensure_user_role(user.id, admin_role.id).await? {
            info!("Assigned {} role to {}", admin_role.role_name, user.email);
            report.user_roles += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    fn seed_config() -> SeedConfig {
        SeedConfig {
            run_on_startup: true,
            admin_email: "Admin@CertDesk.local".to_string(),
            admin_password: "secret-pass".to_string(),
            admin_first_name: "System".to_string(),
            admin_last_name: "Administrator".to_string(),
        }
    }

    #[tokio::test]
    async fn second_run_creates_nothing() {
        let store = Arc::new(MemoryStore::new());
        let seeder = Seeder::new(store.clone(), seed_config());

        let first = seeder.run().await.unwrap();
        assert_eq!(first.applications, 9);
        assert_eq!(first.roles, 3);
        assert_eq!(first.permissions, 9);
        assert_eq!(first.users, 1);
        assert_eq!(first.user_roles, 1);

        let second = seeder.run().await.unwrap();
        assert!(second.is_empty(), "unexpected inserts: {:?}", second);
    }

    #[tokio::test]
    async fn admin_is_stored_lowercase_with_hashed_password() {
        let store = Arc::new(MemoryStore::new());
        Seeder::new(store.clone(), seed_config()).run().await.unwrap();

        let admin = store.find_user_by_email("admin@certdesk.local").await.unwrap().unwrap();
        assert_ne!(admin.password_hash, "secret-pass");
        assert!(crate::auth::verify_password("secret-pass", &admin.password_hash).unwrap());

        let roles = store.roles_for_user(admin.id).await.unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].role_name, ADMIN_ROLE);
    }

    #[tokio::test]
    async fn empty_admin_password_is_refused() {
        let store = Arc::new(MemoryStore::new());
        let config = SeedConfig {
            admin_password: String::new(),
            ..seed_config()
        };

        let err = Seeder::new(store.clone(), config.clone()).run().await.unwrap_err();
        assert!(matches!(err, SeedError::MissingAdminPassword(_)));
        assert!(store.find_user_by_email("admin@certdesk.local").await.unwrap().is_none());

        // An existing admin does not need the password again
        Seeder::new(store.clone(), seed_config()).run().await.unwrap();
        let report = Seeder::new(store, config).run().await.unwrap();
        assert!(report.is_empty());
    }
}
