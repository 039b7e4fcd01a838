//! Administrator bootstrap from environment variables.
//!
//! A fresh database has no accounts, so nobody could manage the catalog.
//! When `ADMIN_USERNAME` and `ADMIN_PASSWORD` are both set, startup creates
//! that administrator unless an account with the username already exists.

use crate::{
    core::account::{self, Profile},
    entities::{Role, account as account_entity},
    errors::Result,
};
use sea_orm::DatabaseConnection;
use tracing::{info, instrument, warn};

/// Credentials for the bootstrap administrator.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    /// Login name
    pub username: String,
    /// Plaintext password, hashed before storage
    pub password: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Reads `ADMIN_USERNAME` and `ADMIN_PASSWORD`.
///
/// Returns `None` unless both are set and non-empty.
#[must_use]
pub fn admin_from_env() -> Option<AdminCredentials> {
    let username = std::env::var("ADMIN_USERNAME").ok()?;
    let password = std::env::var("ADMIN_PASSWORD").ok()?;
    if username.trim().is_empty() || password.is_empty() {
        warn!("ADMIN_USERNAME or ADMIN_PASSWORD is empty, skipping admin bootstrap");
        return None;
    }
    Some(AdminCredentials {
        username: username.trim().to_string(),
        password,
    })
}

/// Creates the administrator account if its username is free.
///
/// # Returns
/// The new account, or `None` if the username was already registered
#[instrument(skip(db))]
pub async fn ensure_admin(
    db: &DatabaseConnection,
    credentials: &AdminCredentials,
) -> Result<Option<account_entity::Model>> {
    if account::get_account_by_username(db, &credentials.username)
        .await?
        .is_some()
    {
        info!("Admin account already present");
        return Ok(None);
    }
    let admin = account::create_account(
        db,
        &credentials.username,
        &credentials.password,
        Role::Admin,
        Profile {
            full_name: "Store Administrator".to_string(),
            ..Profile::default()
        },
    )
    .await?;
    info!(account_id = admin.id, "Admin account created");
    Ok(Some(admin))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let credentials = AdminCredentials {
            username: "root".to_string(),
            password: "change-me".to_string(),
        };

        let created = ensure_admin(&db, &credentials).await?.unwrap();
        assert!(created.is_admin());
        assert!(ensure_admin(&db, &credentials).await?.is_none());

        let session = account::authenticate(&db, "root", "change-me").await?;
        assert!(session.is_admin());
        Ok(())
    }

    #[test]
    fn test_debug_redacts_password() {
        let credentials = AdminCredentials {
            username: "root".to_string(),
            password: "hunter22".to_string(),
        };
        let printed = format!("{credentials:?}");
        assert!(printed.contains("root"));
        assert!(!printed.contains("hunter22"));
    }
}
