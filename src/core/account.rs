//! Account business logic - registration, login and administration.
//!
//! Logging in yields a [`Session`], which callers pass explicitly to every
//! operation that depends on who is asking. Administrative operations check
//! the session's role before touching the database.

use crate::{
    core::password,
    entities::{Account, AccountColumn, Role, account},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
    sea_query::{Expr, Func},
};
use tracing::{info, instrument, warn};

const MIN_PASSWORD_LEN: usize = 4;
const MAX_USERNAME_LEN: usize = 50;

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Account ID
    pub account_id: i64,
    /// Login name
    pub username: String,
    /// Role at login time
    pub role: Role,
}

impl Session {
    /// Builds a session for an account row.
    #[must_use]
    pub fn for_account(account: &account::Model) -> Self {
        Self {
            account_id: account.id,
            username: account.username.clone(),
            role: account.role,
        }
    }

    /// Whether the caller is an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fails unless the caller is an administrator.
    ///
    /// # Errors
    /// Returns [`Error::PermissionDenied`] for non-admin sessions.
    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(Error::PermissionDenied {
                message: "administrator role required".to_string(),
            })
        }
    }
}

/// Contact details kept on an account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    /// Display name
    pub full_name: String,
    /// Email address
    pub email: String,
    /// Phone number
    pub phone: String,
    /// Default shipping address
    pub address: String,
}

fn validate_username(username: &str) -> Result<String> {
    let username = username.trim();
    if username.is_empty() {
        return Err(Error::validation("username cannot be empty"));
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(Error::validation(format!(
            "username cannot exceed {MAX_USERNAME_LEN} characters"
        )));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(Error::validation("username cannot contain spaces"));
    }
    Ok(username.to_string())
}

fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Retrieves an account by ID.
pub async fn get_account_by_id<C>(db: &C, account_id: i64) -> Result<Option<account::Model>>
where
    C: ConnectionTrait,
{
    Account::find_by_id(account_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves an account by exact username.
pub async fn get_account_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<account::Model>> {
    Account::find()
        .filter(AccountColumn::Username.eq(username.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Inserts an account with the given role.
///
/// # Errors
/// * Validation error for a malformed username or a short password
/// * [`Error::UsernameTaken`] if the username is already registered, including
///   when a concurrent registration wins the unique index
#[instrument(skip(db, password, profile))]
pub async fn create_account(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
    role: Role,
    profile: Profile,
) -> Result<account::Model> {
    let username = validate_username(username)?;
    validate_password(password)?;

    if get_account_by_username(db, &username).await?.is_some() {
        return Err(Error::UsernameTaken { username });
    }

    let credential = password::hash_password(password);
    let account = account::ActiveModel {
        username: Set(username.clone()),
        password_hash: Set(credential.hash),
        password_salt: Set(credential.salt),
        role: Set(role),
        full_name: Set(profile.full_name.trim().to_string()),
        email: Set(profile.email.trim().to_string()),
        phone: Set(profile.phone.trim().to_string()),
        address: Set(profile.address.trim().to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => Error::UsernameTaken { username },
        _ => e.into(),
    })?;
    info!(account_id = account.id, %role, "Account created");
    Ok(account)
}

/// Self-service registration. New accounts always get the `USER` role.
pub async fn register(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
    profile: Profile,
) -> Result<account::Model> {
    create_account(db, username, password, Role::User, profile).await
}

/// Checks credentials and opens a session.
///
/// # Errors
/// Returns [`Error::InvalidCredentials`] for an unknown username or a wrong
/// password; the two cases are indistinguishable to the caller.
#[instrument(skip(db, password))]
pub async fn authenticate(db: &DatabaseConnection, username: &str, password: &str) -> Result<Session> {
    let Some(account) = get_account_by_username(db, username).await? else {
        warn!("Login attempt for unknown username");
        return Err(Error::InvalidCredentials);
    };
    if !password::verify_password(password, &account.password_hash, &account.password_salt) {
        warn!(account_id = account.id, "Login attempt with wrong password");
        return Err(Error::InvalidCredentials);
    }
    info!(account_id = account.id, "Logged in");
    Ok(Session::for_account(&account))
}

async fn store_password(
    db: &DatabaseConnection,
    account: account::Model,
    new_password: &str,
) -> Result<account::Model> {
    validate_password(new_password)?;
    let credential = password::hash_password(new_password);
    let mut active: account::ActiveModel = account.into();
    active.password_hash = Set(credential.hash);
    active.password_salt = Set(credential.salt);
    active.update(db).await.map_err(Into::into)
}

/// Changes the caller's own password after verifying the current one.
#[instrument(skip_all, fields(account_id = session.account_id))]
pub async fn change_password(
    db: &DatabaseConnection,
    session: &Session,
    current_password: &str,
    new_password: &str,
) -> Result<()> {
    let account = get_account_by_id(db, session.account_id)
        .await?
        .ok_or_else(|| Error::not_found("account", session.account_id))?;
    if !password::verify_password(
        current_password,
        &account.password_hash,
        &account.password_salt,
    ) {
        return Err(Error::InvalidCredentials);
    }
    store_password(db, account, new_password).await?;
    info!("Password changed");
    Ok(())
}

/// Replaces the caller's contact details.
#[instrument(skip_all, fields(account_id = session.account_id))]
pub async fn update_profile(
    db: &DatabaseConnection,
    session: &Session,
    profile: Profile,
) -> Result<account::Model> {
    let account = get_account_by_id(db, session.account_id)
        .await?
        .ok_or_else(|| Error::not_found("account", session.account_id))?;
    let mut active: account::ActiveModel = account.into();
    active.full_name = Set(profile.full_name.trim().to_string());
    active.email = Set(profile.email.trim().to_string());
    active.phone = Set(profile.phone.trim().to_string());
    active.address = Set(profile.address.trim().to_string());
    active.update(db).await.map_err(Into::into)
}

/// Lists every account (admin only).
pub async fn list_accounts(db: &DatabaseConnection, session: &Session) -> Result<Vec<account::Model>> {
    session.require_admin()?;
    Account::find()
        .order_by_asc(AccountColumn::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Accounts whose username contains `term`, ignoring case (admin only).
pub async fn search_accounts(
    db: &DatabaseConnection,
    session: &Session,
    term: &str,
) -> Result<Vec<account::Model>> {
    session.require_admin()?;
    let pattern = format!("%{}%", term.trim().to_lowercase());
    Account::find()
        .filter(Expr::expr(Func::lower(Expr::col(AccountColumn::Username))).like(pattern))
        .order_by_asc(AccountColumn::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Changes another account's role (admin only).
///
/// Administrators cannot change their own role, since their open session
/// would keep the old one.
#[instrument(skip(db, session), fields(admin_id = session.account_id))]
pub async fn update_role(
    db: &DatabaseConnection,
    session: &Session,
    account_id: i64,
    role: Role,
) -> Result<account::Model> {
    session.require_admin()?;
    if account_id == session.account_id {
        return Err(Error::PermissionDenied {
            message: "you cannot change your own role".to_string(),
        });
    }
    let account = get_account_by_id(db, account_id)
        .await?
        .ok_or_else(|| Error::not_found("account", account_id))?;
    let mut active: account::ActiveModel = account.into();
    active.role = Set(role);
    let updated = active.update(db).await?;
    info!(account_id, %role, "Role updated");
    Ok(updated)
}

/// Sets a new password on any account without knowing the old one (admin only).
#[instrument(skip(db, session, new_password), fields(admin_id = session.account_id))]
pub async fn reset_password(
    db: &DatabaseConnection,
    session: &Session,
    account_id: i64,
    new_password: &str,
) -> Result<()> {
    session.require_admin()?;
    let account = get_account_by_id(db, account_id)
        .await?
        .ok_or_else(|| Error::not_found("account", account_id))?;
    store_password(db, account, new_password).await?;
    info!(account_id, "Password reset");
    Ok(())
}

/// Deletes an account (admin only). Administrators cannot delete themselves.
#[instrument(skip(db, session), fields(admin_id = session.account_id))]
pub async fn delete_account(db: &DatabaseConnection, session: &Session, account_id: i64) -> Result<()> {
    session.require_admin()?;
    if account_id == session.account_id {
        return Err(Error::PermissionDenied {
            message: "you cannot delete your own account".to_string(),
        });
    }
    let result = Account::delete_by_id(account_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("account", account_id));
    }
    info!(account_id, "Account deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::errors::ErrorKind;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_register_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let empty = register(&db, "  ", "secret", Profile::default()).await;
        assert!(matches!(empty, Err(Error::Validation { .. })));

        let spaced = register(&db, "two words", "secret", Profile::default()).await;
        assert!(matches!(spaced, Err(Error::Validation { .. })));

        let short = register(&db, "alice", "abc", Profile::default()).await;
        assert!(matches!(short, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_plaintext() -> Result<()> {
        let db = setup_test_db().await?;
        let account = register(&db, "alice", "wonderland", test_profile()).await?;

        assert_eq!(account.role, Role::User);
        assert_ne!(account.password_hash, "wonderland");
        assert!(!account.password_hash.contains("wonderland"));
        assert_eq!(account.full_name, "Test Customer");
        Ok(())
    }

    #[tokio::test]
    async fn test_username_must_be_unique() -> Result<()> {
        let db = setup_test_db().await?;
        register(&db, "alice", "wonderland", Profile::default()).await?;

        let err = register(&db, "alice", "different", Profile::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UsernameTaken { .. }));
        assert_eq!(err.kind(), ErrorKind::Conflict);
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_registration_of_same_username() -> Result<()> {
        let db = setup_test_db().await?;

        let (first, second) = tokio::join!(
            register(&db, "dup", "password", Profile::default()),
            register(&db, "dup", "password", Profile::default()),
        );
        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        let loser = outcomes.into_iter().find_map(Result::err).unwrap();
        assert!(matches!(loser, Error::UsernameTaken { .. }));
        assert_eq!(loser.kind(), ErrorKind::Conflict);
        assert_eq!(Account::find().all(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_authenticate() -> Result<()> {
        let db = setup_test_db().await?;
        let account = register(&db, "alice", "wonderland", Profile::default()).await?;

        let session = authenticate(&db, "alice", "wonderland").await?;
        assert_eq!(session.account_id, account.id);
        assert_eq!(session.username, "alice");
        assert!(!session.is_admin());

        let wrong = authenticate(&db, "alice", "Wonderland").await;
        assert!(matches!(wrong, Err(Error::InvalidCredentials)));
        let unknown = authenticate(&db, "mallory", "wonderland").await;
        assert!(matches!(unknown, Err(Error::InvalidCredentials)));
        Ok(())
    }

    #[tokio::test]
    async fn test_change_password_requires_current() -> Result<()> {
        let db = setup_test_db().await?;
        register(&db, "alice", "wonderland", Profile::default()).await?;
        let session = authenticate(&db, "alice", "wonderland").await?;

        let wrong = change_password(&db, &session, "nope", "looking-glass").await;
        assert!(matches!(wrong, Err(Error::InvalidCredentials)));

        change_password(&db, &session, "wonderland", "looking-glass").await?;
        assert!(authenticate(&db, "alice", "wonderland").await.is_err());
        authenticate(&db, "alice", "looking-glass").await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_update_profile() -> Result<()> {
        let db = setup_test_db().await?;
        register(&db, "alice", "wonderland", Profile::default()).await?;
        let session = authenticate(&db, "alice", "wonderland").await?;

        let updated = update_profile(&db, &session, test_profile()).await?;
        assert_eq!(updated.address, "1 Test Street");
        assert_eq!(updated.email, "customer@example.com");
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_operations_require_admin() -> Result<()> {
        let db = setup_test_db().await?;
        let user = register(&db, "alice", "wonderland", Profile::default()).await?;
        let session = Session::for_account(&user);

        let err = list_accounts(&db, &session).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        let err = update_role(&db, &session, user.id, Role::Admin)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_manages_accounts() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = test_admin_session(&db).await?;
        let alice = register(&db, "alice", "wonderland", Profile::default()).await?;
        register(&db, "bob", "builder", Profile::default()).await?;

        assert_eq!(list_accounts(&db, &admin).await?.len(), 3);
        let found = search_accounts(&db, &admin, "ALI").await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, alice.id);

        let promoted = update_role(&db, &admin, alice.id, Role::Admin).await?;
        assert!(promoted.is_admin());

        reset_password(&db, &admin, alice.id, "fresh-start").await?;
        authenticate(&db, "alice", "fresh-start").await?;

        delete_account(&db, &admin, alice.id).await?;
        assert!(get_account_by_id(&db, alice.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_cannot_delete_self() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = test_admin_session(&db).await?;

        let err = delete_account(&db, &admin, admin.account_id)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied { .. }));
        assert!(get_account_by_id(&db, admin.account_id).await?.is_some());

        let missing = delete_account(&db, &admin, 9999).await;
        assert!(matches!(missing, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_cannot_change_own_role() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = test_admin_session(&db).await?;

        let err = update_role(&db, &admin, admin.account_id, Role::User)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        let stored = get_account_by_id(&db, admin.account_id).await?.unwrap();
        assert!(stored.is_admin());
        Ok(())
    }
}
