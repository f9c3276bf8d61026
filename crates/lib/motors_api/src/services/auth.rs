//! Account service: registration, login, profile and password changes.

use chrono::Duration;
use motors_core::auth::TokenCodec;
use motors_core::auth::password::{hash_password, verify_password};
use motors_core::models::{Account, Identity, NewAccount};
use motors_core::store::{CredentialStore, StoreError};
use motors_core::validation::{AccountUpdate, Login, PasswordChange, Registration};
use tracing::info;

use crate::error::{AppError, AppResult};

/// Generic login failure; never reveals which half was wrong.
pub const BAD_CREDENTIALS: &str = "Please check your credentials and try again.";

/// Update attempted on somebody else's account.
pub const NOT_YOUR_ACCOUNT: &str = "You can only update your own account.";

/// A signed-in account and its fresh token.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub account: Account,
    pub token: String,
}

/// Sign a token for `account`.
pub fn issue_token(codec: &TokenCodec, account: &Account, ttl: Duration) -> AppResult<String> {
    Ok(codec.sign(&account.identity(), ttl)?)
}

/// Create a `Client` account.
pub async fn register(accounts: &dyn CredentialStore, reg: &Registration) -> AppResult<Account> {
    let password_hash = hash_password(&reg.password)?;
    let account = accounts
        .create(NewAccount {
            firstname: reg.firstname.clone(),
            lastname: reg.lastname.clone(),
            email: reg.email.clone(),
            password_hash,
        })
        .await?;
    info!(account_id = account.account_id, "account registered");
    Ok(account)
}

/// Check credentials and issue a token.
pub async fn login(
    accounts: &dyn CredentialStore,
    codec: &TokenCodec,
    ttl: Duration,
    login: &Login,
) -> AppResult<SignedIn> {
    let Some(found) = accounts.find_by_email(&login.email).await? else {
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
    };
    if !verify_password(&login.password, &found.password_hash)? {
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
    }

    let token = issue_token(codec, &found.account, ttl)?;
    info!(account_id = found.account.account_id, "login succeeded");
    Ok(SignedIn {
        account: found.account,
        token,
    })
}

fn ensure_owner(acting: &Identity, account_id: i32) -> AppResult<()> {
    if acting.sub == account_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(NOT_YOUR_ACCOUNT.into()))
    }
}

/// Update the caller's own profile and re-issue their token so the new
/// name and email take effect immediately.
pub async fn update_profile(
    accounts: &dyn CredentialStore,
    codec: &TokenCodec,
    ttl: Duration,
    acting: &Identity,
    update: &AccountUpdate,
) -> AppResult<SignedIn> {
    ensure_owner(acting, update.account_id)?;

    let account = accounts
        .update_profile(update.account_id, &update.firstname, &update.lastname, &update.email)
        .await
        .map_err(|e| match e {
            StoreError::DuplicateEmail => {
                AppError::Conflict("Email already in use by another account.".into())
            }
            other => other.into(),
        })?
        .ok_or_else(|| AppError::NotFound("Account not found.".into()))?;

    let token = issue_token(codec, &account, ttl)?;
    info!(account_id = account.account_id, "account updated");
    Ok(SignedIn { account, token })
}

/// Replace the caller's own password.
pub async fn change_password(
    accounts: &dyn CredentialStore,
    acting: &Identity,
    change: &PasswordChange,
) -> AppResult<()> {
    ensure_owner(acting, change.account_id)?;

    let hash = hash_password(&change.password)?;
    if !accounts.update_password(change.account_id, &hash).await? {
        return Err(AppError::NotFound("Account not found.".into()));
    }
    info!(account_id = change.account_id, "password changed");
    Ok(())
}
