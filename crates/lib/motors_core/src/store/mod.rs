//! Storage seams.
//!
//! Handlers talk to these traits only. [`postgres::PgStore`] is the
//! production implementation; [`memory::MemoryStore`] backs tests and the
//! server's `--in-memory` mode.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    Account, AccountWithPassword, Classification, FavoriteItem, NewAccount, Vehicle, VehicleForm,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Default classifications seeded into a fresh store.
pub const DEFAULT_CLASSIFICATIONS: [&str; 5] = ["Sedan", "SUV", "Truck", "Sport", "Utility"];

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Classification already exists: {0}")]
    DuplicateClassification(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),
}

/// Account persistence. Emails are compared case-insensitively.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up an account and its password hash by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<AccountWithPassword>, StoreError>;

    async fn find_by_id(&self, account_id: i32) -> Result<Option<Account>, StoreError>;

    /// Create a `Client` account. Fails with `DuplicateEmail` on conflict.
    async fn create(&self, new: NewAccount) -> Result<Account, StoreError>;

    /// Update names and email. `Ok(None)` when the account does not exist.
    async fn update_profile(
        &self,
        account_id: i32,
        firstname: &str,
        lastname: &str,
        email: &str,
    ) -> Result<Option<Account>, StoreError>;

    /// Replace the password hash. `Ok(false)` when the account does not exist.
    async fn update_password(&self, account_id: i32, password_hash: &str)
    -> Result<bool, StoreError>;
}

/// Classifications and vehicles.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// All classifications ordered by name.
    async fn classifications(&self) -> Result<Vec<Classification>, StoreError>;

    async fn add_classification(&self, name: &str) -> Result<Classification, StoreError>;

    /// Vehicles in a classification ordered by make, then model.
    async fn vehicles_by_classification(
        &self,
        classification_id: i32,
    ) -> Result<Vec<Vehicle>, StoreError>;

    async fn vehicle(&self, inv_id: i32) -> Result<Option<Vehicle>, StoreError>;

    /// Insert a vehicle. `NotFound` if the classification does not exist.
    async fn add_vehicle(&self, form: &VehicleForm) -> Result<Vehicle, StoreError>;

    /// `Ok(None)` when the vehicle does not exist.
    async fn update_vehicle(
        &self,
        inv_id: i32,
        form: &VehicleForm,
    ) -> Result<Option<Vehicle>, StoreError>;

    /// `Ok(true)` if a row was deleted.
    async fn delete_vehicle(&self, inv_id: i32) -> Result<bool, StoreError>;
}

/// Per-account saved vehicles.
#[async_trait]
pub trait FavoriteStore: Send + Sync {
    /// Saved vehicles, newest first.
    async fn list(&self, account_id: i32) -> Result<Vec<FavoriteItem>, StoreError>;

    /// Idempotent add. `NotFound` if the vehicle does not exist.
    async fn add(&self, account_id: i32, inv_id: i32) -> Result<(), StoreError>;

    /// `Ok(true)` if a favorite was removed.
    async fn remove(&self, account_id: i32, inv_id: i32) -> Result<bool, StoreError>;

    async fn contains(&self, account_id: i32, inv_id: i32) -> Result<bool, StoreError>;
}
