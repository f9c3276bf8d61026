//! PostgreSQL-backed stores.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{CredentialStore, FavoriteStore, InventoryStore, StoreError};
use crate::models::{
    Account, AccountWithPassword, Classification, FavoriteItem, NewAccount, Role, Vehicle,
    VehicleForm,
};

const VEHICLE_COLUMNS: &str = "i.inv_id, i.inv_make, i.inv_model, i.inv_year, i.inv_description, \
     i.inv_image, i.inv_thumbnail, i.inv_price::float8 AS inv_price, i.inv_miles, i.inv_color, \
     i.classification_id, c.classification_name";

/// All stores over one connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lightweight connectivity probe.
    pub async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok_and(|v| v == 1)
    }
}

type AccountRow = (i32, String, String, String, String);

fn account_from_row((account_id, firstname, lastname, email, role): AccountRow) -> Result<Account, StoreError> {
    let role = role.parse::<Role>().map_err(|e| {
        tracing::warn!(account_id, error = %e, "account has an unrecognised role");
        StoreError::DbError(sqlx::Error::Decode(Box::new(e)))
    })?;
    Ok(Account {
        account_id,
        firstname,
        lastname,
        email,
        role,
    })
}

/// Map unique violations on `account_email` to `DuplicateEmail`.
fn account_write_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateEmail,
        _ => StoreError::DbError(e),
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<AccountWithPassword>, StoreError> {
        let row = sqlx::query_as::<_, (i32, String, String, String, String, String)>(
            "SELECT account_id, account_firstname, account_lastname, account_email, \
             account_type::text, account_password \
             FROM account WHERE lower(account_email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(id, first, last, email, role, password_hash)| {
            Ok(AccountWithPassword {
                account: account_from_row((id, first, last, email, role))?,
                password_hash,
            })
        })
        .transpose()
    }

    async fn find_by_id(&self, account_id: i32) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT account_id, account_firstname, account_lastname, account_email, account_type::text \
             FROM account WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(account_from_row).transpose()
    }

    async fn create(&self, new: NewAccount) -> Result<Account, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "INSERT INTO account (account_firstname, account_lastname, account_email, account_password, account_type) \
             VALUES ($1, $2, $3, $4, 'Client') \
             RETURNING account_id, account_firstname, account_lastname, account_email, account_type::text",
        )
        .bind(&new.firstname)
        .bind(&new.lastname)
        .bind(&new.email)
        .bind(&new.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(account_write_error)?;
        account_from_row(row)
    }

    async fn update_profile(
        &self,
        account_id: i32,
        firstname: &str,
        lastname: &str,
        email: &str,
    ) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "UPDATE account SET account_firstname = $1, account_lastname = $2, account_email = $3 \
             WHERE account_id = $4 \
             RETURNING account_id, account_firstname, account_lastname, account_email, account_type::text",
        )
        .bind(firstname)
        .bind(lastname)
        .bind(email)
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(account_write_error)?;
        row.map(account_from_row).transpose()
    }

    async fn update_password(
        &self,
        account_id: i32,
        password_hash: &str,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE account SET account_password = $1 WHERE account_id = $2")
            .bind(password_hash)
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[derive(sqlx::FromRow)]
struct VehicleRow {
    inv_id: i32,
    inv_make: String,
    inv_model: String,
    inv_year: i32,
    inv_description: String,
    inv_image: String,
    inv_thumbnail: String,
    inv_price: f64,
    inv_miles: i32,
    inv_color: String,
    classification_id: i32,
    classification_name: String,
}

impl From<VehicleRow> for Vehicle {
    fn from(r: VehicleRow) -> Self {
        Vehicle {
            inv_id: r.inv_id,
            make: r.inv_make,
            model: r.inv_model,
            year: r.inv_year,
            description: r.inv_description,
            image: r.inv_image,
            thumbnail: r.inv_thumbnail,
            price: r.inv_price,
            miles: r.inv_miles,
            color: r.inv_color,
            classification_id: r.classification_id,
            classification_name: r.classification_name,
        }
    }
}

/// Map foreign-key violations on `classification_id` to `NotFound`.
fn vehicle_write_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            StoreError::NotFound("classification".into())
        }
        _ => StoreError::DbError(e),
    }
}

#[async_trait]
impl InventoryStore for PgStore {
    async fn classifications(&self) -> Result<Vec<Classification>, StoreError> {
        let rows = sqlx::query_as::<_, (i32, String)>(
            "SELECT classification_id, classification_name FROM classification ORDER BY classification_name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(classification_id, classification_name)| Classification {
                classification_id,
                classification_name,
            })
            .collect())
    }

    async fn add_classification(&self, name: &str) -> Result<Classification, StoreError> {
        let (classification_id, classification_name) = sqlx::query_as::<_, (i32, String)>(
            "INSERT INTO classification (classification_name) VALUES ($1) \
             RETURNING classification_id, classification_name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::DuplicateClassification(name.to_string())
            }
            _ => StoreError::DbError(e),
        })?;
        Ok(Classification {
            classification_id,
            classification_name,
        })
    }

    async fn vehicles_by_classification(
        &self,
        classification_id: i32,
    ) -> Result<Vec<Vehicle>, StoreError> {
        let sql = format!(
            "SELECT {VEHICLE_COLUMNS} FROM inventory i \
             JOIN classification c ON c.classification_id = i.classification_id \
             WHERE i.classification_id = $1 ORDER BY i.inv_make, i.inv_model"
        );
        let rows = sqlx::query_as::<_, VehicleRow>(&sql)
            .bind(classification_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Vehicle::from).collect())
    }

    async fn vehicle(&self, inv_id: i32) -> Result<Option<Vehicle>, StoreError> {
        let sql = format!(
            "SELECT {VEHICLE_COLUMNS} FROM inventory i \
             JOIN classification c ON c.classification_id = i.classification_id \
             WHERE i.inv_id = $1"
        );
        let row = sqlx::query_as::<_, VehicleRow>(&sql)
            .bind(inv_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Vehicle::from))
    }

    async fn add_vehicle(&self, form: &VehicleForm) -> Result<Vehicle, StoreError> {
        let inv_id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO inventory (inv_make, inv_model, inv_year, inv_description, inv_image, \
             inv_thumbnail, inv_price, inv_miles, inv_color, classification_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7::numeric, $8, $9, $10) RETURNING inv_id",
        )
        .bind(&form.make)
        .bind(&form.model)
        .bind(form.year)
        .bind(&form.description)
        .bind(&form.image)
        .bind(&form.thumbnail)
        .bind(form.price)
        .bind(form.miles)
        .bind(&form.color)
        .bind(form.classification_id)
        .fetch_one(&self.pool)
        .await
        .map_err(vehicle_write_error)?;

        self.vehicle(inv_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("vehicle {inv_id}")))
    }

    async fn update_vehicle(
        &self,
        inv_id: i32,
        form: &VehicleForm,
    ) -> Result<Option<Vehicle>, StoreError> {
        let updated = sqlx::query(
            "UPDATE inventory SET inv_make = $1, inv_model = $2, inv_year = $3, inv_description = $4, \
             inv_image = $5, inv_thumbnail = $6, inv_price = $7::numeric, inv_miles = $8, \
             inv_color = $9, classification_id = $10 WHERE inv_id = $11",
        )
        .bind(&form.make)
        .bind(&form.model)
        .bind(form.year)
        .bind(&form.description)
        .bind(&form.image)
        .bind(&form.thumbnail)
        .bind(form.price)
        .bind(form.miles)
        .bind(&form.color)
        .bind(form.classification_id)
        .bind(inv_id)
        .execute(&self.pool)
        .await
        .map_err(vehicle_write_error)?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.vehicle(inv_id).await
    }

    async fn delete_vehicle(&self, inv_id: i32) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM inventory WHERE inv_id = $1")
            .bind(inv_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl FavoriteStore for PgStore {
    async fn list(&self, account_id: i32) -> Result<Vec<FavoriteItem>, StoreError> {
        let rows = sqlx::query_as::<_, (i32, String, String, i32, f64, String, String, DateTime<Utc>)>(
            "SELECT f.inv_id, i.inv_make, i.inv_model, i.inv_year, i.inv_price::float8, \
             i.inv_thumbnail, c.classification_name, f.created_at \
             FROM favorite f \
             JOIN inventory i ON i.inv_id = f.inv_id \
             JOIN classification c ON c.classification_id = i.classification_id \
             WHERE f.account_id = $1 \
             ORDER BY f.created_at DESC, f.favorite_id DESC",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(inv_id, make, model, year, price, thumbnail, classification_name, created_at)| {
                    FavoriteItem {
                        inv_id,
                        make,
                        model,
                        year,
                        price,
                        thumbnail,
                        classification_name,
                        created_at,
                    }
                },
            )
            .collect())
    }

    async fn add(&self, account_id: i32, inv_id: i32) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO favorite (account_id, inv_id) VALUES ($1, $2) \
             ON CONFLICT (account_id, inv_id) DO NOTHING",
        )
        .bind(account_id)
        .bind(inv_id)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                StoreError::NotFound(format!("vehicle {inv_id}"))
            }
            _ => StoreError::DbError(e),
        })?;
        Ok(())
    }

    async fn remove(&self, account_id: i32, inv_id: i32) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM favorite WHERE account_id = $1 AND inv_id = $2")
            .bind(account_id)
            .bind(inv_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn contains(&self, account_id: i32, inv_id: i32) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM favorite WHERE account_id = $1 AND inv_id = $2)",
        )
        .bind(account_id)
        .bind(inv_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}
