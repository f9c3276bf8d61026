//! In-memory stores.
//!
//! Mirrors the PostgreSQL constraints that callers rely on: case-insensitive
//! unique emails, unique classification names, foreign keys from vehicles to
//! classifications and from favorites to vehicles (cascade on delete).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{CredentialStore, DEFAULT_CLASSIFICATIONS, FavoriteStore, InventoryStore, StoreError};
use crate::models::{
    Account, AccountWithPassword, Classification, FavoriteItem, NewAccount, Role, Vehicle,
    VehicleForm,
};

struct StoredVehicle {
    inv_id: i32,
    form: VehicleForm,
}

struct StoredFavorite {
    account_id: i32,
    inv_id: i32,
    created_at: DateTime<Utc>,
    seq: u64,
}

#[derive(Default)]
struct State {
    accounts: Vec<AccountWithPassword>,
    classifications: Vec<Classification>,
    vehicles: Vec<StoredVehicle>,
    favorites: Vec<StoredFavorite>,
    next_account_id: i32,
    next_classification_id: i32,
    next_inv_id: i32,
    next_favorite_seq: u64,
}

impl State {
    fn classification_name(&self, classification_id: i32) -> Option<&str> {
        self.classifications
            .iter()
            .find(|c| c.classification_id == classification_id)
            .map(|c| c.classification_name.as_str())
    }

    fn joined(&self, stored: &StoredVehicle) -> Option<Vehicle> {
        let f = &stored.form;
        Some(Vehicle {
            inv_id: stored.inv_id,
            make: f.make.clone(),
            model: f.model.clone(),
            year: f.year,
            description: f.description.clone(),
            image: f.image.clone(),
            thumbnail: f.thumbnail.clone(),
            price: f.price,
            miles: f.miles,
            color: f.color.clone(),
            classification_id: f.classification_id,
            classification_name: self.classification_name(f.classification_id)?.to_string(),
        })
    }

    fn email_taken(&self, email: &str, except: Option<i32>) -> bool {
        self.accounts.iter().any(|a| {
            a.account.email.eq_ignore_ascii_case(email) && Some(a.account.account_id) != except
        })
    }

    fn add_classification(&mut self, name: &str) -> Result<Classification, StoreError> {
        if self
            .classifications
            .iter()
            .any(|c| c.classification_name == name)
        {
            return Err(StoreError::DuplicateClassification(name.to_string()));
        }
        self.next_classification_id += 1;
        let classification = Classification {
            classification_id: self.next_classification_id,
            classification_name: name.to_string(),
        };
        self.classifications.push(classification.clone());
        Ok(classification)
    }
}

/// Process-local store implementing every store trait.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with the default classifications.
    pub fn seeded() -> Self {
        let mut state = State::default();
        for name in DEFAULT_CLASSIFICATIONS {
            // Names are distinct, so this cannot fail.
            let _ = state.add_classification(name);
        }
        Self {
            state: RwLock::new(state),
        }
    }

    /// Change an account's role. Returns `false` if the account does not exist.
    ///
    /// Registration only creates `Client` accounts; this is how staff
    /// accounts are provisioned outside of PostgreSQL.
    pub async fn set_role(&self, account_id: i32, role: Role) -> bool {
        let mut state = self.state.write().await;
        match state
            .accounts
            .iter_mut()
            .find(|a| a.account.account_id == account_id)
        {
            Some(a) => {
                a.account.role = role;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<AccountWithPassword>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .accounts
            .iter()
            .find(|a| a.account.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, account_id: i32) -> Result<Option<Account>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .accounts
            .iter()
            .find(|a| a.account.account_id == account_id)
            .map(|a| a.account.clone()))
    }

    async fn create(&self, new: NewAccount) -> Result<Account, StoreError> {
        let mut state = self.state.write().await;
        if state.email_taken(&new.email, None) {
            return Err(StoreError::DuplicateEmail);
        }
        state.next_account_id += 1;
        let account = Account {
            account_id: state.next_account_id,
            firstname: new.firstname,
            lastname: new.lastname,
            email: new.email,
            role: Role::Client,
        };
        state.accounts.push(AccountWithPassword {
            account: account.clone(),
            password_hash: new.password_hash,
        });
        Ok(account)
    }

    async fn update_profile(
        &self,
        account_id: i32,
        firstname: &str,
        lastname: &str,
        email: &str,
    ) -> Result<Option<Account>, StoreError> {
        let mut state = self.state.write().await;
        if state.email_taken(email, Some(account_id)) {
            return Err(StoreError::DuplicateEmail);
        }
        let Some(stored) = state
            .accounts
            .iter_mut()
            .find(|a| a.account.account_id == account_id)
        else {
            return Ok(None);
        };
        stored.account.firstname = firstname.to_string();
        stored.account.lastname = lastname.to_string();
        stored.account.email = email.to_string();
        Ok(Some(stored.account.clone()))
    }

    async fn update_password(
        &self,
        account_id: i32,
        password_hash: &str,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        match state
            .accounts
            .iter_mut()
            .find(|a| a.account.account_id == account_id)
        {
            Some(stored) => {
                stored.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn classifications(&self) -> Result<Vec<Classification>, StoreError> {
        let state = self.state.read().await;
        let mut all = state.classifications.clone();
        all.sort_by(|a, b| a.classification_name.cmp(&b.classification_name));
        Ok(all)
    }

    async fn add_classification(&self, name: &str) -> Result<Classification, StoreError> {
        self.state.write().await.add_classification(name)
    }

    async fn vehicles_by_classification(
        &self,
        classification_id: i32,
    ) -> Result<Vec<Vehicle>, StoreError> {
        let state = self.state.read().await;
        let mut vehicles: Vec<Vehicle> = state
            .vehicles
            .iter()
            .filter(|v| v.form.classification_id == classification_id)
            .filter_map(|v| state.joined(v))
            .collect();
        vehicles.sort_by(|a, b| (&a.make, &a.model).cmp(&(&b.make, &b.model)));
        Ok(vehicles)
    }

    async fn vehicle(&self, inv_id: i32) -> Result<Option<Vehicle>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .vehicles
            .iter()
            .find(|v| v.inv_id == inv_id)
            .and_then(|v| state.joined(v)))
    }

    async fn add_vehicle(&self, form: &VehicleForm) -> Result<Vehicle, StoreError> {
        let mut state = self.state.write().await;
        if state.classification_name(form.classification_id).is_none() {
            return Err(StoreError::NotFound("classification".into()));
        }
        state.next_inv_id += 1;
        let stored = StoredVehicle {
            inv_id: state.next_inv_id,
            form: form.clone(),
        };
        let vehicle = state
            .joined(&stored)
            .ok_or_else(|| StoreError::NotFound("classification".into()))?;
        state.vehicles.push(stored);
        Ok(vehicle)
    }

    async fn update_vehicle(
        &self,
        inv_id: i32,
        form: &VehicleForm,
    ) -> Result<Option<Vehicle>, StoreError> {
        let mut state = self.state.write().await;
        if state.classification_name(form.classification_id).is_none() {
            return Err(StoreError::NotFound("classification".into()));
        }
        let Some(idx) = state.vehicles.iter().position(|v| v.inv_id == inv_id) else {
            return Ok(None);
        };
        state.vehicles[idx].form = form.clone();
        Ok(state.joined(&state.vehicles[idx]))
    }

    async fn delete_vehicle(&self, inv_id: i32) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let before = state.vehicles.len();
        state.vehicles.retain(|v| v.inv_id != inv_id);
        let deleted = state.vehicles.len() != before;
        if deleted {
            state.favorites.retain(|f| f.inv_id != inv_id);
        }
        Ok(deleted)
    }
}

#[async_trait]
impl FavoriteStore for MemoryStore {
    async fn list(&self, account_id: i32) -> Result<Vec<FavoriteItem>, StoreError> {
        let state = self.state.read().await;
        let mut mine: Vec<&StoredFavorite> = state
            .favorites
            .iter()
            .filter(|f| f.account_id == account_id)
            .collect();
        mine.sort_by(|a, b| b.seq.cmp(&a.seq));

        Ok(mine
            .into_iter()
            .filter_map(|f| {
                let stored = state.vehicles.iter().find(|v| v.inv_id == f.inv_id)?;
                let v = state.joined(stored)?;
                Some(FavoriteItem {
                    inv_id: v.inv_id,
                    make: v.make,
                    model: v.model,
                    year: v.year,
                    price: v.price,
                    thumbnail: v.thumbnail,
                    classification_name: v.classification_name,
                    created_at: f.created_at,
                })
            })
            .collect())
    }

    async fn add(&self, account_id: i32, inv_id: i32) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if !state.vehicles.iter().any(|v| v.inv_id == inv_id) {
            return Err(StoreError::NotFound(format!("vehicle {inv_id}")));
        }
        if state
            .favorites
            .iter()
            .any(|f| f.account_id == account_id && f.inv_id == inv_id)
        {
            return Ok(());
        }
        state.next_favorite_seq += 1;
        let seq = state.next_favorite_seq;
        state.favorites.push(StoredFavorite {
            account_id,
            inv_id,
            created_at: Utc::now(),
            seq,
        });
        Ok(())
    }

    async fn remove(&self, account_id: i32, inv_id: i32) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let before = state.favorites.len();
        state
            .favorites
            .retain(|f| !(f.account_id == account_id && f.inv_id == inv_id));
        Ok(state.favorites.len() != before)
    }

    async fn contains(&self, account_id: i32, inv_id: i32) -> Result<bool, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .favorites
            .iter()
            .any(|f| f.account_id == account_id && f.inv_id == inv_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            firstname: "Basic".into(),
            lastname: "Client".into(),
            email: email.into(),
            password_hash: "$2b$12$hash".into(),
        }
    }

    fn wrangler(classification_id: i32) -> VehicleForm {
        VehicleForm {
            make: "Jeep".into(),
            model: "Wrangler".into(),
            year: 2019,
            description: "Small and compact.".into(),
            image: "/images/vehicles/wrangler.jpg".into(),
            thumbnail: "/images/vehicles/wrangler-tn.jpg".into(),
            price: 28045.0,
            miles: 41205,
            color: "Yellow".into(),
            classification_id,
        }
    }

    async fn suv_id(store: &MemoryStore) -> i32 {
        store
            .classifications()
            .await
            .unwrap()
            .into_iter()
            .find(|c| c.classification_name == "SUV")
            .unwrap()
            .classification_id
    }

    #[tokio::test]
    async fn accounts_are_clients_with_unique_emails() {
        let store = MemoryStore::new();
        let acct = store.create(new_account("basic@340.edu")).await.unwrap();
        assert_eq!(acct.role, Role::Client);
        assert!(matches!(
            store.create(new_account("BASIC@340.edu")).await,
            Err(StoreError::DuplicateEmail)
        ));
        let found = store.find_by_email("Basic@340.EDU").await.unwrap().unwrap();
        assert_eq!(found.account, acct);
    }

    #[tokio::test]
    async fn profile_update_rejects_email_of_other_account() {
        let store = MemoryStore::new();
        let a = store.create(new_account("a@340.edu")).await.unwrap();
        store.create(new_account("b@340.edu")).await.unwrap();
        assert!(matches!(
            store.update_profile(a.account_id, "A", "Person", "b@340.edu").await,
            Err(StoreError::DuplicateEmail)
        ));
        let same = store
            .update_profile(a.account_id, "A", "Person", "a@340.edu")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(same.firstname, "A");
        assert!(store.update_profile(99, "X", "Yz", "x@340.edu").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn seeded_classifications_sorted_and_unique() {
        let store = MemoryStore::seeded();
        let names: Vec<_> = store
            .classifications()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.classification_name)
            .collect();
        assert_eq!(names, ["SUV", "Sedan", "Sport", "Truck", "Utility"]);
        assert!(matches!(
            store.add_classification("Truck").await,
            Err(StoreError::DuplicateClassification(_))
        ));
    }

    #[tokio::test]
    async fn vehicle_requires_existing_classification() {
        let store = MemoryStore::seeded();
        assert!(matches!(
            store.add_vehicle(&wrangler(999)).await,
            Err(StoreError::NotFound(_))
        ));
        let suv = suv_id(&store).await;
        let v = store.add_vehicle(&wrangler(suv)).await.unwrap();
        assert_eq!(v.classification_name, "SUV");
        assert_eq!(store.vehicles_by_classification(suv).await.unwrap(), vec![v]);
    }

    #[tokio::test]
    async fn favorites_are_idempotent_and_cascade() {
        let store = MemoryStore::seeded();
        let suv = suv_id(&store).await;
        let v = store.add_vehicle(&wrangler(suv)).await.unwrap();

        store.add(1, v.inv_id).await.unwrap();
        store.add(1, v.inv_id).await.unwrap();
        assert_eq!(store.list(1).await.unwrap().len(), 1);
        assert!(store.contains(1, v.inv_id).await.unwrap());
        assert!(matches!(store.add(1, 4242).await, Err(StoreError::NotFound(_))));

        assert!(store.delete_vehicle(v.inv_id).await.unwrap());
        assert!(store.list(1).await.unwrap().is_empty());
        assert!(!store.remove(1, v.inv_id).await.unwrap());
    }

    #[tokio::test]
    async fn favorites_list_newest_first() {
        let store = MemoryStore::seeded();
        let suv = suv_id(&store).await;
        let first = store.add_vehicle(&wrangler(suv)).await.unwrap();
        let mut other = wrangler(suv);
        other.model = "Cherokee".into();
        let second = store.add_vehicle(&other).await.unwrap();

        store.add(7, first.inv_id).await.unwrap();
        store.add(7, second.inv_id).await.unwrap();
        let ids: Vec<_> = store.list(7).await.unwrap().into_iter().map(|f| f.inv_id).collect();
        assert_eq!(ids, [second.inv_id, first.inv_id]);
    }

    #[tokio::test]
    async fn set_role_promotes_existing_accounts_only() {
        let store = MemoryStore::new();
        let acct = store.create(new_account("staff@340.edu")).await.unwrap();
        assert!(store.set_role(acct.account_id, Role::Employee).await);
        assert!(!store.set_role(404, Role::Admin).await);
        let found = store.find_by_id(acct.account_id).await.unwrap().unwrap();
        assert_eq!(found.role, Role::Employee);
    }
}
