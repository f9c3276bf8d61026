//! Domain models shared by the stores and the HTTP layer.

pub mod account;
pub mod inventory;

pub use account::{Account, AccountWithPassword, Identity, NewAccount, Role, UnknownRole};
pub use inventory::{Classification, FavoriteItem, Vehicle, VehicleForm};
