//! Request middleware.

pub mod identity;
pub mod negotiate;
pub mod role_gate;
pub mod security;
pub mod session;
