//! Services module
//!
//! Business logic services that coordinate between the API handlers,
//! the record store and the blob store.

pub mod users;

pub use users::{UserForm, UsersService};
