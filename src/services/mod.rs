// Service exports
pub mod auth;
pub mod memory;
pub mod postgres;
pub mod seed;
pub mod store;

pub use auth::{hash_password, verify_password, Claims, TokenService};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use seed::{seed_users, SEED_PASSWORD};
pub use store::{DatingStore, MatchStore, NewUser, ProfileStore, StoreError, SubscriptionStore, UserStore, ViewLogStore};
