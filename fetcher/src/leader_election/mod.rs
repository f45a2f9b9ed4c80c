pub mod election_client;
pub mod election_trait;

pub use election_client::{ElectionClient, Role, Transition};
pub use election_trait::{Broadcast, ElectionService, SessionLink};
