pub mod config;
pub mod display;
pub mod error;
pub mod fetch_task;
pub mod leader_election;
pub mod messages;
pub mod participant;
pub mod scene;
pub mod session;

pub use participant::Participant;
