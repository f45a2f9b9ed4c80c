pub mod hub;
pub mod server;

pub use hub::Hub;
pub use server::run_hub;
