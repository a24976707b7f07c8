pub mod discord;
pub mod router;
pub mod types;
