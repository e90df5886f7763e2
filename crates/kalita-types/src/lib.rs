pub mod api;
pub mod directory;
pub mod events;
pub mod models;
