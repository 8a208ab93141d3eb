pub mod auth;
pub mod health;
pub mod messaging;
pub mod properties;
pub mod users;
