//! User accounts: storage, identity resolution and the profile endpoints.

pub mod controller;
pub mod identity;
pub mod repository;
pub mod router;
pub mod service;
