//! Registration, login and token refresh.

pub mod controller;
pub mod router;
pub mod service;
