//! Property listings and their images.

pub mod controller;
pub mod router;
pub mod service;
