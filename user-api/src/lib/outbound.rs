pub mod auth;
pub mod identity_provider;
pub mod repositories;
