//! API handlers module

pub mod attachments;
pub mod audits;
pub mod auth;
pub mod health;
pub mod library;
pub mod non_conformities;
pub mod users;
