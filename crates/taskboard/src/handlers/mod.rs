//! Request handlers, one module per resource.

pub mod auth;
pub mod chat;
pub mod health;
pub mod tasks;
pub mod users;
