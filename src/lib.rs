//! Per-user notification storage with soft deletes, and a template-driven
//! renderer that turns a user's notifications into text.

pub mod db;
pub mod error;
pub mod notification;
pub mod routes;
pub mod state;
pub mod template;
pub mod widget;
