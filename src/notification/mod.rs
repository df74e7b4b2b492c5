// Declare submodules
pub mod notification_catalog;
pub mod notification_dto;
pub mod notification_handlers;
pub mod notification_manager;
pub mod notification_models;
pub mod notification_repository;

// Re-export public items
pub use notification_catalog::{MessageCatalog, MessageText};
pub use notification_manager::NotificationManager;
pub use notification_models::Notification;
pub use notification_repository::{DatabaseTarget, NotificationTarget};
