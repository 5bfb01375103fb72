pub mod body;
pub mod cors;
pub mod delivery;
pub mod dispatch;
pub mod error;
pub mod frontend;
pub mod health;
pub mod modules;
pub mod openapi;
pub mod router;
