pub mod admin;
pub mod callbacks;
pub mod conversation;
pub mod dispatch;
pub mod health;
pub mod keyboards;
pub mod polling;
pub mod registration;
pub mod user_lock;
pub mod webhook;

pub use dispatch::{DispatchSettings, Dispatcher};
