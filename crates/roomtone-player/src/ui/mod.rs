//! iced user interface

pub mod app;
pub mod message;

pub use app::RoomtoneApp;
pub use message::Message;
