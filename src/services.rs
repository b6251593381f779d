pub mod builtin;
mod error;
pub mod lines;
pub mod resolver;
mod room;
pub mod room_store;

pub use resolver::{InteractionResolver, Layer};
pub use room::RoomService;
pub use room_store::{FileRoomStore, RoomStore};

pub use error::ServiceError;
