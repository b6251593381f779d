pub mod flags;
pub mod inventory;
pub mod room;
pub mod rules;
pub mod types;
