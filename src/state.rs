pub mod context;
pub mod dialogue;
pub mod editor;
pub mod machine;
pub mod registry;
