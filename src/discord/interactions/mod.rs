pub mod events;
pub mod slash_context;
