pub mod lifecycle;
pub mod registry;
pub mod roster;
