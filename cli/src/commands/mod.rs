pub mod health;
pub mod menu;
pub mod preset;
pub mod reset;
pub mod verify;
