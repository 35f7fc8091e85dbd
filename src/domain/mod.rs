pub mod entity;
pub mod grid;
pub mod physics;
pub mod player;
pub mod tile;
