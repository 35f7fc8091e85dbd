pub mod edit;
pub mod event;
pub mod game;
pub mod level;
pub mod profile;
pub mod session;
pub mod step;
pub mod win;
