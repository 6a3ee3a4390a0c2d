pub mod broadcast;
pub mod config;
pub mod directory;
pub mod game_loop;
pub mod grid;
pub mod player;
pub mod protocol;
pub mod room;
