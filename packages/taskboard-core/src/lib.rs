pub mod auth;
pub mod board;
pub mod config;
pub mod drag;
pub mod error;
pub mod notify;
pub mod repository;
pub mod sequencer;
pub mod storage;
pub mod types;

pub use board::{BoardSnapshot, BoardState};
pub use error::BoardError;
