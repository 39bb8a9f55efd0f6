//! Process bootstrap helpers that run before any command.

pub mod logger;
