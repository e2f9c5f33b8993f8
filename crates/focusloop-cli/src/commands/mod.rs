pub mod config;
pub mod history;
pub mod items;
pub mod timer;
