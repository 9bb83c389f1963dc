pub mod app;
pub mod auth;
pub mod chat;
pub mod cli;
pub mod config;
pub mod content;
pub mod history;
pub mod message;
pub mod paths;
pub mod payment;
pub mod quota;
pub mod relay;
pub mod settings;
pub mod state;
pub mod store;
pub mod util;
