pub mod admin;
pub mod auth;
pub mod chatbot;
pub mod payment;
pub mod provider;
pub mod user;
