pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod ingredients;
pub mod llm;
pub mod profile;
pub mod recipes;
pub mod safety;
pub mod state;
