pub mod api;
pub mod app;
pub mod clients;
pub mod constants;
pub mod errors;
pub mod models;
pub mod resources;
pub mod services;
pub mod store;
pub mod utils;
