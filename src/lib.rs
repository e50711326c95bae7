pub mod api;
pub mod error;
pub mod models;
pub mod repository;
pub mod response;
pub mod services;
pub mod state;
pub mod validation;
