pub mod account_repo;
pub mod manager;
pub mod models;
