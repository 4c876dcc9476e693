pub mod aggregate;
pub mod catalog;
pub mod day;
pub mod db;
pub mod error;
pub mod models;
pub mod service;
pub mod store;
