pub mod auth;
pub mod contacts;
pub mod employees;
pub mod health;
pub mod routes;
pub mod storage;
