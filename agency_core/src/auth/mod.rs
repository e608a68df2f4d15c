pub mod jwt;
pub mod models;
pub mod repository;
pub mod service;


pub use jwt::*;
pub use models::*;
pub use repository::*;
pub use service::*;
