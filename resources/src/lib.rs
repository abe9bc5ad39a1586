pub mod models;
pub mod objects;
