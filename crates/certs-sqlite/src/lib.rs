mod open;
mod models;
mod upsert;
mod query;
mod schema;

pub use open::Db;
pub use models::*;
