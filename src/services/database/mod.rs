// Database service module
// SQLite connection and schema for the client-side cache

mod connection;
mod schema;

pub use connection::Database;
