pub mod admin_key;
pub mod cors;

pub use admin_key::AdminKeyMiddleware;
pub use cors::create_cors;
