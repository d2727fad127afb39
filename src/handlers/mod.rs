pub mod admin;
pub mod draw;
pub mod prize;

pub use admin::admin_config;
pub use draw::draw_config;
pub use prize::prize_config;
