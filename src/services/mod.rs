pub mod draw_policy;
pub mod draw_service;
pub mod prize_service;

pub use draw_policy::*;
pub use draw_service::*;
pub use prize_service::*;
