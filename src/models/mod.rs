pub mod common;
pub mod draw;
pub mod prize;

pub use common::*;
pub use draw::*;
pub use prize::*;
