pub mod google_sheets;

pub use google_sheets::*;
