pub mod draw_entries;
pub mod prize_tiers;

pub use draw_entries as draw_entry_entity;
pub use prize_tiers as prize_tier_entity;
