pub mod item;
pub mod record;

pub use item::ItemId;
pub use record::{Quality, ReviewRecord};
