pub mod scheduler;
pub mod selector;
pub mod sm2;

pub use scheduler::{record_priority, ReviewCalendar, Scheduler, SchedulerStats};
pub use selector::QuestionSelector;
pub use sm2::{calculate_sm2, Sm2Result};
