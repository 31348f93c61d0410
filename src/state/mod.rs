pub mod activity_log;
pub mod player_index;

pub use activity_log::{ActivityEvent, ActivityLog};
pub use player_index::{NameMatch, PlayerIndex};
