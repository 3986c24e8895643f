pub mod ids;
pub mod time;

pub use ids::new_message_id;
pub use time::{format_timestamp_ms, now_ms};
