mod stats;
mod users;

pub use stats::cmd_stats;
pub use users::{cmd_create_user, cmd_list_users};
