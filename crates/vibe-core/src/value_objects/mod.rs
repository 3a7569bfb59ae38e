//! Value objects - immutable types that represent domain concepts

mod match_mode;
mod snowflake;
mod user_id;

pub use match_mode::{MatchMode, MatchModeParseError};
pub use snowflake::{Snowflake, SnowflakeGenerator, SnowflakeParseError};
pub use user_id::UserId;
