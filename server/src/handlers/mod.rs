pub mod prelude;

pub mod categories;
pub mod edit_match;
pub mod events;
pub mod fields;
pub mod get_acta;
pub mod get_matches;
pub mod get_standings;
pub mod get_stats;
pub mod get_vocalia;
pub mod players;
pub mod post_finalize;
pub mod post_match;
pub mod post_register_team;
pub mod post_vocalia;
pub mod put_vocalia;
pub mod regulations;
pub mod rosters;
pub mod teams;
pub mod tournaments;
pub mod users;
