pub use super::categories::Entity as Categories;
pub use super::fields::Entity as Fields;
pub use super::goals::Entity as Goals;
pub use super::match_players::Entity as MatchPlayers;
pub use super::matches::Entity as Matches;
pub use super::players::Entity as Players;
pub use super::regulations::Entity as Regulations;
pub use super::sanctions::Entity as Sanctions;
pub use super::substitutions::Entity as Substitutions;
pub use super::teams::Entity as Teams;
pub use super::tournament_teams::Entity as TournamentTeams;
pub use super::tournaments::Entity as Tournaments;
pub use super::users::Entity as Users;
pub use super::vocalias::Entity as Vocalias;
