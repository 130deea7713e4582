use liga_db::{prelude::*, tournament_teams};
use sea_orm::EntityTrait;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn idx<E: EntityTrait>(s: &sea_orm::Schema, e: E) -> Vec<IndexCreateStatement> {
    s.create_index_from_entity(e)
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, m: &SchemaManager) -> Result<(), DbErr> {
        let s = sea_orm::Schema::new(m.get_database_backend());
        m.create_table(s.create_table_from_entity(Users)).await?;
        m.create_table(s.create_table_from_entity(Categories))
            .await?;
        m.create_table(s.create_table_from_entity(Tournaments))
            .await?;
        m.create_table(s.create_table_from_entity(Teams)).await?;
        m.create_table(s.create_table_from_entity(Players)).await?;
        m.create_table(s.create_table_from_entity(Fields)).await?;
        m.create_table(s.create_table_from_entity(Matches)).await?;
        m.create_table(s.create_table_from_entity(TournamentTeams))
            .await?;
        m.create_table(s.create_table_from_entity(Vocalias)).await?;
        m.create_table(s.create_table_from_entity(Goals)).await?;
        m.create_table(s.create_table_from_entity(Sanctions))
            .await?;
        m.create_table(s.create_table_from_entity(Substitutions))
            .await?;
        m.create_table(s.create_table_from_entity(MatchPlayers))
            .await?;
        let s = &s;
        let all_idx = [
            idx(s, Users),
            idx(s, Categories),
            idx(s, Tournaments),
            idx(s, Teams),
            idx(s, Players),
            idx(s, Fields),
            idx(s, Matches),
            idx(s, TournamentTeams),
            idx(s, Vocalias),
            idx(s, Goals),
            idx(s, Sanctions),
            idx(s, Substitutions),
            idx(s, MatchPlayers),
        ]
        .into_iter()
        .flatten();
        for i in all_idx {
            m.create_index(i).await?;
        }
        // The standings uniqueness the finalize workflow relies on.
        m.create_index(
            Index::create()
                .name("idx-tournament-teams-tournament-id-team-id")
                .table(TournamentTeams)
                .col(tournament_teams::Column::TournamentId)
                .col(tournament_teams::Column::TeamId)
                .unique()
                .to_owned(),
        )
        .await?;
        Ok(())
    }

    async fn down(&self, m: &SchemaManager) -> Result<(), DbErr> {
        m.drop_table(Table::drop().table(MatchPlayers).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop match_players"))?;
        m.drop_table(Table::drop().table(Substitutions).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop substitutions"))?;
        m.drop_table(Table::drop().table(Sanctions).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop sanctions"))?;
        m.drop_table(Table::drop().table(Goals).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop goals"))?;
        m.drop_table(Table::drop().table(Vocalias).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop vocalias"))?;
        m.drop_table(Table::drop().table(TournamentTeams).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop tournament_teams"))?;
        m.drop_table(Table::drop().table(Matches).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop matches"))?;
        m.drop_table(Table::drop().table(Fields).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop fields"))?;
        m.drop_table(Table::drop().table(Players).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop players"))?;
        m.drop_table(Table::drop().table(Teams).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop teams"))?;
        m.drop_table(Table::drop().table(Tournaments).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop tournaments"))?;
        m.drop_table(Table::drop().table(Categories).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop categories"))?;
        m.drop_table(Table::drop().table(Users).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop users"))?;
        Ok(())
    }
}

fn log_err<'a>(ctx: &'a str) -> impl FnOnce(&DbErr) + 'a {
    move |e| {
        eprintln!("{ctx}: {e}");
    }
}
