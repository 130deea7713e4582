use crate::handlers::prelude::*;
use crate::scheduling;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchesQuery {
    tournament_id: Option<i64>,
    team_id: Option<i64>,
    status: Option<db::matches::Status>,
    from: Option<sea_orm::prelude::TimeDateTimeWithTimeZone>,
    to: Option<sea_orm::prelude::TimeDateTimeWithTimeZone>,
    page: Option<i64>,
    limit: Option<i64>,
}

#[get("/matches")]
pub async fn get_matches(req: HttpRequest, q: web::Query<MatchesQuery>) -> HttpResult {
    let state = server_state(&req)?;
    let q = q.into_inner();
    let filter = scheduling::MatchFilter {
        tournament_id: q.tournament_id,
        team_id: q.team_id,
        status: q.status,
        from: q.from,
        to: q.to,
    };
    let page = PageParams {
        page: q.page,
        limit: q.limit,
    };
    let (items, pagination) = scheduling::list_matches(&state.db, filter, page).await?;
    Ok(ok_json(Page { items, pagination }))
}

#[get("/matches/{match_id}")]
pub async fn get_match(req: HttpRequest, path: web::Path<i64>) -> HttpResult {
    let state = server_state(&req)?;
    let m = scheduling::get_match(&state.db, *path).await?;
    Ok(ok_json(m))
}
