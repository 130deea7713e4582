use sea_orm::prelude::TimeDateTimeWithTimeZone;
use sea_orm::{ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QuerySelect, Select};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// Non-positive and missing values fall back to the 1/10 defaults.
pub fn page_window(params: PageParams) -> (u64, u64) {
    let page = params.page.map_or(DEFAULT_PAGE, |p| p.max(1) as u64);
    let limit = params.limit.map_or(DEFAULT_LIMIT, |l| l.max(1) as u64);
    (page, limit)
}

pub fn pagination(total: u64, page: u64, limit: u64) -> Pagination {
    Pagination {
        total,
        page,
        limit,
        total_pages: total.div_ceil(limit),
    }
}

/// Shared listing path of every entity service: count, then fetch one page.
/// An empty page is a successful result.
pub async fn paginate<E: EntityTrait, C: ConnectionTrait>(
    db: &C,
    select: Select<E>,
    params: PageParams,
) -> Result<(Vec<E::Model>, Pagination), DbErr>
where
    E::Model: Send + Sync,
{
    let (page, limit) = page_window(params);
    let total = select.clone().count(db).await?;
    let items = select
        .offset((page - 1) * limit)
        .limit(limit)
        .all(db)
        .await?;
    Ok((items, pagination(total, page, limit)))
}

pub fn contains_filter<C: ColumnTrait>(col: C, needle: Option<&str>) -> Condition {
    match needle {
        Some(s) if !s.is_empty() => Condition::all().add(col.contains(s)),
        _ => Condition::all(),
    }
}

pub fn eq_filter<C: ColumnTrait, V: Into<sea_orm::Value>>(col: C, value: Option<V>) -> Condition {
    match value {
        Some(v) => Condition::all().add(col.eq(v)),
        None => Condition::all(),
    }
}

pub fn date_range_filter<C: ColumnTrait>(
    col: C,
    from: Option<TimeDateTimeWithTimeZone>,
    to: Option<TimeDateTimeWithTimeZone>,
) -> Condition {
    let mut c = Condition::all();
    if let Some(from) = from {
        c = c.add(col.gte(from));
    }
    if let Some(to) = to {
        c = c.add(col.lte(to));
    }
    c
}
