pub use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse, Responder};
pub use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
pub use serde::{Deserialize, Serialize};

pub use liga_db as db;
pub use liga_db::users::Role;

pub use crate::auth::{authenticate, require, AuthInfo};
pub use crate::crud::{self, Page, PageParams};
pub use crate::error::Error;
pub use crate::http_types::*;
pub use crate::server_state::*;

pub fn requester_of(auth: &AuthInfo) -> crate::engine::Requester {
    match auth.role {
        Role::Admin => crate::engine::Requester::Admin,
        Role::Vocal => crate::engine::Requester::Vocal(auth.id),
    }
}
