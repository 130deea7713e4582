use actix_web::HttpRequest;
use serde::Deserialize;

use crate::http_types::*;
use crate::server_state::server_state;
use liga_db::users::Role;

/// Identity resolved from a bearer token. Issuance and verification of
/// tokens are the auth service's problem; we only ask it who the caller is.
#[derive(Clone, Debug, Deserialize)]
pub struct AuthInfo {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

pub async fn authenticate(req: &HttpRequest) -> Result<Option<AuthInfo>, AppHttpError> {
    let Some(token) = bearer_token(req) else {
        log::trace!("No bearer token in request");
        return Ok(None);
    };
    let state = server_state(req)?;
    for t in &state.config.access_control.insecure_static_tokens {
        if t.token == token {
            return Ok(Some(AuthInfo {
                id: t.user_id,
                email: t.email.clone(),
                role: t.role,
            }));
        }
    }
    verify_remote(&state.config.auth_api_url, token).await
}

async fn verify_remote(base_url: &str, token: &str) -> Result<Option<AuthInfo>, AppHttpError> {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base_url}/verify"))
        .bearer_auth(token)
        .send()
        .await
        .map_err(|e| {
            log::error!("Token verifier is unreachable: {e:?}");
            AppHttpError::Internal
        })?;
    if !response.status().is_success() {
        log::trace!("Token rejected by the verifier: {}", response.status());
        return Ok(None);
    }
    let info = response.json::<AuthInfo>().await.map_err(|e| {
        log::error!("Failed to decode the verifier response: {e:?}");
        AppHttpError::Internal
    })?;
    Ok(Some(info))
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(actix_web::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

pub fn require(auth: Option<AuthInfo>, role: Role) -> Result<AuthInfo, AppHttpError> {
    let Some(auth) = auth else {
        return Err(AppHttpError::Unauthenticated);
    };
    if allowed(auth.role, role) {
        Ok(auth)
    } else {
        Err(AppHttpError::Forbidden(StringError(format!(
            "role {:?} cannot perform this operation",
            auth.role
        ))))
    }
}

fn allowed(have: Role, want: Role) -> bool {
    match have {
        Role::Admin => true,
        Role::Vocal => want == Role::Vocal,
    }
}
