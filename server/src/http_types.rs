use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use derive_more::Display;
use serde::Serialize;

pub type HttpResult = Result<HttpResponse, AppHttpError>;

#[derive(Debug, Display, PartialEq, Eq)]
pub struct StringError(pub String);

#[derive(Debug, Display)]
pub enum AppHttpError {
    #[display(fmt = "Internal error.")]
    Internal,

    #[display(fmt = "{_0}")]
    BadClientData(StringError),

    #[display(fmt = "{_0}")]
    NotFound(StringError),

    #[display(fmt = "{_0}")]
    Conflict(StringError),

    #[display(fmt = "{_0}")]
    Forbidden(StringError),

    #[display(fmt = "Unauthenticated.")]
    Unauthenticated,
}

impl std::error::Error for AppHttpError {}

#[derive(Serialize)]
struct FailureBody<'a> {
    success: bool,
    error: &'a str,
}

impl actix_web::error::ResponseError for AppHttpError {
    fn error_response(&self) -> HttpResponse {
        let message = self.to_string();
        HttpResponse::build(self.status_code()).json(FailureBody {
            success: false,
            error: &message,
        })
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            AppHttpError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            AppHttpError::BadClientData(_) => StatusCode::BAD_REQUEST,
            AppHttpError::NotFound(_) => StatusCode::NOT_FOUND,
            AppHttpError::Conflict(_) => StatusCode::CONFLICT,
            AppHttpError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppHttpError::Unauthenticated => StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<crate::error::Error> for AppHttpError {
    fn from(e: crate::error::Error) -> Self {
        use crate::error::Error;
        match e {
            Error::Validation(m) | Error::Integrity(m) => {
                AppHttpError::BadClientData(StringError(m))
            }
            Error::NotFound(m) => AppHttpError::NotFound(StringError(m)),
            Error::Conflict(m) => AppHttpError::Conflict(StringError(m)),
            Error::Permission(m) => AppHttpError::Forbidden(StringError(m)),
            Error::Db(e) => {
                log::error!("Database error reached the HTTP boundary: {e:?}");
                AppHttpError::Internal
            }
        }
    }
}

/// The usual way a low-level failure leaves a handler: logged with context,
/// opaque to the client.
pub fn log_internal<E: std::fmt::Debug>(context: &'static str) -> impl FnOnce(E) -> AppHttpError {
    move |e| {
        log::error!("{context}: {e:?}");
        AppHttpError::Internal
    }
}

#[derive(Serialize)]
struct SuccessBody<T: Serialize> {
    success: bool,
    data: T,
}

pub fn ok_json<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(SuccessBody {
        success: true,
        data,
    })
}

pub fn created_json<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Created().json(SuccessBody {
        success: true,
        data,
    })
}
