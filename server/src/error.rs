use derive_more::Display;
use sea_orm::DbErr;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure taxonomy of the service layer; the HTTP boundary maps each
/// variant to a status code.
#[derive(Debug, Display)]
pub enum Error {
    #[display(fmt = "{_0}")]
    Validation(String),
    #[display(fmt = "{_0}")]
    NotFound(String),
    #[display(fmt = "{_0}")]
    Conflict(String),
    #[display(fmt = "{_0}")]
    Permission(String),
    #[display(fmt = "{_0}")]
    Integrity(String),
    #[display(fmt = "database error: {_0}")]
    Db(DbErr),
}

impl std::error::Error for Error {}

impl From<DbErr> for Error {
    fn from(e: DbErr) -> Self {
        Error::Db(e)
    }
}

impl From<sea_orm::TransactionError<Error>> for Error {
    fn from(e: sea_orm::TransactionError<Error>) -> Self {
        match e {
            sea_orm::TransactionError::Connection(e) => Error::Db(e),
            sea_orm::TransactionError::Transaction(e) => e,
        }
    }
}
