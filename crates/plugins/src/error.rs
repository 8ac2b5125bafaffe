use thiserror::Error;

use crate::schema::SchemaError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] kohort_api::ApiError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

pub type Result<T> = std::result::Result<T, Error>;
