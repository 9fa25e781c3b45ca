use crate::repository::error::DatabaseError;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ServiceError {
    #[error("Unknown creator `{creator_id}`")]
    UnknownCreator { creator_id: String },

    #[error("DatabaseError: {0}")]
    DatabaseError(#[from] DatabaseError),
}
