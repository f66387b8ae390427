use crate::entity::EntityId;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur when manipulating the world state.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The requested entity ID does not exist in the arena.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// An entity with the same name (case-insensitive) already exists.
    #[error("entity already exists: \"{0}\"")]
    DuplicateName(String),
}
