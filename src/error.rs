use crate::identifier::Identifier;

/// Error type for registry, asset and persistence operations.
#[derive(Debug, thiserror::Error)]
pub enum AccretionError {
    #[error("registry '{registry}' is frozen")]
    RegistryFrozen { registry: Identifier },
    #[error("duplicate entry '{id}' in registry '{registry}'")]
    DuplicateEntry {
        registry: Identifier,
        id: Identifier,
    },
    #[error("registry '{registry}' has {count} unregistered intrusive holder(s)")]
    UnregisteredIntrusiveHolders {
        registry: Identifier,
        count: usize,
    },
    #[error("tags not bound for '{0}'")]
    TagsNotBound(String),
    #[error("entry '{id}' not found in registry '{registry}'")]
    UnknownEntry {
        registry: Identifier,
        id: Identifier,
    },
    #[error("value not present in registry '{registry}'")]
    UnknownValue { registry: Identifier },
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),
    #[error("component parse error: {0}")]
    ComponentParse(String),
    #[error("script error: {0}")]
    Script(String),
    #[error("invalid definition: {0}")]
    Definition(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AccretionError>;
