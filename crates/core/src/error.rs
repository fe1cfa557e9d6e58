//! Error taxonomy for Tessera.
//!
//! Every fallible operation in the workspace returns [`TesseraResult`].
//! Errors are terminal to the operation that raised them: there is no
//! retry and no partial-success signalling.

use thiserror::Error;

/// Result alias used throughout the workspace.
pub type TesseraResult<T> = Result<T, TesseraError>;

/// Message raised when a query has an OR-chain but no AND-chain.
pub const OR_WITHOUT_WHERE: &str = "Cannot use orWhere without where";

/// Errors raised by definitions, writes, queries and storage.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TesseraError {
    /// An entity or relation definition is malformed.
    #[error("Invalid definition for entity {entity}: {reason}")]
    Definition {
        /// Entity being defined
        entity: String,
        /// What is wrong with it
        reason: String,
    },

    /// A field value was rejected by its validator.
    ///
    /// Displays the validator's message unchanged.
    #[error("{message}")]
    Validation {
        /// Entity owning the field
        entity: String,
        /// Field (or relation) whose value was rejected
        field: String,
        /// Verbatim validator message
        message: String,
    },

    /// A `with` request named a relation the entity does not declare.
    #[error("Relation {relation} not found on entity {entity}")]
    RelationNotFound {
        /// Requested relation name
        relation: String,
        /// Entity the relation was looked up on
        entity: String,
    },

    /// The query builder was used in an invalid sequence.
    #[error("{message}")]
    Usage {
        /// Fixed usage message
        message: String,
    },

    /// The storage backend has no table for this entity.
    #[error("Entity {entity} is not registered")]
    EntityNotRegistered {
        /// Entity name
        entity: String,
    },

    /// A single-record patch targeted a record that does not exist.
    #[error("Record {id} not found in entity {entity}")]
    RecordNotFound {
        /// Entity name
        entity: String,
        /// Stringified id
        id: String,
    },

    /// A value cannot serve as an identity for the entity.
    #[error("Invalid id for entity {entity}: {reason}")]
    InvalidId {
        /// Entity name
        entity: String,
        /// Why the id was rejected
        reason: String,
    },

    /// A comparison operator symbol is not in the operator table.
    #[error("Unknown operator: {symbol}")]
    UnknownOperator {
        /// The rejected symbol
        symbol: String,
    },

    /// A write was attempted on a read-only database.
    #[error("Database is read-only")]
    ReadOnly,

    /// Serialization or deserialization failed.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Underlying error message
        message: String,
    },

    /// Filesystem I/O failed.
    #[error("I/O error: {message}")]
    Io {
        /// Underlying error message
        message: String,
    },
}

impl TesseraError {
    /// Build a [`TesseraError::Definition`].
    pub fn definition(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        TesseraError::Definition {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`TesseraError::Validation`].
    pub fn validation(
        entity: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        TesseraError::Validation {
            entity: entity.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Build a [`TesseraError::RelationNotFound`].
    pub fn relation_not_found(relation: impl Into<String>, entity: impl Into<String>) -> Self {
        TesseraError::RelationNotFound {
            relation: relation.into(),
            entity: entity.into(),
        }
    }

    /// Build a [`TesseraError::Usage`].
    pub fn usage(message: impl Into<String>) -> Self {
        TesseraError::Usage {
            message: message.into(),
        }
    }

    /// Build a [`TesseraError::EntityNotRegistered`].
    pub fn not_registered(entity: impl Into<String>) -> Self {
        TesseraError::EntityNotRegistered {
            entity: entity.into(),
        }
    }

    /// Build a [`TesseraError::RecordNotFound`].
    pub fn record_not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        TesseraError::RecordNotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Build a [`TesseraError::InvalidId`].
    pub fn invalid_id(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        TesseraError::InvalidId {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`TesseraError::Serialization`].
    pub fn serialization(message: impl Into<String>) -> Self {
        TesseraError::Serialization {
            message: message.into(),
        }
    }

    /// Whether this error came from a field validator.
    pub fn is_validation(&self) -> bool {
        matches!(self, TesseraError::Validation { .. })
    }
}

impl From<serde_json::Error> for TesseraError {
    fn from(err: serde_json::Error) -> Self {
        TesseraError::serialization(err.to_string())
    }
}

impl From<std::io::Error> for TesseraError {
    fn from(err: std::io::Error) -> Self {
        TesseraError::Io {
            message: err.to_string(),
        }
    }
}
