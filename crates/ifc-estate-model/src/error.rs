// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for reading IFC files

use crate::EntityId;
use thiserror::Error;

/// Result type alias for parser operations
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors that can occur while loading or reading an IFC file
#[derive(Error, Debug)]
pub enum ParseError {
    /// Content is not an ISO-10303-21 exchange structure
    #[error("Invalid IFC format: {0}")]
    InvalidFormat(String),

    /// HEADER section could not be read
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Schema identifier outside the supported IFC releases
    #[error("Unsupported schema version: {0}")]
    UnsupportedSchema(String),

    /// Failed to decode an entity instance
    #[error("Failed to parse entity {0}: {1}")]
    EntityParse(EntityId, String),

    /// Entity not found
    #[error("Entity {0} not found")]
    EntityNotFound(EntityId),

    /// Missing required attribute
    #[error("Missing required attribute {attribute} on entity {entity}")]
    MissingAttribute { entity: EntityId, attribute: usize },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl ParseError {
    /// Create a new format error
    pub fn format(msg: impl Into<String>) -> Self {
        ParseError::InvalidFormat(msg.into())
    }

    /// Create a new entity parse error
    pub fn entity_parse(id: EntityId, msg: impl Into<String>) -> Self {
        ParseError::EntityParse(id, msg.into())
    }

    /// Create a missing attribute error
    pub fn missing(entity: EntityId, attribute: usize) -> Self {
        ParseError::MissingAttribute { entity, attribute }
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        ParseError::Other(msg.into())
    }
}
