// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for geometry processing

use ifc_estate_model::EntityId;
use thiserror::Error;

/// Geometry processing result type
pub type Result<T> = std::result::Result<T, Error>;

/// Geometry processing errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Invalid attribute at index {index}: {message}")]
    InvalidAttribute { index: usize, message: String },

    #[error("Profile error: {0}")]
    Profile(String),

    #[error("Triangulation error: {0}")]
    Triangulation(String),

    #[error("Invalid extrusion: {0}")]
    InvalidExtrusion(String),

    /// Kernel output that cannot be reshaped into triangles
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    #[error("Unsupported geometry type: {0}")]
    UnsupportedType(String),
}

impl Error {
    pub fn geometry(msg: impl Into<String>) -> Self {
        Error::Geometry(msg.into())
    }

    pub fn profile(msg: impl Into<String>) -> Self {
        Error::Profile(msg.into())
    }

    pub fn triangulation(msg: impl Into<String>) -> Self {
        Error::Triangulation(msg.into())
    }

    pub fn invalid_shape(msg: impl Into<String>) -> Self {
        Error::InvalidShape(msg.into())
    }

    pub fn entity_not_found(id: EntityId) -> Self {
        Error::EntityNotFound(id)
    }

    pub fn invalid_attribute(index: usize, msg: impl Into<String>) -> Self {
        Error::InvalidAttribute {
            index,
            message: msg.into(),
        }
    }

    pub fn unsupported_type(type_name: impl Into<String>) -> Self {
        Error::UnsupportedType(type_name.into())
    }
}
