//! JSON serialization options for submodel payloads.
//!
//! [`SerializationOptions::build`] is the factory: every call hands out a new,
//! independent value. The options also know how to apply themselves, so callers
//! can encode and decode without a second configuration step.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adapter::{RestError, RestErrorKind};

mod de;
mod ser;

/// How struct field names are written. Map keys are never renamed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FieldNaming {
    /// Names are written exactly as the type declares them.
    #[default]
    Preserve,
    /// `snake_case` struct fields are written as `camelCase` and read back the
    /// same way. Map keys are left alone.
    CamelCase,
}

impl FieldNaming {
    /// Wire name for a declared struct field.
    pub fn apply(self, declared: &str) -> String {
        match self {
            FieldNaming::Preserve => declared.to_owned(),
            FieldNaming::CamelCase => snake_to_camel(declared),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("failed to encode value: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode value: {0}")]
    Decode(#[source] serde_json::Error),
}

impl From<SerializationError> for RestError {
    fn from(err: SerializationError) -> Self {
        RestError::new(RestErrorKind::Parse, None, err.to_string(), false)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SerializationOptions {
    omit_null_on_write: bool,
    field_naming: FieldNaming,
    indented: bool,
}

impl SerializationOptions {
    /// Null struct fields are dropped on write and names are kept as declared.
    /// Map entries are written as they are, nulls included.
    pub fn build(indented: bool) -> Self {
        Self {
            omit_null_on_write: true,
            field_naming: FieldNaming::Preserve,
            indented,
        }
    }

    pub fn with_field_naming(mut self, field_naming: FieldNaming) -> Self {
        self.field_naming = field_naming;
        self
    }

    pub fn with_indented(mut self, indented: bool) -> Self {
        self.indented = indented;
        self
    }

    pub fn omit_null_on_write(&self) -> bool {
        self.omit_null_on_write
    }

    pub fn field_naming(&self) -> FieldNaming {
        self.field_naming
    }

    pub fn indented(&self) -> bool {
        self.indented
    }

    pub fn to_vec<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, SerializationError> {
        let tree = self.prepare(value)?;
        let encoded = if self.indented {
            serde_json::to_vec_pretty(&tree)
        } else {
            serde_json::to_vec(&tree)
        };
        encoded.map_err(SerializationError::Encode)
    }

    pub fn to_string<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, SerializationError> {
        let tree = self.prepare(value)?;
        let encoded = if self.indented {
            serde_json::to_string_pretty(&tree)
        } else {
            serde_json::to_string(&tree)
        };
        encoded.map_err(SerializationError::Encode)
    }

    pub fn from_slice<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, SerializationError> {
        match self.field_naming {
            FieldNaming::Preserve => serde_json::from_slice(bytes).map_err(SerializationError::Decode),
            naming => {
                let tree: Value =
                    serde_json::from_slice(bytes).map_err(SerializationError::Decode)?;
                T::deserialize(de::Renaming::new(tree, naming)).map_err(SerializationError::Decode)
            }
        }
    }

    fn prepare<T: Serialize + ?Sized>(&self, value: &T) -> Result<Value, SerializationError> {
        value
            .serialize(ser::Shaper::new(self.omit_null_on_write, self.field_naming))
            .map_err(SerializationError::Encode)
    }
}

impl Default for SerializationOptions {
    fn default() -> Self {
        Self::build(true)
    }
}

// Underscores are dropped and the character after each one is uppercased. A
// leading underscore is kept.
fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for ch in key.chars() {
        if ch == '_' && !out.is_empty() {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}
