//! Nullable column values with symmetric JSON encoding.
//!
//! A [`Nullable`] is either valid (carries a value) or not (SQL NULL).
//! Valid values serialize exactly like the wrapped primitive; invalid ones
//! serialize as JSON `null`. Record fields are never skipped, so a NULL
//! column always shows up as `"field": null`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Primitive types that may be wrapped in [`Nullable`].
///
/// Sealed: the family is boolean, 64-bit integer, double, string and
/// timestamp.
pub trait Primitive: Serialize + DeserializeOwned + sealed::Sealed {
    /// Name used in codec error messages.
    const TYPE_NAME: &'static str;

    /// Rejects values that have no faithful JSON literal.
    fn check_encodable(&self) -> Result<(), String> {
        Ok(())
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for bool {}
    impl Sealed for i64 {}
    impl Sealed for f64 {}
    impl Sealed for String {}
    impl Sealed for chrono::DateTime<chrono::Utc> {}
}

impl Primitive for bool {
    const TYPE_NAME: &'static str = "boolean";
}

impl Primitive for i64 {
    const TYPE_NAME: &'static str = "int64";
}

impl Primitive for f64 {
    const TYPE_NAME: &'static str = "float64";

    fn check_encodable(&self) -> Result<(), String> {
        // serde_json would silently write NaN/inf as null, which decodes
        // back as an invalid value.
        if self.is_finite() {
            Ok(())
        } else {
            Err(format!("{self} has no JSON representation"))
        }
    }
}

impl Primitive for String {
    const TYPE_NAME: &'static str = "string";
}

impl Primitive for DateTime<Utc> {
    const TYPE_NAME: &'static str = "timestamp";
}

/// A column value that may be SQL NULL.
#[derive(Clone, PartialEq)]
pub struct Nullable<T> {
    value: Option<T>,
}

pub type NullBool = Nullable<bool>;
pub type NullInt64 = Nullable<i64>;
pub type NullFloat64 = Nullable<f64>;
pub type NullString = Nullable<String>;
pub type NullTime = Nullable<DateTime<Utc>>;

impl<T> Nullable<T> {
    /// A valid value.
    pub fn new(value: T) -> Self {
        Self { value: Some(value) }
    }

    /// The invalid (NULL) value.
    pub fn null() -> Self {
        Self { value: None }
    }

    pub fn is_valid(&self) -> bool {
        self.value.is_some()
    }

    /// The wrapped value, if valid.
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn into_option(self) -> Option<T> {
        self.value
    }
}

impl<T> Default for Nullable<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> From<Option<T>> for Nullable<T> {
    fn from(value: Option<T>) -> Self {
        Self { value }
    }
}

impl<T: fmt::Debug> fmt::Debug for Nullable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => f.debug_tuple("Valid").field(v).finish(),
            None => f.write_str("Null"),
        }
    }
}

impl<T: Primitive> Serialize for Nullable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.value {
            Some(v) => {
                v.check_encodable().map_err(serde::ser::Error::custom)?;
                v.serialize(serializer)
            }
            None => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Primitive> Deserialize<'de> for Nullable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Nullable::from)
    }
}

/// Error produced by [`encode`] and [`decode`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("cannot decode {token} as nullable {target}: {message}")]
    Decode {
        token: String,
        target: &'static str,
        message: String,
    },

    #[error("cannot encode nullable {target}: {message}")]
    Encode {
        target: &'static str,
        message: String,
    },
}

/// Encodes a nullable value as a JSON literal (`null` when invalid).
pub fn encode<T: Primitive>(value: &Nullable<T>) -> Result<String, CodecError> {
    serde_json::to_string(value).map_err(|e| CodecError::Encode {
        target: T::TYPE_NAME,
        message: e.to_string(),
    })
}

/// Decodes a JSON literal (`null` or a `T`) into a nullable value.
pub fn decode<T: Primitive>(json: &str) -> Result<Nullable<T>, CodecError> {
    serde_json::from_str(json).map_err(|e| CodecError::Decode {
        token: json.trim().to_string(),
        target: T::TYPE_NAME,
        message: e.to_string(),
    })
}
