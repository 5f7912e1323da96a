//! URL-safe annotation identifiers.
//!
//! Annotation ids are UUIDs in the database and travel over the wire as the
//! URL-safe base64 encoding of their 16 bytes with the padding stripped, which
//! always yields a 22 character string.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use uuid::Uuid;

use crate::error::CoreError;

/// Length of an encoded id.
pub const ENCODED_ID_LEN: usize = 22;

/// Encode a UUID as a URL-safe id.
pub fn encode(id: &Uuid) -> String {
    URL_SAFE_NO_PAD.encode(id.as_bytes())
}

/// Decode a URL-safe id back into a UUID.
pub fn decode(value: &str) -> Result<Uuid, CoreError> {
    if value.len() != ENCODED_ID_LEN {
        return Err(invalid(value));
    }
    let bytes = URL_SAFE_NO_PAD.decode(value).map_err(|_| invalid(value))?;
    Uuid::from_slice(&bytes).map_err(|_| invalid(value))
}

/// Decode a list of ids, failing on the first malformed entry.
pub fn decode_all<S: AsRef<str>>(values: &[S]) -> Result<Vec<Uuid>, CoreError> {
    values.iter().map(|v| decode(v.as_ref())).collect()
}

fn invalid(value: &str) -> CoreError {
    CoreError::Validation(format!("'{value}' is not a valid annotation id"))
}

/// Serde adapters so DTOs can carry [`Uuid`]s that serialize as URL-safe ids.
pub mod serde_id {
    use serde::{Deserialize, Deserializer, Serializer};
    use uuid::Uuid;

    pub fn serialize<S: Serializer>(id: &Uuid, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::encode(id))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Uuid, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::decode(&raw).map_err(serde::de::Error::custom)
    }
}

/// Like [`serde_id`] but for lists of ids.
pub mod serde_ids {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};
    use uuid::Uuid;

    pub fn serialize<S: Serializer>(ids: &[Uuid], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(ids.len()))?;
        for id in ids {
            seq.serialize_element(&super::encode(id))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Uuid>, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        super::decode_all(&raw).map_err(serde::de::Error::custom)
    }
}
