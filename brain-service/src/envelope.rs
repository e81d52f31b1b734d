//! Tagged wire form for the closed unions that cross the JSON boundary.
//!
//! Claims, identifiers and party records are sum types. On the wire each one
//! travels as `{"type": "<tag>", "value": <payload>}`; the tag is
//! authoritative and must belong to the closed registry of the union being
//! decoded. The codec never infers a variant from the payload shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// `{type, value}` pair carrying one variant of an [`Enveloped`] union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: Value,
}

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("unknown {capability} variant '{kind}'")]
    UnknownVariant {
        capability: &'static str,
        kind: String,
    },

    #[error("malformed {capability} envelope of type '{kind}': {source}")]
    MalformedEnvelope {
        capability: &'static str,
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to wrap {capability}: {source}")]
    Wrapping {
        capability: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// A closed union that can be carried in an [`Envelope`].
///
/// `Kind` is the union's tag registry. Its `FromStr` must reject every string
/// that is not a registered tag, which is what makes unknown variants a hard
/// decode failure.
pub trait Enveloped: Sized {
    /// Capability name used in error messages ("claims", "identifier", "party").
    const CAPABILITY: &'static str;

    type Kind: Copy + fmt::Display + FromStr;

    fn kind(&self) -> Self::Kind;

    /// The concrete variant's own JSON, without the tag.
    fn payload(&self) -> serde_json::Result<Value>;

    /// Decode `payload` as the concrete variant registered for `kind`.
    fn from_payload(kind: Self::Kind, payload: Value) -> serde_json::Result<Self>;
}

impl Envelope {
    pub fn wrap<T: Enveloped>(value: &T) -> Result<Self, EnvelopeError> {
        let payload = value.payload().map_err(|source| EnvelopeError::Wrapping {
            capability: T::CAPABILITY,
            source,
        })?;

        Ok(Self {
            kind: value.kind().to_string(),
            value: payload,
        })
    }

    pub fn unwrap_as<T: Enveloped>(self) -> Result<T, EnvelopeError> {
        let kind: T::Kind = self
            .kind
            .parse()
            .map_err(|_| EnvelopeError::UnknownVariant {
                capability: T::CAPABILITY,
                kind: self.kind.clone(),
            })?;

        T::from_payload(kind, self.value).map_err(|source| EnvelopeError::MalformedEnvelope {
            capability: T::CAPABILITY,
            kind: self.kind,
            source,
        })
    }
}

/// Implements `Serialize`/`Deserialize` for an [`Enveloped`] union by going
/// through its envelope, so any field of that type is wrapped on the wire.
macro_rules! enveloped_serde {
    ($ty:ty) => {
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let envelope = $crate::envelope::Envelope::wrap(self)
                    .map_err(<S::Error as serde::ser::Error>::custom)?;
                serde::Serialize::serialize(&envelope, serializer)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let envelope =
                    <$crate::envelope::Envelope as serde::Deserialize>::deserialize(deserializer)?;
                envelope
                    .unwrap_as::<$ty>()
                    .map_err(<D::Error as serde::de::Error>::custom)
            }
        }
    };
}

pub(crate) use enveloped_serde;

/// Tag registry helper: matches `s` against the `as_str` of every kind.
pub(crate) fn parse_tag<K: Copy>(all: &[K], as_str: fn(K) -> &'static str, s: &str) -> Option<K> {
    all.iter().copied().find(|k| as_str(*k) == s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Claims, ClaimsKind, Identifier};
    use serde_json::json;

    #[test]
    fn unknown_tag_is_rejected_for_every_capability() {
        let envelope = Envelope {
            kind: "totally-unknown-tag".to_string(),
            value: json!({}),
        };

        assert!(matches!(
            envelope.clone().unwrap_as::<Claims>(),
            Err(EnvelopeError::UnknownVariant { capability: "claims", .. })
        ));
        assert!(matches!(
            envelope.clone().unwrap_as::<Identifier>(),
            Err(EnvelopeError::UnknownVariant { capability: "identifier", .. })
        ));
        assert!(matches!(
            envelope.unwrap_as::<crate::models::Party>(),
            Err(EnvelopeError::UnknownVariant { capability: "party", .. })
        ));
    }

    #[test]
    fn tags_are_case_sensitive() {
        let envelope = Envelope {
            kind: "humanuserlogin".to_string(),
            value: json!({}),
        };
        assert!(matches!(
            envelope.unwrap_as::<Claims>(),
            Err(EnvelopeError::UnknownVariant { .. })
        ));
    }

    #[test]
    fn known_tag_with_wrong_shape_is_malformed() {
        let envelope = Envelope {
            kind: ClaimsKind::HumanUserLogin.to_string(),
            value: json!({ "userId": 42 }),
        };
        assert!(matches!(
            envelope.unwrap_as::<Claims>(),
            Err(EnvelopeError::MalformedEnvelope { capability: "claims", .. })
        ));
    }

    #[test]
    fn tag_decides_the_variant_not_the_payload() {
        // A Name payload under the Id tag is not silently reinterpreted.
        let envelope = Envelope {
            kind: "Id".to_string(),
            value: json!({ "name": "root" }),
        };
        assert!(matches!(
            envelope.unwrap_as::<Identifier>(),
            Err(EnvelopeError::MalformedEnvelope { .. })
        ));
    }

    #[test]
    fn wire_shape_uses_type_and_value() {
        let id = Identifier::id("abc");
        let wire = serde_json::to_value(&id).unwrap();
        assert_eq!(wire, json!({ "type": "Id", "value": { "id": "abc" } }));
    }
}
