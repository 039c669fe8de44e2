use std::error::Error;
use std::fmt;
use std::str::FromStr;

use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::schema::ID_HEX_LEN;

/// Store-native document identifier, represented externally as 24 hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DocumentId(ObjectId);

impl DocumentId {
    #[must_use]
    pub const fn new(oid: ObjectId) -> Self {
        Self(oid)
    }

    #[must_use]
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(ObjectId::from_bytes(bytes))
    }

    /// Parses the 24-digit hex form. Anything else is rejected whole.
    ///
    /// # Errors
    /// Returns `IdParseError` if the input is not exactly 24 ASCII hex digits.
    pub fn parse_hex(value: &str) -> Result<Self, IdParseError> {
        if value.len() != ID_HEX_LEN || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(IdParseError(value.to_string()));
        }
        ObjectId::parse_str(value)
            .map(Self)
            .map_err(|_| IdParseError(value.to_string()))
    }

    #[must_use]
    pub fn to_hex(self) -> String {
        self.0.to_hex()
    }

    #[must_use]
    pub const fn oid(&self) -> ObjectId {
        self.0
    }
}

impl From<ObjectId> for DocumentId {
    fn from(oid: ObjectId) -> Self {
        Self(oid)
    }
}

impl From<DocumentId> for ObjectId {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.to_hex()
    }
}

impl TryFrom<String> for DocumentId {
    type Error = IdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_hex(&value)
    }
}

impl FromStr for DocumentId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

/// Input that is not a well-formed hex identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdParseError(pub String);

impl fmt::Display for IdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid object ID: {:?}", self.0)
    }
}

impl Error for IdParseError {}

/// Collections in the bound database, in store enumeration order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionListing {
    pub database_name: String,
    pub collection_names: Vec<String>,
}

/// One page of document identifiers within a collection.
///
/// `document_count` covers the whole collection, not just this page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentIdListing {
    pub database_name: String,
    pub collection_name: String,
    pub document_count: u64,
    pub ids: Vec<DocumentId>,
}

/// A single document rendered as indented text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentView {
    pub database_name: String,
    pub collection_name: String,
    pub id: DocumentId,
    pub document: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip_is_identity() {
        for hex in [
            "000000000000000000000000",
            "ffffffffffffffffffffffff",
            "5f1d7c2e9a3b4c5d6e7f8091",
        ] {
            let id = DocumentId::parse_hex(hex).expect("valid hex id");
            assert_eq!(id.to_hex(), hex);
            assert_eq!(id.to_string(), hex);
        }
    }

    #[test]
    fn accepts_uppercase_and_formats_lowercase() {
        let id = DocumentId::parse_hex("5F1D7C2E9A3B4C5D6E7F8091").expect("valid hex id");
        assert_eq!(id.to_hex(), "5f1d7c2e9a3b4c5d6e7f8091");
    }

    #[test]
    fn rejects_malformed_ids() {
        for input in [
            "",
            "5f1d7c2e9a3b4c5d6e7f809",
            "5f1d7c2e9a3b4c5d6e7f80912",
            "5f1d7c2e9a3b4c5d6e7f809g",
            " 5f1d7c2e9a3b4c5d6e7f809",
            "+f1d7c2e9a3b4c5d6e7f8091",
            "５f1d7c2e9a3b4c5d6e7f809",
        ] {
            assert!(DocumentId::parse_hex(input).is_err(), "{input:?} should be rejected");
        }
    }

    #[test]
    fn serializes_as_hex_string() {
        let id = DocumentId::from_bytes([0xab; 12]);
        let json = serde_json::to_value(id).expect("serialize id");
        assert_eq!(json, serde_json::json!("abababababababababababab"));

        let back: DocumentId = serde_json::from_value(json).expect("deserialize id");
        assert_eq!(back, id);
    }

    #[test]
    fn listing_uses_camel_case_fields() {
        let listing = DocumentIdListing {
            database_name: "example".to_string(),
            collection_name: "users".to_string(),
            document_count: 1,
            ids: vec![DocumentId::from_bytes([1; 12])],
        };
        let json = serde_json::to_value(&listing).expect("serialize listing");
        assert_eq!(json["databaseName"], "example");
        assert_eq!(json["collectionName"], "users");
        assert_eq!(json["documentCount"], 1);
        assert_eq!(json["ids"][0], "010101010101010101010101");
    }
}
