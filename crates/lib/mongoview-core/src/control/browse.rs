use bson::{Bson, Document, spec::ElementType};
use futures::TryStreamExt;
use mongoview_store::{CollectionListing, DocumentId, DocumentIdListing, DocumentView};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Number, Value};
use tracing::debug;

use super::{BrowseControlPlane, ControlError, Deadline, StoreAction};
use crate::store::{DocumentStore, StoreError, StoreResult};

impl<S: DocumentStore> BrowseControlPlane<S> {
    /// Lists every collection in the bound database.
    ///
    /// # Errors
    /// Returns `ControlError::Store` if enumeration fails at any point, or
    /// `ControlError::Timeout` if the deadline passes first.
    pub async fn list_collections(
        &self,
        deadline: Deadline,
    ) -> Result<CollectionListing, ControlError> {
        let fail = |err| ControlError::store(StoreAction::ListCollections, err);
        let collection_names = deadline
            .run(async {
                let mut names = self.store.list_collection_names().await.map_err(fail)?;
                let mut collected = Vec::new();
                while let Some(name) = names.try_next().await.map_err(fail)? {
                    collected.push(name);
                }
                Ok::<_, ControlError>(collected)
            })
            .await?;

        debug!(count = collection_names.len(), "listed collections");
        Ok(CollectionListing {
            database_name: self.database_name().to_string(),
            collection_names,
        })
    }

    /// Lists document identifiers in `name`, starting `skip` documents in.
    ///
    /// `skip` is the raw caller value; `None` or an empty string means zero.
    /// The returned count always covers the whole collection.
    ///
    /// # Errors
    /// Returns `ControlError::Validation` for a missing name or a bad skip,
    /// `ControlError::Store` if counting or querying fails or a document has a
    /// non-`ObjectId` `_id`, or `ControlError::Timeout` if the deadline passes.
    pub async fn list_document_ids(
        &self,
        name: &str,
        skip: Option<&str>,
        deadline: Deadline,
    ) -> Result<DocumentIdListing, ControlError> {
        if name.is_empty() {
            return Err(ControlError::validation("missing name query parameter"));
        }
        let skip = parse_skip(skip)?;

        let (document_count, ids) = deadline
            .run(async {
                let document_count = self
                    .store
                    .count_documents(name)
                    .await
                    .map_err(|err| ControlError::store(StoreAction::CountDocuments, err))?;

                let query_failed = |err| ControlError::store(StoreAction::QueryDocuments, err);
                let mut values = self.store.find_ids(name, skip).await.map_err(query_failed)?;
                let mut ids = Vec::new();
                while let Some(value) = values.try_next().await.map_err(query_failed)? {
                    ids.push(require_object_id(value).map_err(query_failed)?);
                }
                Ok::<_, ControlError>((document_count, ids))
            })
            .await?;

        debug!(collection = name, skip, document_count, page = ids.len(), "listed document ids");
        Ok(DocumentIdListing {
            database_name: self.database_name().to_string(),
            collection_name: name.to_string(),
            document_count,
            ids,
        })
    }

    /// Fetches one document and renders it as tab-indented JSON text.
    ///
    /// # Errors
    /// Returns `ControlError::Validation` for a missing collection or a
    /// malformed id, `ControlError::Store` if the document is missing, cannot
    /// be read, or cannot be rendered, or `ControlError::Timeout` if the
    /// deadline passes.
    pub async fn get_document(
        &self,
        collection: &str,
        id: &str,
        deadline: Deadline,
    ) -> Result<DocumentView, ControlError> {
        if collection.is_empty() {
            return Err(ControlError::validation("missing collection query parameter"));
        }
        if id.is_empty() {
            return Err(ControlError::validation("missing id query parameter"));
        }
        let id = DocumentId::parse_hex(id)
            .map_err(|_| ControlError::validation("invalid object ID"))?;

        let record = deadline
            .run(async {
                let decode_failed = |err| ControlError::store(StoreAction::DecodeDocument, err);
                self.store
                    .find_document(collection, &id)
                    .await
                    .map_err(decode_failed)?
                    .ok_or_else(|| {
                        decode_failed(StoreError::NotFound {
                            collection: collection.to_string(),
                            id,
                        })
                    })
            })
            .await?;

        let document = render_document(record)
            .map_err(|err| ControlError::store(StoreAction::EncodeDocument, err))?;

        debug!(collection, %id, bytes = document.len(), "fetched document");
        Ok(DocumentView {
            database_name: self.database_name().to_string(),
            collection_name: collection.to_string(),
            id,
            document,
        })
    }
}

fn parse_skip(raw: Option<&str>) -> Result<u64, ControlError> {
    let Some(raw) = raw.filter(|value| !value.is_empty()) else {
        return Ok(0);
    };
    raw.parse::<i64>()
        .ok()
        .and_then(|value| u64::try_from(value).ok())
        .ok_or_else(|| ControlError::validation("invalid skip param"))
}

fn require_object_id(value: Bson) -> StoreResult<DocumentId> {
    match value {
        Bson::ObjectId(oid) => Ok(DocumentId::from(oid)),
        other => Err(StoreError::UnsupportedIdType(
            element_type_name(other.element_type()).to_string(),
        )),
    }
}

/// Renders a document as indented JSON text, one tab per nesting level.
///
/// Object ids print as hex strings and datetimes as RFC 3339 strings. Keys are
/// sorted at every level, so an unchanged record always renders the same bytes.
///
/// # Errors
/// Returns `StoreError::Encode` if a value has no JSON form, such as a
/// non-finite double.
pub fn render_document(document: Document) -> StoreResult<String> {
    let value = document_to_json(document)?;
    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"\t"));
    value
        .serialize(&mut serializer)
        .map_err(|err| StoreError::Encode(err.to_string()))?;
    String::from_utf8(buffer).map_err(|err| StoreError::Encode(err.to_string()))
}

fn document_to_json(document: Document) -> StoreResult<Value> {
    let mut entries: Vec<(String, Bson)> = document.into_iter().collect();
    entries.sort_unstable_by(|(left, _), (right, _)| left.cmp(right));

    let mut object = Map::new();
    for (key, value) in entries {
        object.insert(key, bson_to_json(value)?);
    }
    Ok(Value::Object(object))
}

fn bson_to_json(value: Bson) -> StoreResult<Value> {
    let json = match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(when) => when
            .try_to_rfc3339_string()
            .map_or_else(|_| Bson::DateTime(when).into_relaxed_extjson(), Value::String),
        Bson::Double(number) => Number::from_f64(number)
            .map(Value::Number)
            .ok_or_else(|| StoreError::Encode(format!("unsupported value: {number}")))?,
        Bson::Document(document) => document_to_json(document)?,
        Bson::Array(items) => Value::Array(
            items
                .into_iter()
                .map(bson_to_json)
                .collect::<StoreResult<Vec<_>>>()?,
        ),
        other => other.into_relaxed_extjson(),
    };
    Ok(json)
}

#[allow(unreachable_patterns)]
const fn element_type_name(kind: ElementType) -> &'static str {
    match kind {
        ElementType::Double => "double",
        ElementType::String => "string",
        ElementType::EmbeddedDocument => "embedded document",
        ElementType::Array => "array",
        ElementType::Binary => "binary",
        ElementType::Undefined => "undefined",
        ElementType::ObjectId => "objectID",
        ElementType::Boolean => "boolean",
        ElementType::DateTime => "UTC datetime",
        ElementType::Null => "null",
        ElementType::RegularExpression => "regex",
        ElementType::DbPointer => "dbPointer",
        ElementType::JavaScriptCode => "javascript",
        ElementType::Symbol => "symbol",
        ElementType::JavaScriptCodeWithScope => "code with scope",
        ElementType::Int32 => "32-bit integer",
        ElementType::Timestamp => "timestamp",
        ElementType::Int64 => "64-bit integer",
        ElementType::Decimal128 => "128-bit decimal",
        ElementType::MinKey => "min key",
        ElementType::MaxKey => "max key",
        _ => "unknown",
    }
}
