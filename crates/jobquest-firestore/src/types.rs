//! Firestore REST API types and value conversions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{FirestoreError, FirestoreResult};

/// Firestore document value types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String), // Firestore sends integers as strings
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(GeoPoint),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    pub values: Option<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    pub fields: Option<HashMap<String, Value>>,
}

impl Value {
    /// Wrap a field map as a nested map value.
    pub fn map(fields: HashMap<String, Value>) -> Self {
        Value::MapValue(MapValue {
            fields: Some(fields),
        })
    }
}

/// Firestore document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name
    pub name: Option<String>,
    /// Document fields
    pub fields: Option<HashMap<String, Value>>,
    /// Create time
    pub create_time: Option<String>,
    /// Update time
    pub update_time: Option<String>,
}

impl Document {
    /// Create a new document with the given fields.
    pub fn new(fields: HashMap<String, Value>) -> Self {
        Self {
            name: None,
            fields: Some(fields),
            create_time: None,
            update_time: None,
        }
    }

    /// Create a named document, as used inside batch writes.
    pub fn named(name: String, fields: HashMap<String, Value>) -> Self {
        Self {
            name: Some(name),
            ..Self::new(fields)
        }
    }

    /// Last segment of the resource name.
    pub fn id(&self) -> Option<&str> {
        self.name.as_deref().and_then(|n| n.rsplit('/').next())
    }

    /// Typed reader over the document fields.
    pub fn reader(&self) -> FirestoreResult<Fields<'_>> {
        self.fields
            .as_ref()
            .map(|f| Fields(Some(f)))
            .ok_or_else(|| FirestoreError::invalid_response("Document has no fields"))
    }
}

/// Read-only accessor for a document's (or nested map's) fields.
#[derive(Clone, Copy)]
pub struct Fields<'a>(Option<&'a HashMap<String, Value>>);

impl<'a> Fields<'a> {
    pub fn raw(&self, key: &str) -> Option<&'a Value> {
        self.0.and_then(|f| f.get(key))
    }

    pub fn get<T: FromFirestoreValue>(&self, key: &str) -> Option<T> {
        self.raw(key).and_then(T::from_firestore_value)
    }

    /// String field, empty when absent.
    pub fn string(&self, key: &str) -> String {
        self.get(key).unwrap_or_default()
    }

    /// Field that must be present and well-typed.
    pub fn require<T: FromFirestoreValue>(&self, key: &str) -> FirestoreResult<T> {
        self.get(key)
            .ok_or_else(|| FirestoreError::invalid_response(format!("missing or invalid field `{}`", key)))
    }

    /// Nested map field. Absent or null maps read as `None`.
    pub fn map(&self, key: &str) -> Option<Fields<'a>> {
        match self.raw(key) {
            Some(Value::MapValue(m)) => Some(Fields(m.fields.as_ref())),
            _ => None,
        }
    }

    /// Array field as nested maps, skipping non-map elements.
    pub fn maps(&self, key: &str) -> Vec<Fields<'a>> {
        match self.raw(key) {
            Some(Value::ArrayValue(arr)) => arr
                .values
                .iter()
                .flatten()
                .filter_map(|v| match v {
                    Value::MapValue(m) => Some(Fields(m.fields.as_ref())),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// List documents response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    pub documents: Option<Vec<Document>>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetDocumentsRequest {
    pub documents: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask: Option<DocumentMask>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetDocumentsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found: Option<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<String>,
}

// ============================================================================
// Batch Write Types (for atomic multi-document operations)
// ============================================================================

/// A single write operation in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Write {
    /// Update or insert a document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<Document>,

    /// Delete a document by name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<String>,

    /// Field mask for partial updates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_mask: Option<DocumentMask>,

    /// Precondition for the write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_document: Option<Precondition>,
}

impl Write {
    /// Full overwrite of a document.
    pub fn upsert(document: Document) -> Self {
        Self {
            update: Some(document),
            delete: None,
            update_mask: None,
            current_document: None,
        }
    }

    /// Insert that fails if the document already exists.
    pub fn create(document: Document) -> Self {
        Self {
            current_document: Some(Precondition::exists(false)),
            ..Self::upsert(document)
        }
    }

    /// Partial update of the masked fields on an existing document.
    pub fn patch(document: Document, field_paths: Vec<String>) -> Self {
        Self {
            update: Some(document),
            delete: None,
            update_mask: Some(DocumentMask { field_paths }),
            current_document: Some(Precondition::exists(true)),
        }
    }

    /// Delete by full document name.
    pub fn delete(name: String) -> Self {
        Self {
            update: None,
            delete: Some(name),
            update_mask: None,
            current_document: None,
        }
    }
}

/// Document field mask for partial updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMask {
    pub field_paths: Vec<String>,
}

/// Precondition for a write operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Precondition {
    /// Document must (or must not) exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,

    /// Document must have this update time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl Precondition {
    pub fn exists(exists: bool) -> Self {
        Self {
            exists: Some(exists),
            update_time: None,
        }
    }
}

/// Batch write request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchWriteRequest {
    pub writes: Vec<Write>,
}

/// Result of a single write in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResult {
    /// Update time of the written document.
    pub update_time: Option<String>,
}

/// Status of a single write in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    /// gRPC status code (0 = OK).
    pub code: Option<i32>,
    /// Error message if failed.
    pub message: Option<String>,
}

/// gRPC ALREADY_EXISTS.
const GRPC_ALREADY_EXISTS: i32 = 6;

/// gRPC FAILED_PRECONDITION.
const GRPC_FAILED_PRECONDITION: i32 = 9;

/// Batch write response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchWriteResponse {
    /// Results for each write, in order.
    pub write_results: Option<Vec<WriteResult>>,
    /// Status for each write, in order.
    pub status: Option<Vec<Status>>,
}

impl BatchWriteResponse {
    /// Create an empty response for empty batch writes.
    pub fn empty() -> Self {
        Self {
            write_results: Some(vec![]),
            status: Some(vec![]),
        }
    }

    /// Surface the first failed write, if any.
    pub fn check_for_errors(&self) -> FirestoreResult<()> {
        let failed = self
            .status
            .iter()
            .flatten()
            .enumerate()
            .find_map(|(i, s)| s.code.filter(|c| *c != 0).map(|c| (i, c, s)));

        let Some((index, code, status)) = failed else {
            return Ok(());
        };
        let msg = format!(
            "Batch write failed at index {}: {} (code {})",
            index,
            status.message.as_deref().unwrap_or("Unknown error"),
            code
        );
        Err(match code {
            GRPC_ALREADY_EXISTS => FirestoreError::AlreadyExists(msg),
            GRPC_FAILED_PRECONDITION => FirestoreError::PreconditionFailed(msg),
            _ => FirestoreError::request_failed(msg),
        })
    }
}

// ============================================================================
// Query Types
// ============================================================================

/// Structured query for `documents:runQuery`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredQuery {
    pub from: Vec<CollectionSelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#where: Option<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<Vec<Order>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<Cursor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSelector {
    pub collection_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_descendants: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composite_filter: Option<CompositeFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_filter: Option<FieldFilter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeFilter {
    pub op: String,
    pub filters: Vec<Filter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldFilter {
    pub field: FieldReference,
    pub op: String,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReference {
    pub field_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub field: FieldReference,
    pub direction: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cursor {
    pub values: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryRequest {
    pub structured_query: StructuredQuery,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryResponse {
    pub document: Option<Document>,
    pub read_time: Option<String>,
}

/// Sort direction for queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        }
    }
}

impl StructuredQuery {
    /// Query every document of a collection.
    pub fn collection(collection_id: &str) -> Self {
        Self {
            from: vec![CollectionSelector {
                collection_id: collection_id.to_string(),
                all_descendants: None,
            }],
            r#where: None,
            order_by: None,
            start_at: None,
            limit: None,
        }
    }

    /// Add an equality filter. Multiple filters are AND-ed.
    pub fn where_eq(mut self, field_path: &str, value: Value) -> Self {
        let filter = Filter {
            composite_filter: None,
            field_filter: Some(FieldFilter {
                field: FieldReference {
                    field_path: field_path.to_string(),
                },
                op: "EQUAL".to_string(),
                value,
            }),
        };

        self.r#where = Some(match self.r#where.take() {
            None => filter,
            Some(Filter {
                composite_filter: Some(mut composite),
                ..
            }) => {
                composite.filters.push(filter);
                Filter {
                    composite_filter: Some(composite),
                    field_filter: None,
                }
            }
            Some(existing) => Filter {
                composite_filter: Some(CompositeFilter {
                    op: "AND".to_string(),
                    filters: vec![existing, filter],
                }),
                field_filter: None,
            },
        });
        self
    }

    pub fn order_by(mut self, field_path: &str, direction: Direction) -> Self {
        self.order_by.get_or_insert_with(Vec::new).push(Order {
            field: FieldReference {
                field_path: field_path.to_string(),
            },
            direction: direction.as_str().to_string(),
        });
        self
    }

    pub fn limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }
}

// ============================================================================
// Conversions
// ============================================================================

/// Convert a Rust value to Firestore Value.
pub trait ToFirestoreValue {
    fn to_firestore_value(&self) -> Value;
}

impl ToFirestoreValue for String {
    fn to_firestore_value(&self) -> Value {
        Value::StringValue(self.clone())
    }
}

impl ToFirestoreValue for &str {
    fn to_firestore_value(&self) -> Value {
        Value::StringValue(self.to_string())
    }
}

impl ToFirestoreValue for i64 {
    fn to_firestore_value(&self) -> Value {
        Value::IntegerValue(self.to_string())
    }
}

impl ToFirestoreValue for u32 {
    fn to_firestore_value(&self) -> Value {
        Value::IntegerValue(self.to_string())
    }
}

impl ToFirestoreValue for f64 {
    fn to_firestore_value(&self) -> Value {
        Value::DoubleValue(*self)
    }
}

impl ToFirestoreValue for bool {
    fn to_firestore_value(&self) -> Value {
        Value::BooleanValue(*self)
    }
}

impl ToFirestoreValue for DateTime<Utc> {
    fn to_firestore_value(&self) -> Value {
        Value::TimestampValue(self.to_rfc3339())
    }
}

impl<T: ToFirestoreValue> ToFirestoreValue for Option<T> {
    fn to_firestore_value(&self) -> Value {
        match self {
            Some(v) => v.to_firestore_value(),
            None => Value::NullValue(()),
        }
    }
}

impl<T: ToFirestoreValue> ToFirestoreValue for Vec<T> {
    fn to_firestore_value(&self) -> Value {
        Value::ArrayValue(ArrayValue {
            values: Some(self.iter().map(|v| v.to_firestore_value()).collect()),
        })
    }
}

/// Convert Firestore Value to Rust type.
pub trait FromFirestoreValue: Sized {
    fn from_firestore_value(value: &Value) -> Option<Self>;
}

impl FromFirestoreValue for String {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::StringValue(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromFirestoreValue for i64 {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::IntegerValue(s) => s.parse().ok(),
            Value::DoubleValue(f) => Some(*f as i64),
            _ => None,
        }
    }
}

impl FromFirestoreValue for u32 {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::IntegerValue(s) => s.parse().ok(),
            Value::DoubleValue(f) if *f >= 0.0 => Some(*f as u32),
            _ => None,
        }
    }
}

impl FromFirestoreValue for f64 {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::DoubleValue(f) => Some(*f),
            Value::IntegerValue(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl FromFirestoreValue for bool {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::BooleanValue(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromFirestoreValue for DateTime<Utc> {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::TimestampValue(s) => DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.into()),
            _ => None,
        }
    }
}

impl<T: FromFirestoreValue> FromFirestoreValue for Vec<T> {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        match value {
            Value::ArrayValue(arr) => Some(
                arr.values
                    .iter()
                    .flatten()
                    .filter_map(T::from_firestore_value)
                    .collect(),
            ),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_wire_format() {
        let json = serde_json::to_value(42i64.to_firestore_value()).unwrap();
        assert_eq!(json, serde_json::json!({"integerValue": "42"}));

        let parsed: Value = serde_json::from_str(r#"{"nullValue": null}"#).unwrap();
        assert_eq!(parsed, Value::NullValue(()));
    }

    #[test]
    fn test_vec_conversion_skips_mistyped_elements() {
        let value = Value::ArrayValue(ArrayValue {
            values: Some(vec![
                Value::StringValue("rust".into()),
                Value::BooleanValue(true),
                Value::StringValue("sql".into()),
            ]),
        });
        let skills: Vec<String> = Vec::from_firestore_value(&value).unwrap();
        assert_eq!(skills, vec!["rust".to_string(), "sql".to_string()]);
    }

    #[test]
    fn test_reader_nested_maps() {
        let mut company = HashMap::new();
        company.insert("name".to_string(), "Acme".to_firestore_value());
        let mut fields = HashMap::new();
        fields.insert("company".to_string(), Value::map(company));
        fields.insert("company_null".to_string(), Value::NullValue(()));
        let doc = Document::named("projects/p/databases/d/documents/users/u1".into(), fields);

        let reader = doc.reader().unwrap();
        assert_eq!(doc.id(), Some("u1"));
        assert_eq!(reader.map("company").unwrap().string("name"), "Acme");
        assert!(reader.map("company_null").is_none());
        assert!(reader.require::<String>("missing").is_err());
    }

    #[test]
    fn test_where_eq_builds_and_filter() {
        let query = StructuredQuery::collection("jobs")
            .where_eq("status", "Active".to_firestore_value())
            .where_eq("recruiterId", "r1".to_firestore_value())
            .where_eq("industry", "Tech".to_firestore_value())
            .order_by("createdAt", Direction::Descending)
            .limit(10);

        let json = serde_json::to_value(&query).unwrap();
        let filters = &json["where"]["compositeFilter"]["filters"];
        assert_eq!(json["where"]["compositeFilter"]["op"], "AND");
        assert_eq!(filters.as_array().unwrap().len(), 3);
        assert_eq!(filters[1]["fieldFilter"]["field"]["fieldPath"], "recruiterId");
        assert_eq!(json["orderBy"][0]["direction"], "DESCENDING");
        assert_eq!(json["limit"], 10);
        assert_eq!(json["from"][0]["collectionId"], "jobs");
    }

    #[test]
    fn test_single_filter_is_not_wrapped() {
        let query = StructuredQuery::collection("users").where_eq("role", "Recruiter".to_firestore_value());
        let json = serde_json::to_value(&query).unwrap();
        assert!(json["where"].get("compositeFilter").is_none());
        assert_eq!(json["where"]["fieldFilter"]["op"], "EQUAL");
    }

    #[test]
    fn test_batch_status_maps_already_exists() {
        let response = BatchWriteResponse {
            write_results: None,
            status: Some(vec![
                Status {
                    code: Some(0),
                    message: None,
                },
                Status {
                    code: Some(6),
                    message: Some("exists".into()),
                },
            ]),
        };
        assert!(matches!(
            response.check_for_errors(),
            Err(FirestoreError::AlreadyExists(_))
        ));
        assert!(BatchWriteResponse::empty().check_for_errors().is_ok());
    }
}
