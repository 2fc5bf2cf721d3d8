use super::models::{
    ArrayValue, CollectionSelector, CompositeFilter, CompositeOperator, FieldFilter, FieldOperator,
    FieldReference, FilterType, QueryFilter, RunQueryRequest, RunQueryResponse, StructuredQuery,
    Value, fields_to_serde_value, serde_value_to_value,
};
use super::StoreError;
use reqwest::header;
use reqwest_middleware::ClientWithMiddleware;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A Firestore query over a single collection, restricted to the filter
/// shapes this client actually issues: equality and membership tests.
#[derive(Clone, Debug)]
pub struct Query {
    query: StructuredQuery,
}

impl Query {
    pub fn new(collection_id: impl Into<String>) -> Self {
        Self {
            query: StructuredQuery {
                from: vec![CollectionSelector {
                    collection_id: collection_id.into(),
                }],
                where_clause: None,
                limit: None,
            },
        }
    }

    /// Filters on `field == value`.
    pub fn where_eq<T: Serialize>(self, field: &str, value: T) -> Result<Self, StoreError> {
        let value = serde_value_to_value(serde_json::to_value(value)?)?;
        Ok(self.push_filter(field, FieldOperator::Equal, value))
    }

    /// Filters on `field in values`. Firestore caps `IN` disjunctions at 10
    /// members; callers chunk before building the query.
    pub fn where_in<T: Serialize>(self, field: &str, values: &[T]) -> Result<Self, StoreError> {
        let values = values
            .iter()
            .map(|v| serde_value_to_value(serde_json::to_value(v)?))
            .collect::<Result<Vec<_>, _>>()?;
        let value = Value {
            value_type: super::models::ValueType::ArrayValue(ArrayValue { values }),
        };
        Ok(self.push_filter(field, FieldOperator::In, value))
    }

    pub fn limit(mut self, limit: i32) -> Self {
        self.query.limit = Some(limit);
        self
    }

    fn push_filter(mut self, field: &str, op: FieldOperator, value: Value) -> Self {
        let filter = QueryFilter {
            filter_type: FilterType::FieldFilter(FieldFilter {
                field: FieldReference {
                    field_path: field.to_string(),
                },
                op,
                value,
            }),
        };

        self.query.where_clause = Some(match self.query.where_clause.take() {
            None => filter,
            Some(existing) => {
                let filters = match existing.filter_type {
                    FilterType::CompositeFilter(cf) if cf.op == CompositeOperator::And => {
                        let mut filters = cf.filters;
                        filters.push(filter);
                        filters
                    }
                    _ => vec![existing, filter],
                };
                QueryFilter {
                    filter_type: FilterType::CompositeFilter(CompositeFilter {
                        op: CompositeOperator::And,
                        filters,
                    }),
                }
            }
        });
        self
    }
}

/// A `Query` attached to a Firestore client, ready for execution.
pub struct ExecutableQuery<'a> {
    client: &'a ClientWithMiddleware,
    parent_path: String,
    query: Query,
}

impl<'a> ExecutableQuery<'a> {
    pub(crate) fn new(client: &'a ClientWithMiddleware, parent_path: String, query: Query) -> Self {
        Self {
            client,
            parent_path,
            query,
        }
    }

    /// Runs the query and deserializes each returned document into `T`.
    pub async fn fetch<T: DeserializeOwned>(&self) -> Result<Vec<T>, StoreError> {
        let url = format!("{}:runQuery", self.parent_path);

        let request = RunQueryRequest {
            structured_query: self.query.query.clone(),
        };

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&request)?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(super::error_from_response(response, "Run query").await);
        }

        let responses: Vec<RunQueryResponse> = response.json().await?;

        let mut records = Vec::new();
        for res in responses {
            if let Some(doc) = res.document {
                let serde_value = fields_to_serde_value(doc.fields)?;
                records.push(serde_json::from_value(serde_value)?);
            }
        }
        Ok(records)
    }
}
