//! GraphQL-over-HTTP request body.

use serde::Serialize;
use serde_json::Value;

use crate::error::TransportError;
use crate::options::RequestOptions;

/// A GraphQL operation, serialized as `{"query", "operationName", "variables"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
}

impl GraphqlRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            operation_name: None,
            variables: None,
        }
    }

    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    pub fn variables(mut self, variables: Value) -> Self {
        self.variables = Some(variables);
        self
    }

    /// The POST that carries this operation to `endpoint`.
    pub fn to_options(&self, endpoint: &str) -> Result<RequestOptions, TransportError> {
        RequestOptions::post(endpoint).json(self)
    }
}
