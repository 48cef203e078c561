//! Turns `RequestOptions` into one HTTP exchange and a decoded JSON result.
//!
//! # Design
//! `dispatch` is three steps: `build_request` (pure), `Transport::execute`
//! (the only I/O), `parse_response` (pure). The pure halves are public so
//! they can be tested or reused without a network. `Dispatcher` holds no
//! mutable state; concurrent calls share nothing but the transport's
//! connection pool.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::DispatcherConfig;
use crate::error::TransportError;
use crate::graphql::GraphqlRequest;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::options::RequestOptions;
use crate::query::{append_query, render_query};
use crate::transport::{ReqwestTransport, Transport};

#[derive(Debug, Clone)]
pub struct Dispatcher<T = ReqwestTransport> {
    transport: T,
    config: DispatcherConfig,
}

impl Default for Dispatcher<ReqwestTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher<ReqwestTransport> {
    /// Dispatcher over a fresh `reqwest` client with the default config.
    pub fn new() -> Self {
        Self::with_transport(ReqwestTransport::new())
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            config: DispatcherConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Normalize `options` into the request that will go on the wire.
    pub fn build_request(&self, options: &RequestOptions) -> Result<HttpRequest, TransportError> {
        let headers = merge_headers(&self.config.default_headers, &options.headers);

        // A JSON `null` body counts as no body at all.
        let body = match (&options.body, options.method) {
            (Some(Value::Null), _) | (None, _) | (_, HttpMethod::Get) => None,
            (Some(body), _) => Some(
                serde_json::to_string(body)
                    .map_err(|e| TransportError::Serialization(e.to_string()))?,
            ),
        };

        let query = render_query(&options.params, self.config.array_format)?;
        let url = append_query(&options.url, &query);

        Ok(HttpRequest {
            method: options.method,
            url,
            headers,
            body,
        })
    }

    /// Issue the request and decode a 2xx body as JSON.
    #[instrument(skip_all, fields(method = %options.method, url = %options.url))]
    pub async fn dispatch(&self, options: &RequestOptions) -> Result<Value, TransportError> {
        let request = self.build_request(options)?;
        debug!(url = %request.url, has_body = request.body.is_some(), "dispatching");

        let response = self.transport.execute(request).await.inspect_err(|err| {
            debug!(error = %err, "transport failed");
        })?;
        debug!(status = response.status, "response");

        parse_response(response)
    }

    /// Like `dispatch`, deserializing the decoded body into `R`.
    pub async fn dispatch_as<R: DeserializeOwned>(
        &self,
        options: &RequestOptions,
    ) -> Result<R, TransportError> {
        let value = self.dispatch(options).await?;
        serde_json::from_value(value).map_err(|e| TransportError::Decode(e.to_string()))
    }

    /// POST a GraphQL document to `endpoint` and return the raw response body.
    pub async fn graphql(
        &self,
        endpoint: &str,
        request: &GraphqlRequest,
    ) -> Result<Value, TransportError> {
        self.dispatch(&request.to_options(endpoint)?).await
    }
}

/// Interpret a transport response: non-2xx fails, an empty 2xx body is
/// `null`, anything else must be JSON.
pub fn parse_response(response: HttpResponse) -> Result<Value, TransportError> {
    if !response.is_success() {
        return Err(TransportError::Status {
            status: response.status,
            body: response.body,
        });
    }
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&response.body).map_err(|e| TransportError::Decode(e.to_string()))
}

/// Defaults first, then supplied headers; a supplied header replaces a
/// default of the same name (case-insensitive) in place.
fn merge_headers(
    defaults: &[(String, String)],
    supplied: &[(String, String)],
) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = defaults.to_vec();
    for (name, value) in supplied {
        match merged.iter_mut().find(|(existing, _)| existing.eq_ignore_ascii_case(name)) {
            Some(slot) => *slot = (name.clone(), value.clone()),
            None => merged.push((name.clone(), value.clone())),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::query::ArrayFormat;

    /// Records every request and replies with a canned response.
    struct StubTransport {
        response: HttpResponse,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl StubTransport {
        fn replying(status: u16, body: &str) -> Self {
            Self {
                response: HttpResponse {
                    status,
                    headers: Vec::new(),
                    body: body.to_string(),
                },
                seen: Mutex::new(Vec::new()),
            }
        }

        fn last(&self) -> HttpRequest {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(request);
            Ok(self.response.clone())
        }
    }

    struct RefusingTransport;

    #[async_trait]
    impl Transport for RefusingTransport {
        async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            Err(TransportError::Network("connection refused".to_string()))
        }
    }

    fn dispatcher() -> Dispatcher<StubTransport> {
        Dispatcher::with_transport(StubTransport::replying(200, "{}"))
    }

    #[test]
    fn get_with_params_renders_query() {
        let options = RequestOptions::get("https://api/x").param("sort", "-id").param("limit", 1);
        let req = dispatcher().build_request(&options).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://api/x?sort=-id&limit=1");
        assert!(req.body.is_none());
    }

    #[test]
    fn post_serializes_body_with_json_content_type() {
        let options = RequestOptions::post("https://api/x").body(json!({"name": "a"}));
        let req = dispatcher().build_request(&options).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.body.as_deref(), Some(r#"{"name":"a"}"#));
        assert_eq!(req.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn get_never_carries_body() {
        let options = RequestOptions::get("https://api/x").body(json!({"ignored": true}));
        let req = dispatcher().build_request(&options).unwrap();
        assert!(req.body.is_none());
    }

    #[test]
    fn null_body_is_not_sent() {
        let options = RequestOptions::post("https://api/x").body(Value::Null);
        let req = dispatcher().build_request(&options).unwrap();
        assert!(req.body.is_none());
    }

    #[test]
    fn delete_carries_body_when_given() {
        let options = RequestOptions::delete("https://api/x").body(json!([1, 2]));
        let req = dispatcher().build_request(&options).unwrap();
        assert_eq!(req.body.as_deref(), Some("[1,2]"));
    }

    #[test]
    fn empty_params_add_no_question_mark() {
        let req = dispatcher().build_request(&RequestOptions::get("https://api/x")).unwrap();
        assert_eq!(req.url, "https://api/x");
    }

    #[test]
    fn supplied_content_type_overrides_default_once() {
        let options = RequestOptions::post("https://api/x")
            .header("content-type", "text/plain")
            .header("X-Trace", "1");
        let req = dispatcher().build_request(&options).unwrap();
        assert_eq!(
            req.headers,
            vec![
                ("content-type".to_string(), "text/plain".to_string()),
                ("X-Trace".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn default_content_type_sent_on_get() {
        let req = dispatcher().build_request(&RequestOptions::get("https://api/x")).unwrap();
        assert_eq!(req.header("content-type"), Some("application/json"));
    }

    #[test]
    fn configured_array_format_is_used() {
        let config = DispatcherConfig {
            array_format: ArrayFormat::Repeat,
            ..DispatcherConfig::default()
        };
        let d = dispatcher().with_config(config);
        let options = RequestOptions::get("https://api/x").param("id", vec![1, 2]);
        assert_eq!(d.build_request(&options).unwrap().url, "https://api/x?id=1&id=2");
    }

    #[test]
    fn parse_non_2xx_is_status_error() {
        let err = parse_response(HttpResponse {
            status: 503,
            headers: Vec::new(),
            body: r#"{"partial":true}"#.to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 503, .. }));
    }

    #[test]
    fn parse_empty_success_is_null() {
        let value = parse_response(HttpResponse {
            status: 204,
            headers: Vec::new(),
            body: String::new(),
        })
        .unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn parse_bad_json_is_decode_error() {
        let err = parse_response(HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: "not json".to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[tokio::test]
    async fn dispatch_sends_built_request_and_decodes() {
        let d = Dispatcher::with_transport(StubTransport::replying(200, r#"[{"id":2}]"#));
        let value = d
            .dispatch(&RequestOptions::get("https://api/users").param("_sort", "-id"))
            .await
            .unwrap();
        assert_eq!(value, json!([{"id": 2}]));
        assert_eq!(d.transport().last().url, "https://api/users?_sort=-id");
    }

    #[tokio::test]
    async fn dispatch_surfaces_status_errors() {
        let d = Dispatcher::with_transport(StubTransport::replying(404, "missing"));
        let err = d.dispatch(&RequestOptions::get("https://api/x")).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn dispatch_surfaces_network_errors() {
        let d = Dispatcher::with_transport(RefusingTransport);
        let err = d.dispatch(&RequestOptions::get("https://api/x")).await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }

    #[tokio::test]
    async fn dispatch_as_deserializes_typed_result() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct User {
            id: u64,
            name: String,
        }
        let d = Dispatcher::with_transport(StubTransport::replying(
            200,
            r#"{"id":1,"name":"Hank"}"#,
        ));
        let user: User = d.dispatch_as(&RequestOptions::get("https://api/users/1")).await.unwrap();
        assert_eq!(
            user,
            User {
                id: 1,
                name: "Hank".to_string()
            }
        );
    }

    #[tokio::test]
    async fn dispatch_as_shape_mismatch_is_decode_error() {
        let d = Dispatcher::with_transport(StubTransport::replying(200, r#"{"id":"x"}"#));
        let err = d
            .dispatch_as::<Vec<u64>>(&RequestOptions::get("https://api/x"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[tokio::test]
    async fn graphql_posts_query_document() {
        let d = Dispatcher::with_transport(StubTransport::replying(200, r#"{"data":{}}"#));
        let request = GraphqlRequest::new("query GetUsers { users { id } }");
        d.graphql("http://localhost/graphql", &request).await.unwrap();
        let req = d.transport().last();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost/graphql");
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"query": "query GetUsers { users { id } }"}));
    }
}
