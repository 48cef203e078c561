//! Caller-facing description of a request.
//!
//! `RequestOptions` is the input to `Dispatcher::dispatch`. Every field has a
//! default: GET, no extra headers, no body, no query parameters. The
//! constructor helpers (`get`, `post`, ...) plus the chained setters cover the
//! common cases without spelling out the struct.

use serde::Serialize;
use serde_json::Value;

use crate::error::TransportError;
use crate::http::HttpMethod;

/// A query parameter value: a single scalar or a sequence of scalars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Single(String),
    Many(Vec<String>),
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Single(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        ParamValue::Single(value.clone())
    }
}

macro_rules! scalar_param {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ParamValue {
                fn from(value: $ty) -> Self {
                    ParamValue::Single(value.to_string())
                }
            }
        )*
    };
}

scalar_param!(bool, char, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        ParamValue::Many(values.into_iter().map(|v| v.into().into_scalar()).collect())
    }
}

impl<T: Into<ParamValue> + Clone> From<&[T]> for ParamValue {
    fn from(values: &[T]) -> Self {
        values.to_vec().into()
    }
}

impl<T: Into<ParamValue>, const N: usize> From<[T; N]> for ParamValue {
    fn from(values: [T; N]) -> Self {
        Vec::from(values).into()
    }
}

impl ParamValue {
    /// Flatten a nested sequence into one comma-joined scalar.
    fn into_scalar(self) -> String {
        match self {
            ParamValue::Single(value) => value,
            ParamValue::Many(values) => values.join(","),
        }
    }
}

/// Everything needed to issue one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Target URL. May already contain a query string.
    pub url: String,
    /// Defaults to GET.
    pub method: HttpMethod,
    /// Merged over the dispatcher's default headers.
    pub headers: Vec<(String, String)>,
    /// JSON body. Ignored for GET and when `null`.
    pub body: Option<Value>,
    /// Query parameters, rendered in insertion order.
    pub params: Vec<(String, ParamValue)>,
}

impl RequestOptions {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            ..Self::default()
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Add a header. A later header with the same name (any case) wins.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize any `Serialize` value into the JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, TransportError> {
        let value = serde_json::to_value(body)
            .map_err(|e| TransportError::Serialization(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }
}
