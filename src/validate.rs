//! Request validation
//!
//! Required query parameters and JSON body fields are checked here, before
//! any backend call is made. Failures short-circuit the handler with a 400.

use crate::error::{ApiError, ApiResult};
use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::convert::Infallible;

/// Decoded query string of a request
///
/// Empty values are treated as absent. When a parameter is repeated, the first
/// occurrence wins.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    values: HashMap<String, String>,
}

impl QueryParams {
    pub fn parse(query: Option<&str>) -> Self {
        let mut values = HashMap::new();
        if let Some(query) = query {
            for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
                values.entry(name.into_owned()).or_insert_with(|| value.into_owned());
            }
        }
        Self { values }
    }

    /// Non-empty value of a parameter
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Values of all `names`, or one error listing every missing parameter
    pub fn require<const N: usize>(&self, names: [&str; N]) -> ApiResult<[&str; N]> {
        let missing: Vec<String> = names
            .iter()
            .filter(|name| self.get(name).is_none())
            .map(|name| name.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(ApiError::MissingParameter(missing));
        }

        Ok(names.map(|name| self.get(name).unwrap_or_default()))
    }

    /// Optional integer parameter
    pub fn integer(&self, name: &str) -> ApiResult<Option<i64>> {
        self.get(name)
            .map(|value| {
                parse_integer(value)
                    .ok_or_else(|| ApiError::invalid_argument(format!("{} must be an integer", name)))
            })
            .transpose()
    }
}

/// Parse a decimal integer, saturating values outside the `i64` range
fn parse_integer(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(n) = value.parse::<i64>() {
        return Some(n);
    }

    let (negative, digits) = match value.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(if negative { i64::MIN } else { i64::MAX })
}

impl<S: Send + Sync> FromRequestParts<S> for QueryParams {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(QueryParams::parse(parts.uri.query()))
    }
}

/// Raw request body; read failures (size limit, broken stream) become error envelopes
#[derive(Debug, Clone, Default)]
pub struct RawBody(pub Bytes);

impl<S: Send + Sync> FromRequest<S> for RawBody {
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        Bytes::from_request(request, state)
            .await
            .map(RawBody)
            .map_err(|rejection| ApiError::Rejected {
                status: rejection.status(),
                message: rejection.body_text(),
            })
    }
}

/// Parsed JSON object body of a request
#[derive(Debug, Clone, Default)]
pub struct JsonBody {
    fields: Map<String, Value>,
}

/// Parse `raw` as a JSON object and check that every required field is present
///
/// A field counts as missing when it is absent, `null`, or an empty string.
/// Other fields are kept as-is, nested structures included.
pub fn require_json_body(raw: &[u8], required_fields: &[&str]) -> ApiResult<JsonBody> {
    let body = JsonBody::parse(raw)?;

    if let Some(field) = required_fields.iter().find(|field| body.get(field).is_none()) {
        return Err(ApiError::MissingField(field.to_string()));
    }

    Ok(body)
}

impl JsonBody {
    pub fn parse(raw: &[u8]) -> ApiResult<Self> {
        match serde_json::from_slice::<Value>(raw) {
            Ok(Value::Object(fields)) => Ok(Self { fields }),
            Ok(_) | Err(_) => Err(ApiError::InvalidBody),
        }
    }

    /// Field value, `None` when absent, null, or an empty string
    pub fn get(&self, field: &str) -> Option<&Value> {
        match self.fields.get(field) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(value) => Some(value),
        }
    }

    /// Non-empty string field
    pub fn str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Text field: strings as-is, numbers in their JSON form
    ///
    /// Objects, arrays and booleans are rejected rather than stringified.
    pub fn text(&self, field: &str) -> ApiResult<Option<String>> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(_) => Err(ApiError::invalid_argument(format!("{} must be a string", field))),
        }
    }

    pub fn required_text(&self, field: &str) -> ApiResult<String> {
        self.text(field)?
            .ok_or_else(|| ApiError::MissingField(field.to_string()))
    }

    /// Object field, passed through without schema checks
    ///
    /// An empty object counts as absent; any other non-object value is an error.
    pub fn object(&self, field: &str) -> ApiResult<Option<Map<String, Value>>> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::Object(map)) if map.is_empty() => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map.clone())),
            Some(_) => Err(ApiError::invalid_argument(format!("{} must be an object", field))),
        }
    }

    /// Integer field; numbers are truncated and numeric strings parsed
    pub fn integer(&self, field: &str) -> ApiResult<Option<i64>> {
        let Some(value) = self.get(field) else {
            return Ok(None);
        };

        let parsed = match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
            Value::String(s) => parse_integer(s),
            _ => None,
        };

        parsed
            .map(Some)
            .ok_or_else(|| ApiError::invalid_argument(format!("{} must be an integer", field)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_returns_values_in_order() {
        let query = QueryParams::parse(Some("table_name=Users&partition_key_name=id"));
        let [table, key] = query.require(["table_name", "partition_key_name"]).unwrap();
        assert_eq!(table, "Users");
        assert_eq!(key, "id");
    }

    #[test]
    fn test_require_reports_every_missing_parameter() {
        let query = QueryParams::parse(Some("table_name=Users&partition_key_name="));
        let err = query
            .require(["table_name", "partition_key_name", "partition_key_value"])
            .unwrap_err();

        match err {
            ApiError::MissingParameter(missing) => {
                assert_eq!(missing, vec!["partition_key_name", "partition_key_value"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_query_decoding_and_first_value_wins() {
        let query = QueryParams::parse(Some("prefix=my%20queue&prefix=other&name=a+b"));
        assert_eq!(query.get("prefix"), Some("my queue"));
        assert_eq!(query.get("name"), Some("a b"));
        assert_eq!(QueryParams::parse(None).get("prefix"), None);
    }

    #[test]
    fn test_query_integer() {
        let query = QueryParams::parse(Some("max_number=500&wait_time_seconds=-5&bad=x"));
        assert_eq!(query.integer("max_number").unwrap(), Some(500));
        assert_eq!(query.integer("wait_time_seconds").unwrap(), Some(-5));
        assert_eq!(query.integer("missing").unwrap(), None);
        assert!(matches!(
            query.integer("bad"),
            Err(ApiError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_integer_saturates_out_of_range() {
        assert_eq!(parse_integer("99999999999999999999999"), Some(i64::MAX));
        assert_eq!(parse_integer("-99999999999999999999999"), Some(i64::MIN));
        assert_eq!(parse_integer(" 7 "), Some(7));
        assert_eq!(parse_integer("+3"), Some(3));
        assert_eq!(parse_integer("1.5"), None);
        assert_eq!(parse_integer("-"), None);
    }

    #[test]
    fn test_body_must_be_json_object() {
        assert!(matches!(require_json_body(b"", &[]), Err(ApiError::InvalidBody)));
        assert!(matches!(require_json_body(b"not json", &[]), Err(ApiError::InvalidBody)));
        assert!(matches!(require_json_body(b"[1,2]", &[]), Err(ApiError::InvalidBody)));
        assert!(require_json_body(b"{}", &[]).is_ok());
    }

    #[test]
    fn test_body_missing_field() {
        for raw in [
            &br#"{}"#[..],
            br#"{"message": null}"#,
            br#"{"message": ""}"#,
        ] {
            match require_json_body(raw, &["message"]) {
                Err(ApiError::MissingField(field)) => assert_eq!(field, "message"),
                other => panic!("unexpected result: {other:?}"),
            }
        }
    }

    #[test]
    fn test_body_passes_nested_attributes_through() {
        let body = require_json_body(
            br#"{"message":"hi","attributes":{"color":{"DataType":"String","StringValue":"red"}}}"#,
            &["message"],
        )
        .unwrap();

        assert_eq!(body.required_text("message").unwrap(), "hi");
        let attributes = body.object("attributes").unwrap().unwrap();
        assert_eq!(attributes["color"]["StringValue"], "red");
    }

    #[test]
    fn test_body_integer_coercion() {
        let body = JsonBody::parse(br#"{"a": 5, "b": 7.9, "c": "12", "d": "soon", "e": true}"#).unwrap();
        assert_eq!(body.integer("a").unwrap(), Some(5));
        assert_eq!(body.integer("b").unwrap(), Some(7));
        assert_eq!(body.integer("c").unwrap(), Some(12));
        assert!(body.integer("d").is_err());
        assert!(body.integer("e").is_err());
        assert_eq!(body.integer("missing").unwrap(), None);
    }

    #[test]
    fn test_text_accepts_strings_and_numbers_only() {
        let body = JsonBody::parse(br#"{"a": "hi", "b": 42, "c": {"order": 1}, "d": [1], "e": true}"#).unwrap();
        assert_eq!(body.text("a").unwrap().as_deref(), Some("hi"));
        assert_eq!(body.text("b").unwrap().as_deref(), Some("42"));
        assert_eq!(body.text("missing").unwrap(), None);
        for field in ["c", "d", "e"] {
            match body.required_text(field) {
                Err(ApiError::InvalidArgument(message)) => {
                    assert_eq!(message, format!("{} must be a string", field));
                }
                other => panic!("unexpected result: {other:?}"),
            }
        }
    }

    #[test]
    fn test_object_rejects_non_objects() {
        let body = JsonBody::parse(
            br#"{"list": ["color", "red"], "text": "color=red", "num": 3, "empty": {}, "nothing": null}"#,
        )
        .unwrap();
        for field in ["list", "text", "num"] {
            match body.object(field) {
                Err(ApiError::InvalidArgument(message)) => {
                    assert_eq!(message, format!("{} must be an object", field));
                }
                other => panic!("unexpected result: {other:?}"),
            }
        }
        assert_eq!(body.object("empty").unwrap(), None);
        assert_eq!(body.object("nothing").unwrap(), None);
        assert_eq!(body.object("missing").unwrap(), None);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected_as_envelope() {
        let request = Request::new(axum::body::Body::from(vec![b'x'; 3 * 1024 * 1024]));

        let err = RawBody::from_request(request, &()).await.unwrap_err();

        assert_eq!(err.status(), axum::http::StatusCode::PAYLOAD_TOO_LARGE);
        assert!(!err.envelope().error.is_empty());
    }
}
