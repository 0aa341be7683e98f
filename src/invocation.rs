//! Invocation envelope
//!
//! The converter is started by a trigger event and answers with a 200
//! response whose body is a JSON string. Only the `verbose` query parameter
//! of the event is read.

use crate::config::ConverterConfig;
use crate::error::Result;
use crate::pipeline::{Converter, RunSummary};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use tracing::info;

/// Trigger event
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InvocationEvent {
    /// Query string parameters of the request
    #[serde(default, rename = "queryStringParameters")]
    pub query: Option<QueryParameters>,
}

/// Query string parameters the converter understands
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct QueryParameters {
    /// Dump schemas and row previews at INFO
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub verbose: bool,
}

impl InvocationEvent {
    /// Event with the verbose flag set
    pub fn verbose(verbose: bool) -> Self {
        Self {
            query: Some(QueryParameters { verbose }),
        }
    }

    /// Parse an event from a JSON value
    ///
    /// Query parameters of the event itself take precedence. Only when it has
    /// none is a `body` holding another event as a JSON string unwrapped.
    /// Unknown shapes parse to the default event.
    pub fn from_value(value: &Value) -> Self {
        let event: Self = serde_json::from_value(value.clone()).unwrap_or_default();
        if event.query.is_some() {
            return event;
        }

        value
            .get("body")
            .and_then(Value::as_str)
            .and_then(|body| serde_json::from_str::<Value>(body).ok())
            .filter(Value::is_object)
            .map_or(event, |inner| Self::from_value(&inner))
    }

    /// Parse an event from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(&value))
    }

    /// Check if verbose logging was requested
    pub fn is_verbose(&self) -> bool {
        self.query.as_ref().is_some_and(|q| q.verbose)
    }
}

/// Interpret a boolean-ish value; anything unrecognized is `false`
pub fn parse_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64() == Some(1),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        ),
        _ => false,
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_flag(&value))
}

/// Response returned to the trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationResponse {
    /// Always 200
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// JSON text `{"message": ..., "summary": ...}`
    pub body: String,
}

impl InvocationResponse {
    /// Build the response for a finished pass
    pub fn from_summary(summary: &RunSummary) -> Result<Self> {
        let body = json!({
            "message": summary.message(),
            "summary": summary,
        });
        Ok(Self {
            status_code: 200,
            body: serde_json::to_string(&body)?,
        })
    }

    /// Parse the body back into JSON
    pub fn body_json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Run one conversion pass for an event
pub async fn handle(event: &InvocationEvent, config: ConverterConfig) -> Result<InvocationResponse> {
    let converter = Converter::from_config(config)?;
    handle_with(event, converter).await
}

/// Run one conversion pass for an event with a prepared converter
pub async fn handle_with(
    event: &InvocationEvent,
    converter: Converter,
) -> Result<InvocationResponse> {
    let verbose = event.is_verbose();
    info!("Invocation received (verbose: {verbose})");

    let mut converter = converter.with_verbose(verbose);
    let summary = converter.run().await?;
    InvocationResponse::from_summary(&summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::BlobStore;
    use bytes::Bytes;
    use object_store::path::Path as ObjectPath;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(json!(true), true ; "bool true")]
    #[test_case(json!(false), false ; "bool false")]
    #[test_case(json!("true"), true ; "string true")]
    #[test_case(json!("TRUE"), true ; "upper case")]
    #[test_case(json!("1"), true ; "string one")]
    #[test_case(json!("yes"), true ; "yes")]
    #[test_case(json!("on"), true ; "on")]
    #[test_case(json!("false"), false ; "string false")]
    #[test_case(json!("maybe"), false ; "unknown word")]
    #[test_case(json!(1), true ; "number one")]
    #[test_case(json!(null), false ; "null")]
    fn test_parse_flag(value: Value, expected: bool) {
        assert_eq!(parse_flag(&value), expected);
    }

    #[test]
    fn test_event_verbose_from_query() {
        let event = InvocationEvent::from_value(&json!({
            "queryStringParameters": {"verbose": "true"}
        }));
        assert!(event.is_verbose());
    }

    #[test]
    fn test_event_without_query_is_quiet() {
        assert!(!InvocationEvent::from_value(&json!({})).is_verbose());
        assert!(!InvocationEvent::from_value(&json!({"queryStringParameters": null})).is_verbose());
        assert!(!InvocationEvent::from_value(&json!("not an object")).is_verbose());
    }

    #[test]
    fn test_event_body_is_unwrapped() {
        let inner = json!({"queryStringParameters": {"verbose": "yes"}}).to_string();
        let event = InvocationEvent::from_value(&json!({ "body": inner }));
        assert!(event.is_verbose());
    }

    #[test]
    fn test_outer_query_wins_over_body() {
        let event = InvocationEvent::from_value(&json!({
            "queryStringParameters": {"verbose": "true"},
            "body": "{\"unrelated\": 1}"
        }));
        assert!(event.is_verbose());

        let event = InvocationEvent::from_value(&json!({
            "queryStringParameters": {"verbose": "false"},
            "body": json!({"queryStringParameters": {"verbose": "true"}}).to_string()
        }));
        assert!(!event.is_verbose());
    }

    #[test]
    fn test_event_from_invalid_json_fails() {
        assert!(InvocationEvent::from_json_str("{oops").is_err());
    }

    #[test]
    fn test_response_serializes_status_code() {
        let summary = RunSummary::new();
        let response = InvocationResponse::from_summary(&summary).unwrap();
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["statusCode"], json!(200));
        let body = response.body_json().unwrap();
        assert_eq!(body["message"], json!(summary.message()));
        assert_eq!(body["summary"]["records_accepted"], json!(0));
    }

    #[tokio::test]
    async fn test_handle_runs_a_pass() {
        let source = BlobStore::in_memory();
        source
            .store()
            .put(
                &ObjectPath::from("one.json"),
                Bytes::from_static(b"{\"features\": [{\"a\": 1}]}").into(),
            )
            .await
            .unwrap();
        let destination = BlobStore::in_memory();

        let config = ConverterConfig::new("memory://", "memory://");
        let converter = Converter::new(config, source, destination.clone()).unwrap();
        let response = handle_with(&InvocationEvent::verbose(true), converter)
            .await
            .unwrap();

        assert_eq!(response.status_code, 200);
        let body = response.body_json().unwrap();
        assert_eq!(body["summary"]["records_accepted"], json!(1));
        assert!(destination
            .store()
            .head(&ObjectPath::from("records1.parquet"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_handle_builds_stores_from_config() {
        let config = ConverterConfig::new("memory://", "memory://");
        let response = handle(&InvocationEvent::default(), config).await.unwrap();
        assert_eq!(response.status_code, 200);
    }
}
