//! JMAP request and response envelopes
//!
//! A request carries the capabilities it uses and an ordered list of method
//! calls `[name, arguments, callId]`. The response answers each call with
//! either `[name, result, callId]` or `["error", {type, description}, callId]`.

use foldersync_core::domain::session::{CAPABILITY_CORE, CAPABILITY_MAIL};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::JmapError;

/// Name of the pseudo-method used for method-level errors
const ERROR_RESPONSE: &str = "error";

/// A single method call or method response: `[name, arguments, callId]`
pub type Invocation = (String, Value, String);

/// Request envelope POSTed to the session's API URL
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JmapRequest {
    using: Vec<String>,
    method_calls: Vec<Invocation>,
}

impl JmapRequest {
    /// Creates an empty request using the core and mail capabilities
    pub fn new() -> Self {
        Self {
            using: vec![CAPABILITY_CORE.to_string(), CAPABILITY_MAIL.to_string()],
            method_calls: Vec::new(),
        }
    }

    /// Appends a method call
    pub fn call(mut self, name: &str, arguments: Value, call_id: &str) -> Self {
        self.method_calls
            .push((name.to_string(), arguments, call_id.to_string()));
        self
    }

    /// Returns the method calls in order
    pub fn method_calls(&self) -> &[Invocation] {
        &self.method_calls
    }
}

impl Default for JmapRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a result reference to the output of an earlier call in the same request
pub fn result_reference(call_id: &str, method: &str, path: &str) -> Value {
    json!({
        "resultOf": call_id,
        "name": method,
        "path": path,
    })
}

/// Response envelope
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JmapResponse {
    method_responses: Vec<Invocation>,
}

#[derive(Debug, Deserialize)]
struct MethodErrorBody {
    #[serde(rename = "type")]
    error_type: String,
    description: Option<String>,
}

impl JmapResponse {
    /// Returns the method error type of `call_id`, if the call failed
    pub fn error_type(&self, call_id: &str) -> Option<String> {
        self.find(call_id)
            .filter(|(name, _, _)| name == ERROR_RESPONSE)
            .and_then(|(_, args, _)| serde_json::from_value::<MethodErrorBody>(args.clone()).ok())
            .map(|body| body.error_type)
    }

    /// Parses the result of `call_id`, which must be a `method` response
    ///
    /// # Errors
    ///
    /// - [`JmapError::Method`] if the server answered the call with an error
    /// - [`JmapError::InvalidResponse`] if the call is missing, was answered
    ///   by another method, or its arguments do not match `T`
    pub fn parse<T: DeserializeOwned>(&self, call_id: &str, method: &str) -> Result<T, JmapError> {
        let (name, args, _) = self.find(call_id).ok_or_else(|| {
            JmapError::InvalidResponse(format!("no response for {method} (call {call_id})"))
        })?;

        if name == ERROR_RESPONSE {
            let body: MethodErrorBody = serde_json::from_value(args.clone()).map_err(|e| {
                JmapError::InvalidResponse(format!("malformed error for {method}: {e}"))
            })?;
            return Err(JmapError::Method {
                method: method.to_string(),
                error_type: body.error_type,
                description: body.description,
            });
        }

        if name != method {
            return Err(JmapError::InvalidResponse(format!(
                "expected {method} response for call {call_id}, got {name}"
            )));
        }

        serde_json::from_value(args.clone())
            .map_err(|e| JmapError::InvalidResponse(format!("malformed {method} response: {e}")))
    }

    fn find(&self, call_id: &str) -> Option<&Invocation> {
        self.method_responses.iter().find(|(_, _, id)| id == call_id)
    }
}
