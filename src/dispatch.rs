//! The JSON-RPC 1.1 envelope the hosting runtime speaks.
//!
//! A request names a method and carries its single argument as the first
//! element of `params`. A response carries either the method's return value as
//! the single element of `result` or an `error`.
//!
//! ```
//! use genome_browser::dispatch::Request;
//!
//! let request: Request = serde_json::from_str(
//!     r#"{"method": "kb_GenomeBrowser.status", "params": [], "id": "1", "version": "1.1"}"#,
//! )?;
//!
//! assert_eq!(request.method, "kb_GenomeBrowser.status");
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::error;
use tracing::info;

use crate::GenomeBrowser;
use crate::params::BrowseGenomeParams;
use crate::params::BuildGenomeBrowserParams;

/// The protocol version.
pub const VERSION: &str = "1.1";

/// The module prefix of every method.
pub const MODULE: &str = "kb_GenomeBrowser";

/// The code for an unknown method.
pub const METHOD_NOT_FOUND: i64 = -32601;

/// The code for parameters that do not match the method.
pub const INVALID_PARAMS: i64 = -32602;

/// The code for a failure within the service.
pub const SERVER_ERROR: i64 = -32000;

/// A request.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Request {
    /// The fully qualified method (`<module>.<method>`).
    pub method: String,

    /// The positional arguments.
    #[serde(default)]
    pub params: Vec<Value>,

    /// The request identifier, echoed in the response.
    #[serde(default)]
    pub id: Option<Value>,

    /// The protocol version.
    #[serde(default)]
    pub version: Option<String>,
}

/// An error in a response.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RpcError {
    /// The kind of error.
    pub name: String,

    /// The error code.
    pub code: i64,

    /// A description of the error.
    pub message: String,
}

impl RpcError {
    /// Creates a new [`RpcError`].
    fn new(name: &str, code: i64, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            code,
            message: message.into(),
        }
    }
}

/// A response.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Response {
    /// The protocol version.
    pub version: String,

    /// The identifier of the request.
    pub id: Option<Value>,

    /// The return value, on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<Value>>,

    /// The error, on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// Decodes the single argument of `method`.
///
/// A missing or `null` argument decodes as `None`.
fn argument<T: DeserializeOwned>(
    method: &str,
    params: &[Value],
) -> std::result::Result<Option<T>, RpcError> {
    match params.first() {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone()).map(Some).map_err(|err| {
            RpcError::new(
                "JSONRPCError",
                INVALID_PARAMS,
                format!("invalid parameters for `{method}`: {err}"),
            )
        }),
    }
}

/// Converts a service failure into an [`RpcError`].
fn server_error(err: impl std::fmt::Display) -> RpcError {
    RpcError::new("Server error", SERVER_ERROR, err.to_string())
}

/// Encodes a return value.
fn encode<T: Serialize>(value: T) -> std::result::Result<Value, RpcError> {
    serde_json::to_value(value).map_err(server_error)
}

/// Runs `method` against `browser`.
fn call(
    browser: &GenomeBrowser,
    method: &str,
    params: &[Value],
) -> std::result::Result<Value, RpcError> {
    let name = method
        .strip_prefix(MODULE)
        .and_then(|name| name.strip_prefix('.'))
        .unwrap_or_default();

    match name {
        "browse_genome_app" => {
            let params = argument::<BrowseGenomeParams>(method, params)?;
            encode(
                browser
                    .browse_genome_app(params.as_ref())
                    .map_err(server_error)?,
            )
        }
        "build_genome_browser" => {
            let params = argument::<BuildGenomeBrowserParams>(method, params)?.unwrap_or_default();
            encode(
                browser
                    .build_genome_browser(&params)
                    .map_err(server_error)?,
            )
        }
        "status" => encode(browser.status()),
        _ => Err(RpcError::new(
            "JSONRPCError",
            METHOD_NOT_FOUND,
            format!("unknown method `{method}`"),
        )),
    }
}

/// Handles a request.
pub fn dispatch(browser: &GenomeBrowser, request: &Request) -> Response {
    info!("dispatch: {}", request.method);

    let (result, error) = match call(browser, &request.method, &request.params) {
        Ok(value) => (Some(vec![value]), None),
        Err(err) => {
            error!("dispatch: {} failed: {}", request.method, err.message);
            (None, Some(err))
        }
    };

    Response {
        version: VERSION.to_string(),
        id: request.id.clone(),
        result,
        error,
    }
}
