//! A blocking JSON-RPC 1.1 client for the workspace and SDK services.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// The JSON-RPC protocol version spoken by the services.
pub const VERSION: &str = "1.1";

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to calling a service.
#[derive(Debug)]
pub enum Error {
    /// An HTTP transport error.
    Http(reqwest::Error),

    /// The service answered with a non-success status and no JSON-RPC error.
    Status(StatusCode, String),

    /// The service answered with a JSON-RPC error.
    Rpc {
        /// The method that was called.
        method: String,

        /// The error name reported by the service.
        name: String,

        /// The error code reported by the service.
        code: i64,

        /// The error message reported by the service.
        message: String,
    },

    /// The response could not be decoded.
    Decode(String, serde_json::Error),

    /// The response did not have the expected shape.
    Malformed(String, String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Http(err) => write!(f, "http error: {err}"),
            Error::Status(status, body) => {
                write!(f, "service returned status `{status}`: {}", body.trim())
            }
            Error::Rpc {
                method,
                name,
                code,
                message,
            } => write!(f, "`{method}` failed with {name} ({code}): {message}"),
            Error::Decode(method, err) => {
                write!(f, "could not decode the response from `{method}`: {err}")
            }
            Error::Malformed(method, reason) => {
                write!(f, "malformed response from `{method}`: {reason}")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Wire format
////////////////////////////////////////////////////////////////////////////////////////

/// The calling context sent alongside a request.
#[derive(Debug, Serialize)]
struct Context<'a> {
    /// The requested release of the target service.
    service_ver: &'a str,
}

/// A JSON-RPC request.
#[derive(Debug, Serialize)]
struct Request<'a, P> {
    /// The fully qualified method name (`Module.function`).
    method: &'a str,

    /// The positional parameters.
    params: [&'a P; 1],

    /// The protocol version.
    version: &'static str,

    /// The request id.
    id: String,

    /// The calling context.
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<Context<'a>>,
}

/// The error object within a JSON-RPC response.
#[derive(Debug, Default, Deserialize)]
struct RpcError {
    /// The error name.
    #[serde(default)]
    name: String,

    /// The error code.
    #[serde(default)]
    code: i64,

    /// The error message.
    #[serde(default)]
    message: String,
}

/// A JSON-RPC response.
#[derive(Debug, Deserialize)]
struct Response {
    /// The positional results.
    #[serde(default)]
    result: Option<Vec<Value>>,

    /// The error, if the call failed.
    #[serde(default)]
    error: Option<RpcError>,
}

////////////////////////////////////////////////////////////////////////////////////////
// Client
////////////////////////////////////////////////////////////////////////////////////////

/// A client for a single JSON-RPC endpoint.
#[derive(Clone, Debug)]
pub struct Client {
    /// The endpoint.
    url: String,

    /// The authorization token, if any.
    token: Option<String>,

    /// The requested service release, if any.
    service_ver: Option<String>,

    /// The underlying HTTP client.
    inner: reqwest::blocking::Client,
}

impl Client {
    /// Attempts to create a new client for `url`.
    ///
    /// Requests made through the client never time out: format conversions on
    /// the other end can legitimately run for a long time.
    ///
    /// # Examples
    ///
    /// ```
    /// use genome_browser::service::Client;
    ///
    /// let client = Client::try_new("http://localhost:5000", None)?;
    /// assert_eq!(client.url(), "http://localhost:5000");
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_new(url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let inner = reqwest::blocking::Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            url: url.into(),
            token,
            service_ver: None,
            inner,
        })
    }

    /// Requests a specific release of the target service.
    pub fn with_service_version(mut self, service_ver: impl Into<String>) -> Self {
        self.service_ver = Some(service_ver.into());
        self
    }

    /// Gets the endpoint.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Calls `method` with a single positional parameter and decodes the first
    /// positional result.
    pub fn call<P, R>(&self, method: &str, params: &P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let request = Request {
            method,
            params: [params],
            version: VERSION,
            id: rand::random::<u64>().to_string(),
            context: self
                .service_ver
                .as_deref()
                .map(|service_ver| Context { service_ver }),
        };

        debug!("rpc: calling `{method}` at {}", self.url);

        let mut builder = self.inner.post(&self.url).json(&request);
        if let Some(token) = &self.token {
            builder = builder.header(AUTHORIZATION, token.as_str());
        }

        let response = builder.send().map_err(Error::Http)?;
        let status = response.status();
        let body = response.text().map_err(Error::Http)?;

        decode(method, status, &body)
    }
}

/// Decodes the body of a response to `method`.
///
/// The services report failures as a JSON-RPC error object, usually alongside
/// a `500` status, so the body is inspected before the status.
fn decode<R>(method: &str, status: StatusCode, body: &str) -> Result<R>
where
    R: DeserializeOwned,
{
    let response = match serde_json::from_str::<Response>(body) {
        Ok(response) => response,
        Err(_) if !status.is_success() => return Err(Error::Status(status, body.to_string())),
        Err(err) => return Err(Error::Decode(method.to_string(), err)),
    };

    if let Some(error) = response.error {
        return Err(Error::Rpc {
            method: method.to_string(),
            name: error.name,
            code: error.code,
            message: error.message,
        });
    }

    if !status.is_success() {
        return Err(Error::Status(status, body.to_string()));
    }

    let value = response
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| Error::Malformed(method.to_string(), String::from("missing result")))?;

    serde_json::from_value(value).map_err(|err| Error::Decode(method.to_string(), err))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_shape() -> Result<()> {
        let params = json!({ "ref": "1/2/3" });
        let request = Request {
            method: "AssemblyUtil.get_assembly_as_fasta",
            params: [&params],
            version: VERSION,
            id: String::from("42"),
            context: Some(Context { service_ver: "dev" }),
        };

        let value = serde_json::to_value(&request)
            .map_err(|err| Error::Decode(String::from("test"), err))?;
        assert_eq!(
            value,
            json!({
                "method": "AssemblyUtil.get_assembly_as_fasta",
                "params": [{ "ref": "1/2/3" }],
                "version": "1.1",
                "id": "42",
                "context": { "service_ver": "dev" }
            })
        );

        Ok(())
    }

    #[test]
    fn decodes_the_first_result() -> Result<()> {
        let body = r#"{"version": "1.1", "id": "1", "result": [{"path": "/tmp/a.fa"}]}"#;
        let value: Value = decode("AssemblyUtil.get_assembly_as_fasta", StatusCode::OK, body)?;
        assert_eq!(value, json!({ "path": "/tmp/a.fa" }));
        Ok(())
    }

    #[test]
    fn surfaces_rpc_errors() {
        let body = r#"{"error": {"name": "JSONRPCError", "code": -32500, "message": "no such object"}}"#;
        let err = decode::<Value>(
            "Workspace.get_object_info3",
            StatusCode::INTERNAL_SERVER_ERROR,
            body,
        )
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "`Workspace.get_object_info3` failed with JSONRPCError (-32500): no such object"
        );
    }

    #[test]
    fn surfaces_bad_statuses() {
        let err = decode::<Value>("Workspace.ver", StatusCode::BAD_GATEWAY, "<html>").unwrap_err();
        assert!(matches!(err, Error::Status(StatusCode::BAD_GATEWAY, _)));
    }

    #[test]
    fn rejects_missing_results() {
        let err = decode::<Value>("Workspace.ver", StatusCode::OK, r#"{"result": []}"#).unwrap_err();
        assert!(matches!(err, Error::Malformed(_, _)));
    }
}
