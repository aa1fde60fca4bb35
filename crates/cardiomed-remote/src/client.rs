use log::{debug, error, trace};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use cardiomed_backend::ServiceError;

const INVALID_CREDENTIALS_CODE: &str = "invalid_credentials";

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub method: &'a str,
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RpcError {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

impl RpcError {
    fn into_service_error(self, operation: &'static str) -> ServiceError {
        if self.code.as_deref() == Some(INVALID_CREDENTIALS_CODE) {
            ServiceError::InvalidCredentials
        } else {
            ServiceError::Rejected {
                operation,
                message: self.message,
            }
        }
    }
}

/// Response envelope: exactly one of `result` or `error` is expected.
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// # Errors
    /// Returns the server-reported error, if any.
    pub fn into_result(self, operation: &'static str) -> Result<Value, ServiceError> {
        match self.error {
            Some(error) => Err(error.into_service_error(operation)),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RpcClient {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl RpcClient {
    #[must_use]
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            token: None,
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|token| !token.trim().is_empty());
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one call and unwrap its envelope.
    ///
    /// # Errors
    /// Returns a network error when the server cannot be reached or answers
    /// with something other than an envelope, and the server's own error when
    /// it rejects the call.
    pub async fn call(
        &self,
        operation: &'static str,
        params: Value,
    ) -> Result<Value, ServiceError> {
        debug!("Data service call: {operation}");

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("User-Agent", "cardiomed")
            .json(&RpcRequest {
                method: operation,
                params,
            });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|error| ServiceError::transport(operation, error))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| ServiceError::transport(operation, error))?;
        trace!("Data service {operation} response ({status}): {body}");

        let envelope = serde_json::from_str::<RpcResponse>(&body);
        if !status.is_success() {
            if let Ok(RpcResponse {
                error: Some(rpc_error),
                ..
            }) = envelope
            {
                return Err(rpc_error.into_service_error(operation));
            }
            error!("Data service {operation} failed with HTTP {status}");
            return Err(ServiceError::Status {
                operation,
                status: status.as_u16(),
            });
        }

        envelope
            .map_err(|error| ServiceError::bad_response(operation, error))?
            .into_result(operation)
    }
}
