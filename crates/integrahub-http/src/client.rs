//! Shared outbound HTTP client.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, error};

use integrahub_core::config::HttpConfig;

use crate::error::HttpError;
use crate::request::{Auth, HttpResponse, RequestBody, RequestSpec};

const FORM_TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Outbound HTTP client shared by every integration.
///
/// Cloning is cheap; all clones reuse one connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    /// Builds the client from configuration.
    pub fn new(config: &HttpConfig) -> Result<Self, HttpError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let inner = builder
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Sends a request and buffers the response whatever its status.
    ///
    /// Only transport failures are errors here; callers classify statuses.
    pub async fn send(&self, spec: RequestSpec) -> Result<HttpResponse, HttpError> {
        let url = spec.url.clone();
        let method = spec.method.clone();
        let mut request = self.inner.request(spec.method, &spec.url);

        request = match spec.auth {
            Auth::None => request,
            Auth::Basic { username, password } => request.basic_auth(username, Some(password)),
            Auth::Bearer(token) => request.bearer_auth(token),
        };
        for (name, value) in &spec.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        request = match spec.body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request.json(&value),
            RequestBody::Form(pairs) => request.form(&pairs),
            RequestBody::Bytes { content_type, data } => request
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(data),
        };

        let response = request.send().await.map_err(|source| {
            let err = HttpError::Transport {
                url: url.clone(),
                source,
            };
            error!(method = %method, url = %url, error = %err, "HTTP request failed");
            err
        })?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(|source| {
            let err = HttpError::Transport {
                url: url.clone(),
                source,
            };
            error!(method = %method, url = %url, error = %err, "Failed to read response body");
            err
        })?;

        debug!(method = %method, url = %url, status, "HTTP request completed");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    /// Sends a request and decodes a successful response.
    ///
    /// Non-2xx statuses become [`HttpError::Status`]. A
    /// `text/plain; charset=utf-8` body is parsed as a form-encoded query
    /// string into an object of value arrays; an empty body is `null`.
    pub async fn execute_json(&self, spec: RequestSpec) -> Result<Value, HttpError> {
        let method = spec.method.clone();
        let url = spec.url.clone();
        let response = self.send(spec).await?;

        if !response.is_success() {
            let err = HttpError::Status {
                url: url.clone(),
                status: response.status,
                body: response.text(),
            };
            error!(
                method = %method,
                url = %url,
                status = response.status,
                error = %err,
                "HTTP request rejected"
            );
            return Err(err);
        }

        decode_body(&url, &response).inspect_err(|err| {
            error!(method = %method, url = %url, error = %err, "Failed to decode response");
        })
    }

    /// GET and decode.
    pub async fn get_json(&self, url: &str, auth: Auth) -> Result<Value, HttpError> {
        self.execute_json(RequestSpec::get(url).auth(auth)).await
    }

    /// POST a body and decode.
    pub async fn post_json(
        &self,
        url: &str,
        auth: Auth,
        body: RequestBody,
    ) -> Result<Value, HttpError> {
        self.execute_json(RequestSpec::post(url).auth(auth).body(body))
            .await
    }

    /// PUT a body and decode.
    pub async fn put_json(
        &self,
        url: &str,
        auth: Auth,
        body: RequestBody,
    ) -> Result<Value, HttpError> {
        self.execute_json(RequestSpec::put(url).auth(auth).body(body))
            .await
    }

    /// DELETE and decode.
    pub async fn delete_json(
        &self,
        url: &str,
        auth: Auth,
        body: RequestBody,
    ) -> Result<Value, HttpError> {
        self.execute_json(RequestSpec::delete(url).auth(auth).body(body))
            .await
    }
}

fn decode_body(url: &str, response: &HttpResponse) -> Result<Value, HttpError> {
    if response.header("content-type") == Some(FORM_TEXT_CONTENT_TYPE) {
        return Ok(parse_query_string(&response.body));
    }
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    response.json().map_err(|e| HttpError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// Parses `a=1&a=2&b=3` into `{"a": ["1", "2"], "b": ["3"]}`.
fn parse_query_string(body: &[u8]) -> Value {
    let mut object: Map<String, Value> = Map::new();
    for (key, value) in url::form_urlencoded::parse(body) {
        if value.is_empty() {
            continue;
        }
        let entry = object
            .entry(key.into_owned())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(values) = entry {
            values.push(Value::String(value.into_owned()));
        }
    }
    Value::Object(object)
}
