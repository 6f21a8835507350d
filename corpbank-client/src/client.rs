use crate::options::RequestOption;
use corpbank_domain::{
    ApiKey, BearerToken, CorpBankConfig, CorpBankError, Credentials, RemoteError,
    DEFAULT_API_BASE_URL,
};
use http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method, StatusCode,
};
use reqwest::{Body, Request, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

/// Largest response body decoded on success.
pub const MAX_READ_BYTES: usize = 10 * 1024 * 1024;
/// Largest response body read when the status is not the expected one.
pub const MAX_READ_BYTES_ON_ERR: usize = 4 * 1024;

#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    pub api_base_url: Option<String>,
    pub http_client: Option<reqwest::Client>,
}

/// Signs and sends requests to the bank API on behalf of one API key.
///
/// Retries, timeouts and connection pooling belong to the `reqwest::Client` passed
/// in [`ClientOptions`]; this type only adds authentication and response handling.
#[derive(Debug, Clone)]
pub struct Client {
    key: ApiKey,
    base_url: Url,
    http_client: reqwest::Client,
}

impl Client {
    pub fn new(credentials: &Credentials, options: ClientOptions) -> Result<Self, CorpBankError> {
        let key = credentials.parse()?;

        let base_url = options
            .api_base_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_API_BASE_URL);
        let base_url = Url::parse(base_url).map_err(|e| {
            RemoteError::invalid_request(&format!("unable to parse API URL `{base_url}`: {e}"))
        })?;

        Ok(Self {
            key,
            base_url,
            http_client: options.http_client.unwrap_or_default(),
        })
    }

    pub fn from_config(config: &CorpBankConfig) -> Result<Self, CorpBankError> {
        Self::new(
            &config.credentials(),
            ClientOptions {
                api_base_url: Some(config.api_base_url.clone()),
                http_client: None,
            },
        )
    }

    pub fn api_key_id(&self) -> Uuid {
        self.key.id
    }

    /// Appends percent-encoded path segments to the base URL.
    pub fn url(&self, segments: &[&str]) -> Result<Url, CorpBankError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                RemoteError::invalid_request(&format!(
                    "API URL `{}` cannot be a base",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    pub fn request(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<Vec<u8>>,
        options: &[RequestOption],
    ) -> Result<Request, CorpBankError> {
        let mut url = self.url(segments)?;
        for option in options {
            option.apply(&mut url);
        }

        let mut request = Request::new(method, url);
        if let Some(body) = body {
            request
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            *request.body_mut() = Some(Body::from(body));
        }

        Ok(request)
    }

    /// Attaches `Authorization: Bearer <token>` signed over the exact body bytes that
    /// will be sent. The body is only borrowed, so the request can still be sent
    /// afterwards. Streaming bodies cannot be read without consuming them and are
    /// rejected.
    pub fn sign(&self, request: &mut Request) -> Result<(), CorpBankError> {
        let body: &[u8] = match request.body() {
            Some(body) => body.as_bytes().ok_or_else(|| {
                RemoteError::invalid_request("streaming request bodies cannot be signed")
            })?,
            None => &[],
        };

        let packed = BearerToken::new_signed(&self.key, body)?.pack()?;

        let mut value = HeaderValue::from_str(&format!("Bearer {packed}")).map_err(|e| {
            RemoteError::invalid_request(&format!("invalid authorization header: {e}"))
        })?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);

        Ok(())
    }

    /// Signs and sends `request`, discarding the response body.
    pub async fn execute(
        &self,
        request: Request,
        expected_status: StatusCode,
    ) -> Result<(), CorpBankError> {
        self.send(request, expected_status).await.map(|_| ())
    }

    /// Signs and sends `request`, decoding the JSON response body.
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        request: Request,
        expected_status: StatusCode,
    ) -> Result<T, CorpBankError> {
        let response = self.send(request, expected_status).await?;
        let body = read_limited(response, MAX_READ_BYTES).await?;

        debug!(
            "Response body from the remote service: {}",
            String::from_utf8_lossy(&body)
        );

        serde_json::from_slice(&body).map_err(|e| {
            RemoteError::invalid_response(&format!(
                "unable to parse JSON response of the remote service: {e}"
            ))
        })
    }

    async fn send(
        &self,
        mut request: Request,
        expected_status: StatusCode,
    ) -> Result<Response, CorpBankError> {
        self.sign(&mut request)?;

        let method = request.method().clone();
        let url = request.url().clone();

        let response = self.http_client.execute(request).await.map_err(|e| {
            RemoteError::transport(&format!("Failed to send request: {}", e.without_url()))
        })?;

        let status = response.status();
        if status != expected_status {
            let body = read_limited(response, MAX_READ_BYTES_ON_ERR).await?;
            warn!(
                "{method} {} returned {status} (expected: {expected_status})",
                url.path()
            );
            return Err(RemoteError::from_response(status, &body));
        }

        Ok(response)
    }
}

async fn read_limited(mut response: Response, limit: usize) -> Result<Vec<u8>, CorpBankError> {
    let mut buf = Vec::new();

    while let Some(chunk) = response.chunk().await.map_err(|e| {
        RemoteError::transport(&format!("unable to read HTTP response: {}", e.without_url()))
    })? {
        let remaining = limit - buf.len();
        if chunk.len() >= remaining {
            buf.extend_from_slice(&chunk[..remaining]);
            break;
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const KEY_ID: &str = "6f1c7d1e-3b9a-4b7e-9a51-2d8f0c4e5a17";
    const KEY_SECRET: &str = "Y29ycGJhbmstdGVzdC1zZWNyZXQ=";

    fn client() -> Client {
        Client::new(
            &Credentials::new(KEY_ID, KEY_SECRET),
            ClientOptions {
                api_base_url: Some("https://api.example.com/corpbank/v1/".to_owned()),
                http_client: None,
            },
        )
        .unwrap()
    }

    fn bearer_token(request: &Request) -> BearerToken {
        let values = request.headers().get_all(AUTHORIZATION).iter().collect::<Vec<_>>();
        assert_eq!(values.len(), 1);
        let header = values[0].to_str().unwrap();
        let packed = header.strip_prefix("Bearer ").unwrap();
        BearerToken::unpack(packed).unwrap()
    }

    #[test]
    fn test_new_uses_default_base_url() {
        let client = Client::new(
            &Credentials::new(KEY_ID, KEY_SECRET),
            ClientOptions::default(),
        )
        .unwrap();
        assert_eq!(client.base_url.as_str(), DEFAULT_API_BASE_URL);
        assert_eq!(client.api_key_id().to_string(), KEY_ID);
    }

    #[test]
    fn test_new_rejects_bad_credentials() {
        let err = Client::new(
            &Credentials::new("nope", KEY_SECRET),
            ClientOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.as_ref(), "MalformedCredentials");
    }

    #[test]
    fn test_new_rejects_bad_base_url() {
        let err = Client::new(
            &Credentials::new(KEY_ID, KEY_SECRET),
            ClientOptions {
                api_base_url: Some("not a url".to_owned()),
                http_client: None,
            },
        )
        .unwrap_err();
        assert_eq!(err.as_ref(), "InvalidRequest");
    }

    #[test]
    fn test_url_escapes_segments() {
        let url = client()
            .url(&["accounts", "a b/c", "balance"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/corpbank/v1/accounts/a%20b%2Fc/balance"
        );
    }

    #[test]
    fn test_sign_covers_request_body() {
        let client = client();
        let body = br#"{"enabled": true}"#.to_vec();
        let mut request = client
            .request(Method::PUT, &["api-keys", KEY_ID, "enabled"], Some(body.clone()), &[])
            .unwrap();

        client.sign(&mut request).unwrap();

        let token = bearer_token(&request);
        assert_eq!(token.api_key_id().to_string(), KEY_ID);
        assert_eq!(
            token.verify(b"corpbank-test-secret", &body, Duration::seconds(5)),
            Ok(())
        );
        assert_eq!(
            request.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        // the body is still there to be sent
        assert_eq!(request.body().and_then(Body::as_bytes), Some(&body[..]));
    }

    #[test]
    fn test_sign_without_body_covers_empty_content() {
        let client = client();
        let mut request = client.request(Method::GET, &["me"], None, &[]).unwrap();

        client.sign(&mut request).unwrap();

        let token = bearer_token(&request);
        assert_eq!(
            token.verify(b"corpbank-test-secret", b"", Duration::seconds(5)),
            Ok(())
        );
        assert!(request.headers().get(AUTHORIZATION).unwrap().is_sensitive());
    }

    #[test]
    fn test_sign_replaces_existing_authorization() {
        let client = client();
        let mut request = client.request(Method::GET, &["me"], None, &[]).unwrap();
        request
            .headers_mut()
            .append(AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        request
            .headers_mut()
            .append(AUTHORIZATION, HeaderValue::from_static("Bearer stale"));

        client.sign(&mut request).unwrap();

        bearer_token(&request);
    }

    #[test]
    fn test_request_applies_options_in_order() {
        let request = client()
            .request(
                Method::GET,
                &["bank-transactions"],
                None,
                &[
                    RequestOption::PageSize(10),
                    RequestOption::incoming(),
                    RequestOption::PageSize(20),
                ],
            )
            .unwrap();
        assert_eq!(
            request.url().query(),
            Some("direction=INCOMING&pageSize=20")
        );
    }
}
