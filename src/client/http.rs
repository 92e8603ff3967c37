//! HTTP transport shared by every index handle.

use crate::client::types::ClientError;
use crate::config::Config;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Body, Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Query string pairs appended to a request.
pub type Query<'a> = &'a [(&'a str, String)];

/// Thin wrapper over [`reqwest::Client`] that knows the engine's base URL and credentials.
///
/// Cloning is cheap: the underlying connection pool is shared.
#[derive(Clone)]
pub struct HttpClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
}

impl HttpClient {
    /// Construct a client from explicit configuration.
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let mut builder =
            Client::builder().user_agent(concat!("docfeed/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let base_url = normalize_base_url(&config.search_url).map_err(ClientError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            has_api_key = config.api_key.is_some(),
            "Initialized search engine HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    /// Normalized base URL requests are issued against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a `GET` and decode the JSON response.
    pub async fn get_json<R>(&self, path: &str, query: Query<'_>) -> Result<R, ClientError>
    where
        R: DeserializeOwned,
    {
        let response = self.request(Method::GET, path).query(query).send().await?;
        decode_response(Method::GET, path, response).await
    }

    /// Issue a `POST` with a JSON body.
    pub async fn post_json<B, R>(
        &self,
        path: &str,
        query: Query<'_>,
        body: &B,
    ) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send_json(Method::POST, path, query, body).await
    }

    /// Issue a `PUT` with a JSON body.
    pub async fn put_json<B, R>(
        &self,
        path: &str,
        query: Query<'_>,
        body: &B,
    ) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send_json(Method::PUT, path, query, body).await
    }

    /// Issue a `PATCH` with a JSON body.
    pub async fn patch_json<B, R>(&self, path: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send_json(Method::PATCH, path, &[], body).await
    }

    /// Issue a `DELETE` and decode the JSON response.
    pub async fn delete_json<R>(&self, path: &str) -> Result<R, ClientError>
    where
        R: DeserializeOwned,
    {
        let response = self.request(Method::DELETE, path).send().await?;
        decode_response(Method::DELETE, path, response).await
    }

    /// Issue a request with an arbitrary JSON body.
    pub async fn send_json<B, R>(
        &self,
        method: Method,
        path: &str,
        query: Query<'_>,
        body: &B,
    ) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .request(method.clone(), path)
            .query(query)
            .json(body)
            .send()
            .await?;
        decode_response(method, path, response).await
    }

    /// Issue a request whose body is sent as-is with the given content type.
    pub async fn send_raw<R>(
        &self,
        method: Method,
        path: &str,
        query: Query<'_>,
        body: Body,
        content_type: &str,
    ) -> Result<R, ClientError>
    where
        R: DeserializeOwned,
    {
        let response = self
            .request(method.clone(), path)
            .query(query)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;
        decode_response(method, path, response).await
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format_endpoint(&self.base_url, path);
        let mut req = self.client.request(method, url);
        if let Some(api_key) = &self.api_key
            && !api_key.is_empty()
        {
            req = req.bearer_auth(api_key);
        }
        req
    }
}

async fn decode_response<R>(
    method: Method,
    path: &str,
    response: reqwest::Response,
) -> Result<R, ClientError>
where
    R: DeserializeOwned,
{
    let status = response.status();
    if status.is_success() {
        let bytes = response.bytes().await?;
        tracing::debug!(%method, path, %status, bytes = bytes.len(), "Engine request succeeded");
        return Ok(serde_json::from_slice(&bytes)?);
    }

    let body = response.text().await.unwrap_or_default();
    let error = ClientError::from_response(status, &body);
    tracing::error!(%method, path, error = %error, "Engine request failed");
    Err(error)
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
