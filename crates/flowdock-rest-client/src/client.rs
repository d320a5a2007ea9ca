//! Main REST API client implementation

use std::borrow::Cow;

use flowdock_api_contract::query::to_query_pairs;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client as HttpClient, Method, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::auth::AuthConfig;
use crate::error::{RestClientError, RestClientResult};
use crate::flows::FlowsService;
use crate::inbox::InboxService;
use crate::messages::MessagesService;
use crate::organizations::OrganizationsService;
use crate::sse::StreamConfig;
use crate::users::UsersService;

/// REST API host of the public Flowdock service
pub const DEFAULT_REST_URL: &str = "https://api.flowdock.com/";
/// Streaming host of the public Flowdock service
pub const DEFAULT_STREAM_URL: &str = "https://stream.flowdock.com/";

const USER_AGENT: &str = concat!("flowdock-rest-client/", env!("CARGO_PKG_VERSION"));
const MEDIA_TYPE: &str = "application/json";

/// Which base URL a relative path resolves against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Rest,
    Stream,
}

/// Status line and headers of a successful response
#[derive(Debug, Clone)]
pub struct ResponseMeta {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl ResponseMeta {
    fn of(response: &Response) -> Self {
        Self {
            status: response.status(),
            headers: response.headers().clone(),
        }
    }
}

/// REST API client for Flowdock.
///
/// Cloning is cheap and clones share one connection pool; the client holds
/// no mutable state, so one instance can serve any number of tasks.
#[derive(Debug, Clone)]
pub struct RestClient {
    http_client: HttpClient,
    rest_url: Url,
    stream_url: Url,
    auth: AuthConfig,
    stream_config: StreamConfig,
}

impl RestClient {
    /// Create a new REST client
    pub fn new(rest_url: Url, stream_url: Url, auth: AuthConfig) -> RestClientResult<Self> {
        let http_client = HttpClient::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            http_client,
            rest_url: as_base(rest_url),
            stream_url: as_base(stream_url),
            auth,
            stream_config: StreamConfig::default(),
        })
    }

    /// Create a client from base URL strings
    pub fn from_urls(rest_url: &str, stream_url: &str, auth: AuthConfig) -> RestClientResult<Self> {
        Self::new(Url::parse(rest_url)?, Url::parse(stream_url)?, auth)
    }

    /// Create a client for the public Flowdock hosts
    pub fn flowdock(auth: AuthConfig) -> RestClientResult<Self> {
        Self::from_urls(DEFAULT_REST_URL, DEFAULT_STREAM_URL, auth)
    }

    /// Replace the `User-Agent` sent with every request
    pub fn with_user_agent(mut self, user_agent: &str) -> RestClientResult<Self> {
        self.http_client = HttpClient::builder().user_agent(user_agent).build()?;
        Ok(self)
    }

    /// Replace the settings used by stream subscriptions
    pub fn with_stream_config(mut self, stream_config: StreamConfig) -> Self {
        self.stream_config = stream_config;
        self
    }

    pub fn rest_url(&self) -> &Url {
        &self.rest_url
    }

    pub fn stream_url(&self) -> &Url {
        &self.stream_url
    }

    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }

    pub fn stream_config(&self) -> &StreamConfig {
        &self.stream_config
    }

    pub fn flows(&self) -> FlowsService<'_> {
        FlowsService::new(self)
    }

    pub fn messages(&self) -> MessagesService<'_> {
        MessagesService::new(self)
    }

    pub fn users(&self) -> UsersService<'_> {
        UsersService::new(self)
    }

    pub fn organizations(&self) -> OrganizationsService<'_> {
        OrganizationsService::new(self)
    }

    pub fn inbox(&self) -> InboxService<'_> {
        InboxService::new(self)
    }

    /// Resolve a relative path against the REST or streaming base URL.
    ///
    /// Paths should not start with a slash, otherwise they replace the base
    /// URL's own path.
    pub fn url_for(&self, endpoint: Endpoint, path: &str) -> RestClientResult<Url> {
        let base = match endpoint {
            Endpoint::Rest => &self.rest_url,
            Endpoint::Stream => &self.stream_url,
        };
        Ok(base.join(path)?)
    }

    /// Build an authenticated request. `body`, when present, is sent as JSON.
    pub fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: Endpoint,
        path: &str,
        body: Option<&B>,
    ) -> RestClientResult<Request> {
        let url = self.url_for(endpoint, path)?;
        self.build_request(method, url, body)
    }

    /// Send a request, failing on any status outside 2xx.
    pub async fn execute(&self, request: Request) -> RestClientResult<ResponseMeta> {
        let response = self.send(request).await?;
        Ok(ResponseMeta::of(&response))
    }

    /// Send a request and decode its JSON body into `T`.
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        request: Request,
    ) -> RestClientResult<(ResponseMeta, T)> {
        let response = self.send(request).await?;
        let meta = ResponseMeta::of(&response);
        let bytes = response.bytes().await?;
        let value = serde_json::from_slice(&bytes).map_err(RestClientError::Decode)?;
        Ok((meta, value))
    }

    // Helpers shared by the resource services

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> RestClientResult<T> {
        let request = self.request(Method::GET, Endpoint::Rest, path, None::<&()>)?;
        self.execute_json(request).await.map(|(_, value)| value)
    }

    pub(crate) async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> RestClientResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let mut url = self.url_for(Endpoint::Rest, path)?;
        let pairs = to_query_pairs(query)?;
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        let request = self.build_request(Method::GET, url, None::<&()>)?;
        self.execute_json(request).await.map(|(_, value)| value)
    }

    pub(crate) async fn send_json<T, B>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> RestClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.request(method, Endpoint::Rest, path, Some(body))?;
        self.execute_json(request).await.map(|(_, value)| value)
    }

    fn build_request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> RestClientResult<Request> {
        let mut request = self
            .http_client
            .request(method, url)
            .header(ACCEPT, HeaderValue::from_static(MEDIA_TYPE))
            .headers(self.auth.headers()?);

        if let Some(body) = body {
            let bytes = serde_json::to_vec(body).map_err(RestClientError::Encode)?;
            request = request
                .header(reqwest::header::CONTENT_TYPE, MEDIA_TYPE)
                .body(bytes);
        }

        Ok(request.build()?)
    }

    async fn send(&self, request: Request) -> RestClientResult<Response> {
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, path = url.path(), "sending request");

        let response = self.http_client.execute(request).await?;
        check_status(method, url, response).await
    }
}

/// Turn a non-2xx response into [`RestClientError::Api`].
///
/// The body is read best-effort: if reading fails the error still carries the
/// status, with an empty body.
pub(crate) async fn check_status(
    method: Method,
    url: Url,
    response: Response,
) -> RestClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = match response.bytes().await {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => {
            debug!(error = %e, "failed to read error response body");
            Vec::new()
        }
    };

    debug!(%method, path = url.path(), %status, "request failed");
    Err(RestClientError::Api {
        method,
        url,
        status,
        body,
    })
}

/// Percent-encode one path segment (organization, flow or token).
pub(crate) fn segment(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

// A base URL must end in a slash for relative paths to resolve beneath it.
fn as_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
