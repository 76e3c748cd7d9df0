pub mod types;

use std::fmt;
use std::future::Future;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use self::types::*;

const USER_AGENT: &str = concat!("fleetdash/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("unexpected response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{message}")]
    Rejected { message: String },

    #[error("invalid base URL '{url}'")]
    InvalidBaseUrl { url: String },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    /// True for failures reported by the backend in an otherwise valid body.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ApiError::Rejected { .. })
    }
}

/// How a command endpoint addresses a robot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Identifier {
    Id(String),
    Serial(u32),
}

impl Identifier {
    /// Picks the robot id when both are supplied.
    pub fn from_parts(robot_id: Option<&str>, serial: Option<u32>) -> Option<Self> {
        match robot_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => Some(Identifier::Id(id.to_string())),
            None => serial.map(Identifier::Serial),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Identifier::Id(_) => "id",
            Identifier::Serial(_) => "serial",
        }
    }

    pub fn path_segment(&self) -> String {
        match self {
            Identifier::Id(id) => id.clone(),
            Identifier::Serial(serial) => serial.to_string(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Id(id) => write!(f, "robot id {id}"),
            Identifier::Serial(serial) => write!(f, "serial #{serial}"),
        }
    }
}

/// Every endpoint of the robots REST API, one method each.
pub trait RobotBackend {
    fn list_robots(
        &self,
        page: u32,
        page_size: u32,
    ) -> impl Future<Output = Result<RobotPage, ApiError>> + Send;

    fn add_robot(&self, robot: &NewRobot) -> impl Future<Output = Result<Ack, ApiError>> + Send;

    fn delete_robot(&self, robot_id: &str) -> impl Future<Output = Result<Ack, ApiError>> + Send;

    fn set_robot_enabled(
        &self,
        robot_id: &str,
        enabled: bool,
    ) -> impl Future<Output = Result<Ack, ApiError>> + Send;

    fn fetch_robot_data(
        &self,
        robot_id: &str,
    ) -> impl Future<Output = Result<RobotSnapshot, ApiError>> + Send;

    fn batch_add(
        &self,
        robots: &[BatchRobot],
    ) -> impl Future<Output = Result<BatchAck, ApiError>> + Send;

    fn batch_delete(
        &self,
        robot_ids: &[String],
    ) -> impl Future<Output = Result<BatchAck, ApiError>> + Send;

    fn schedule_start(
        &self,
        target: &Identifier,
        params: &ScheduleParams,
    ) -> impl Future<Output = Result<ScheduleAck, ApiError>> + Send;

    fn start(&self, target: &Identifier)
        -> impl Future<Output = Result<CommandAck, ApiError>> + Send;

    fn time_sync(
        &self,
        target: &Identifier,
    ) -> impl Future<Output = Result<CommandAck, ApiError>> + Send;

    fn get_alarms(
        &self,
        target: &Identifier,
    ) -> impl Future<Output = Result<AlarmState, ApiError>> + Send;

    fn set_alarms(
        &self,
        target: &Identifier,
        values: &AlarmValues,
    ) -> impl Future<Output = Result<CommandAck, ApiError>> + Send;
}

#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub base_url: String,
    /// `None` leaves requests without a deadline.
    pub timeout_seconds: Option<u64>,
    pub proxy: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout_seconds: None,
            proxy: None,
        }
    }
}

/// reqwest-backed implementation of [`RobotBackend`].
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(options: &ClientOptions) -> Result<Self, ApiError> {
        let base_url = options.base_url.trim().trim_end_matches('/').to_string();
        if reqwest::Url::parse(&base_url).is_err() {
            return Err(ApiError::InvalidBaseUrl {
                url: options.base_url.clone(),
            });
        }

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(USER_AGENT),
        );

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(seconds) = options.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds.max(1)));
        }

        if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| ApiError::ProxySetup {
                proxy: proxy.to_string(),
                source: e,
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| ApiError::HttpClientBuild { source: e })?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/robots{}", self.base_url, path)
    }

    fn target_url(&self, target: &Identifier, action: &str) -> String {
        self.url(&format!(
            "/{}/{}?type={}",
            target.path_segment(),
            action,
            target.kind()
        ))
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&(dyn ErasedBody + Sync)>,
    ) -> Result<reqwest::Response, ApiError> {
        debug!(%method, url, "sending request");
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = body.attach(request);
        }
        let response = request.send().await.map_err(|e| ApiError::Transport {
            url: url.to_string(),
            source: e,
        })?;
        debug!(url, status = %response.status(), "response received");
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(
        url: &str,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        response.json::<T>().await.map_err(|e| ApiError::Decode {
            url: url.to_string(),
            source: e,
        })
    }

    /// Decodes the body whatever the HTTP status; the body's own `success`
    /// flag decides the outcome.
    async fn exchange<T: DeserializeOwned>(
        &self,
        method: Method,
        url: String,
        body: Option<&(dyn ErasedBody + Sync)>,
    ) -> Result<T, ApiError> {
        let response = self.send(method, &url, body).await?;
        Self::decode(&url, response).await
    }
}

/// Lets `send` take any serializable body without becoming generic.
trait ErasedBody {
    fn attach(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder;
}

impl<T: Serialize> ErasedBody for T {
    fn attach(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.json(self)
    }
}

impl RobotBackend for ApiClient {
    async fn list_robots(&self, page: u32, page_size: u32) -> Result<RobotPage, ApiError> {
        let url = self.url(&format!("?page={page}&pageSize={page_size}"));
        let response = self.send(Method::GET, &url, None).await?;
        if !response.status().is_success() {
            return Err(ApiError::Status {
                url,
                status: response.status(),
            });
        }
        Self::decode(&url, response).await
    }

    async fn add_robot(&self, robot: &NewRobot) -> Result<Ack, ApiError> {
        self.exchange(Method::POST, self.url(""), Some(robot)).await
    }

    async fn delete_robot(&self, robot_id: &str) -> Result<Ack, ApiError> {
        self.exchange(Method::DELETE, self.url(&format!("/{robot_id}")), None)
            .await
    }

    async fn set_robot_enabled(&self, robot_id: &str, enabled: bool) -> Result<Ack, ApiError> {
        let body = StatusBody { enabled };
        self.exchange(
            Method::PATCH,
            self.url(&format!("/{robot_id}/status")),
            Some(&body),
        )
        .await
    }

    async fn fetch_robot_data(&self, robot_id: &str) -> Result<RobotSnapshot, ApiError> {
        let snapshot: RobotSnapshot = self
            .exchange(Method::GET, self.url(&format!("/{robot_id}/data")), None)
            .await?;
        Ok(snapshot.normalize())
    }

    async fn batch_add(&self, robots: &[BatchRobot]) -> Result<BatchAck, ApiError> {
        let body = BatchAddBody { robots };
        self.exchange(Method::POST, self.url("/batch"), Some(&body))
            .await
    }

    async fn batch_delete(&self, robot_ids: &[String]) -> Result<BatchAck, ApiError> {
        let body = BatchDeleteBody { robot_ids };
        self.exchange(Method::POST, self.url("/batch-delete"), Some(&body))
            .await
    }

    async fn schedule_start(
        &self,
        target: &Identifier,
        params: &ScheduleParams,
    ) -> Result<ScheduleAck, ApiError> {
        self.exchange(
            Method::POST,
            self.target_url(target, "schedule_start"),
            Some(params),
        )
        .await
    }

    async fn start(&self, target: &Identifier) -> Result<CommandAck, ApiError> {
        self.exchange(Method::POST, self.target_url(target, "start"), None)
            .await
    }

    async fn time_sync(&self, target: &Identifier) -> Result<CommandAck, ApiError> {
        self.exchange(Method::POST, self.target_url(target, "time_sync"), None)
            .await
    }

    async fn get_alarms(&self, target: &Identifier) -> Result<AlarmState, ApiError> {
        self.exchange(Method::GET, self.target_url(target, "alarms"), None)
            .await
    }

    async fn set_alarms(
        &self,
        target: &Identifier,
        values: &AlarmValues,
    ) -> Result<CommandAck, ApiError> {
        self.exchange(Method::PATCH, self.target_url(target, "alarms"), Some(values))
            .await
    }
}
