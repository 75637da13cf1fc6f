//!
//! Client data layer for the Pulseboard server-monitoring dashboard.
//!
//! ## Pulseboard Client
//! The entry point is a [`Client`] pointed at a dashboard deployment
//! ```no_run
//! #[tokio::main]
//! async fn main() -> Result<(), pulseboard_client::Error> {
//!     use pulseboard_client::ClientBuilder;
//!
//!     let client = ClientBuilder::new().build("https://board.example.net")?;
//!
//!     let hosts = client.nodes().await?;
//!     println!("{} hosts monitored", hosts.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Directory, live feed and derived views
//! The directory owns the host roster, the feed owns the latest snapshot per
//! host, and everything the dashboard renders is recomputed from the two.
//! ```no_run
//! #[tokio::main]
//! async fn main() -> Result<(), pulseboard_client::Error> {
//!     use pulseboard_client::{
//!         directory::NodeDirectory, feed::LiveFeed, session::ViewSession, view, ClientBuilder,
//!     };
//!
//!     let client = ClientBuilder::new().build("https://board.example.net")?;
//!
//!     let directory = NodeDirectory::new(client.clone());
//!     directory.refresh().await?;
//!
//!     // The feed refuses to open before the directory's first load settles.
//!     let feed = LiveFeed::new(Default::default());
//!     feed.activate(&client, &directory).await?;
//!
//!     let session = ViewSession::new();
//!     let roster = directory.roster().await;
//!     let snapshots = feed.snapshots().await;
//!     let view = view::derive_view(&roster, &snapshots, &session.query());
//!     println!("{}/{} online", view.stats.online_count, view.stats.total_count);
//!     Ok(())
//! }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::missing_errors_doc)]

pub mod directory;
pub mod feed;
pub mod format;
pub mod projection;
pub mod session;
pub mod types;
pub mod view;

pub use types::{HostRecord, LiveSnapshot, SnapshotMap, TrafficLimitType};

/// Error returned by client functions
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failure returned by the HTTP server
    #[error("HTTP failed {0}, {1}")]
    WebServer(u16, String),

    /// Websocket error
    #[error("Websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("Serde JSON error: {0}")]
    Serde(#[from] serde_json::Error),

    /// URL parsing error
    #[error("URL: {0}")]
    URL(#[from] url::ParseError),

    /// HTTP client error
    #[error("Reqwest: {0}")]
    HTTPClient(#[from] reqwest::Error),

    /// Live feed error
    #[error("Live feed error {0:?}")]
    Feed(Option<String>),

    /// This error is returned if we get data from the API we can't parse/understand
    #[error("API Error {0:?}")]
    API(String),

    /// IO Errors
    #[error("IO error {0}")]
    IO(#[from] std::io::Error),

    /// General Error
    #[error("Error {0}")]
    General(String),
}

impl Error {
    /// Create a general error
    #[must_use]
    pub fn general(err: &str) -> Self {
        Self::General(err.to_string())
    }
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Builder for a Pulseboard [`Client`]
#[derive(Clone)]
pub struct ClientBuilder {
    reqwest_ca: Vec<reqwest::Certificate>,
    disable_cert_verification: bool,
    timeout: Option<std::time::Duration>,
}

impl ClientBuilder {
    /// Create a new builder instance
    #[must_use]
    pub const fn new() -> Self {
        Self {
            reqwest_ca: Vec::new(),
            disable_cert_verification: false,
            timeout: None,
        }
    }

    /// Add a root certificate for API certificate verification
    pub fn add_root_certificate(mut self, cert: &[u8]) -> Result<Self> {
        let ca = reqwest::Certificate::from_pem(cert)?;
        self.reqwest_ca.push(ca);
        Ok(self)
    }

    /// Disable certificate verification
    #[must_use]
    pub fn danger_accept_invalid_certs(self) -> Self {
        Self {
            disable_cert_verification: true,
            ..self
        }
    }

    /// Set a timeout for API requests
    #[must_use]
    pub fn request_timeout(self, timeout: std::time::Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self
        }
    }

    /// Build a [`Client`] for the dashboard deployment at `host`
    pub fn build(&self, host: &str) -> Result<Client> {
        let base_url = url::Url::parse(host)?;

        let client = reqwest::Client::builder();
        let client = self
            .reqwest_ca
            .iter()
            .fold(client, |client, ca| client.add_root_certificate(ca.clone()));
        let client = client.danger_accept_invalid_certs(self.disable_cert_verification);
        let client = match self.timeout {
            Some(timeout) => client.timeout(timeout),
            None => client,
        };
        let client = client.build()?;

        Client::new(client, base_url)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The `Client` is used for all interaction with a Pulseboard deployment.
#[derive(Clone)]
pub struct Client {
    base_url: url::Url,
    pub(crate) websocket_url: url::Url,
    client: reqwest::Client,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("websocket_url", &self.websocket_url)
            .finish()
    }
}

impl Client {
    /// Create a Client builder
    #[must_use]
    pub const fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    fn new(client: reqwest::Client, base_url: url::Url) -> Result<Self> {
        let ws_scheme = match base_url.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        let websocket_url =
            url::Url::parse(&format!("{}://{}/v1/ws/", ws_scheme, base_url.host_port()?))?;

        Ok(Self {
            base_url,
            websocket_url,
            client,
        })
    }

    /// GET a json payload from the REST API.
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query_params: Option<&[(&str, &str)]>,
    ) -> Result<T> {
        let url = self.base_url.join(path)?;

        let mut builder = self.client.get(url).header("Accept", "application/json");
        if let Some(qp) = query_params {
            builder = builder.query(qp);
        }

        let result = builder.send().await?;

        if result.status().is_success() {
            let res = result.json().await?;
            Ok(res)
        } else {
            Err(Error::WebServer(
                result.status().as_u16(),
                result.status().to_string(),
            ))
        }
    }

    /// Fetch the full host roster. The order of the returned records carries
    /// no meaning; callers sort by weight (see
    /// [`NodeDirectory`](directory::NodeDirectory)).
    pub async fn nodes(&self) -> Result<Vec<types::HostRecord>> {
        self.get_json("v1/nodes", None).await
    }

    /// Fetch the most recent metric records for one host
    pub async fn recent_stats(&self, uuid: &str) -> Result<Vec<types::LiveSnapshot>> {
        self.get_json(&format!("v1/node/{uuid}/recent-stats"), None)
            .await
    }

    /// Fetch the load history of one host over the last `hours` hours
    pub async fn load_history(&self, uuid: &str, hours: u32) -> Result<types::LoadHistory> {
        self.get_json(
            &format!("v1/node/{uuid}/load-history"),
            Some(&[("hours", hours.to_string().as_str())]),
        )
        .await
    }

    /// Fetch the ping history of one host over the last `hours` hours
    pub async fn ping_history(&self, uuid: &str, hours: u32) -> Result<types::PingHistory> {
        self.get_json(
            &format!("v1/node/{uuid}/ping-history"),
            Some(&[("hours", hours.to_string().as_str())]),
        )
        .await
    }

    /// Open a subscription on the live snapshot push channel
    pub async fn subscribe_live(&self) -> Result<feed::Subscription> {
        feed::Subscription::connect(self).await
    }
}

pub(crate) trait URLExt {
    fn host_port(&self) -> std::result::Result<String, url::ParseError>;
}

impl URLExt for url::Url {
    fn host_port(&self) -> std::result::Result<String, url::ParseError> {
        let host = self.host_str().ok_or(url::ParseError::EmptyHost)?;
        Ok(match (host, self.port()) {
            (host, Some(port)) => format!("{}:{}", host, port),
            (host, _) => host.to_string(),
        })
    }
}
