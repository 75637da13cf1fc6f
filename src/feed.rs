//!
//! Live snapshot feed.
//!
//! Maintains the most recent [`LiveSnapshot`](crate::types::LiveSnapshot) per
//! host, sourced from the push channel. The cache is a pure last-value store:
//! every push message carries a full uuid-to-snapshot map and replaces the
//! cache wholesale. Reconnection, backoff and heartbeats are the transport's
//! responsibility; this layer only reflects presence or absence of data.
use crate::directory::NodeDirectory;
use crate::types::SnapshotMap;
use crate::{Client, Error, Result};
use futures_util::{Stream, StreamExt};
use pin_project_lite::pin_project;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio_tungstenite::tungstenite::Message as WSMessage;

type WebSocketStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

pin_project! {
    /// One open subscription on the live push channel
    pub struct Subscription {
        ws: WebSocketStream,
    }
}

impl Subscription {
    pub(crate) async fn connect(client: &Client) -> Result<Self> {
        let ws_url = client.websocket_url.join("live")?;
        tracing::debug!("subscribing to {}", ws_url);

        let (ws, _) = tokio_tungstenite::connect_async(ws_url.as_str()).await?;
        Ok(Self { ws })
    }

    /// Wait for the next full snapshot map. `None` means the channel closed.
    pub async fn recv(&mut self) -> Result<Option<SnapshotMap>> {
        loop {
            let msg = match self.ws.next().await {
                None => return Ok(None),
                Some(msg) => msg?,
            };

            match msg {
                WSMessage::Text(text) => return Ok(Some(serde_json::from_str(&text)?)),
                WSMessage::Binary(bin) => return Ok(Some(serde_json::from_slice(&bin)?)),
                WSMessage::Ping(_) | WSMessage::Pong(_) => continue,
                WSMessage::Close(_) => return Ok(None),
                msg => {
                    return Err(Error::Feed(Some(format!(
                        "Unexpected message type: '{msg}'"
                    ))))
                }
            }
        }
    }

    /// Close the subscription, releasing the transport resource
    pub async fn close(&mut self) -> Result<()> {
        self.ws.close(None).await?;
        Ok(())
    }
}

impl Stream for Subscription {
    type Item = Result<SnapshotMap>;

    fn poll_next(
        self: std::pin::Pin<&mut Self>,
        cx: &mut core::task::Context<'_>,
    ) -> core::task::Poll<Option<Self::Item>> {
        let this = self.project();
        let mut ws = std::pin::Pin::new(this.ws);

        loop {
            match ws.as_mut().poll_next(cx) {
                core::task::Poll::Ready(val) => {
                    let res: Option<Self::Item> = match val {
                        Some(Ok(WSMessage::Text(text))) => {
                            Some(serde_json::from_str(&text).map_err(Error::from))
                        }
                        Some(Ok(WSMessage::Binary(bin))) => {
                            Some(serde_json::from_slice(&bin).map_err(Error::from))
                        }
                        Some(Ok(WSMessage::Ping(_) | WSMessage::Pong(_))) => continue,
                        Some(Ok(WSMessage::Close(_))) | None => None,
                        Some(Ok(msg)) => Some(Err(Error::Feed(Some(format!(
                            "Unexpected message ({msg:?})"
                        ))))),
                        Some(Err(e)) => Some(Err(e.into())),
                    };

                    return core::task::Poll::Ready(res);
                }
                core::task::Poll::Pending => return core::task::Poll::Pending,
            }
        }
    }
}

/// [`LiveFeed`] options
#[derive(Clone, Copy, Debug)]
pub struct Options {
    /// When false the feed never subscribes and the cache stays empty
    pub enabled: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Last-value cache of live snapshots, keyed by host uuid.
///
/// The feed may only activate once the directory's first load has settled;
/// until then (and whenever the feed is inactive) consumers see an empty map
/// and must treat every host as unknown/offline.
pub struct LiveFeed {
    options: Options,
    cache: Arc<RwLock<SnapshotMap>>,
    pump: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl LiveFeed {
    /// Create an inactive feed
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self {
            options,
            cache: Arc::new(RwLock::new(SnapshotMap::new())),
            pump: Mutex::new(None),
        }
    }

    /// Open the push subscription and start replacing the cache on every
    /// message.
    ///
    /// Refuses with [`Error::Feed`] while `directory` has not settled its
    /// first load; with the feed disabled in [`Options`] this is a no-op that
    /// tears down any previous subscription. Calling activate twice replaces
    /// the prior subscription.
    pub async fn activate(&self, client: &Client, directory: &NodeDirectory) -> Result<()> {
        if !self.options.enabled {
            tracing::debug!("live feed disabled, not subscribing");
            self.deactivate().await;
            return Ok(());
        }

        if !directory.settled().await {
            return Err(Error::Feed(Some(
                "node directory has not settled its first load".to_string(),
            )));
        }

        self.deactivate().await;

        let subscription = client.subscribe_live().await?;
        tracing::info!("live feed subscribed");

        let cache = Arc::clone(&self.cache);
        let handle = tokio::spawn(pump(subscription, cache));
        *self.pump.lock().await = Some(handle);

        Ok(())
    }

    /// Tear down the subscription and discard all cached snapshots.
    /// Idempotent; called on every deactivation path.
    pub async fn deactivate(&self) {
        if let Some(handle) = self.pump.lock().await.take() {
            handle.abort();
            tracing::info!("live feed unsubscribed");
        }
        self.cache.write().await.clear();
    }

    /// Whether a subscription is currently being pumped
    pub async fn active(&self) -> bool {
        self.pump
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// The current cache. Consumers re-read after every replacement; an
    /// absent key means unknown/offline.
    pub async fn snapshots(&self) -> SnapshotMap {
        self.cache.read().await.clone()
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        // Component teardown must release the transport as well.
        if let Ok(mut pump) = self.pump.try_lock() {
            if let Some(handle) = pump.take() {
                handle.abort();
            }
        }
    }
}

async fn pump(mut subscription: Subscription, cache: Arc<RwLock<SnapshotMap>>) {
    loop {
        match subscription.recv().await {
            Ok(Some(snapshots)) => {
                tracing::trace!("live push with {} hosts", snapshots.len());
                replace(&mut *cache.write().await, snapshots);
            }
            Ok(None) => {
                tracing::info!("live channel closed");
                break;
            }
            Err(e) => {
                tracing::warn!("live channel error: {}", e);
                break;
            }
        }
    }

    // No channel means no live data; readers fall back to offline display.
    cache.write().await.clear();
}

/// Wholesale replacement, never a per-key patch
fn replace(cache: &mut SnapshotMap, next: SnapshotMap) {
    *cache = next;
}

#[cfg(test)]
mod test {
    use super::{replace, LiveFeed, Options};
    use crate::directory::NodeDirectory;
    use crate::types::{LiveSnapshot, SnapshotMap};
    use crate::ClientBuilder;

    #[test]
    fn replacement_discards_missing_keys() {
        let mut cache = SnapshotMap::new();
        cache.insert("h-1".to_string(), LiveSnapshot::default());
        cache.insert("h-2".to_string(), LiveSnapshot::default());

        let mut next = SnapshotMap::new();
        next.insert("h-2".to_string(), LiveSnapshot::default());
        next.insert("h-3".to_string(), LiveSnapshot::default());
        replace(&mut cache, next);

        assert!(!cache.contains_key("h-1"));
        assert!(cache.contains_key("h-2"));
        assert!(cache.contains_key("h-3"));
    }

    #[tokio::test]
    async fn refuses_before_directory_settles() {
        let client = ClientBuilder::new().build("http://127.0.0.1:1").unwrap();
        let directory = NodeDirectory::new(client.clone());

        let feed = LiveFeed::new(Options::default());
        let result = feed.activate(&client, &directory).await;
        assert!(matches!(result, Err(crate::Error::Feed(_))));
        assert!(!feed.active().await);
    }

    #[tokio::test]
    async fn disabled_feed_never_subscribes() {
        let client = ClientBuilder::new().build("http://127.0.0.1:1").unwrap();
        let directory = NodeDirectory::new(client.clone());

        let feed = LiveFeed::new(Options { enabled: false });
        feed.activate(&client, &directory).await.unwrap();
        assert!(!feed.active().await);
        assert!(feed.snapshots().await.is_empty());
    }

    #[tokio::test]
    async fn deactivate_clears_cache() {
        let feed = LiveFeed::new(Options::default());
        feed.cache
            .write()
            .await
            .insert("h-1".to_string(), LiveSnapshot::default());

        feed.deactivate().await;
        assert!(feed.snapshots().await.is_empty());
    }
}
