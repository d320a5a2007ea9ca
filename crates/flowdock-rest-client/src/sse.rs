//! Server-Sent Events (SSE) streaming support

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use eventsource_client as es;
use flowdock_api_contract::Message;
use futures::stream::{Stream, StreamExt};
use reqwest::header::HeaderMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{RestClientError, RestClientResult, StreamError};

/// Buffering and reconnect settings for stream subscriptions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Messages buffered before the stream task waits for the consumer
    pub message_capacity: usize,
    /// Errors buffered before further errors are dropped
    pub error_capacity: usize,
    pub reconnect_delay: Duration,
    pub backoff_factor: u32,
    pub max_reconnect_delay: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            message_capacity: 64,
            error_capacity: 16,
            reconnect_delay: Duration::from_secs(3),
            backoff_factor: 2,
            max_reconnect_delay: Duration::from_secs(60),
        }
    }
}

/// Live subscription to one flow's message stream.
///
/// Messages arrive in server order through [`recv`](Self::recv) or the
/// [`Stream`] impl; decode and transport failures arrive separately through
/// [`next_error`](Self::next_error). Dropping the subscription stops the
/// background task.
pub struct FlowSubscription {
    messages: MessageReceiver,
    errors: ErrorReceiver,
    handle: SubscriptionHandle,
}

impl FlowSubscription {
    /// Next message, or `None` once the subscription has ended.
    pub async fn recv(&mut self) -> Option<Message> {
        self.messages.recv().await
    }

    /// Next out-of-band error, or `None` once the subscription has ended.
    pub async fn next_error(&mut self) -> Option<StreamError> {
        self.errors.recv().await
    }

    /// Stop the stream and wait for its task to finish.
    pub async fn close(self) {
        self.handle.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }

    /// Separate the message and error channels from the task handle.
    pub fn split(self) -> (MessageReceiver, ErrorReceiver, SubscriptionHandle) {
        (self.messages, self.errors, self.handle)
    }
}

impl Stream for FlowSubscription {
    type Item = Message;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.messages).poll_next(cx)
    }
}

/// Message half of a split subscription
pub struct MessageReceiver {
    receiver: mpsc::Receiver<Message>,
}

impl MessageReceiver {
    pub async fn recv(&mut self) -> Option<Message> {
        self.receiver.recv().await
    }
}

impl Stream for MessageReceiver {
    type Item = Message;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Error half of a split subscription
pub struct ErrorReceiver {
    receiver: mpsc::Receiver<StreamError>,
}

impl ErrorReceiver {
    pub async fn recv(&mut self) -> Option<StreamError> {
        self.receiver.recv().await
    }
}

impl Stream for ErrorReceiver {
    type Item = StreamError;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Owns the stream task; dropping it cancels the task.
pub struct SubscriptionHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SubscriptionHandle {
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "stream task ended abnormally");
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.task.as_ref().map_or(true, |t| t.is_finished())
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Open a subscription on `url`. Connecting happens in the background, so
/// connection failures are reported on the error channel.
pub(crate) fn subscribe(
    url: &Url,
    headers: &HeaderMap,
    config: &StreamConfig,
    label: String,
) -> RestClientResult<FlowSubscription> {
    let mut builder = es::ClientBuilder::for_url(url.as_str()).map_err(sse_error)?;
    for (name, value) in headers {
        let value = value
            .to_str()
            .map_err(|e| RestClientError::Auth(e.to_string()))?;
        builder = builder.header(name.as_str(), value).map_err(sse_error)?;
    }

    // Connection failures surface to `deliver`, which owns the backoff.
    let client = builder
        .reconnect(
            es::ReconnectOptions::reconnect(true)
                .retry_initial(false)
                .delay(config.reconnect_delay)
                .backoff_factor(config.backoff_factor)
                .delay_max(config.max_reconnect_delay)
                .build(),
        )
        .build();

    let (message_tx, message_rx) = mpsc::channel(config.message_capacity.max(1));
    let (error_tx, error_rx) = mpsc::channel(config.error_capacity.max(1));
    let cancel = CancellationToken::new();

    let task = tokio::spawn(deliver(
        client,
        message_tx,
        error_tx,
        cancel.clone(),
        Backoff::new(config),
        label,
    ));

    Ok(FlowSubscription {
        messages: MessageReceiver {
            receiver: message_rx,
        },
        errors: ErrorReceiver { receiver: error_rx },
        handle: SubscriptionHandle {
            cancel,
            task: Some(task),
        },
    })
}

/// Reconnect delays: grows by `factor` after each failure, capped at `max`.
#[derive(Debug, Clone)]
struct Backoff {
    initial: Duration,
    factor: u32,
    max: Duration,
    current: Duration,
}

impl Backoff {
    fn new(config: &StreamConfig) -> Self {
        let initial = config.reconnect_delay.min(config.max_reconnect_delay);
        Self {
            initial,
            factor: config.backoff_factor.max(1),
            max: config.max_reconnect_delay,
            current: initial,
        }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self
            .current
            .checked_mul(self.factor)
            .map_or(self.max, |next| next.min(self.max));
        delay
    }

    fn reset(&mut self) {
        self.current = self.initial;
    }
}

async fn deliver(
    client: impl es::Client,
    messages: mpsc::Sender<Message>,
    errors: mpsc::Sender<StreamError>,
    cancel: CancellationToken,
    mut backoff: Backoff,
    label: String,
) {
    info!(flow = %label, "subscription started");

    'connect: loop {
        let mut stream = client.stream();

        loop {
            let item = tokio::select! {
                biased;
                _ = cancel.cancelled() => break 'connect,
                item = stream.next() => item,
            };

            match item {
                Some(Ok(es::SSE::Connected(_))) => {
                    debug!(flow = %label, "stream connected");
                    backoff.reset();
                }
                Some(Ok(es::SSE::Event(event))) => {
                    backoff.reset();
                    if event.data.trim().is_empty() {
                        continue;
                    }

                    match serde_json::from_str::<Message>(&event.data) {
                        Ok(message) => {
                            debug!(flow = %label, id = ?message.id, event = ?message.event, "stream event");
                            let sent = tokio::select! {
                                biased;
                                _ = cancel.cancelled() => break 'connect,
                                sent = messages.send(message) => sent,
                            };
                            if sent.is_err() {
                                break 'connect;
                            }
                        }
                        Err(source) => {
                            warn!(flow = %label, id = ?event.id, error = %source, "undecodable stream event");
                            report(
                                &errors,
                                StreamError::Decode {
                                    event_id: event.id,
                                    source,
                                },
                            );
                        }
                    }
                }
                Some(Ok(es::SSE::Comment(_))) => {}
                Some(Err(e)) => {
                    if let Some(status) = rejected_status(&e) {
                        warn!(flow = %label, status, "stream credentials rejected");
                        report(&errors, StreamError::Rejected { status });
                        break 'connect;
                    }
                    warn!(flow = %label, error = %e, "stream transport error");
                    report(&errors, StreamError::Transport(e.to_string()));
                    break;
                }
                None => break,
            }
        }

        drop(stream);
        let delay = backoff.next_delay();
        debug!(flow = %label, delay_ms = delay.as_millis() as u64, "reconnecting");
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    info!(flow = %label, "subscription stopped");
}

/// Status of a response that retrying cannot fix.
fn rejected_status(error: &es::Error) -> Option<u16> {
    match error {
        es::Error::UnexpectedResponse(response, _) => {
            let status = response.status();
            matches!(status, 401 | 403).then_some(status)
        }
        _ => None,
    }
}

fn report(errors: &mpsc::Sender<StreamError>, error: StreamError) {
    match errors.try_send(error) {
        Ok(()) | Err(TrySendError::Closed(_)) => {}
        Err(TrySendError::Full(dropped)) => {
            warn!(error = %dropped, "error channel full, dropping error");
        }
    }
}

fn sse_error(e: es::Error) -> RestClientError {
    RestClientError::Sse(format!("{e:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_event_parsing() {
        let data = r#"{"event":"message","content":"message 0","flow":"acme:ops","id":1}"#;
        let message: Message = serde_json::from_str(data).unwrap();
        assert_eq!(message.event.as_deref(), Some("message"));
        assert_eq!(message.id, Some(1));
    }

    #[test]
    fn test_default_backoff() {
        let config = StreamConfig::default();
        assert_eq!(config.reconnect_delay, Duration::from_secs(3));
        assert_eq!(config.max_reconnect_delay, Duration::from_secs(60));
        assert_eq!(config.backoff_factor, 2);
    }

    #[test]
    fn test_backoff_grows_to_cap_and_resets() {
        let mut backoff = Backoff::new(&StreamConfig::default());
        let delays: Vec<u64> = (0..7).map(|_| backoff.next_delay().as_secs()).collect();
        assert_eq!(delays, vec![3, 6, 12, 24, 48, 60, 60]);

        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_secs(3));
    }

    #[test]
    fn test_backoff_initial_above_cap() {
        let mut backoff = Backoff::new(&StreamConfig {
            reconnect_delay: Duration::from_secs(90),
            ..StreamConfig::default()
        });
        assert_eq!(backoff.next_delay(), Duration::from_secs(60));
        assert_eq!(backoff.next_delay(), Duration::from_secs(60));
    }

    #[test]
    fn test_full_error_channel_drops() {
        let (tx, mut rx) = mpsc::channel(1);
        report(&tx, StreamError::Transport("first".into()));
        report(&tx, StreamError::Transport("second".into()));

        assert!(matches!(rx.try_recv(), Ok(StreamError::Transport(e)) if e == "first"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dropping_handle_cancels() {
        let url = Url::parse("http://127.0.0.1:9/flows/acme/ops").unwrap();
        let subscription =
            subscribe(&url, &HeaderMap::new(), &StreamConfig::default(), "acme/ops".into())
                .unwrap();
        let (_messages, _errors, handle) = subscription.split();
        let cancel = handle.cancel.clone();

        drop(handle);
        assert!(cancel.is_cancelled());
    }
}
