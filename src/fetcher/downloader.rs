use std::sync::Arc;

use reqwest::header::LOCATION;
use tokio::task::JoinHandle;
use url::Url;

use crate::fetcher::{
    Download, FetchError, FetchResult, ResponseMeta, Transport, TransportReply,
};

pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Fetches a single resource, following redirects by hand.
///
/// Holds no mutable state, so clones can run any number of fetches
/// concurrently.
#[derive(Clone)]
pub struct Downloader {
    transport: Arc<dyn Transport + Send + Sync>,
    max_redirects: usize,
}

impl Downloader {
    pub fn new(transport: Arc<dyn Transport + Send + Sync>) -> Self {
        Self::with_max_redirects(transport, DEFAULT_MAX_REDIRECTS)
    }

    pub fn with_max_redirects(
        transport: Arc<dyn Transport + Send + Sync>,
        max_redirects: usize,
    ) -> Self {
        Self {
            transport,
            max_redirects,
        }
    }

    pub fn max_redirects(&self) -> usize {
        self.max_redirects
    }

    /// Fetch `url`, returning the terminal response body and metadata.
    ///
    /// Makes at most `max_redirects + 1` transport calls. A malformed URL
    /// fails before any call is made.
    pub async fn fetch(&self, url: &str) -> FetchResult {
        let mut current = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        let mut redirects = 0;

        loop {
            match self.transport.send(&current).await? {
                TransportReply::Other { url, .. } => {
                    return Err(FetchError::UnexpectedResponseType { url });
                }
                TransportReply::Http {
                    url,
                    status,
                    headers,
                    body,
                } => {
                    if status.is_redirection() {
                        let location = headers
                            .get(LOCATION)
                            .and_then(|v| v.to_str().ok())
                            .ok_or_else(|| FetchError::RedirectWithoutLocation {
                                url: url.clone(),
                                status,
                            })?;

                        redirects += 1;
                        if redirects > self.max_redirects {
                            return Err(FetchError::TooManyRedirects {
                                limit: self.max_redirects,
                            });
                        }

                        let next = current.join(location).map_err(|source| {
                            FetchError::InvalidUrl {
                                url: location.to_string(),
                                source,
                            }
                        })?;
                        tracing::debug!("{} {} -> {}", status.as_u16(), current, next);
                        current = next;
                        continue;
                    }

                    if !status.is_success() {
                        return Err(FetchError::BadStatus { url, status, body });
                    }

                    return Ok(Download {
                        body,
                        response: ResponseMeta {
                            url,
                            status,
                            headers,
                        },
                    });
                }
            }
        }
    }

    /// Run [`fetch`](Self::fetch) on the runtime and hand the result to
    /// `on_complete` exactly once.
    pub fn spawn_fetch<F>(&self, url: &str, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(FetchResult) + Send + 'static,
    {
        let downloader = self.clone();
        let url = url.to_string();

        tokio::spawn(async move {
            let result = downloader.fetch(&url).await;
            on_complete(result);
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use reqwest::header::{HeaderMap, HeaderValue};
    use reqwest::StatusCode;
    use tokio::sync::oneshot;

    use super::*;
    use crate::fetcher::{FetchErrorKind, TransportError};

    /// Canned reply for one transport call.
    pub(crate) enum Canned {
        Status(u16, Option<&'static str>, &'static [u8]),
        Other(&'static [u8]),
        Fail,
    }

    /// Transport that replays canned replies and records every URL it saw.
    #[derive(Default)]
    pub(crate) struct MockTransport {
        replies: Mutex<VecDeque<Canned>>,
        fallback: Option<(u16, Option<&'static str>)>,
        pub(crate) calls: AtomicUsize,
        pub(crate) seen: Mutex<Vec<Url>>,
        gate: Mutex<Option<oneshot::Receiver<()>>>,
    }

    impl MockTransport {
        pub(crate) fn with_replies(replies: Vec<Canned>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                ..Default::default()
            }
        }

        /// Answer every call with the same status and location.
        pub(crate) fn always(status: u16, location: Option<&'static str>) -> Self {
            Self {
                fallback: Some((status, location)),
                ..Default::default()
            }
        }

        /// Block the first call until the returned sender fires.
        pub(crate) fn gated(mut self) -> (Self, oneshot::Sender<()>) {
            let (tx, rx) = oneshot::channel();
            self.gate = Mutex::new(Some(rx));
            (self, tx)
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn http_reply(url: &Url, status: u16, location: Option<&str>, body: &[u8]) -> TransportReply {
        let mut headers = HeaderMap::new();
        if let Some(location) = location {
            headers.insert(LOCATION, HeaderValue::from_str(location).unwrap());
        }
        TransportReply::Http {
            url: url.clone(),
            status: StatusCode::from_u16(status).unwrap(),
            headers,
            body: body.to_vec(),
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, url: &Url) -> Result<TransportReply, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(url.clone());

            let gate = self.gate.lock().unwrap().take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }

            let next = self.replies.lock().unwrap().pop_front();
            match next {
                Some(Canned::Status(status, location, body)) => {
                    Ok(http_reply(url, status, location, body))
                }
                Some(Canned::Other(body)) => Ok(TransportReply::Other {
                    url: url.clone(),
                    body: body.to_vec(),
                }),
                Some(Canned::Fail) => Err(TransportError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                ))),
                None => match self.fallback {
                    Some((status, location)) => Ok(http_reply(url, status, location, b"")),
                    None => panic!("unexpected transport call for {}", url),
                },
            }
        }
    }

    fn downloader(transport: &Arc<MockTransport>) -> Downloader {
        Downloader::new(transport.clone())
    }

    #[tokio::test]
    async fn test_malformed_url_makes_no_call() {
        let transport = Arc::new(MockTransport::default());
        let downloader = downloader(&transport);

        for bad in ["", "not a url", "/relative/path", "http://[::1"] {
            let err = downloader.fetch(bad).await.unwrap_err();
            assert_eq!(err.kind(), FetchErrorKind::InvalidUrl);
        }
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_plain_success() {
        let transport = Arc::new(MockTransport::with_replies(vec![Canned::Status(
            200,
            None,
            b"hello",
        )]));
        let download = downloader(&transport)
            .fetch("https://example.com/manifest.json")
            .await
            .unwrap();

        assert_eq!(download.body, b"hello");
        assert_eq!(download.response.status, StatusCode::OK);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_redirect_chain_returns_terminal_response() {
        let transport = Arc::new(MockTransport::with_replies(vec![
            Canned::Status(301, Some("https://mirror.example.com/a"), b"moved"),
            Canned::Status(302, Some("/b"), b"found"),
            Canned::Status(307, Some("c.json"), b"temporary"),
            Canned::Status(200, None, b"final body"),
        ]));
        let download = downloader(&transport)
            .fetch("https://example.com/start")
            .await
            .unwrap();

        assert_eq!(download.body, b"final body");
        assert_eq!(download.response.status, StatusCode::OK);
        assert_eq!(
            download.response.url.as_str(),
            "https://mirror.example.com/c.json"
        );

        let seen = transport.seen.lock().unwrap();
        let seen: Vec<&str> = seen.iter().map(Url::as_str).collect();
        assert_eq!(
            seen,
            vec![
                "https://example.com/start",
                "https://mirror.example.com/a",
                "https://mirror.example.com/b",
                "https://mirror.example.com/c.json",
            ]
        );
    }

    #[tokio::test]
    async fn test_redirects_up_to_limit_succeed() {
        let mut replies: Vec<Canned> = (0..3)
            .map(|_| Canned::Status(302, Some("/next"), b""))
            .collect();
        replies.push(Canned::Status(200, None, b"ok"));
        let transport = Arc::new(MockTransport::with_replies(replies));

        let download = Downloader::with_max_redirects(transport.clone(), 3)
            .fetch("https://example.com/")
            .await
            .unwrap();

        assert_eq!(download.body, b"ok");
        assert_eq!(transport.call_count(), 4);
    }

    #[tokio::test]
    async fn test_redirect_loop_is_bounded() {
        let transport = Arc::new(MockTransport::always(302, Some("/loop")));
        let err = downloader(&transport)
            .fetch("https://example.com/loop")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FetchError::TooManyRedirects {
                limit: DEFAULT_MAX_REDIRECTS
            }
        ));
        assert_eq!(transport.call_count(), DEFAULT_MAX_REDIRECTS + 1);
    }

    #[tokio::test]
    async fn test_redirect_without_location() {
        let transport = Arc::new(MockTransport::with_replies(vec![Canned::Status(
            302, None, b"",
        )]));
        let err = downloader(&transport)
            .fetch("https://example.com/")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FetchErrorKind::RedirectWithoutLocation);
    }

    #[tokio::test]
    async fn test_bad_status_carries_code_and_body() {
        for code in [404u16, 500] {
            let transport = Arc::new(MockTransport::with_replies(vec![Canned::Status(
                code,
                None,
                b"nope",
            )]));
            let err = downloader(&transport)
                .fetch("https://example.com/missing")
                .await
                .unwrap_err();

            match err {
                FetchError::BadStatus { status, body, .. } => {
                    assert_eq!(status.as_u16(), code);
                    assert_eq!(body, b"nope");
                }
                other => panic!("expected BadStatus, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_non_http_reply_is_unexpected() {
        let transport = Arc::new(MockTransport::with_replies(vec![Canned::Other(b"raw")]));
        let err = downloader(&transport)
            .fetch("https://example.com/")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FetchErrorKind::UnexpectedResponseType);
    }

    #[tokio::test]
    async fn test_transport_error_passes_through() {
        let transport = Arc::new(MockTransport::with_replies(vec![Canned::Fail]));
        let err = downloader(&transport)
            .fetch("https://example.com/")
            .await
            .unwrap_err();

        match err {
            FetchError::Transport(TransportError::Io(e)) => {
                assert_eq!(e.kind(), std::io::ErrorKind::ConnectionRefused);
            }
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_spawn_fetch_calls_back_once() {
        let transport = Arc::new(MockTransport::with_replies(vec![Canned::Status(
            200,
            None,
            b"payload",
        )]));
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = oneshot::channel();

        let counter = calls.clone();
        let handle = downloader(&transport).spawn_fetch("https://example.com/", move |result| {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(result.map(|d| d.body));
        });
        handle.await.unwrap();

        assert_eq!(rx.await.unwrap().unwrap(), b"payload");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
