//! Fakes shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use comet::prelude::*;
use comet_services::ServiceError;
use comet_transport::{ConnectionId, TransportError};
use tokio::sync::mpsc;

// =========================================================================
// In-memory transport
// =========================================================================

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// What a test can observe about a fake connection after handing it over.
#[derive(Debug, Default)]
pub struct Observed {
    inbound: Mutex<VecDeque<Vec<u8>>>,
    pub sent: Mutex<Vec<Vec<u8>>>,
    pub recv_calls: AtomicUsize,
    pub closed: AtomicBool,
    send_limit: Mutex<Option<usize>>,
}

impl Observed {
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn recv_calls(&self) -> usize {
        self.recv_calls.load(Ordering::SeqCst)
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Lets `n` more frames through, then fails every send as if the client
    /// had gone away.
    pub fn fail_sends_after(&self, n: usize) {
        *self.send_limit.lock().unwrap() = Some(self.sent_count() + n);
    }
}

pub struct FakeConnection {
    id: ConnectionId,
    peer: SocketAddr,
    observed: Arc<Observed>,
}

impl FakeConnection {
    /// A connection from `peer` whose client will send `frames` and then
    /// hang up.
    pub fn new(peer: &str, frames: Vec<Vec<u8>>) -> (Self, Arc<Observed>) {
        let observed = Arc::new(Observed {
            inbound: Mutex::new(frames.into()),
            ..Observed::default()
        });
        let conn = Self {
            id: ConnectionId::new(NEXT_ID.fetch_add(1, Ordering::SeqCst)),
            peer: peer.parse().unwrap(),
            observed: Arc::clone(&observed),
        };
        (conn, observed)
    }
}

impl Connection for FakeConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let limit = *self.observed.send_limit.lock().unwrap();
        if limit.is_some_and(|n| self.observed.sent_count() >= n) {
            let err = std::io::Error::from(std::io::ErrorKind::BrokenPipe);
            return Err(TransportError::SendFailed(err));
        }
        self.observed.sent.lock().unwrap().push(data.to_vec());
        Ok(())
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        self.observed.recv_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.observed.inbound.lock().unwrap().pop_front())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.observed.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

/// Yields whatever the test pushes into it; pends when there is nothing.
pub struct FakeTransport {
    incoming: mpsc::UnboundedReceiver<Result<FakeConnection, TransportError>>,
    shut_down: Arc<AtomicBool>,
}

/// The test's end of a [`FakeTransport`].
#[derive(Clone)]
pub struct Dialer {
    tx: mpsc::UnboundedSender<Result<FakeConnection, TransportError>>,
    shut_down: Arc<AtomicBool>,
}

impl Dialer {
    /// Queues a connection from `peer` and returns what the test can observe of it.
    pub fn connect(&self, peer: &str, frames: Vec<Vec<u8>>) -> Arc<Observed> {
        let (conn, observed) = FakeConnection::new(peer, frames);
        self.tx.send(Ok(conn)).unwrap();
        observed
    }

    /// Makes the next accept fail.
    pub fn fail_accept(&self) {
        let err = std::io::Error::from(std::io::ErrorKind::ConnectionAborted);
        self.tx.send(Err(TransportError::AcceptFailed(err))).unwrap();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

pub fn fake_transport() -> (FakeTransport, Dialer) {
    let (tx, incoming) = mpsc::unbounded_channel();
    let shut_down = Arc::new(AtomicBool::new(false));
    let transport = FakeTransport {
        incoming,
        shut_down: Arc::clone(&shut_down),
    };
    (transport, Dialer { tx, shut_down })
}

impl Transport for FakeTransport {
    type Connection = FakeConnection;

    async fn accept(&mut self) -> Result<FakeConnection, TransportError> {
        match self.incoming.recv().await {
            Some(next) => next,
            None => std::future::pending().await,
        }
    }

    async fn shutdown(self) -> Result<(), TransportError> {
        self.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// =========================================================================
// Fake shared services
// =========================================================================

/// Hands out `at-N`, bumping N on every refresh.
#[derive(Debug)]
pub struct FakeTokens {
    user_id: String,
    generation: AtomicUsize,
    fail: bool,
}

impl FakeTokens {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.into(),
            generation: AtomicUsize::new(0),
            fail: false,
        }
    }

    /// Every call fails as if the auth server rejected the refresh token.
    pub fn failing(user_id: &str) -> Self {
        Self {
            fail: true,
            ..Self::new(user_id)
        }
    }

    fn check(&self) -> Result<(), ServiceError> {
        if self.fail {
            return Err(ServiceError::TokenRejected {
                status: 400,
                body: "invalid_grant".into(),
            });
        }
        Ok(())
    }
}

impl CredentialRefresh for FakeTokens {
    fn user_id(&self) -> &str {
        &self.user_id
    }

    async fn access_token(&self) -> Result<String, ServiceError> {
        self.check()?;
        Ok(format!("at-{}", self.generation.load(Ordering::SeqCst)))
    }

    async fn refresh(&self) -> Result<String, ServiceError> {
        self.check()?;
        let n = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("at-{n}"))
    }
}

/// Records every notice it is given.
#[derive(Debug, Default, Clone)]
pub struct FakeNotifier {
    pub pushed: Arc<Mutex<Vec<Notice>>>,
}

impl NotificationSink for FakeNotifier {
    async fn push(&self, notice: Notice) -> Result<(), ServiceError> {
        self.pushed.lock().unwrap().push(notice);
        Ok(())
    }
}

// =========================================================================
// Helpers
// =========================================================================

/// Polls `cond` until it holds, failing the test after two seconds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
