//! In-process messaging network for local runs and tests.
//!
//! Pairing is simulated: the client issues a configurable number of pairing
//! codes and then either links (persisting a fresh identity) or times out.
//! Submitted messages are logged and kept in memory.

use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use futures::{
    StreamExt,
    channel::mpsc::{self, UnboundedSender},
    stream::BoxStream,
};
use kirimkan_core::{
    DEFAULT_USER_SERVER, Jid, PairingEvent,
    traits::{
        DeviceIdentity, IdentityStore, MessageReceipt, MessagingClient, MessagingNetwork,
        NetworkError,
    },
};
use uuid::Uuid;

/// First code stays valid longer than the ones that follow it.
const FIRST_CODE_TIMEOUT: Duration = Duration::from_secs(60);
const NEXT_CODE_TIMEOUT: Duration = Duration::from_secs(20);

/// How a simulated pairing attempt plays out.
#[derive(Debug, Clone, Copy)]
pub struct PairingScript {
    /// Codes issued before the attempt resolves.
    pub codes: usize,
    /// Whether the last code gets "scanned".
    pub succeeds: bool,
    /// Delay between codes.
    pub interval: Duration,
}

impl Default for PairingScript {
    fn default() -> Self {
        Self {
            codes: 1,
            succeeds: true,
            interval: Duration::from_secs(2),
        }
    }
}

/// In-process stand-in for the messaging network.
#[derive(Debug, Default, Clone)]
pub struct LoopbackNetwork {
    script: PairingScript,
}

impl LoopbackNetwork {
    /// Network whose pairing follows `script`.
    #[must_use]
    pub const fn with_script(script: PairingScript) -> Self {
        Self { script }
    }
}

impl MessagingNetwork for LoopbackNetwork {
    fn new_client(
        &self,
        device: Option<DeviceIdentity>,
        identity: Arc<dyn IdentityStore>,
    ) -> Arc<dyn MessagingClient> {
        Arc::new(LoopbackClient::new(device, identity, self.script))
    }
}

/// A message accepted by a [`LoopbackClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: Jid,
    pub body: String,
}

/// Client half of [`LoopbackNetwork`].
pub struct LoopbackClient {
    device: Arc<Mutex<Option<DeviceIdentity>>>,
    identity: Arc<dyn IdentityStore>,
    script: PairingScript,
    connected: Arc<AtomicBool>,
    pairing_tx: Mutex<Option<UnboundedSender<PairingEvent>>>,
    sent: Mutex<Vec<SentMessage>>,
}

impl LoopbackClient {
    /// Create a client for `device`.
    #[must_use]
    pub fn new(
        device: Option<DeviceIdentity>,
        identity: Arc<dyn IdentityStore>,
        script: PairingScript,
    ) -> Self {
        Self {
            device: Arc::new(Mutex::new(device)),
            identity,
            script,
            connected: Arc::new(AtomicBool::new(false)),
            pairing_tx: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Messages accepted so far.
    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn spawn_pairing(&self, tx: UnboundedSender<PairingEvent>) {
        let script = self.script;
        let device = Arc::clone(&self.device);
        let identity = Arc::clone(&self.identity);
        let connected = Arc::clone(&self.connected);

        tokio::spawn(async move {
            for i in 0..script.codes {
                let timeout = if i == 0 {
                    FIRST_CODE_TIMEOUT
                } else {
                    NEXT_CODE_TIMEOUT
                };
                let code = format!("2@{},{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
                if tx.unbounded_send(PairingEvent::Code { code, timeout }).is_err() {
                    return;
                }
                tokio::time::sleep(script.interval).await;
            }

            if !script.succeeds {
                connected.store(false, Ordering::SeqCst);
                let _ = tx.unbounded_send(PairingEvent::Timeout);
                return;
            }

            let paired = DeviceIdentity {
                jid: Jid::new(format!("loopback.{}:1", Uuid::new_v4().simple()), DEFAULT_USER_SERVER),
                credentials: Uuid::new_v4().as_bytes().to_vec(),
            };
            let event = match identity.save_device(&paired).await {
                Ok(()) => {
                    *device.lock().unwrap_or_else(PoisonError::into_inner) = Some(paired);
                    PairingEvent::Success
                }
                Err(e) => PairingEvent::Error(e.to_string()),
            };
            let _ = tx.unbounded_send(event);
        });
    }
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[async_trait]
impl MessagingClient for LoopbackClient {
    fn device(&self) -> Option<DeviceIdentity> {
        self.device
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn pairing_events(&self) -> Result<BoxStream<'static, PairingEvent>, NetworkError> {
        if self.device().is_some() {
            return Err(NetworkError::PairingChannel(
                "identity store already holds a device".to_string(),
            ));
        }
        if self.is_connected() {
            return Err(NetworkError::PairingChannel(
                "pairing must be requested before connecting".to_string(),
            ));
        }

        let (tx, rx) = mpsc::unbounded();
        *self
            .pairing_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(tx);
        Ok(rx.boxed())
    }

    async fn connect(&self) -> Result<(), NetworkError> {
        if self.connected.swap(true, Ordering::SeqCst) {
            return Err(NetworkError::AlreadyConnected);
        }

        let pending = self
            .pairing_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tx) = pending {
            self.spawn_pairing(tx);
        }
        Ok(())
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    async fn send_text(&self, to: &Jid, body: &str) -> Result<MessageReceipt, NetworkError> {
        if !self.is_connected() || self.device().is_none() {
            return Err(NetworkError::NotConnected);
        }
        if to.user.is_empty() || !to.user.chars().all(|c| c.is_ascii_digit()) {
            return Err(NetworkError::Send(format!("{to} is not a valid user address")));
        }

        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentMessage {
                to: to.clone(),
                body: body.to_string(),
            });
        tracing::debug!(%to, bytes = body.len(), "Loopback accepted message");

        Ok(MessageReceipt {
            id: Uuid::new_v4().simple().to_string().to_uppercase(),
            timestamp: now(),
        })
    }
}
