//! Session manager: pairs or reconnects, then publishes the live session.

use std::sync::{Arc, PoisonError, RwLock};

use futures::{StreamExt, stream::BoxStream};
use kirimkan_core::{
    PairingEvent,
    traits::{
        IdentityError, IdentityStore, MessagingClient, MessagingNetwork, NetworkError,
        SessionSource,
    },
};
use tokio::sync::{Mutex, watch};

use crate::PairingPresenter;

/// Session manager error. Every variant is fatal to startup.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to initialise identity store: {0}")]
    IdentityInit(#[source] IdentityError),
    #[error("Failed to load device identity: {0}")]
    IdentityLoad(#[source] IdentityError),
    #[error("Failed to open pairing channel: {0}")]
    PairingChannel(#[source] NetworkError),
    #[error("Failed to connect: {0}")]
    Connect(#[source] NetworkError),
    #[error("Pairing failed: {0}")]
    PairingFailed(PairingEvent),
    #[error("Pairing channel closed before pairing completed")]
    PairingAborted,
    #[error("Session already established")]
    AlreadyEstablished,
}

/// Lifecycle state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing attempted yet.
    Unpaired,
    /// Waiting for a pairing code to be scanned.
    Pairing,
    /// Session published and usable.
    Connected,
    /// Establishing failed, or the session was shut down.
    Disconnected,
}

/// Owns the single long-lived session to the messaging network.
pub struct SessionManager {
    identity: Arc<dyn IdentityStore>,
    network: Arc<dyn MessagingNetwork>,
    presenter: Arc<dyn PairingPresenter>,
    session: RwLock<Option<Arc<dyn MessagingClient>>>,
    state: watch::Sender<SessionState>,
    /// Held for the whole of `establish` so at most one client is ever opened.
    establishing: Mutex<()>,
}

impl SessionManager {
    /// Create a session manager.
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityStore>,
        network: Arc<dyn MessagingNetwork>,
        presenter: Arc<dyn PairingPresenter>,
    ) -> Self {
        Self {
            identity,
            network,
            presenter,
            session: RwLock::new(None),
            state: watch::Sender::new(SessionState::Unpaired),
            establishing: Mutex::new(()),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Watch lifecycle state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Reconnect with the stored identity, or pair a new device.
    ///
    /// Blocks until pairing resolves; there is no built-in timeout.
    ///
    /// # Errors
    /// Returns error if any step fails, or if a session is already
    /// published. Nothing is retried. Concurrent callers are serialised.
    pub async fn establish(&self) -> Result<Arc<dyn MessagingClient>, SessionError> {
        let _establishing = self.establishing.lock().await;
        if self.current().is_some() {
            return Err(SessionError::AlreadyEstablished);
        }

        let result = self.connect_or_pair().await;
        match &result {
            Ok(client) => {
                *self
                    .session
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(client));
                self.state.send_replace(SessionState::Connected);
                tracing::info!("Connected to WhatsApp");
            }
            Err(e) => {
                self.state.send_replace(SessionState::Disconnected);
                tracing::error!("Failed to connect to WhatsApp: {e}");
            }
        }
        result
    }

    async fn connect_or_pair(&self) -> Result<Arc<dyn MessagingClient>, SessionError> {
        self.identity
            .init()
            .await
            .map_err(SessionError::IdentityInit)?;
        let device = self
            .identity
            .load_device()
            .await
            .map_err(SessionError::IdentityLoad)?;

        let paired = device.is_some();
        let client = self
            .network
            .new_client(device, Arc::clone(&self.identity));

        if paired {
            tracing::info!("Reconnecting with stored device identity");
            client.connect().await.map_err(SessionError::Connect)?;
            return Ok(client);
        }

        self.state.send_replace(SessionState::Pairing);
        let events = client
            .pairing_events()
            .await
            .map_err(SessionError::PairingChannel)?;
        client.connect().await.map_err(SessionError::Connect)?;

        if let Err(e) = await_pairing(events, self.presenter.as_ref()).await {
            client.disconnect().await;
            return Err(e);
        }
        Ok(client)
    }

    /// Unpublish and disconnect the session. Best-effort.
    pub async fn shutdown(&self) {
        let client = self
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(client) = client {
            client.disconnect().await;
            tracing::info!("Disconnected from WhatsApp");
        }
        self.state.send_replace(SessionState::Disconnected);
    }
}

impl SessionSource for SessionManager {
    fn current(&self) -> Option<Arc<dyn MessagingClient>> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Drive pairing events until a terminal one arrives.
async fn await_pairing(
    mut events: BoxStream<'static, PairingEvent>,
    presenter: &dyn PairingPresenter,
) -> Result<(), SessionError> {
    while let Some(event) = events.next().await {
        match event {
            PairingEvent::Code { code, timeout } => presenter.present(&code, timeout),
            PairingEvent::Success => {
                tracing::info!("Pairing event: {}", PairingEvent::Success);
                return Ok(());
            }
            other => {
                tracing::warn!("Pairing event: {other}");
                return Err(SessionError::PairingFailed(other));
            }
        }
    }
    Err(SessionError::PairingAborted)
}
