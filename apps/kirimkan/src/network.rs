//! Messaging network selection.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::bail;
use kirimkan_core::traits::MessagingNetwork;
use kirimkan_session::LoopbackNetwork;

/// The network to connect to, and where its device identity lives.
pub struct Backend {
    pub network: Arc<dyn MessagingNetwork>,
    pub identity_file: PathBuf,
}

/// Pick the messaging network.
///
/// The loopback network only runs when asked for. Its identities are kept
/// next to `session_file`, never in it.
///
/// # Errors
/// Returns error when no network is selected.
pub fn select(loopback: bool, session_file: &Path) -> anyhow::Result<Backend> {
    if !loopback {
        bail!(
            "no messaging network backend is built in; pass --loopback to run against the \
             in-process loopback network (messages are accepted but not delivered)"
        );
    }

    tracing::warn!("Using the loopback network: messages are accepted but not delivered");
    Ok(Backend {
        network: Arc::new(LoopbackNetwork::default()),
        identity_file: loopback_identity_file(session_file),
    })
}

/// `session.lock` becomes `session.loopback.lock`.
fn loopback_identity_file(session_file: &Path) -> PathBuf {
    session_file.with_extension("loopback.lock")
}
