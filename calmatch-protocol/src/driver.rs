//! Polling driver binding a session to a transport.
//!
//! One tokio task owns the poll loop for a session, so message handling is
//! serialized by construction: a batch is fully applied before the next
//! poll's results are looked at. The driver never re-sends on its own; a
//! failed send lands in the unsent queue for the caller to retry.

use crate::error::Result;
use crate::messages::{Message, Role};
use crate::session::Session;
use crate::transport::{MessageTransport, SessionId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Drives one session against the relay on a fixed poll interval.
pub struct SessionDriver {
    session: Arc<Mutex<Session>>,
    transport: Arc<dyn MessageTransport>,
    id: SessionId,
    stop: watch::Sender<bool>,
    unsent: Arc<std::sync::Mutex<Vec<Message>>>,
    handle: JoinHandle<()>,
}

impl SessionDriver {
    /// Start the session (sending JOIN for a joiner) and spawn the poll loop.
    pub fn spawn(
        session: Session,
        transport: Arc<dyn MessageTransport>,
        poll_interval: Duration,
    ) -> Self {
        let id = session.id().clone();
        let role = session.role();
        let session = Arc::new(Mutex::new(session));
        let unsent = Arc::new(std::sync::Mutex::new(Vec::new()));
        let (stop, stop_rx) = watch::channel(false);

        let handle = tokio::spawn(poll_loop(
            Arc::clone(&session),
            Arc::clone(&transport),
            id.clone(),
            role,
            poll_interval,
            stop_rx,
            Arc::clone(&unsent),
        ));

        Self {
            session,
            transport,
            id,
            stop,
            unsent,
            handle,
        }
    }

    /// Shared handle to the session for read access.
    pub fn session(&self) -> Arc<Mutex<Session>> {
        Arc::clone(&self.session)
    }

    /// Encrypt and send a note for a matched event.
    ///
    /// # Errors
    /// `NoSecureChannel` before results, or the transport error if the send
    /// failed; a failed send is also queued in [`SessionDriver::take_unsent`].
    pub async fn send_note(&self, uid: &str, text: &str) -> Result<()> {
        let message = self.session.lock().await.compose_note(uid, text)?;
        self.deliver(message).await
    }

    /// Messages whose send failed, handed to the caller for explicit retry.
    pub fn take_unsent(&self) -> Vec<Message> {
        std::mem::take(&mut *self.unsent.lock().expect("unsent lock poisoned"))
    }

    /// Retry one previously failed message.
    pub async fn resend(&self, message: Message) -> Result<()> {
        self.deliver(message).await
    }

    /// Signal the poll loop to stop. Idempotent: stopping an already stopped
    /// driver is a no-op.
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }

    /// Stop and wait for the loop to finish. Dropping the returned driver and
    /// the session handle discards all session state at once.
    pub async fn shutdown(self) {
        self.stop();
        let _ = self.handle.await;
    }

    async fn deliver(&self, message: Message) -> Result<()> {
        match self.transport.send(&self.id, message.clone()).await {
            Ok(()) => Ok(()),
            Err(error) => {
                warn!(session = %self.id, %error, "send failed, queued for retry");
                self.unsent
                    .lock()
                    .expect("unsent lock poisoned")
                    .push(message);
                Err(error)
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn poll_loop(
    session: Arc<Mutex<Session>>,
    transport: Arc<dyn MessageTransport>,
    id: SessionId,
    role: Role,
    poll_interval: Duration,
    mut stop_rx: watch::Receiver<bool>,
    unsent: Arc<std::sync::Mutex<Vec<Message>>>,
) {
    // Initial transition: joiner announces itself, initiator just waits.
    let opening = session.lock().await.start();
    send_all(&*transport, &id, opening, &unsent).await;

    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = stop_rx.changed() => {
                info!(session = %id, "poll loop stopped");
                return;
            }
            _ = ticker.tick() => {
                let batch = match transport.poll(&id, role).await {
                    Ok(batch) => batch,
                    Err(error) => {
                        // Transient relay trouble: skip this cycle, retry on
                        // the next interval.
                        warn!(session = %id, %error, "poll failed, skipping cycle");
                        continue;
                    }
                };
                if batch.is_empty() {
                    continue;
                }

                let outbound = {
                    let mut session = session.lock().await;
                    match session.handle_batch(&batch) {
                        Ok(outbound) => outbound,
                        Err(error) => {
                            // Undecodable handshake data: no safe partial
                            // result exists, abort this session.
                            error!(session = %id, %error, "handshake failed, aborting session");
                            return;
                        }
                    }
                };
                send_all(&*transport, &id, outbound, &unsent).await;
            }
        }
    }
}

async fn send_all(
    transport: &dyn MessageTransport,
    id: &SessionId,
    messages: Vec<Message>,
    unsent: &std::sync::Mutex<Vec<Message>>,
) {
    for message in messages {
        if let Err(error) = transport.send(id, message.clone()).await {
            warn!(session = %id, %error, "send failed, queued for retry");
            unsent.lock().expect("unsent lock poisoned").push(message);
        }
    }
}
