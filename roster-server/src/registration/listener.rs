//! Event journal listener
//!
//! Subscribes to the manager's broadcast and writes every committed
//! registration event to the log, giving an audit trail of state changes.

use shared::registration::RegistrationEvent;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

pub struct EventJournal {
    source: broadcast::Receiver<RegistrationEvent>,
    shutdown: CancellationToken,
}

impl EventJournal {
    pub fn new(source: broadcast::Receiver<RegistrationEvent>, shutdown: CancellationToken) -> Self {
        Self { source, shutdown }
    }

    /// Runs until shutdown or until the manager is dropped; returns how
    /// many events were journaled
    pub async fn run(mut self) -> u64 {
        tracing::info!("Event journal started");
        let mut seen = 0u64;

        loop {
            tokio::select! {
                received = self.source.recv() => match received {
                    Ok(event) => {
                        seen += 1;
                        tracing::info!(
                            target: "roster::events",
                            event_id = %event.event_id,
                            resource_id = %event.resource_id,
                            command_id = event.command_id.as_deref().unwrap_or("-"),
                            payload = ?event.payload,
                            "Registration event"
                        );
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Event journal lagged, events skipped");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Event source closed, journal stopping");
                        return seen;
                    }
                },
                _ = self.shutdown.cancelled() => {
                    tracing::info!(journaled = seen, "Event journal received shutdown signal");
                    return seen;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::registration::EventPayload;

    #[tokio::test]
    async fn journals_until_source_closes() {
        let (tx, rx) = broadcast::channel(16);
        let journal = EventJournal::new(rx, CancellationToken::new());

        for i in 0..3 {
            tx.send(RegistrationEvent::new(
                "spin",
                i,
                None,
                EventPayload::EntryConfirmed {
                    entry_id: format!("e{i}"),
                    party_id: format!("p{i}"),
                },
            ))
            .unwrap();
        }
        drop(tx);

        assert_eq!(journal.run().await, 3);
    }

    #[tokio::test]
    async fn stops_on_shutdown() {
        let (_tx, rx) = broadcast::channel::<RegistrationEvent>(4);
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(EventJournal::new(rx, token).run().await, 0);
    }
}
