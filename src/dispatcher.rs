use std::future::Future;
use std::sync::Arc;

use teloxide::types::Update;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::RouterError;
use crate::normalize::normalize;
use crate::platform::update::callback_query_id;
use crate::registry::{tolerate, Registry};

/// An update together with the endpoint it was delivered to.
#[derive(Debug, Clone)]
pub struct IncomingPacket {
    pub endpoint: String,
    pub update: Update,
}

/// Why the dispatch loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Signal,
    StreamClosed,
}

/// Merges the per-endpoint streams into one queue. Each stream gets its own
/// forwarding task, so order is kept within an endpoint but not across them.
pub fn fan_in(
    streams: Vec<(String, mpsc::Receiver<Update>)>,
    capacity: usize,
) -> mpsc::Receiver<IncomingPacket> {
    let (tx, rx) = mpsc::channel(capacity);
    for (endpoint, mut stream) in streams {
        let tx = tx.clone();
        tokio::spawn(async move {
            while let Some(update) = stream.recv().await {
                let packet = IncomingPacket {
                    endpoint: endpoint.clone(),
                    update,
                };
                if tx.send(packet).await.is_err() {
                    break;
                }
            }
            debug!("stream for endpoint {} closed", endpoint);
        });
    }
    rx
}

pub struct Dispatcher {
    registry: Arc<Registry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Answers one packet. Only fatal errors are returned; failed replies
    /// and callback answers are logged.
    pub async fn process_packet(&self, packet: &IncomingPacket) -> Result<(), RouterError> {
        debug!("got Telegram update");
        let name = packet.endpoint.as_str();

        if let Some(query_id) = callback_query_id(&packet.update) {
            tolerate(self.registry.acknowledge_callback(name, query_id).await)?;
        }

        let mention = self.registry.mention(name)?;
        let command = normalize(&packet.update, mention, self.registry.own_ids());
        if command.is_noop() {
            return Ok(());
        }

        let command_name = command.command.to_lowercase();
        info!(
            "chat: {}, command: {} {}",
            command.chat_id, command_name, command.arguments
        );
        let response = self.registry.maintenance_response(name)?;
        tolerate(self.registry.send(name, command.chat_id, response).await)
    }

    /// Processes packets one at a time until `shutdown` resolves or every
    /// stream has closed.
    pub async fn run<F>(
        &self,
        packets: &mut mpsc::Receiver<IncomingPacket>,
        shutdown: F,
    ) -> Result<StopReason, RouterError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                packet = packets.recv() => match packet {
                    Some(packet) => self.process_packet(&packet).await?,
                    None => {
                        warn!("all webhook streams closed");
                        return Ok(StopReason::StreamClosed);
                    }
                },
                _ = &mut shutdown => return Ok(StopReason::Signal),
            }
        }
    }
}
