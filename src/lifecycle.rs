use std::collections::BTreeMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::Config;
use crate::dispatcher::{fan_in, Dispatcher, IncomingPacket, StopReason};
use crate::error::RouterError;
use crate::identity::own_identities;
use crate::platform::ChatPlatform;
use crate::registry::Registry;
use crate::server::{self, WebhookRoute};

pub const STARTUP_NOTICE: &str = "bot is up in maintenance mode";

/// A started router: webhooks registered, listener accepting deliveries,
/// admin notified.
pub struct Service {
    registry: Arc<Registry>,
    packets: mpsc::Receiver<IncomingPacket>,
    server: JoinHandle<anyhow::Result<()>>,
    local_addr: SocketAddr,
}

/// Runs every startup step in order; the first failure is returned and
/// nothing after it is attempted.
pub async fn start(
    config: &Config,
    clients: BTreeMap<String, Arc<dyn ChatPlatform>>,
) -> Result<Service, RouterError> {
    config.validate()?;
    let own_ids = own_identities(config)?;

    let mut registry = Registry::new(config, clients, own_ids)?;
    registry.register_webhooks().await?;
    registry.resolve_identities().await?;
    let registry = Arc::new(registry);

    let mut routes = Vec::new();
    let mut streams = Vec::new();
    for (name, endpoint) in &config.endpoints {
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        routes.push(WebhookRoute {
            endpoint: name.clone(),
            path: endpoint.listen_path.clone(),
            tx,
        });
        streams.push((name.clone(), rx));
    }
    let app = server::router(routes)?;
    let listener = server::bind(&config.listen_address)
        .await
        .map_err(RouterError::Listener)?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| RouterError::Listener(e.into()))?;
    let server = tokio::spawn(server::serve(listener, app));

    if let Err(e) = registry
        .notify_admin(&config.admin_endpoint, config.admin_id, STARTUP_NOTICE)
        .await
    {
        server.abort();
        return Err(e);
    }

    Ok(Service {
        registry,
        packets: fan_in(streams, config.queue_capacity),
        server,
        local_addr,
    })
}

impl Service {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Dispatches until `shutdown` resolves or the listener dies, then
    /// removes every webhook.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<StopReason, RouterError>
    where
        F: Future<Output = ()>,
    {
        let dispatcher = Dispatcher::new(self.registry.clone());
        let outcome = tokio::select! {
            result = dispatcher.run(&mut self.packets, shutdown) => result,
            joined = &mut self.server => Err(RouterError::Listener(match joined {
                Ok(Ok(())) => anyhow!("webhook server stopped"),
                Ok(Err(e)) => e,
                Err(e) => e.into(),
            })),
        };
        self.server.abort();

        self.registry.deregister_webhooks().await?;
        outcome
    }
}

pub async fn run<F>(
    config: &Config,
    clients: BTreeMap<String, Arc<dyn ChatPlatform>>,
    shutdown: F,
) -> Result<(), RouterError>
where
    F: Future<Output = ()>,
{
    let service = start(config, clients).await?;
    info!("serving webhooks on {}", service.local_addr());
    let reason = service.run_until(shutdown).await?;
    info!("stopped: {:?}", reason);
    Ok(())
}

/// Resolves on SIGINT, SIGTERM or SIGABRT. Handlers are installed right
/// away so a signal arriving during startup is not lost.
#[cfg(unix)]
pub fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut abort = signal(SignalKind::from_raw(libc::SIGABRT))?;
    Ok(async move {
        let name = tokio::select! {
            _ = interrupt.recv() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
            _ = abort.recv() => "SIGABRT",
        };
        info!("got signal {}", name);
    })
}

#[cfg(not(unix))]
pub fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("got signal ctrl-c"),
            Err(e) => {
                tracing::error!("cannot listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
        }
    })
}
