//! Bootstrap - service wiring
//!
//! Builds every component of the dispatch service against one shared clock
//! and hands back a [`DispatchApp`] that owns them. Tests build the same
//! graph with a fixed clock; production uses the system clock.

use std::sync::Arc;
use std::time::Duration;

use log::info;
use rideline_clock::SystemClock;
use rideline_dispatch::{
    DispatchConfig, DispatchEngine, DriverRegistry, InMemoryRideRepository, RideStore,
    spawn_sweeper,
};
use rideline_gateway::{
    ClientMessage, ConnectionHandle, NotificationRouter, OutboundMessage, SocketGateway,
};
use rideline_geo::FareSchedule;
use rideline_ports::Clock;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Everything the service needs to start
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub dispatch: DispatchConfig,
    pub fares: FareSchedule,
    /// Outbound frame queue per connection; overflow drops the frame
    pub connection_queue: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dispatch: DispatchConfig::default(),
            fares: FareSchedule::default(),
            connection_queue: 64,
        }
    }
}

/// One open client session: its inbound sender, its outbound receiver and
/// the task driving it. Dropping the sender ends the session.
pub struct Session {
    pub tx: mpsc::Sender<ClientMessage>,
    pub rx: mpsc::Receiver<OutboundMessage>,
    pub task: JoinHandle<()>,
}

/// The wired service: one engine, one gateway, one connection table
pub struct DispatchApp {
    pub engine: Arc<DispatchEngine>,
    pub gateway: Arc<SocketGateway>,
    pub router: Arc<NotificationRouter>,
    pub registry: Arc<DriverRegistry>,
    pub store: Arc<RideStore>,
    config: AppConfig,
}

impl DispatchApp {
    /// Production wiring: system clock, in-memory ride repository
    pub fn build(config: AppConfig) -> Self {
        Self::build_with(config, Arc::new(SystemClock::new()))
    }

    /// Same graph with a caller-supplied clock
    pub fn build_with(config: AppConfig, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(RideStore::new(
            Arc::new(InMemoryRideRepository::new()),
            clock.clone(),
        ));
        let registry = Arc::new(DriverRegistry::new(clock.clone()));
        let router = Arc::new(NotificationRouter::new());
        let engine = Arc::new(DispatchEngine::new(
            store.clone(),
            registry.clone(),
            router.clone(),
            clock,
            config.fares.clone(),
            config.dispatch.clone(),
        ));
        let gateway = Arc::new(SocketGateway::new(
            router.clone(),
            registry.clone(),
            store.clone(),
        ));

        info!(
            "dispatch service wired: radius={} km, accept_timeout={:?} s",
            config.dispatch.search_radius_km, config.dispatch.accept_timeout_secs
        );

        Self {
            engine,
            gateway,
            router,
            registry,
            store,
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Spawn the periodic expiry + re-dispatch task; abort the handle to
    /// stop it
    pub fn start_sweeper(&self) -> JoinHandle<()> {
        let period = Duration::from_secs(self.config.dispatch.sweep_interval_secs);
        spawn_sweeper(self.engine.clone(), period)
    }

    /// Open one channel-backed client session and spawn its task
    pub fn open_session(&self) -> Session {
        let (in_tx, in_rx) = mpsc::channel(self.config.connection_queue);
        let (out_tx, out_rx) = mpsc::channel(self.config.connection_queue);
        let connection = ConnectionHandle::new(out_tx);
        let gateway = self.gateway.clone();
        let task = tokio::spawn(async move { gateway.run_session(connection, in_rx).await });
        Session {
            tx: in_tx,
            rx: out_rx,
            task,
        }
    }
}
