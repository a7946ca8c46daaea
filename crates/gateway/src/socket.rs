//! Socket Gateway
//!
//! One `run_session` task per accepted connection. The session registers
//! the user against the router, relays driver location pings into the
//! driver registry, and - when the driver has an active ride - forwards the
//! position to that ride's rider. The active-ride lookup is a ride-store
//! query, so the dependency direction stays transport -> dispatch.

use std::sync::Arc;

use log::{debug, info, warn};
use rideline_core::UserId;
use rideline_dispatch::{DriverRegistry, RideStore};
use tokio::sync::mpsc;

use crate::messages::{ClientMessage, ClientRole, OutboundMessage};
use crate::router::{ConnectionHandle, NotificationRouter};

/// Accepts registered sessions and relays their messages into dispatch
pub struct SocketGateway {
    router: Arc<NotificationRouter>,
    registry: Arc<DriverRegistry>,
    store: Arc<RideStore>,
}

impl SocketGateway {
    pub fn new(
        router: Arc<NotificationRouter>,
        registry: Arc<DriverRegistry>,
        store: Arc<RideStore>,
    ) -> Self {
        Self {
            router,
            registry,
            store,
        }
    }

    /// Drive one connection until its inbound channel closes, then clean up
    /// the registration.
    pub async fn run_session(
        &self,
        connection: ConnectionHandle,
        mut inbound: mpsc::Receiver<ClientMessage>,
    ) {
        let connection_id = connection.id();
        let mut session: Option<(UserId, ClientRole)> = None;

        while let Some(message) = inbound.recv().await {
            match message {
                ClientMessage::Register { user_id, role } => {
                    info!(
                        "session registered: user={user_id}, role={role:?}, connection={connection_id}"
                    );
                    self.router.register(user_id, connection.clone());
                    session = Some((user_id, role));
                }
                ClientMessage::LocationUpdate {
                    latitude,
                    longitude,
                } => {
                    let Some((user_id, ClientRole::Driver)) = session else {
                        warn!(
                            "location update on a non-driver session, connection={connection_id}"
                        );
                        continue;
                    };
                    self.handle_location_update(user_id, latitude, longitude).await;
                }
            }
        }

        self.router.unregister(connection_id);
        debug!("session closed: connection={connection_id}");
    }

    async fn handle_location_update(&self, driver_id: UserId, latitude: f64, longitude: f64) {
        if let Err(e) = self.registry.update_location(driver_id, latitude, longitude) {
            warn!("dropping location update from driver {driver_id}: {e}");
            return;
        }

        // only the rider of an active ride sees the driver's live position
        match self.store.active_ride_for_driver(driver_id).await {
            Ok(Some(ride)) => {
                let frame =
                    OutboundMessage::driver_location(ride.id, driver_id, latitude, longitude);
                self.router.deliver_frame(ride.rider_id, frame);
            }
            Ok(None) => {}
            Err(e) => warn!("active-ride lookup failed for driver {driver_id}: {e}"),
        }
    }
}
