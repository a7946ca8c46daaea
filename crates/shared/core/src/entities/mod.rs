mod driver;
mod events;
mod ride;
mod ride_status;

pub use driver::DriverLocation;
pub use events::RideEvent;
pub use ride::Ride;
pub use ride_status::RideStatus;
