//! HTTP clients for the platform services the report engine consumes:
//! time-series queries, the device inventory, identity-provider token
//! exchange, and the outbound mail relay.

pub mod devices;
pub mod error;
pub mod keycloak;
pub mod mail;
pub mod timeseries;

pub use devices::DevicesClient;
pub use error::ApiError;
pub use keycloak::KeycloakClient;
pub use mail::{Address, Attachment, MailClient, SendRequest};
pub use timeseries::TimeseriesClient;
