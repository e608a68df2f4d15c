pub mod handler;
pub mod messages;
pub mod registry;


pub use handler::websocket_handler;
pub use messages::{ClientMessage, NotificationEvent, ServerMessage, NEW_CONTACT_SUBMISSION};
pub use registry::{
    AdminConnection, BroadcastReport, ConnectionRegistry, ConnectionState, EventBroadcaster, Notifier,
};
