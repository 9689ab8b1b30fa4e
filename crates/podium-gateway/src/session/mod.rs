//! Session routing state: connection handles, the per-presentation registry,
//! and the outbound broadcast/unicast router.

mod connection;
mod registry;
mod router;

pub use connection::Connection;
pub use registry::{Session, SessionRegistry};
pub use router::BroadcastRouter;
