//! Protocol dispatcher: the per-connection init state machine, the
//! role-indexed handler table, and connection lifecycle teardown.

mod dispatcher;

pub use dispatcher::{Dispatcher, Outcome, Phase};
