//! Core state machines for quizgate
//!
//! This crate holds the logic with actual temporal state:
//! - `SessionGuard`: validity checks of the stored login (warn, extend, expire)
//! - `CategoryTimer`: the single live countdown bound to an open panel
//! - `Authenticator`: digest comparison login over the session record
//!
//! Nothing here talks to a host directly. Operations take the current time
//! explicitly and return `CoreEvent`s for the host loop to apply.

mod auth;
mod events;
mod guard;
mod timer;

pub use auth::*;
pub use events::*;
pub use guard::*;
pub use timer::*;
