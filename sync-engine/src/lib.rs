//! Synchronization engine: the reconciler that converges the local store
//! against a remote item store, and the periodic driver plus supervisor
//! that run it unattended for the lifetime of a logged-in session.

mod driver;
mod reconciler;
mod supervisor;

pub use driver::{PeriodicDriver, DEFAULT_INTERVAL};
pub use reconciler::Reconciler;
pub use supervisor::JobSupervisor;
