//! Account orchestration.
//!
//! Drives auth, name resolution, and the application lifecycle for each
//! configured account in order, and aggregates the outcomes into the run
//! summary. Progress is reported through `RunEvent`s; presentation layers
//! subscribe to the channel instead of the core printing anything.

mod controller;
mod lifecycle;

#[cfg(test)]
pub(crate) mod testutil;

pub(crate) use controller::run_accounts;
