// src/storage/mod.rs

//! Persistence for relay state.
//!
//! The only durable state is the set of already-relayed post IDs, kept as a
//! flat JSON array in a single file. The file is read once at startup and
//! rewritten whole at the end of each cycle.

mod sent;

pub use sent::SentStore;
