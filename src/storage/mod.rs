//! Durable side of the tracker: an embedded SQLite store holding the
//! append-only activity log, system startup/shutdown events and the category
//! override table, plus the aggregation queries reporting is built on.

pub mod entities;
pub mod store;
