pub mod dedup;
pub mod ingest;
pub mod status;
pub mod watch;
