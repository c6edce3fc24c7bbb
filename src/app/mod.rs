pub mod ports;
pub mod retry;
pub mod ingest_use_case;
