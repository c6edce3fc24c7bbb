// Consolidation engine: identity, provenance, deduplication, ordering, and storage

pub mod identity;
pub mod provenance;
pub mod dedup;
pub mod sort;
pub mod trends;
pub mod dataset;
pub mod repository;
pub mod storage;
