//! Infrastructure adapters for the core seams.

pub mod docstore;

pub use docstore::DocStoreRecordStore;
