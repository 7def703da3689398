//! # Document Store SDK
//!
//! Typed client for the document-database REST API that holds investor
//! records. The wire format follows the page/database model: records are
//! pages inside a database, and each page carries a bag of typed properties
//! keyed by display name.
//!
//! This SDK provides:
//! - Database queries with typed property filters (`equals`, combined with `or`)
//! - Page creation inside a database
//! - Page property updates
//! - Typed property values that serialize to the store's JSON shape
//!
//! # Examples
//!
//! ```rust,no_run
//! use docstore_sdk::client::{ClientConfig, DocStoreClient, Filter, QueryRequest};
//!
//! # async fn example() -> Result<(), docstore_sdk::ApiError> {
//! let client = DocStoreClient::builder("secret-api-key")
//!     .config(ClientConfig::default())
//!     .build()?;
//!
//! let query = QueryRequest::new(Filter::email_equals("Email", "ada@example.com")).with_page_size(1);
//! let results = client.query_database("database-id", &query).await?;
//! println!("found {} records", results.results.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod properties;

pub use client::{
    ClientConfig, CreatePageRequest, DocStoreClient, Filter, Page, Parent, QueryRequest,
    QueryResponse, UpdatePageRequest,
};
pub use error::ApiError;
pub use properties::{DateValue, PropertyMap, PropertyValue, RelationRef, RichText, SelectOption};
