//! avtools - validated access to a financial market data API
//!
//! Requests for stock series, technical indicators, crypto, forex, economic
//! indicators, commodities, listings and fundamentals are validated into
//! typed records, routed to upstream function names, and executed as tools.
//! Large responses can be delivered through an S3-compatible object store,
//! which also receives usage lines extracted from application logs.

pub mod error;
pub mod ingest;
pub mod request;
pub mod store;
pub mod tools;
pub mod upstream;

pub use error::AvError;
