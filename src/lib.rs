pub mod categories;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod fetch;
pub mod gamelog;
pub mod logging;
pub mod metrics;
pub mod odds;
pub mod parser;
pub mod pipeline;
pub mod retry;
pub mod schema;
pub mod server;
pub mod types;
pub mod validate;

pub use error::{Result, ScraperError};
