pub mod connection;
pub mod dns;
pub mod response;

mod error;

pub use connection::ConnectionManager;
pub use error::{Error, Result};
pub use response::{ClusterHealth, Hit, Hits, SearchResponse};
