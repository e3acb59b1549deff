pub mod http;
pub mod models;
pub mod response;

pub use http::{router, serve};
pub use response::{RequestError, RestResult};
