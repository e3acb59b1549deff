pub mod facade;
pub mod types;

pub use facade::QueryFacade;
pub use types::*;
