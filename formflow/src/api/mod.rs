pub mod types;

mod flow_api;
mod form_api;
mod public_api;
mod response_api;

pub use flow_api::*;
pub use form_api::*;
pub use public_api::*;
pub use response_api::*;
