pub mod engine;
pub mod flows;
pub mod ids;
pub mod responses;
pub mod slugs;

pub use engine::{EngineConfig, FormEngine};
