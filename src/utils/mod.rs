mod config;

pub use config::{GeneratorConfig, SuiteConfig};
