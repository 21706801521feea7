pub mod cache_tests;
pub mod config_tests;
pub mod error_tests;
pub mod file_discovery_tests;
pub mod output_tests;
pub mod validation_tests;
