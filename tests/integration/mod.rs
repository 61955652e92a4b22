//! Integration tests for the insights relay

mod availability_probe;
mod config_integration;
mod request_pipeline;
mod test_utils;
