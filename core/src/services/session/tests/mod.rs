//! Unit tests for the session services

mod codec_tests;
mod service_tests;
