//! Unit tests for configuration defaults and validation.
