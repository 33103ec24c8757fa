//! Unit tests for the watchdog and the bootstrap script.
