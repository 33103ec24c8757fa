//! Unit and behavioural tests for pyfence-vetting.


use crate::VettingPolicy;

/// Module allowlist used throughout the tests.
pub(crate) const TEST_MODULES: &[&str] = &[
    "math",
    "random",
    "datetime",
    "time",
    "json",
    "re",
    "string",
    "itertools",
    "statistics",
];

pub(crate) const fn test_policy() -> VettingPolicy {
    VettingPolicy::new(2000, TEST_MODULES)
}
