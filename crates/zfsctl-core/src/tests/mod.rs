//! Crate-level test doubles and behaviour scenarios.

pub(crate) mod support;
