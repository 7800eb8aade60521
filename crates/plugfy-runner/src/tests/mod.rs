//! Test harness shared by the runner's unit and behaviour tests.

pub(crate) mod support;
