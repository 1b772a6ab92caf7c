//! microsvc integration tests.

mod support;
