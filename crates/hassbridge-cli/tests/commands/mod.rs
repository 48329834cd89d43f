//! Command-specific CLI tests.

mod rpc_test;
mod state_test;
