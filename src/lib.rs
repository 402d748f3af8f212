// Library target for integration tests and criterion benchmarks.
// The binary entry point is main.rs; this file re-declares the non-UI module
// tree so that harnesses can import types via `kotoba::engine::*` /
// `kotoba::store::*`.

pub mod config;
pub mod engine;
pub mod error;
pub mod session;
pub mod store;
pub mod vocab;
