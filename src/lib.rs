// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) wires the modules into one automation run.
//
// Module responsibilities:
// - `api`: the blocking HTTP client for the platform endpoints and the
//   pure parsers for their response bodies.
// - `account`: resolves the operator's account id (environment, cache
//   file, interactive prompt).
// - `profile`: the cached enrollment profile and its soft-failure
//   resolution policy.
// - `store`: the minimal key-value cache both files above live behind.
// - `logging`: the per-run log handle handed to each component.
// - `run`: sequences one full run and owns the exit-code mapping.
// - `ui`: the terminal prompt and spinner helpers.
//
// Keeping this separation makes it easier to test the cache policy and
// the response parsers without touching a terminal or the network.
pub mod account;
pub mod api;
pub mod logging;
pub mod profile;
pub mod run;
pub mod store;
pub mod ui;
