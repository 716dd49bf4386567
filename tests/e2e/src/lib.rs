//! End-to-end scenario tests (see `tests/scenarios.rs`) and the codec
//! round-trip property test (see `tests/codec_properties.rs`). This crate
//! has no library surface of its own; it exists to host integration tests
//! against the real server and client transports over loopback UDP.
