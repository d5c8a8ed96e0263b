//! Cross-module tests: scenes built through the public API and checked
//! against the behavior each subsystem promises.
