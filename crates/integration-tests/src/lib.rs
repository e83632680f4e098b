//! End-to-end tests for the stablegate HTTP surface live under `tests/`
