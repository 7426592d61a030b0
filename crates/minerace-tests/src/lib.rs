//! Cross-crate test suite for minerace.
//!
//! Integration tests drive the producers and the validator together, either
//! step by step on one thread or as a full threaded simulation, and check the
//! chain invariants that must hold whatever order the race resolves in.
//! Shared test helpers live in [`helpers`].

pub mod helpers;
