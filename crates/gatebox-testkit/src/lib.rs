//! # Gatebox Testkit
//!
//! Testing utilities for gatebox.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: A box sealed with fixed keys and nonces, plus key and ECDH vectors
//! - **Generators**: Proptest strategies for recipients, tokens and policies
//! - **Fixtures**: Deterministic recipients and a credential service over a counting backend
//!
//! ## Golden Vectors
//!
//! ```rust
//! use gatebox_testkit::vectors::verify_all_vectors;
//!
//! for (name, passed, detail) in verify_all_vectors() {
//!     assert!(passed, "{}: {}", name, detail);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use gatebox_accessbox::BoxBuilder;
//! use gatebox_testkit::generators::recipients;
//!
//! proptest! {
//!     #[test]
//!     fn every_recipient_can_open(params in recipients(4)) {
//!         let (access_box, _) = BoxBuilder::new()
//!             .recipients(params.iter().map(|p| p.recipient()))
//!             .pack()
//!             .unwrap();
//!         for p in &params {
//!             prop_assert!(access_box.gate_data(&p.key).is_ok());
//!         }
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use gatebox_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new(3);
//! let (access_box, _secrets) = fixture.pack();
//! assert_eq!(access_box.gates.len(), 3);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{
    multi_recipient_fixtures, CountingBackend, FailingBackend, RecipientFixture, TestFixture,
};
pub use generators::{recipients, RecipientParams};
pub use vectors::{verify_all_vectors, BoxVector, BOX_VECTOR};
