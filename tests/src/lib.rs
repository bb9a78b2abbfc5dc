//! # Pickup Test Suite
//!
//! End-to-end tests that drive the full router over the in-memory adapters.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── harness.rs        # TestApp: router + state + request helpers
//!     ├── pickup_flow.rs    # arrival → release round trip
//!     ├── realtime.rs       # live delivery through the connection registry
//!     └── access.rs         # authentication, roles and ownership
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p pickup-tests
//! cargo test -p pickup-tests integration::pickup_flow
//! ```

pub mod integration;
