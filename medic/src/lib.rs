//! CI self-healing and fix orchestration engine.
//!
//! Medic runs as a sequence of stateless, independently scheduled CI job
//! steps that share no memory: every hand-off goes through durable JSON
//! documents keyed by run id. The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (decision policy, risk scoring,
//!   patch gating). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (durable documents, process
//!   execution, the classification HTTP client). Isolated to enable mocking
//!   in tests.
//!
//! Orchestration modules ([`prepare`], [`decide`], [`heal`], [`assess`],
//! [`gate`]) coordinate core logic with I/O to implement CLI commands.

pub mod assess;
pub mod core;
pub mod decide;
pub mod exit_codes;
pub mod gate;
pub mod heal;
pub mod io;
pub mod logging;
pub mod prepare;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
