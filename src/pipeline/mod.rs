//! Pipeline stages for converting one uploaded document.
//!
//! Each submodule implements exactly one step, so each is testable alone.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ stage ──▶ extract ──▶ postprocess
//! (Upload)  (temp file) (engine, blocking) (cleanup)
//! ```
//!
//! 1. [`input`]  : the [`input::Upload`] type; CLI paths and URLs become uploads
//! 2. [`stage`]  : write the blob to a request-scoped, uniquely named temp file
//! 3. [`extract`]: run the engine on `spawn_blocking` under a timeout and
//!    release the staged file on every exit path
//! 4. [`postprocess`]: deterministic text cleanup before metrics and downloads

pub(crate) mod extract;
pub mod input;
pub mod postprocess;
pub mod stage;
