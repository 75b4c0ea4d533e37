//! Per-entry compile stages.
//!
//! Each submodule implements exactly one step of turning a page source into
//! a PDF page. Keeping stages separate makes each independently testable and
//! lets embedders swap the transport (see [`resolve::ImageFetcher`]) without
//! touching the rest.
//!
//! ## Data Flow
//!
//! ```text
//! resolve ──▶ decode ──▶ layout ──▶ document
//! (URL/data)  (image)    (size)     (lopdf)
//! ```
//!
//! 1. [`resolve`]: fetch remote sources or parse inline payloads into bytes
//! 2. [`decode`]: decode and measure; runs in `spawn_blocking` because
//!    large scans are CPU-bound
//! 3. [`layout`]: one point per pixel, landscape iff wider than tall
//! 4. [`document`]: append the page and draw the image edge to edge, or a
//!    placeholder page with its marker text

pub mod decode;
pub mod document;
pub mod layout;
pub mod resolve;
