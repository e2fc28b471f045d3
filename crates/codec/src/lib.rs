//! # Alertsmith Codec
//!
//! Lossless reader/rewriter for the alert section of an HCL-style document.
//!
//! ## Architecture
//!
//! ```text
//! Document text
//!     │
//!     ├──> Lexer (state machine: comments, strings, heredocs skipped)
//!     │      └─> Token stream with byte spans
//!     │
//!     ├──> Section locator (`alerts = [`)
//!     │      └─> Block reader (brace depth, raw nested values)
//!     │             └─> AlertRecord[] + verbatim source snapshots
//!     │
//!     └──> Replace
//!            ├─> untouched records: original text
//!            ├─> changed records: canonical rendering
//!            └─> bytes outside the section: copied as-is
//! ```
//!
//! ## Example
//!
//! ```rust
//! use alertsmith_codec::{AlertCodec, ReplaceMode};
//!
//! let doc = r#"
//! alerts = [
//!   {
//!     name       = "Shipment duration <DPD>(741)"
//!     nrql_query = "SELECT average(duration) FROM Tx WHERE carrierId = 741"
//!   },
//! ]
//! "#;
//!
//! let codec = AlertCodec::default();
//! let mut alerts = codec.parse(doc).unwrap();
//! assert_eq!(codec.replace(doc, &alerts, ReplaceMode::ExistingOnly).unwrap(), doc);
//!
//! alerts[0].critical_threshold = Some(12.5);
//! let updated = codec.replace(doc, &alerts, ReplaceMode::ExistingOnly).unwrap();
//! assert!(updated.contains("critical_threshold = 12.5"));
//! ```

mod codec;
mod config;
mod error;
mod lexer;
mod model;
mod parser;
mod render;

pub use codec::{parse_alerts, replace_alerts, AlertCodec};
pub use config::{CodecConfig, ReplaceMode};
pub use error::{CodecError, Result};
pub use model::{AlertField, AlertRecord, FieldKind};
pub use render::{format_number, quote};
