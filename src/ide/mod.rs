//! Query providers. Each takes a [`DocumentSnapshot`](crate::document::DocumentSnapshot)
//! plus a byte offset or span, and returns wire records with UTF-16 offsets.
//!
//! "Nothing here" is `Ok(None)` or an empty list, never an error.

pub mod completion;
pub mod definition;
pub mod diagnostics;
pub mod format;
pub mod hover;
pub mod markup;
pub mod rename;
pub mod signature;

pub use completion::{complete, resolve};
pub use definition::definition;
pub use diagnostics::code_check;
pub use format::format;
pub use hover::hover;
pub use rename::rename;
pub use signature::signature_help;
