//! Error types for the inpainting engine.
//!
//! Every failure inside the crate is an [`InpaintError`]. Constructors live in
//! [`constructors`] so call sites stay short:
//!
//! ```rust
//! use oar_inpaint::core::errors::{ErrorKind, InpaintError};
//!
//! let error = InpaintError::invalid_argument("image bytes are empty");
//! assert_eq!(error.kind(), ErrorKind::InvalidArgument);
//! ```

pub mod constructors;
pub mod types;

pub use types::{ErrorKind, InpaintError, SimpleError};

/// Convenient result alias for engine operations.
pub type InpaintResult<T> = Result<T, InpaintError>;
