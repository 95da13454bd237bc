//! Native-facing surface.
//!
//! Typed handles, status codes and callback signatures. The native binding
//! itself lives outside this crate; these are the shapes it hands us.

pub mod error;
pub mod handles;
pub mod raw;

pub use error::{check_error, error_from_cl, error_name};
pub use handles::*;
pub use raw::*;
