//! SAML 2.0 assertion types and data structures.

mod assertion;
mod constants;
mod name_id;

pub use assertion::*;
pub use constants::*;
pub use name_id::*;
