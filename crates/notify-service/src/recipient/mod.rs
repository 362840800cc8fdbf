//! Audience expansion through the student directory.

pub mod directory;
pub mod resolver;

pub use directory::{DirectoryClient, HttpDirectoryClient, StudentRecord};
pub use resolver::{AudienceScope, RecipientResolver, ResolveError};
