//! # notify-service
//!
//! Business logic for School Notify. The orchestrator turns dispatch
//! requests into notifications and, on a worker, into deliveries; the
//! recipient resolver expands audiences through the student directory; the
//! query service answers reads and operator mutations.
//!
//! Services follow constructor injection. Stores, the directory client and
//! the dispatch publisher are trait objects provided at construction time.

pub mod orchestrator;
pub mod query;
pub mod recipient;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use orchestrator::{
    DispatchPublisher, DispatchRequest, DispatchSummary, DispatchTask, NotificationOrchestrator,
};
pub use query::NotificationQueryService;
pub use recipient::{
    AudienceScope, DirectoryClient, HttpDirectoryClient, RecipientResolver, ResolveError,
    StudentRecord,
};
