//! Audience to contact-list resolution.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use notify_channel::normalize_phone;
use notify_core::error::{AppError, ErrorKind};
use notify_entity::notification::{Notification, TargetAudience};
use notify_entity::recipient::{RecipientContact, RecipientType};

use super::directory::{DirectoryClient, StudentRecord};

/// Why an audience could not be resolved.
///
/// The `Display` form is stored as the notification's `failure_reason`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("directory_unavailable: {0}")]
    DirectoryUnavailable(String),

    #[error("unsupported_audience: {0}")]
    UnsupportedAudience(TargetAudience),

    #[error("missing_scope: {0}")]
    MissingScope(&'static str),
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        let kind = match err {
            ResolveError::DirectoryUnavailable(_) => ErrorKind::ExternalService,
            ResolveError::UnsupportedAudience(_) | ResolveError::MissingScope(_) => {
                ErrorKind::Validation
            }
        };
        AppError::new(kind, err.to_string())
    }
}

/// The audience portion of a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudienceScope {
    pub audience: TargetAudience,
    pub class_id: Option<i64>,
    pub section: Option<String>,
    pub student_ids: Vec<i64>,
}

impl AudienceScope {
    /// Scope covering a whole audience with no narrowing.
    pub fn of(audience: TargetAudience) -> Self {
        Self {
            audience,
            class_id: None,
            section: None,
            student_ids: Vec::new(),
        }
    }
}

impl From<&Notification> for AudienceScope {
    fn from(n: &Notification) -> Self {
        Self {
            audience: n.target_audience,
            class_id: n.class_id,
            section: n.section.clone(),
            student_ids: n.student_ids.clone(),
        }
    }
}

/// Expands audiences into de-duplicated recipient contacts.
#[derive(Clone)]
pub struct RecipientResolver {
    directory: Arc<dyn DirectoryClient>,
    country_code: String,
}

impl RecipientResolver {
    /// Creates a new resolver over a directory client.
    pub fn new(directory: Arc<dyn DirectoryClient>, country_code: impl Into<String>) -> Self {
        Self {
            directory,
            country_code: country_code.into(),
        }
    }

    /// Resolve an audience to the contacts that should receive it.
    pub async fn resolve(&self, scope: &AudienceScope) -> Result<Vec<RecipientContact>, ResolveError> {
        let (students, recipient_type) = match scope.audience {
            TargetAudience::AllParents => (self.directory.all_students().await?, RecipientType::Parent),
            TargetAudience::AllStudents => {
                (self.directory.all_students().await?, RecipientType::Student)
            }
            TargetAudience::SpecificClass => {
                let class_id = scope.class_id.ok_or(ResolveError::MissingScope("class_id"))?;
                let students = match scope.section.as_deref().map(str::trim) {
                    Some(section) if !section.is_empty() => {
                        self.directory
                            .students_by_class_section(class_id, section)
                            .await?
                    }
                    _ => self.directory.students_by_class(class_id).await?,
                };
                (students, RecipientType::Parent)
            }
            TargetAudience::SpecificStudent => {
                if scope.student_ids.is_empty() {
                    return Err(ResolveError::MissingScope("student_ids"));
                }
                (
                    self.directory.students_by_ids(&scope.student_ids).await?,
                    RecipientType::Parent,
                )
            }
            other @ (TargetAudience::AllStaff | TargetAudience::AdminOnly) => {
                return Err(ResolveError::UnsupportedAudience(other));
            }
        };

        let fetched = students.len();
        let contacts = self.dedup(
            students
                .iter()
                .filter(|s| s.is_active())
                .map(|s| contact_for(s, recipient_type)),
        );
        info!(
            audience = %scope.audience,
            fetched,
            resolved = contacts.len(),
            "Resolved recipients"
        );
        Ok(contacts)
    }

    /// Look up the contact behind an existing delivery.
    pub async fn resolve_one(
        &self,
        recipient_id: i64,
        recipient_type: RecipientType,
    ) -> Result<Option<RecipientContact>, ResolveError> {
        let students = self.directory.students_by_ids(&[recipient_id]).await?;
        let contact = students
            .iter()
            .find(|s| s.id == recipient_id && s.is_active())
            .map(|s| contact_for(s, recipient_type));
        if contact.is_none() {
            debug!(recipient_id, "Recipient no longer in directory");
        }
        Ok(contact)
    }

    /// Keep the first contact for each phone number or email address.
    fn dedup(&self, contacts: impl Iterator<Item = RecipientContact>) -> Vec<RecipientContact> {
        let mut phones = HashSet::new();
        let mut emails = HashSet::new();
        let mut out = Vec::new();
        for contact in contacts {
            let phone = contact.phone().map(|p| normalize_phone(p, &self.country_code));
            let email = contact.email().map(str::to_lowercase);
            let seen = phone.as_ref().is_some_and(|p| phones.contains(p))
                || email.as_ref().is_some_and(|e| emails.contains(e));
            if seen {
                debug!(recipient_id = contact.recipient_id, "Dropping duplicate contact");
                continue;
            }
            phones.extend(phone);
            emails.extend(email);
            out.push(contact);
        }
        out
    }
}

impl std::fmt::Debug for RecipientResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipientResolver")
            .field("country_code", &self.country_code)
            .finish()
    }
}

fn contact_for(student: &StudentRecord, recipient_type: RecipientType) -> RecipientContact {
    let student_name = student.display_name();
    match recipient_type {
        RecipientType::Student => RecipientContact {
            recipient_id: student.id,
            recipient_type,
            name: student_name.clone(),
            student_name,
            phone: student.phone.clone(),
            email: student.email.clone(),
        },
        _ => RecipientContact {
            recipient_id: student.id,
            recipient_type,
            name: student.parent_name.clone(),
            student_name,
            phone: student.parent_phone.clone(),
            email: student.parent_email.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDirectory, student};

    fn resolver(dir: FakeDirectory) -> RecipientResolver {
        RecipientResolver::new(Arc::new(dir), "91")
    }

    #[tokio::test]
    async fn test_shared_parent_phone_yields_one_contact() {
        let r = resolver(FakeDirectory::with(vec![
            student(1, Some("09876543210"), None),
            student(2, Some("9876543210"), None),
            student(3, Some("+91 98765 43210"), None),
        ]));

        let contacts = r.resolve(&AudienceScope::of(TargetAudience::AllParents)).await.unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].recipient_id, 1);
        assert_eq!(contacts[0].recipient_type, RecipientType::Parent);
        assert_eq!(contacts[0].student_name.as_deref(), Some("Student 1"));
    }

    #[tokio::test]
    async fn test_email_dedup_is_case_insensitive() {
        let r = resolver(FakeDirectory::with(vec![
            student(1, None, Some("Family@Example.in")),
            student(2, None, Some("family@example.in")),
            student(3, None, None),
        ]));

        let contacts = r.resolve(&AudienceScope::of(TargetAudience::AllParents)).await.unwrap();
        assert_eq!(
            contacts.iter().map(|c| c.recipient_id).collect::<Vec<_>>(),
            vec![1, 3]
        );
    }

    #[tokio::test]
    async fn test_inactive_students_dropped() {
        let mut gone = student(2, Some("9811111111"), None);
        gone.is_active = Some(false);
        let r = resolver(FakeDirectory::with(vec![student(1, Some("9822222222"), None), gone]));

        let contacts = r.resolve(&AudienceScope::of(TargetAudience::AllStudents)).await.unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].recipient_type, RecipientType::Student);
        assert_eq!(contacts[0].phone.as_deref(), Some("9000000001"));
    }

    #[tokio::test]
    async fn test_class_section_scope() {
        let mut other = student(2, Some("9811111111"), None);
        other.section = Some("B".into());
        let dir = Arc::new(FakeDirectory::with(vec![student(1, Some("9822222222"), None), other]));
        let r = RecipientResolver::new(dir.clone(), "91");

        let scope = AudienceScope {
            class_id: Some(7),
            section: Some("B".into()),
            ..AudienceScope::of(TargetAudience::SpecificClass)
        };
        let contacts = r.resolve(&scope).await.unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].recipient_id, 2);
        assert_eq!(dir.calls(), vec!["class:7:B".to_string()]);

        let missing = AudienceScope::of(TargetAudience::SpecificClass);
        assert_eq!(
            r.resolve(&missing).await.unwrap_err(),
            ResolveError::MissingScope("class_id")
        );
    }

    #[tokio::test]
    async fn test_errors_are_distinct() {
        let dir = FakeDirectory::default();
        dir.set_down(true);
        let r = resolver(dir);
        let err = r.resolve(&AudienceScope::of(TargetAudience::AllParents)).await.unwrap_err();
        assert!(err.to_string().starts_with("directory_unavailable"));

        let err = r.resolve(&AudienceScope::of(TargetAudience::AllStaff)).await.unwrap_err();
        assert_eq!(err.to_string(), "unsupported_audience: ALL_STAFF");
    }

    #[tokio::test]
    async fn test_resolve_one() {
        let r = resolver(FakeDirectory::with(vec![student(4, Some("9833333333"), None)]));
        let contact = r.resolve_one(4, RecipientType::Parent).await.unwrap().unwrap();
        assert_eq!(contact.phone.as_deref(), Some("9833333333"));
        assert!(r.resolve_one(5, RecipientType::Parent).await.unwrap().is_none());
    }
}
