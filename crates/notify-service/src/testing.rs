//! In-process fakes for tests: a fixed student directory, recording
//! channels, and a publisher that remembers what it was given.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use notify_channel::{Channel, ChannelError, ChannelMessage, SendOutcome};
use notify_core::error::AppError;
use notify_core::result::AppResult;
use notify_entity::delivery::DeliveryMethod;
use notify_entity::notification::Notification;
use notify_entity::recipient::RecipientContact;

use crate::orchestrator::{DispatchPublisher, DispatchTask};
use crate::recipient::{DirectoryClient, ResolveError, StudentRecord};

/// Directory backed by a fixed student list.
#[derive(Debug, Default)]
pub struct FakeDirectory {
    students: Mutex<Vec<StudentRecord>>,
    down: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl FakeDirectory {
    pub fn with(students: Vec<StudentRecord>) -> Self {
        Self {
            students: Mutex::new(students),
            ..Self::default()
        }
    }

    /// Make every call fail as if the directory were unreachable.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn set_students(&self, students: Vec<StudentRecord>) {
        *self.students.lock().unwrap() = students;
    }

    /// Calls made so far, e.g. `all`, `class:7`, `class:7:B`, `ids:[1, 2]`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(
        &self,
        call: String,
        keep: impl Fn(&StudentRecord) -> bool,
    ) -> Result<Vec<StudentRecord>, ResolveError> {
        self.calls.lock().unwrap().push(call);
        if self.down.load(Ordering::SeqCst) {
            return Err(ResolveError::DirectoryUnavailable("connection refused".into()));
        }
        Ok(self
            .students
            .lock()
            .unwrap()
            .iter()
            .filter(|s| keep(s))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DirectoryClient for FakeDirectory {
    async fn all_students(&self) -> Result<Vec<StudentRecord>, ResolveError> {
        self.answer("all".into(), |_| true)
    }

    async fn students_by_class(&self, class_id: i64) -> Result<Vec<StudentRecord>, ResolveError> {
        self.answer(format!("class:{class_id}"), |s| s.class_id == Some(class_id))
    }

    async fn students_by_class_section(
        &self,
        class_id: i64,
        section: &str,
    ) -> Result<Vec<StudentRecord>, ResolveError> {
        self.answer(format!("class:{class_id}:{section}"), |s| {
            s.class_id == Some(class_id) && s.section.as_deref() == Some(section)
        })
    }

    async fn students_by_ids(&self, ids: &[i64]) -> Result<Vec<StudentRecord>, ResolveError> {
        self.answer(format!("ids:{ids:?}"), |s| ids.contains(&s.id))
    }
}

/// An active student in class 7 section A with the given parent contacts.
pub fn student(id: i64, parent_phone: Option<&str>, parent_email: Option<&str>) -> StudentRecord {
    StudentRecord {
        id,
        full_name: Some(format!("Student {id}")),
        parent_name: Some(format!("Parent {id}")),
        parent_phone: parent_phone.map(String::from),
        parent_email: parent_email.map(String::from),
        phone: Some(format!("90000000{id:02}")),
        class_id: Some(7),
        section: Some("A".into()),
        ..StudentRecord::default()
    }
}

/// A channel that records every send instead of talking to a provider.
#[derive(Debug)]
pub struct RecordingChannel {
    method: DeliveryMethod,
    outcome: SendOutcome,
    failing: Mutex<HashSet<String>>,
    fail_all: AtomicBool,
    sent: Mutex<Vec<(String, ChannelMessage)>>,
}

impl RecordingChannel {
    /// Channel for `method` that reports `Sent` (or `Delivered` for in-app).
    pub fn new(method: DeliveryMethod) -> Self {
        let outcome = match method {
            DeliveryMethod::InApp => SendOutcome::Delivered,
            _ => SendOutcome::Sent,
        };
        Self {
            method,
            outcome,
            failing: Mutex::default(),
            fail_all: AtomicBool::new(false),
            sent: Mutex::default(),
        }
    }

    /// Reject sends to this destination.
    pub fn fail_for(&self, destination: impl Into<String>) {
        self.failing.lock().unwrap().insert(destination.into());
    }

    /// Reject every send.
    pub fn set_failing(&self, failing: bool) {
        self.fail_all.store(failing, Ordering::SeqCst);
    }

    /// Destinations and messages sent so far.
    pub fn sent(&self) -> Vec<(String, ChannelMessage)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn send_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    fn method(&self) -> DeliveryMethod {
        self.method
    }

    fn destination(&self, contact: &RecipientContact) -> Option<String> {
        match self.method {
            DeliveryMethod::Email => contact.email().map(str::to_string),
            DeliveryMethod::Sms | DeliveryMethod::WhatsApp => contact.phone().map(str::to_string),
            _ => Some(contact.recipient_id.to_string()),
        }
    }

    fn render(&self, notification: &Notification, _contact: &RecipientContact) -> ChannelMessage {
        ChannelMessage {
            subject: Some(notification.title.clone()),
            body: notification.message.clone(),
        }
    }

    async fn send(
        &self,
        destination: &str,
        message: &ChannelMessage,
    ) -> Result<SendOutcome, ChannelError> {
        if self.fail_all.load(Ordering::SeqCst) || self.failing.lock().unwrap().contains(destination) {
            return Err(ChannelError::Rejected {
                status: 400,
                body: "rejected by fake provider".into(),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((destination.to_string(), message.clone()));
        Ok(self.outcome)
    }
}

/// Publisher that records tasks and never runs them.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    tasks: Mutex<Vec<DispatchTask>>,
    broken: AtomicBool,
}

impl RecordingPublisher {
    pub fn tasks(&self) -> Vec<DispatchTask> {
        self.tasks.lock().unwrap().clone()
    }

    /// Make `publish` fail.
    pub fn set_broken(&self, broken: bool) {
        self.broken.store(broken, Ordering::SeqCst);
    }
}

#[async_trait]
impl DispatchPublisher for RecordingPublisher {
    async fn publish(&self, task: DispatchTask) -> AppResult<bool> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(AppError::service_unavailable("Dispatch queue is closed"));
        }
        let mut tasks = self.tasks.lock().unwrap();
        if tasks.contains(&task) {
            return Ok(false);
        }
        tasks.push(task);
        Ok(true)
    }
}
