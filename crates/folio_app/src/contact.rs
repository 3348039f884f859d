//! Contact form
//!
//! Submission is simulated: the form shows a sending state for `submit_ms`,
//! then a confirmation with the fields cleared, and returns to editing after
//! `confirmation_ms`.

use folio_core::scheduler::{EventLoop, TaskScope};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    pub submit_ms: u64,
    pub confirmation_ms: u64,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            submit_ms: 1500,
            confirmation_ms: 3000,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFields {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactFields {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.email.is_empty()
            && self.subject.is_empty()
            && self.message.is_empty()
    }

    fn validate(&self) -> Result<(), ContactError> {
        for (field, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("subject", &self.subject),
            ("message", &self.message),
        ] {
            if value.trim().is_empty() {
                return Err(ContactError::MissingField(field));
            }
        }
        let valid_email = self
            .email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
        if !valid_email {
            return Err(ContactError::InvalidEmail(self.email.clone()));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormState {
    #[default]
    Editing,
    Submitting,
    Submitted,
}

impl fmt::Display for FormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FormState::Editing => "editing",
            FormState::Submitting => "submitting",
            FormState::Submitted => "submitted",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContactError {
    #[error("field `{0}` is required")]
    MissingField(&'static str),
    #[error("`{0}` is not an email address")]
    InvalidEmail(String),
    #[error("form is {0}, not accepting input")]
    Busy(FormState),
    #[error("contact section is not mounted")]
    NotMounted,
}

struct FormInner {
    config: ContactConfig,
    fields: ContactFields,
    state: FormState,
    sent: u32,
    scope: TaskScope,
}

pub struct ContactForm {
    inner: Rc<RefCell<FormInner>>,
}

impl ContactForm {
    pub fn new(event_loop: &EventLoop, config: ContactConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(FormInner {
                config,
                fields: ContactFields::default(),
                state: FormState::Editing,
                sent: 0,
                scope: TaskScope::new(event_loop),
            })),
        }
    }

    pub fn state(&self) -> FormState {
        self.inner.borrow().state
    }

    pub fn fields(&self) -> ContactFields {
        self.inner.borrow().fields.clone()
    }

    /// Messages that reached the confirmation state
    pub fn sent(&self) -> u32 {
        self.inner.borrow().sent
    }

    /// Submit `fields`; the button is disabled outside [`FormState::Editing`]
    pub fn submit(&self, fields: ContactFields) -> Result<(), ContactError> {
        let mut inner = self.inner.borrow_mut();
        if inner.state != FormState::Editing {
            return Err(ContactError::Busy(inner.state));
        }
        fields.validate()?;

        inner.fields = fields;
        inner.state = FormState::Submitting;
        let delay = inner.config.submit_ms;
        let weak = Rc::downgrade(&self.inner);
        inner.scope.set_timeout(delay, move || on_sent(&weak));
        tracing::debug!(delay_ms = delay, "contact form submitting");
        Ok(())
    }

    /// Cancel pending state changes
    pub fn cancel(&self) {
        self.inner.borrow_mut().scope.cancel_all();
    }
}

fn on_sent(weak: &Weak<RefCell<FormInner>>) {
    let Some(rc) = weak.upgrade() else {
        return;
    };
    let mut inner = rc.borrow_mut();
    inner.state = FormState::Submitted;
    inner.fields = ContactFields::default();
    inner.sent += 1;
    tracing::info!(sent = inner.sent, "contact message sent");

    let delay = inner.config.confirmation_ms;
    let next = weak.clone();
    inner.scope.set_timeout(delay, move || {
        if let Some(rc) = next.upgrade() {
            rc.borrow_mut().state = FormState::Editing;
        }
    });
}
