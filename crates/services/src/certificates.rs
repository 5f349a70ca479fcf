//! Course-completion certificates.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use course_core::model::{CertificateId, EnrollmentId};
use course_core::Clock;

use crate::error::CertificateError;

/// A certificate as the issuing service reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub id: CertificateId,
    pub enrollment_id: EnrollmentId,
    pub issued_at: DateTime<Utc>,
}

/// Issues course-completion certificates.
///
/// Invoked at most once per passed final quiz; the attempt policy is the
/// only trigger.
#[async_trait]
pub trait CertificateIssuer: Send + Sync {
    /// Issue a certificate for the given enrollment.
    ///
    /// # Errors
    ///
    /// Returns [`CertificateError::Unavailable`] when the issuing service
    /// cannot record the certificate.
    async fn issue(&self, enrollment: EnrollmentId) -> Result<Certificate, CertificateError>;
}

/// In-memory issuer, for tests and local prototyping.
#[derive(Debug, Clone)]
pub struct InMemoryIssuer {
    clock: Clock,
    issued: Arc<Mutex<Vec<Certificate>>>,
}

impl InMemoryIssuer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            clock: Clock::default_clock(),
            issued: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Replace the clock, typically with a fixed clock in tests.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Every certificate issued so far, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`CertificateError::Unavailable`] if the store is poisoned.
    pub fn issued(&self) -> Result<Vec<Certificate>, CertificateError> {
        let issued = self
            .issued
            .lock()
            .map_err(|e| CertificateError::Unavailable(e.to_string()))?;
        Ok(issued.clone())
    }
}

impl Default for InMemoryIssuer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CertificateIssuer for InMemoryIssuer {
    async fn issue(&self, enrollment: EnrollmentId) -> Result<Certificate, CertificateError> {
        let certificate = Certificate {
            id: CertificateId::generate(),
            enrollment_id: enrollment,
            issued_at: self.clock.now(),
        };
        let mut issued = self
            .issued
            .lock()
            .map_err(|e| CertificateError::Unavailable(e.to_string()))?;
        issued.push(certificate.clone());
        info!(certificate = %certificate.id, "certificate issued");
        Ok(certificate)
    }
}
