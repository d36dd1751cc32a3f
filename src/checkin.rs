use std::fmt;

use crate::clock;
use crate::ledger::{AttendanceEntry, AttendanceLedger};
use crate::session::SessionManager;

/// Why a submission did not commit. Everything except `Storage` is a
/// validation outcome that mutates no state.
#[derive(Debug)]
pub enum CheckinError {
    InvalidSession,
    MissingName,
    MissingStudentId,
    FaceVerificationRequired,
    Storage(anyhow::Error),
}

impl fmt::Display for CheckinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckinError::InvalidSession => write!(f, "invalid or expired session token"),
            CheckinError::MissingName => write!(f, "please enter your name"),
            CheckinError::MissingStudentId => write!(f, "please enter your student ID"),
            CheckinError::FaceVerificationRequired => {
                write!(f, "face verification required")
            }
            CheckinError::Storage(e) => write!(f, "failed to record check-in: {}", e),
        }
    }
}

impl std::error::Error for CheckinError {}

/// Request provenance, best-effort: the host layer passes through whatever it
/// knows about the submitting client.
#[derive(Debug, Default, Clone)]
pub struct Provenance {
    pub user_agent: String,
    pub ip: String,
}

/// A submission from the interactive (QR-scanned) check-in form.
#[derive(Debug, Clone)]
pub struct FormCheckin {
    pub name: String,
    pub student_id: String,
    pub face_verified: bool,
    pub voice_verified: bool,
    pub verification_data: String,
    pub provenance: Provenance,
}

/// A submission from the programmatic JSON path. Requires only a name;
/// carries no verification assertions.
#[derive(Debug, Clone)]
pub struct ApiCheckin {
    pub name: String,
    pub student_id: String,
    pub provenance: Provenance,
}

/// Decides whether a claimed verification passes. The shipped provider trusts
/// the caller's assertion outright; a real biometric check slots in here
/// without touching the submission flow.
pub trait VerificationProvider {
    fn face_passes(&self, asserted: bool, verification_data: &str) -> bool;
}

/// The original trust model: the client asserts verification, the server only
/// records the assertion.
pub struct AssertedVerification;

impl VerificationProvider for AssertedVerification {
    fn face_passes(&self, asserted: bool, _verification_data: &str) -> bool {
        asserted
    }
}

/// Runs a submission through the fixed validation order and commits it.
/// Checks short-circuit: token first (read at validation time, so a rotation
/// mid-request fails the stale submission), then required fields, then the
/// verification gate, then the durable append.
pub struct CheckinController<'a> {
    session: &'a SessionManager,
    ledger: &'a AttendanceLedger,
    verifier: &'a dyn VerificationProvider,
}

impl<'a> CheckinController<'a> {
    pub fn new(
        session: &'a SessionManager,
        ledger: &'a AttendanceLedger,
        verifier: &'a dyn VerificationProvider,
    ) -> Self {
        CheckinController {
            session,
            ledger,
            verifier,
        }
    }

    /// Interactive path: name and student ID required, face verification
    /// gated. Voice verification is recorded but never required.
    pub fn submit_form(
        &self,
        token: &str,
        submission: FormCheckin,
    ) -> Result<AttendanceEntry, CheckinError> {
        if !self.session.is_active(token) {
            return Err(CheckinError::InvalidSession);
        }
        let name = submission.name.trim();
        if name.is_empty() {
            return Err(CheckinError::MissingName);
        }
        let student_id = submission.student_id.trim();
        if student_id.is_empty() {
            return Err(CheckinError::MissingStudentId);
        }
        if !self
            .verifier
            .face_passes(submission.face_verified, &submission.verification_data)
        {
            return Err(CheckinError::FaceVerificationRequired);
        }
        let entry = AttendanceEntry {
            name: name.to_string(),
            student_id: student_id.to_string(),
            timestamp: clock::utc_now_iso(),
            session_id: token.to_string(),
            user_agent: submission.provenance.user_agent,
            ip: submission.provenance.ip,
            face_verified: Some(submission.face_verified),
            voice_verified: Some(submission.voice_verified),
            verification_data: Some(submission.verification_data),
        };
        self.commit(entry)
    }

    /// Programmatic path: only the name is required; `student_id` may be
    /// empty and verification fields are omitted from the stored entry.
    pub fn submit_api(
        &self,
        token: &str,
        submission: ApiCheckin,
    ) -> Result<AttendanceEntry, CheckinError> {
        if !self.session.is_active(token) {
            return Err(CheckinError::InvalidSession);
        }
        let name = submission.name.trim();
        if name.is_empty() {
            return Err(CheckinError::MissingName);
        }
        let entry = AttendanceEntry {
            name: name.to_string(),
            student_id: submission.student_id.trim().to_string(),
            timestamp: clock::utc_now_iso(),
            session_id: token.to_string(),
            user_agent: submission.provenance.user_agent,
            ip: submission.provenance.ip,
            face_verified: None,
            voice_verified: None,
            verification_data: None,
        };
        self.commit(entry)
    }

    fn commit(&self, entry: AttendanceEntry) -> Result<AttendanceEntry, CheckinError> {
        // No rollback exists past this point; a failed append is the only
        // reason a validated submission does not finalize.
        self.ledger
            .append(entry.clone())
            .map_err(CheckinError::Storage)?;
        Ok(entry)
    }
}
