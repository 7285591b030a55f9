use crate::model::{RosterError, SectionKey, StudentId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Seuil d'écart-type au-delà duquel les turmas d'une UC sont jugées
/// déséquilibrées.
pub const BALANCE_THRESHOLD: f64 = 4.0;

/// Nature d'une demande.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestKind {
    Enroll,
    Withdraw,
    ChangeClass,
    ChangeCourse,
}

/// Demande en attente ou résolue. Immuable une fois construite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub student: StudentId,
    pub target: SectionKey,
    pub kind: RequestKind,
    /// UC quittée, uniquement pour ChangeCourse.
    pub previous_course: Option<String>,
}

/// Motif de rejet lors du traitement d'un lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    CapacityExceeded,
    BalanceViolation,
    ScheduleConflict,
    /// Devenue caduque : une demande antérieure du lot a changé les
    /// inscriptions de l'étudiant depuis la soumission.
    Superseded,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CapacityExceeded => "exceeds capacity",
            Self::BalanceViolation => "harms balance",
            Self::ScheduleConflict => "schedule conflict",
            Self::Superseded => "superseded by an earlier request",
        }
    }
}

/// Demande rejetée, avec son motif. Journal en append seul.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub request: Request,
    pub reason: RejectionReason,
}

/// Demande acceptée, avec la turma tenue avant le changement
/// (nécessaire pour défaire ChangeClass/ChangeCourse).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedEntry {
    pub request: Request,
    pub prior_section: Option<SectionKey>,
}

/// Bilan d'un lot : tout ce qui a été accepté et rejeté, dans l'ordre de
/// traitement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub accepted: Vec<AcceptedEntry>,
    pub rejected: Vec<Rejection>,
}

/// Refus à la soumission : la demande n'entre jamais en file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("unknown student: {0}")]
    UnknownStudent(StudentId),
    #[error("unknown course: {0}")]
    UnknownCourse(String),
    #[error("unknown section: {0}")]
    UnknownSection(SectionKey),
    #[error("{student} is not enrolled in course {course}")]
    NotEnrolled { student: StudentId, course: String },
    #[error("{student} is already enrolled in course {course}")]
    AlreadyEnrolled { student: StudentId, course: String },
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
