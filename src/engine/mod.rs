mod process;
mod types;
mod undo;
mod util;
mod validate;

pub use types::{
    AcceptedEntry, BatchReport, EngineError, Rejection, RejectionReason, Request, RequestKind,
    SubmitError, BALANCE_THRESHOLD,
};
pub use validate::{check_balance, check_capacity, check_overlap};

use crate::model::{Roster, SectionKey, StudentId};
use std::collections::VecDeque;

/// Moteur de résolution des demandes : encapsule le roster, quatre files
/// FIFO (une par type de demande), le journal des rejets et l'historique
/// LIFO des acceptations. Acteur unique, traitement séquentiel.
#[derive(Debug, Default)]
pub struct Engine {
    roster: Roster,
    enrolls: VecDeque<Request>,
    withdrawals: VecDeque<Request>,
    class_changes: VecDeque<Request>,
    course_changes: VecDeque<Request>,
    rejected: Vec<Rejection>,
    accepted: Vec<AcceptedEntry>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Démarre sur un roster déjà chargé (catalogue + inscriptions).
    pub fn with_roster(roster: Roster) -> Self {
        Self {
            roster,
            ..Self::default()
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }
    pub fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    pub fn pending_count(&self) -> usize {
        self.withdrawals.len() + self.enrolls.len() + self.class_changes.len()
            + self.course_changes.len()
    }

    /// Demandes en attente, dans l'ordre où elles seront traitées.
    pub fn pending_requests(&self) -> Vec<&Request> {
        self.withdrawals
            .iter()
            .chain(self.enrolls.iter())
            .chain(self.class_changes.iter())
            .chain(self.course_changes.iter())
            .collect()
    }

    /// Vide et rend le journal des rejets.
    pub fn drain_rejections(&mut self) -> Vec<Rejection> {
        std::mem::take(&mut self.rejected)
    }

    pub fn history_len(&self) -> usize {
        self.accepted.len()
    }

    /// Dernière demande acceptée, celle que `undo_last` défera.
    pub fn last_accepted(&self) -> Option<&AcceptedEntry> {
        self.accepted.last()
    }

    /// Soumet une inscription à une UC. Vérifications légères seulement ;
    /// capacité/équilibre/chevauchement attendent le traitement du lot.
    pub fn submit_enroll(
        &mut self,
        student: StudentId,
        course: &str,
        section: &str,
    ) -> Result<(), SubmitError> {
        let target = self.checked_target(student, course, section)?;
        if self.student(student)?.is_enrolled_in(course) {
            return Err(SubmitError::AlreadyEnrolled {
                student,
                course: course.to_string(),
            });
        }
        self.enrolls.push_back(Request {
            student,
            target,
            kind: RequestKind::Enroll,
            previous_course: None,
        });
        Ok(())
    }

    /// Soumet un retrait d'une UC ; la turma visée est celle que
    /// l'étudiant y tient actuellement.
    pub fn submit_withdraw(&mut self, student: StudentId, course: &str) -> Result<(), SubmitError> {
        if !self.roster.course_exists(course) {
            return Err(SubmitError::UnknownCourse(course.to_string()));
        }
        let target = self
            .student(student)?
            .section_of(course)
            .cloned()
            .ok_or_else(|| SubmitError::NotEnrolled {
                student,
                course: course.to_string(),
            })?;
        self.withdrawals.push_back(Request {
            student,
            target,
            kind: RequestKind::Withdraw,
            previous_course: None,
        });
        Ok(())
    }

    /// Soumet un changement de turma au sein d'une UC (même turma admise).
    pub fn submit_change_class(
        &mut self,
        student: StudentId,
        course: &str,
        section: &str,
    ) -> Result<(), SubmitError> {
        let target = self.checked_target(student, course, section)?;
        if !self.student(student)?.is_enrolled_in(course) {
            return Err(SubmitError::NotEnrolled {
                student,
                course: course.to_string(),
            });
        }
        self.class_changes.push_back(Request {
            student,
            target,
            kind: RequestKind::ChangeClass,
            previous_course: None,
        });
        Ok(())
    }

    /// Soumet un changement d'UC : quitter `from_course`, rejoindre la
    /// turma `section` de `course`.
    pub fn submit_change_course(
        &mut self,
        student: StudentId,
        from_course: &str,
        course: &str,
        section: &str,
    ) -> Result<(), SubmitError> {
        if !self.roster.course_exists(from_course) {
            return Err(SubmitError::UnknownCourse(from_course.to_string()));
        }
        if !self.student(student)?.is_enrolled_in(from_course) {
            return Err(SubmitError::NotEnrolled {
                student,
                course: from_course.to_string(),
            });
        }
        let target = self.checked_target(student, course, section)?;
        if self.student(student)?.is_enrolled_in(course) {
            return Err(SubmitError::AlreadyEnrolled {
                student,
                course: course.to_string(),
            });
        }
        self.course_changes.push_back(Request {
            student,
            target,
            kind: RequestKind::ChangeCourse,
            previous_course: Some(from_course.to_string()),
        });
        Ok(())
    }

    /// Draine les quatre files dans l'ordre fixe : retraits, inscriptions,
    /// changements de turma, changements d'UC. Chaque demande est acceptée
    /// ou rejetée indépendamment ; le lot n'avorte jamais sur un rejet.
    /// L'éligibilité est réexaminée au traitement : une demande rendue
    /// caduque par une demande antérieure du lot est rejetée (`Superseded`),
    /// jamais appliquée deux fois.
    pub fn process_all(&mut self) -> Result<BatchReport, EngineError> {
        let mut report = BatchReport::default();

        while let Some(request) = self.withdrawals.pop_front() {
            process::resolve_withdraw(self, request, &mut report)?;
        }
        while let Some(request) = self.enrolls.pop_front() {
            process::resolve_enroll(self, request, &mut report)?;
        }
        while let Some(request) = self.class_changes.pop_front() {
            process::resolve_change_class(self, request, &mut report)?;
        }
        while let Some(request) = self.course_changes.pop_front() {
            process::resolve_change_course(self, request, &mut report)?;
        }

        self.rejected.extend(report.rejected.iter().cloned());
        Ok(report)
    }

    /// Défait la dernière acceptation (LIFO strict). `None` si l'historique
    /// est vide ; rien n'est alors modifié.
    pub fn undo_last(&mut self) -> Result<Option<AcceptedEntry>, EngineError> {
        undo::undo_last(self)
    }

    fn student(&self, id: StudentId) -> Result<&crate::model::Student, SubmitError> {
        self.roster
            .find_student(id)
            .ok_or(SubmitError::UnknownStudent(id))
    }

    /// UC puis turma cible : les deux doivent exister.
    fn checked_target(
        &self,
        student: StudentId,
        course: &str,
        section: &str,
    ) -> Result<SectionKey, SubmitError> {
        self.student(student)?;
        if !self.roster.course_exists(course) {
            return Err(SubmitError::UnknownCourse(course.to_string()));
        }
        let key = SectionKey::new(course, section);
        if self.roster.find_section(&key).is_none() {
            return Err(SubmitError::UnknownSection(key));
        }
        Ok(key)
    }
}
