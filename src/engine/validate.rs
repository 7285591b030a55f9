use super::types::BALANCE_THRESHOLD;
use super::util;
use crate::model::{Roster, RosterError, Section, SectionKey, StudentId, MAX_CAPACITY};

/// Vrai si la turma est pleine : la demande doit être rejetée.
pub fn check_capacity(section: &Section) -> bool {
    section.len() >= MAX_CAPACITY
}

/// Vrai si une aula d'une turma tenue par l'étudiant chevauche une aula de
/// la turma candidate. La turma éventuellement quittée compte aussi.
pub fn check_overlap(
    roster: &Roster,
    student: StudentId,
    candidate: &Section,
) -> Result<bool, RosterError> {
    let held = roster.lessons_of_student(student)?;
    Ok(held
        .iter()
        .any(|lesson| candidate.lessons.iter().any(|c| lesson.overlaps(c))))
}

/// Vrai si le déplacement vers `to` est acceptable pour l'équilibre des
/// turmas de l'UC de `to` : soit l'écart-type reste sous le seuil avant et
/// après, soit il diminue strictement.
///
/// `from` vaut `Some` uniquement quand une turma de la même UC perd un
/// étudiant (ChangeClass) ; un appel avec `from == Some(to)` ne change rien
/// aux effectifs et est accepté sans calcul.
pub fn check_balance(roster: &Roster, from: Option<&SectionKey>, to: &SectionKey) -> bool {
    if from == Some(to) {
        return true;
    }
    let current = util::course_deviation(roster, &to.course, None, None);
    let post = util::course_deviation(roster, &to.course, from, Some(to));
    (current < BALANCE_THRESHOLD && post < BALANCE_THRESHOLD) || post < current
}
