use super::types::{AcceptedEntry, BatchReport, EngineError, Rejection, RejectionReason, Request};
use super::{validate, Engine};
use crate::model::RosterError;
use anyhow::anyhow;

fn reject(report: &mut BatchReport, request: Request, reason: RejectionReason) {
    report.rejected.push(Rejection { request, reason });
}

fn accept(engine: &mut Engine, report: &mut BatchReport, entry: AcceptedEntry) {
    engine.accepted.push(entry.clone());
    report.accepted.push(entry);
}

/// Un retrait libère de la place et ne peut qu'aider les invariants :
/// aucune validation au-delà du réexamen d'éligibilité. Comme pour les
/// autres types, une demande antérieure du lot peut l'avoir rendue caduque.
pub(super) fn resolve_withdraw(
    engine: &mut Engine,
    request: Request,
    report: &mut BatchReport,
) -> Result<(), EngineError> {
    let held = engine
        .roster
        .find_student(request.student)
        .ok_or(RosterError::StudentNotFound(request.student))?
        .section_of(&request.target.course);
    if held != Some(&request.target) {
        reject(report, request, RejectionReason::Superseded);
        return Ok(());
    }
    engine
        .roster
        .remove_student_from_section(request.student, &request.target)?;
    let entry = AcceptedEntry {
        request,
        prior_section: None,
    };
    accept(engine, report, entry);
    Ok(())
}

pub(super) fn resolve_enroll(
    engine: &mut Engine,
    request: Request,
    report: &mut BatchReport,
) -> Result<(), EngineError> {
    let student = engine
        .roster
        .find_student(request.student)
        .ok_or(RosterError::StudentNotFound(request.student))?;
    if student.is_enrolled_in(&request.target.course) {
        reject(report, request, RejectionReason::Superseded);
        return Ok(());
    }
    let section = engine
        .roster
        .find_section(&request.target)
        .ok_or_else(|| RosterError::SectionNotFound(request.target.clone()))?;

    if validate::check_capacity(section) {
        reject(report, request, RejectionReason::CapacityExceeded);
        return Ok(());
    }
    if !validate::check_balance(&engine.roster, None, &request.target) {
        reject(report, request, RejectionReason::BalanceViolation);
        return Ok(());
    }
    if validate::check_overlap(&engine.roster, request.student, section)? {
        reject(report, request, RejectionReason::ScheduleConflict);
        return Ok(());
    }

    engine
        .roster
        .add_student_to_section(request.student, &request.target)?;
    let entry = AcceptedEntry {
        request,
        prior_section: None,
    };
    accept(engine, report, entry);
    Ok(())
}

pub(super) fn resolve_change_class(
    engine: &mut Engine,
    request: Request,
    report: &mut BatchReport,
) -> Result<(), EngineError> {
    let current = engine
        .roster
        .find_student(request.student)
        .ok_or(RosterError::StudentNotFound(request.student))?
        .section_of(&request.target.course)
        .cloned();
    let Some(current) = current else {
        // plus inscrit à l'UC : caduque, le lot continue
        reject(report, request, RejectionReason::Superseded);
        return Ok(());
    };
    let section = engine
        .roster
        .find_section(&request.target)
        .ok_or_else(|| RosterError::SectionNotFound(request.target.clone()))?;

    if validate::check_capacity(section) {
        reject(report, request, RejectionReason::CapacityExceeded);
        return Ok(());
    }
    if !validate::check_balance(&engine.roster, Some(&current), &request.target) {
        reject(report, request, RejectionReason::BalanceViolation);
        return Ok(());
    }
    if validate::check_overlap(&engine.roster, request.student, section)? {
        reject(report, request, RejectionReason::ScheduleConflict);
        return Ok(());
    }

    engine
        .roster
        .move_student_to_section(request.student, &current, &request.target)?;
    let entry = AcceptedEntry {
        request,
        prior_section: Some(current),
    };
    accept(engine, report, entry);
    Ok(())
}

pub(super) fn resolve_change_course(
    engine: &mut Engine,
    request: Request,
    report: &mut BatchReport,
) -> Result<(), EngineError> {
    let previous_course = request
        .previous_course
        .clone()
        .ok_or_else(|| anyhow!("change-course request without a previous course"))?;
    let student = engine
        .roster
        .find_student(request.student)
        .ok_or(RosterError::StudentNotFound(request.student))?;
    if student.is_enrolled_in(&request.target.course) {
        reject(report, request, RejectionReason::Superseded);
        return Ok(());
    }
    let current = student.section_of(&previous_course).cloned();
    let Some(current) = current else {
        // source quittée entre-temps : caduque, le lot continue
        reject(report, request, RejectionReason::Superseded);
        return Ok(());
    };
    let section = engine
        .roster
        .find_section(&request.target)
        .ok_or_else(|| RosterError::SectionNotFound(request.target.clone()))?;

    if validate::check_capacity(section) {
        reject(report, request, RejectionReason::CapacityExceeded);
        return Ok(());
    }
    if !validate::check_balance(&engine.roster, None, &request.target) {
        reject(report, request, RejectionReason::BalanceViolation);
        return Ok(());
    }
    if validate::check_overlap(&engine.roster, request.student, section)? {
        reject(report, request, RejectionReason::ScheduleConflict);
        return Ok(());
    }

    engine
        .roster
        .move_student_to_section(request.student, &current, &request.target)?;
    let entry = AcceptedEntry {
        request,
        prior_section: Some(current),
    };
    accept(engine, report, entry);
    Ok(())
}
