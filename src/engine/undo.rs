use super::types::{AcceptedEntry, EngineError, RequestKind};
use super::Engine;
use anyhow::anyhow;

/// Défait la dernière demande acceptée en appliquant la mutation inverse,
/// sans revalider capacité/équilibre/chevauchement : on restaure un état
/// qui était valide.
pub(super) fn undo_last(engine: &mut Engine) -> Result<Option<AcceptedEntry>, EngineError> {
    let Some(entry) = engine.accepted.pop() else {
        return Ok(None);
    };

    match entry.request.kind {
        RequestKind::Enroll => {
            engine
                .roster
                .remove_student_from_section(entry.request.student, &entry.request.target)?;
        }
        RequestKind::Withdraw => {
            engine
                .roster
                .add_student_to_section(entry.request.student, &entry.request.target)?;
        }
        RequestKind::ChangeClass | RequestKind::ChangeCourse => {
            let prior = entry.prior_section.clone().ok_or_else(|| {
                anyhow!(
                    "accepted {:?} entry without a prior section",
                    entry.request.kind
                )
            })?;
            engine
                .roster
                .move_student_to_section(entry.request.student, &entry.request.target, &prior)?;
        }
    }

    Ok(Some(entry))
}
