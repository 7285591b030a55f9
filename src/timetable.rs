use crate::model::{Lesson, Roster, StudentId};
use anyhow::{Context, Result};
use chrono::Weekday;

/// Horaire hebdomadaire rendu pour un étudiant.
#[derive(Debug, Clone)]
pub struct WeeklySchedule {
    pub student: StudentId,
    pub student_name: String,
    pub content: String,
}

/// Permet de customiser le rendu de l'horaire (texte, HTML, etc.).
pub trait ScheduleRenderer {
    fn render(&self, name: &str, id: StudentId, lessons: &[Lesson]) -> String;
}

/// Rendu texte simple, une section par jour.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextSchedule;

impl ScheduleRenderer for TextSchedule {
    fn render(&self, name: &str, id: StudentId, lessons: &[Lesson]) -> String {
        let mut out = format!("Horaire de {id} - {name}\n");
        out.push_str("---------------------------------------------\n");
        let mut current_day: Option<Weekday> = None;
        for lesson in lessons {
            if current_day != Some(lesson.weekday) {
                current_day = Some(lesson.weekday);
                out.push_str(day_name(lesson.weekday));
                out.push_str(":\n");
            }
            out.push_str(&format!(
                "{} to {} -> {} ({})\n",
                lesson.start.format("%H:%M"),
                lesson.end().format("%H:%M"),
                lesson.section,
                lesson.kind.code()
            ));
        }
        out
    }
}

fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Prépare l'horaire hebdomadaire d'un étudiant, aulas triées par
/// (jour, début).
pub fn prepare_schedule(
    roster: &Roster,
    id: StudentId,
    renderer: &dyn ScheduleRenderer,
) -> Result<WeeklySchedule> {
    let student = roster
        .find_student(id)
        .with_context(|| format!("unknown student: {id}"))?;
    let lessons = roster
        .lessons_of_student(id)
        .with_context(|| format!("inconsistent roster for {id}"))?;
    let content = renderer.render(&student.name, id, &lessons);
    Ok(WeeklySchedule {
        student: id,
        student_name: student.name.clone(),
        content,
    })
}
