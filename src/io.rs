use crate::model::{Lesson, LessonKind, Roster, SectionKey, StudentId};
use anyhow::{bail, Context};
use chrono::{NaiveTime, Weekday};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::path::Path;

/// Import du catalogue depuis CSV :
/// header `ClassCode,UcCode,WeekDay,StartHour,Duration,ClassType`.
/// Heures en décimal (10.5 = 10:30), type "T" / "TP" / "PL".
pub fn import_catalog_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Lesson>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let class_code = rec.get(0).context("missing ClassCode")?.trim();
        let course_code = rec.get(1).context("missing UcCode")?.trim();
        if class_code.is_empty() || course_code.is_empty() {
            bail!("invalid catalog row (empty codes)");
        }
        let weekday = parse_weekday(rec.get(2).context("missing WeekDay")?.trim())?;
        let start = parse_decimal_hour(rec.get(3).context("missing StartHour")?.trim())?;
        let duration_min = parse_duration_min(rec.get(4).context("missing Duration")?.trim())?;
        let kind_raw = rec.get(5).context("missing ClassType")?.trim();
        let kind = LessonKind::from_code(kind_raw)
            .with_context(|| format!("invalid lesson type: {kind_raw}"))?;
        let section = SectionKey::new(course_code, class_code);
        out.push(Lesson::new(weekday, start, duration_min, kind, section));
    }
    Ok(out)
}

fn parse_weekday(raw: &str) -> anyhow::Result<Weekday> {
    raw.parse::<Weekday>()
        .map_err(|_| anyhow::anyhow!("invalid weekday: {raw}"))
}

/// "10.5" -> 10:30. Les horaires sont alignés sur la demi-heure ; on
/// arrondit à la minute.
fn parse_decimal_hour(raw: &str) -> anyhow::Result<NaiveTime> {
    let hours: f64 = raw
        .parse()
        .with_context(|| format!("invalid decimal hour: {raw}"))?;
    if !(0.0..24.0).contains(&hours) {
        bail!("hour out of range: {raw}");
    }
    let total_min = (hours * 60.0).round() as u32;
    NaiveTime::from_hms_opt(total_min / 60, total_min % 60, 0)
        .with_context(|| format!("invalid time: {raw}"))
}

fn parse_duration_min(raw: &str) -> anyhow::Result<u32> {
    let hours: f64 = raw
        .parse()
        .with_context(|| format!("invalid duration: {raw}"))?;
    if hours <= 0.0 || hours > 24.0 {
        bail!("duration out of range: {raw}");
    }
    Ok((hours * 60.0).round() as u32)
}

/// Import des inscriptions initiales :
/// header `StudentCode,StudentName,UcCode,ClassCode`.
pub fn import_enrollments_csv<P: AsRef<Path>>(
    path: P,
) -> anyhow::Result<Vec<(StudentId, String, SectionKey)>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let code_raw = rec.get(0).context("missing StudentCode")?.trim();
        let code: u32 = code_raw
            .parse()
            .with_context(|| format!("invalid student code: {code_raw}"))?;
        let name = rec.get(1).context("missing StudentName")?.trim();
        let course = rec.get(2).context("missing UcCode")?.trim();
        let class_code = rec.get(3).context("missing ClassCode")?.trim();
        if name.is_empty() || course.is_empty() || class_code.is_empty() {
            bail!("invalid enrollment row for student {code_raw}");
        }
        out.push((
            StudentId::new(code),
            name.to_string(),
            SectionKey::new(course, class_code),
        ));
    }
    Ok(out)
}

/// Export CSV des inscriptions, même forme que l'import. Appelé par le
/// pilote après chaque lot traité (et après un undo).
pub fn export_enrollments_csv<P: AsRef<Path>>(path: P, roster: &Roster) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["StudentCode", "StudentName", "UcCode", "ClassCode"])?;
    let mut code_buf = itoa::Buffer::new();
    for student in roster.students.values() {
        for key in &student.sections {
            w.write_record([
                code_buf.format(student.id.code()),
                student.name.as_str(),
                key.course.as_str(),
                key.section.as_str(),
            ])?;
        }
    }
    w.flush()?;
    Ok(())
}

/// Export JSON du roster (jolie mise en forme).
pub fn export_roster_json<P: AsRef<Path>>(path: P, roster: &Roster) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(roster)?;
    fs::write(path, s)?;
    Ok(())
}
