use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

/// Capacité maximale d'une turma.
pub const MAX_CAPACITY: usize = 30;

/// Identifiant fort pour Student (numéro UP).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StudentId(u32);

impl StudentId {
    pub fn new(code: u32) -> Self {
        Self(code)
    }
    pub fn code(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "up{}", self.0)
    }
}

/// Identifie une turma d'une unité curriculaire : (code UC, code turma).
/// L'ordre dérivé suit l'ordre des champs : UC d'abord, turma ensuite.
/// Sérialisée comme `"UC/turma"` pour servir de clé d'objet JSON
/// (serde_json exige des clés chaînes).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct SectionKey {
    pub course: String,
    pub section: String,
}

impl SectionKey {
    pub fn new<C: Into<String>, S: Into<String>>(course: C, section: S) -> Self {
        Self {
            course: course.into(),
            section: section.into(),
        }
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.course, self.section)
    }
}

impl From<SectionKey> for String {
    fn from(key: SectionKey) -> Self {
        key.to_string()
    }
}

impl std::str::FromStr for SectionKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (course, section) = s
            .split_once('/')
            .ok_or_else(|| format!("invalid section key (expected UC/turma): {s}"))?;
        if course.is_empty() || section.is_empty() {
            return Err(format!("invalid section key (empty codes): {s}"));
        }
        Ok(Self::new(course, section))
    }
}

impl TryFrom<String> for SectionKey {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Type d'une aula ( "T" / "TP" / "PL" ).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LessonKind {
    Theory,
    TheoryPractice,
    Practical,
}

impl LessonKind {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "T" => Some(Self::Theory),
            "TP" => Some(Self::TheoryPractice),
            "PL" => Some(Self::Practical),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Theory => "T",
            Self::TheoryPractice => "TP",
            Self::Practical => "PL",
        }
    }
}

/// Aula hebdomadaire d'une turma (jour, début, durée en minutes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub weekday: Weekday,
    pub start: NaiveTime,
    pub duration_min: u32,
    pub kind: LessonKind,
    pub section: SectionKey,
}

impl Lesson {
    pub fn new(
        weekday: Weekday,
        start: NaiveTime,
        duration_min: u32,
        kind: LessonKind,
        section: SectionKey,
    ) -> Self {
        Self {
            weekday,
            start,
            duration_min,
            kind,
            section,
        }
    }

    /// Jour en numérique (Lundi = 0 .. Dimanche = 6).
    pub fn day_value(&self) -> u32 {
        self.weekday.num_days_from_monday()
    }

    /// Clé de tri chronologique : (jour, début).
    pub fn sort_key(&self) -> (u32, NaiveTime) {
        (self.day_value(), self.start)
    }

    fn start_min(&self) -> u32 {
        self.start.hour() * 60 + self.start.minute()
    }

    fn end_min(&self) -> u32 {
        self.start_min() + self.duration_min
    }

    /// Heure de fin de l'aula.
    pub fn end(&self) -> NaiveTime {
        self.start + chrono::Duration::minutes(i64::from(self.duration_min))
    }

    /// Deux aulas se chevauchent si : même jour, aucune des deux n'est
    /// théorique, et leurs intervalles semi-ouverts [début, fin) se coupent.
    pub fn overlaps(&self, other: &Lesson) -> bool {
        if self.weekday != other.weekday {
            return false;
        }
        if self.kind == LessonKind::Theory || other.kind == LessonKind::Theory {
            return false;
        }
        self.start_min() < other.end_min() && other.start_min() < self.end_min()
    }
}

/// Turma : son horaire (aulas, ajoutées uniquement au chargement) et les
/// étudiants inscrits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub key: SectionKey,
    pub lessons: Vec<Lesson>,
    pub students: BTreeSet<StudentId>,
}

impl Section {
    pub fn new(key: SectionKey) -> Self {
        Self {
            key,
            lessons: Vec::new(),
            students: BTreeSet::new(),
        }
    }

    pub fn add_lesson(&mut self, lesson: Lesson) {
        self.lessons.push(lesson);
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

/// Étudiant : au plus une turma par unité curriculaire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub sections: Vec<SectionKey>,
}

impl Student {
    pub fn new<N: Into<String>>(id: StudentId, name: N) -> Self {
        Self {
            id,
            name: name.into(),
            sections: Vec::new(),
        }
    }

    pub fn is_enrolled_in(&self, course: &str) -> bool {
        self.sections.iter().any(|k| k.course == course)
    }

    pub fn section_of(&self, course: &str) -> Option<&SectionKey> {
        self.sections.iter().find(|k| k.course == course)
    }

    pub fn add_section(&mut self, key: SectionKey) {
        self.sections.push(key);
    }

    /// Retire l'inscription à une UC, et rend la turma quittée.
    pub fn remove_section(&mut self, course: &str) -> Option<SectionKey> {
        let pos = self.sections.iter().position(|k| k.course == course)?;
        Some(self.sections.remove(pos))
    }
}

/// Recherche ratée dans le roster : incohérence entre une demande déjà
/// validée et l'état courant. Jamais silencieux.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    #[error("student not found: {0}")]
    StudentNotFound(StudentId),
    #[error("section not found: {0}")]
    SectionNotFound(SectionKey),
    #[error("{0} is not a member of section {1}")]
    MembershipNotFound(StudentId, SectionKey),
    #[error("{0} already holds a section of course {1}")]
    CourseAlreadyHeld(StudentId, String),
}

/// Roster complet : turmas et étudiants, à double sens
/// (étudiant ∈ turma ⟺ turma ∈ étudiant).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub sections: BTreeMap<SectionKey, Section>,
    pub students: BTreeMap<StudentId, Student>,
}

impl Roster {
    pub fn find_student(&self, id: StudentId) -> Option<&Student> {
        self.students.get(&id)
    }

    pub fn find_student_mut(&mut self, id: StudentId) -> Option<&mut Student> {
        self.students.get_mut(&id)
    }

    pub fn find_section(&self, key: &SectionKey) -> Option<&Section> {
        self.sections.get(key)
    }

    pub fn find_section_mut(&mut self, key: &SectionKey) -> Option<&mut Section> {
        self.sections.get_mut(key)
    }

    pub fn course_exists(&self, course: &str) -> bool {
        self.sections.keys().any(|k| k.course == course)
    }

    /// Turma existante ou créée vide (chargement du catalogue).
    pub fn upsert_section(&mut self, key: SectionKey) -> &mut Section {
        self.sections
            .entry(key.clone())
            .or_insert_with(|| Section::new(key))
    }

    /// Étudiant existant ou créé à la première référence.
    pub fn upsert_student(&mut self, id: StudentId, name: &str) -> &mut Student {
        self.students
            .entry(id)
            .or_insert_with(|| Student::new(id, name))
    }

    /// Inscrit l'étudiant dans la turma, des deux côtés à la fois.
    /// Aucune vérification de capacité/chevauchement/équilibre ici, mais
    /// une seconde turma de la même UC est refusée : au plus une par UC.
    pub fn add_student_to_section(
        &mut self,
        id: StudentId,
        key: &SectionKey,
    ) -> Result<(), RosterError> {
        let student = self
            .students
            .get(&id)
            .ok_or(RosterError::StudentNotFound(id))?;
        if student.is_enrolled_in(&key.course) {
            return Err(RosterError::CourseAlreadyHeld(id, key.course.clone()));
        }
        let section = self
            .sections
            .get_mut(key)
            .ok_or_else(|| RosterError::SectionNotFound(key.clone()))?;
        section.students.insert(id);
        self.students
            .get_mut(&id)
            .ok_or(RosterError::StudentNotFound(id))?
            .add_section(key.clone());
        Ok(())
    }

    /// Désinscrit l'étudiant de la turma, des deux côtés à la fois.
    /// Erreur si l'inscription n'existait pas : un retrait qui ne retire
    /// rien trahit une incohérence, jamais un succès silencieux.
    pub fn remove_student_from_section(
        &mut self,
        id: StudentId,
        key: &SectionKey,
    ) -> Result<(), RosterError> {
        if !self.students.contains_key(&id) {
            return Err(RosterError::StudentNotFound(id));
        }
        let section = self
            .sections
            .get_mut(key)
            .ok_or_else(|| RosterError::SectionNotFound(key.clone()))?;
        if !section.students.remove(&id) {
            return Err(RosterError::MembershipNotFound(id, key.clone()));
        }
        self.students
            .get_mut(&id)
            .ok_or(RosterError::StudentNotFound(id))?
            .remove_section(&key.course)
            .ok_or_else(|| RosterError::MembershipNotFound(id, key.clone()))?;
        Ok(())
    }

    /// Déplace l'étudiant vers une autre turma (même UC ou non), et rend la
    /// turma quittée.
    pub fn move_student_to_section(
        &mut self,
        id: StudentId,
        from: &SectionKey,
        to: &SectionKey,
    ) -> Result<SectionKey, RosterError> {
        self.remove_student_from_section(id, from)?;
        self.add_student_to_section(id, to)?;
        Ok(from.clone())
    }

    /// Charge le catalogue : les clés dupliquées accumulent leurs aulas
    /// dans la même turma.
    pub fn load_catalog(&mut self, lessons: impl IntoIterator<Item = Lesson>) {
        for lesson in lessons {
            self.upsert_section(lesson.section.clone()).add_lesson(lesson);
        }
    }

    /// Charge les inscriptions initiales ; les étudiants sont créés à la
    /// première référence. La turma doit exister dans le catalogue.
    pub fn load_enrollments(
        &mut self,
        rows: impl IntoIterator<Item = (StudentId, String, SectionKey)>,
    ) -> Result<(), RosterError> {
        for (id, name, key) in rows {
            self.upsert_student(id, &name);
            self.add_student_to_section(id, &key)?;
        }
        Ok(())
    }

    /// Toutes les aulas d'un étudiant, triées chronologiquement.
    pub fn lessons_of_student(&self, id: StudentId) -> Result<Vec<Lesson>, RosterError> {
        let student = self
            .find_student(id)
            .ok_or(RosterError::StudentNotFound(id))?;
        let mut lessons = Vec::new();
        for key in &student.sections {
            let section = self
                .find_section(key)
                .ok_or_else(|| RosterError::SectionNotFound(key.clone()))?;
            lessons.extend(section.lessons.iter().cloned());
        }
        lessons.sort_by_key(Lesson::sort_key);
        Ok(lessons)
    }

    /// Effectifs des turmas d'une UC, par clé croissante.
    pub fn section_sizes(&self, course: &str) -> Vec<(SectionKey, usize)> {
        self.sections
            .iter()
            .filter(|(k, _)| k.course == course)
            .map(|(k, s)| (k.clone(), s.len()))
            .collect()
    }

    /// Nombre d'étudiants inscrits à au moins `n` UCs.
    pub fn students_with_at_least(&self, n: usize) -> usize {
        self.students
            .values()
            .filter(|s| s.sections.len() >= n)
            .count()
    }

    /// Turma la plus remplie d'une UC.
    pub fn fullest_section(&self, course: &str) -> Option<(SectionKey, usize)> {
        self.section_sizes(course)
            .into_iter()
            .max_by_key(|(_, n)| *n)
    }
}
