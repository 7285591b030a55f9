#![forbid(unsafe_code)]
//! Inscription — résolution de demandes d'inscription sur un horaire
//! hebdomadaire fixe (sans BD).
//!
//! - Quatre types de demandes : inscription, retrait, changement de turma,
//!   changement d'UC.
//! - Files FIFO par type, traitement par lot dans un ordre fixe, undo LIFO.
//! - Validation capacité / équilibre / chevauchement ; rejets rendus en
//!   données, jamais levés.
//! - Stockage fichiers (JSON/CSV).

pub mod engine;
pub mod io;
pub mod model;
pub mod storage;
pub mod timetable;

pub use engine::{
    AcceptedEntry, BatchReport, Engine, EngineError, Rejection, RejectionReason, Request,
    RequestKind, SubmitError, BALANCE_THRESHOLD,
};
pub use model::{
    Lesson, LessonKind, Roster, RosterError, Section, SectionKey, Student, StudentId, MAX_CAPACITY,
};
pub use storage::{JsonStorage, Storage};
pub use timetable::{prepare_schedule, ScheduleRenderer, TextSchedule, WeeklySchedule};
