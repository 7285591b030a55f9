#![forbid(unsafe_code)]
use inscription::{
    engine::check_balance, Engine, RejectionReason, RequestKind, Roster, SectionKey, StudentId,
    SubmitError, MAX_CAPACITY,
};

/// Trois UCs, turmas sans aulas (aucun conflit d'horaire possible) :
/// A/{A1, A2}, B/{B1}, C/{C1}.
fn sample_roster() -> Roster {
    let mut roster = Roster::default();
    for key in [
        SectionKey::new("A", "A1"),
        SectionKey::new("A", "A2"),
        SectionKey::new("B", "B1"),
        SectionKey::new("C", "C1"),
    ] {
        roster.upsert_section(key);
    }
    roster
}

fn assert_invariants(roster: &Roster) {
    for section in roster.sections.values() {
        assert!(section.len() <= MAX_CAPACITY);
        for id in &section.students {
            let student = roster.find_student(*id).unwrap();
            assert_eq!(student.section_of(&section.key.course), Some(&section.key));
        }
    }
    for student in roster.students.values() {
        let mut courses: Vec<_> = student.sections.iter().map(|k| &k.course).collect();
        courses.sort();
        courses.dedup();
        assert_eq!(courses.len(), student.sections.len(), "dup course for {}", student.id);
        for key in &student.sections {
            assert!(roster
                .find_section(key)
                .unwrap()
                .students
                .contains(&student.id));
        }
        let lessons = roster.lessons_of_student(student.id).unwrap();
        for (i, a) in lessons.iter().enumerate() {
            for b in lessons.iter().skip(i + 1) {
                assert!(!a.overlaps(b), "overlap kept for {}", student.id);
            }
        }
    }
}

#[test]
fn processing_order_is_fixed() {
    let mut roster = sample_roster();
    roster
        .load_enrollments(vec![
            (StudentId::new(1), "S1".to_string(), SectionKey::new("A", "A1")),
            (StudentId::new(3), "S3".to_string(), SectionKey::new("A", "A1")),
            (StudentId::new(4), "S4".to_string(), SectionKey::new("C", "C1")),
        ])
        .unwrap();
    roster.upsert_student(StudentId::new(2), "S2");

    let mut engine = Engine::with_roster(roster);
    // soumission volontairement dans le désordre
    engine
        .submit_change_course(StudentId::new(4), "C", "B", "B1")
        .unwrap();
    engine.submit_change_class(StudentId::new(3), "A", "A2").unwrap();
    engine.submit_enroll(StudentId::new(2), "B", "B1").unwrap();
    engine.submit_withdraw(StudentId::new(1), "A").unwrap();

    assert_eq!(engine.pending_count(), 4);
    let report = engine.process_all().unwrap();
    assert_eq!(engine.pending_count(), 0);
    assert!(report.rejected.is_empty());

    let kinds: Vec<RequestKind> = report.accepted.iter().map(|e| e.request.kind).collect();
    assert_eq!(
        kinds,
        vec![
            RequestKind::Withdraw,
            RequestKind::Enroll,
            RequestKind::ChangeClass,
            RequestKind::ChangeCourse,
        ]
    );
    assert_invariants(engine.roster());
}

#[test]
fn duplicate_enrolls_keep_one_section_per_course() {
    let mut roster = sample_roster();
    roster.upsert_student(StudentId::new(2), "S2");
    let mut engine = Engine::with_roster(roster);

    // les deux passent à la soumission : ni l'une ni l'autre n'est
    // encore appliquée
    engine.submit_enroll(StudentId::new(2), "A", "A1").unwrap();
    engine.submit_enroll(StudentId::new(2), "A", "A2").unwrap();
    let report = engine.process_all().unwrap();

    assert_eq!(report.accepted.len(), 1);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].reason, RejectionReason::Superseded);
    assert_eq!(
        engine
            .roster()
            .find_student(StudentId::new(2))
            .unwrap()
            .sections,
        vec![SectionKey::new("A", "A1")]
    );
    assert_invariants(engine.roster());
}

#[test]
fn withdraw_makes_later_changes_stale_without_aborting_the_batch() {
    let mut roster = sample_roster();
    roster
        .load_enrollments(vec![
            (StudentId::new(1), "S1".to_string(), SectionKey::new("A", "A1")),
        ])
        .unwrap();
    roster.upsert_student(StudentId::new(2), "S2");
    let mut engine = Engine::with_roster(roster);

    // valides à la soumission ; le retrait, traité en premier, rend les
    // deux changements caducs sans empêcher l'inscription de S2
    engine.submit_change_class(StudentId::new(1), "A", "A2").unwrap();
    engine
        .submit_change_course(StudentId::new(1), "A", "B", "B1")
        .unwrap();
    engine.submit_withdraw(StudentId::new(1), "A").unwrap();
    engine.submit_enroll(StudentId::new(2), "B", "B1").unwrap();

    let report = engine.process_all().unwrap();
    assert_eq!(engine.pending_count(), 0);

    let accepted: Vec<RequestKind> = report.accepted.iter().map(|e| e.request.kind).collect();
    assert_eq!(accepted, vec![RequestKind::Withdraw, RequestKind::Enroll]);
    let rejected: Vec<RequestKind> = report.rejected.iter().map(|r| r.request.kind).collect();
    assert_eq!(rejected, vec![RequestKind::ChangeClass, RequestKind::ChangeCourse]);
    assert!(report
        .rejected
        .iter()
        .all(|r| r.reason == RejectionReason::Superseded));

    assert!(engine
        .roster()
        .find_student(StudentId::new(1))
        .unwrap()
        .sections
        .is_empty());
    assert_invariants(engine.roster());
}

#[test]
fn duplicate_withdraws_accept_only_the_first() {
    let key = SectionKey::new("A", "A1");
    let mut roster = sample_roster();
    roster
        .load_enrollments(vec![(StudentId::new(1), "S1".to_string(), key.clone())])
        .unwrap();
    let before = roster.clone();

    let mut engine = Engine::with_roster(roster);
    engine.submit_withdraw(StudentId::new(1), "A").unwrap();
    engine.submit_withdraw(StudentId::new(1), "A").unwrap();
    let report = engine.process_all().unwrap();

    assert_eq!(report.accepted.len(), 1);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].reason, RejectionReason::Superseded);
    assert_eq!(engine.history_len(), 1);

    // un seul pas dans l'historique : défaire rend exactement l'état initial
    engine.undo_last().unwrap().unwrap();
    assert!(engine.undo_last().unwrap().is_none());
    assert_eq!(engine.roster(), &before);
}

/// UC Y à deux turmas, effectifs 10 et 2 : s'inscrire côté 2 réduit
/// l'écart-type (4.0 -> 3.5), côté 10 l'aggrave (4.0 -> 4.5).
fn unbalanced_roster() -> (Roster, SectionKey, SectionKey) {
    let y1 = SectionKey::new("Y", "Y1");
    let y2 = SectionKey::new("Y", "Y2");
    let mut roster = Roster::default();
    roster.upsert_section(y1.clone());
    roster.upsert_section(y2.clone());
    let mut rows = Vec::new();
    for i in 101..=110 {
        rows.push((StudentId::new(i), format!("S{i}"), y1.clone()));
    }
    for i in 201..=202 {
        rows.push((StudentId::new(i), format!("S{i}"), y2.clone()));
    }
    roster.load_enrollments(rows).unwrap();
    (roster, y1, y2)
}

#[test]
fn balance_rejects_widening_and_accepts_narrowing() {
    let (mut roster, _y1, _y2) = unbalanced_roster();
    roster.upsert_student(StudentId::new(301), "Q");
    roster.upsert_student(StudentId::new(302), "R");

    let mut engine = Engine::with_roster(roster);
    // FIFO : la demande vers Y1 est traitée en premier, sur l'état 10/2
    engine.submit_enroll(StudentId::new(302), "Y", "Y1").unwrap();
    engine.submit_enroll(StudentId::new(301), "Y", "Y2").unwrap();
    let report = engine.process_all().unwrap();

    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].request.student, StudentId::new(302));
    assert_eq!(report.rejected[0].reason, RejectionReason::BalanceViolation);

    assert_eq!(report.accepted.len(), 1);
    assert_eq!(report.accepted[0].request.student, StudentId::new(301));
    assert_invariants(engine.roster());
}

#[test]
fn check_balance_direct() {
    let (roster, y1, y2) = unbalanced_roster();

    assert!(!check_balance(&roster, None, &y1));
    assert!(check_balance(&roster, None, &y2));
    // appel symétrique : no-op accepté, même sur une UC déséquilibrée
    assert!(check_balance(&roster, Some(&y1), &y1));
    // déplacement Y1 -> Y2 : [9, 3], écart 3.0 < 4 -> accepté
    assert!(check_balance(&roster, Some(&y1), &y2));
    // déplacement Y2 -> Y1 : [11, 1], écart 5.0 -> refusé
    assert!(!check_balance(&roster, Some(&y2), &y1));
}

#[test]
fn roster_queries() {
    let (roster, y1, _y2) = unbalanced_roster();

    assert_eq!(roster.fullest_section("Y"), Some((y1, 10)));
    assert_eq!(roster.students_with_at_least(1), 12);
    assert_eq!(roster.students_with_at_least(2), 0);
    assert_eq!(
        roster.section_sizes("Y").iter().map(|(_, n)| *n).collect::<Vec<_>>(),
        vec![10, 2]
    );
}

#[test]
fn undo_enroll_restores_exact_state() {
    let mut roster = sample_roster();
    roster.upsert_student(StudentId::new(5), "S5");
    let before = roster.clone();

    let mut engine = Engine::with_roster(roster);
    engine.submit_enroll(StudentId::new(5), "B", "B1").unwrap();
    engine.process_all().unwrap();
    assert_ne!(engine.roster(), &before);

    let undone = engine.undo_last().unwrap().unwrap();
    assert_eq!(undone.request.kind, RequestKind::Enroll);
    assert_eq!(engine.roster(), &before);
}

#[test]
fn undo_on_empty_history_mutates_nothing() {
    let roster = sample_roster();
    let before = roster.clone();
    let mut engine = Engine::with_roster(roster);

    assert!(engine.undo_last().unwrap().is_none());
    assert_eq!(engine.roster(), &before);
}

#[test]
fn undo_withdraw_reenrolls() {
    let key = SectionKey::new("A", "A1");
    let mut roster = sample_roster();
    roster
        .load_enrollments(vec![(StudentId::new(1), "S1".to_string(), key.clone())])
        .unwrap();
    let before = roster.clone();

    let mut engine = Engine::with_roster(roster);
    engine.submit_withdraw(StudentId::new(1), "A").unwrap();
    engine.process_all().unwrap();
    assert!(engine.roster().find_section(&key).unwrap().is_empty());

    engine.undo_last().unwrap().unwrap();
    assert_eq!(engine.roster(), &before);
}

#[test]
fn undo_change_class_moves_back() {
    let a1 = SectionKey::new("A", "A1");
    let a2 = SectionKey::new("A", "A2");
    let mut roster = sample_roster();
    roster
        .load_enrollments(vec![(StudentId::new(1), "S1".to_string(), a1.clone())])
        .unwrap();

    let mut engine = Engine::with_roster(roster);
    engine.submit_change_class(StudentId::new(1), "A", "A2").unwrap();
    let report = engine.process_all().unwrap();
    assert_eq!(report.accepted.len(), 1);
    assert_eq!(report.accepted[0].prior_section, Some(a1.clone()));
    assert_eq!(
        engine
            .roster()
            .find_student(StudentId::new(1))
            .unwrap()
            .section_of("A"),
        Some(&a2)
    );

    engine.undo_last().unwrap().unwrap();
    assert_eq!(
        engine
            .roster()
            .find_student(StudentId::new(1))
            .unwrap()
            .section_of("A"),
        Some(&a1)
    );
    assert!(engine.roster().find_section(&a2).unwrap().is_empty());
    assert_invariants(engine.roster());
}

#[test]
fn undo_change_course_moves_back() {
    let c1 = SectionKey::new("C", "C1");
    let b1 = SectionKey::new("B", "B1");
    let mut roster = sample_roster();
    roster
        .load_enrollments(vec![(StudentId::new(4), "S4".to_string(), c1.clone())])
        .unwrap();
    let before = roster.clone();

    let mut engine = Engine::with_roster(roster);
    engine
        .submit_change_course(StudentId::new(4), "C", "B", "B1")
        .unwrap();
    let report = engine.process_all().unwrap();
    assert_eq!(report.accepted[0].prior_section, Some(c1));
    assert!(engine
        .roster()
        .find_section(&b1)
        .unwrap()
        .students
        .contains(&StudentId::new(4)));

    engine.undo_last().unwrap().unwrap();
    assert_eq!(engine.roster(), &before);
}

#[test]
fn submission_errors_never_enqueue() {
    let mut roster = sample_roster();
    roster
        .load_enrollments(vec![
            (StudentId::new(1), "S1".to_string(), SectionKey::new("A", "A1")),
        ])
        .unwrap();
    let mut engine = Engine::with_roster(roster);

    assert!(matches!(
        engine.submit_enroll(StudentId::new(9), "A", "A1"),
        Err(SubmitError::UnknownStudent(_))
    ));
    assert!(matches!(
        engine.submit_enroll(StudentId::new(1), "Z", "Z1"),
        Err(SubmitError::UnknownCourse(_))
    ));
    assert!(matches!(
        engine.submit_enroll(StudentId::new(1), "A", "A9"),
        Err(SubmitError::UnknownSection(_))
    ));
    assert!(matches!(
        engine.submit_enroll(StudentId::new(1), "A", "A2"),
        Err(SubmitError::AlreadyEnrolled { .. })
    ));
    assert!(matches!(
        engine.submit_withdraw(StudentId::new(1), "B"),
        Err(SubmitError::NotEnrolled { .. })
    ));
    assert!(matches!(
        engine.submit_change_class(StudentId::new(1), "B", "B1"),
        Err(SubmitError::NotEnrolled { .. })
    ));
    assert!(matches!(
        engine.submit_change_course(StudentId::new(1), "B", "C", "C1"),
        Err(SubmitError::NotEnrolled { .. })
    ));
    assert!(matches!(
        engine.submit_change_course(StudentId::new(1), "A", "A", "A2"),
        Err(SubmitError::AlreadyEnrolled { .. })
    ));

    assert_eq!(engine.pending_count(), 0);
}

#[test]
fn rejection_log_drains_once() {
    let (mut roster, _y1, _y2) = unbalanced_roster();
    roster.upsert_student(StudentId::new(302), "R");

    let mut engine = Engine::with_roster(roster);
    engine.submit_enroll(StudentId::new(302), "Y", "Y1").unwrap();
    engine.process_all().unwrap();

    let drained = engine.drain_rejections();
    assert_eq!(drained.len(), 1);
    assert!(engine.drain_rejections().is_empty());
}
