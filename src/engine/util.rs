use crate::model::{Roster, SectionKey};

/// Écart-type de population (division par l'effectif, pas n-1).
pub(super) fn population_stddev(counts: &[f64]) -> f64 {
    if counts.is_empty() {
        return 0.0;
    }
    let n = counts.len() as f64;
    let mean = counts.iter().sum::<f64>() / n;
    let variance = counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Écart-type des effectifs des turmas d'une UC, avec ajustements
/// hypothétiques : `minus` perd un étudiant, `plus` en gagne un.
/// Une clé hors de l'UC est simplement ignorée.
pub(super) fn course_deviation(
    roster: &Roster,
    course: &str,
    minus: Option<&SectionKey>,
    plus: Option<&SectionKey>,
) -> f64 {
    let counts: Vec<f64> = roster
        .sections
        .iter()
        .filter(|(key, _)| key.course == course)
        .map(|(key, section)| {
            let mut count = section.len() as f64;
            if Some(key) == minus {
                count -= 1.0;
            }
            if Some(key) == plus {
                count += 1.0;
            }
            count
        })
        .collect();
    population_stddev(&counts)
}
