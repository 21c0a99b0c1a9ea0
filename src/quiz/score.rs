use crate::quiz::QuizForm;

/// Number of questions whose selected choice is the correct one.
/// Unanswered questions simply don't count.
pub fn score(form: &QuizForm) -> u32 {
    (0..form.len())
        .filter_map(|index| form.selected_choice(index))
        .filter(|choice| choice.is_correct)
        .count() as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreReport {
    pub score: u32,
    pub total: u32,
    pub answered: u32,
}

pub fn report(form: &QuizForm) -> ScoreReport {
    ScoreReport {
        score: score(form),
        total: form.len() as u32,
        answered: form.answered_count() as u32,
    }
}
