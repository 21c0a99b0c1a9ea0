use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::quiz::score::ScoreReport;
use crate::quiz::QuizForm;
use crate::store::ledger::ScoreEntry;

pub const PLAY: &str = "Play";
pub const NEW_PLAYER: &str = "New player";
pub const LEADERBOARD: &str = "Leaderboard";
pub const FINISH_GAME: &str = "Finish game";

const SUBMIT_PREFIX: &str = "submit";
const ANSWER_PREFIX: &str = "answer";

/// What a press on one of the inline buttons of a round asks for.
/// Every action carries the round id of the form its button was drawn for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Answer {
        round: u32,
        question: usize,
        choice: usize,
    },
    Submit {
        round: u32,
    },
}

impl FormAction {
    pub fn parse(data: &str) -> Option<Self> {
        let mut parts = data.split(':');
        let action = match parts.next()? {
            SUBMIT_PREFIX => FormAction::Submit {
                round: parts.next()?.parse().ok()?,
            },
            ANSWER_PREFIX => FormAction::Answer {
                round: parts.next()?.parse().ok()?,
                question: parts.next()?.parse().ok()?,
                choice: parts.next()?.parse().ok()?,
            },
            _ => return None,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(action)
    }

    pub fn data(&self) -> String {
        match self {
            FormAction::Answer {
                round,
                question,
                choice,
            } => format!("{}:{}:{}:{}", ANSWER_PREFIX, round, question, choice),
            FormAction::Submit { round } => format!("{}:{}", SUBMIT_PREFIX, round),
        }
    }

    pub fn round(&self) -> u32 {
        match self {
            FormAction::Answer { round, .. } | FormAction::Submit { round } => *round,
        }
    }

    /// Buttons left over from an earlier round must not touch `form`.
    pub fn belongs_to(&self, form: &QuizForm) -> bool {
        self.round() == form.round
    }
}

pub fn menu_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![KeyboardButton::new(PLAY), KeyboardButton::new(LEADERBOARD)],
        vec![KeyboardButton::new(NEW_PLAYER)],
    ])
}

pub fn round_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new(FINISH_GAME),
        KeyboardButton::new(NEW_PLAYER),
    ]])
}

pub fn question_text(form: &QuizForm, question_index: usize) -> String {
    let question = &form.questions[question_index];
    let mut text = format!("Question {} of {}", question_index + 1, form.len());
    if !question.category.is_empty() {
        text.push_str(&format!(" ({}, {})", question.category, question.difficulty));
    }
    text.push_str("\n\n");
    text.push_str(&question.prompt);
    text
}

/// One button per choice, the selected one marked. The callback data only
/// carries positions, never whether a choice is correct.
pub fn question_keyboard(form: &QuizForm, question_index: usize) -> InlineKeyboardMarkup {
    let selected = form.selections.get(question_index).copied().flatten();
    let rows = form.questions[question_index]
        .choices
        .iter()
        .enumerate()
        .map(|(choice_index, choice)| {
            let label = if selected == Some(choice_index) {
                format!("● {}", choice.answer_text)
            } else {
                choice.answer_text.clone()
            };
            let action = FormAction::Answer {
                round: form.round,
                question: question_index,
                choice: choice_index,
            };
            vec![InlineKeyboardButton::callback(label, action.data())]
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

pub fn submit_keyboard(form: &QuizForm) -> InlineKeyboardMarkup {
    let action = FormAction::Submit { round: form.round };
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "Submit answers",
        action.data(),
    )]])
}

pub fn score_text(report: &ScoreReport) -> String {
    format!(
        "Quiz finished! You answered {} of {} questions correctly ({} answered).",
        report.score, report.total, report.answered
    )
}

pub fn format_leaderboard(entries: &[ScoreEntry]) -> String {
    if entries.is_empty() {
        return "No scores yet.".to_string();
    }
    let rows = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| format!("{}. {}: {}", i + 1, entry.username, entry.score))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Scores:\n{}", rows)
}
