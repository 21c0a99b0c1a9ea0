pub mod loader;
pub mod render;
pub mod score;

use crate::error::SelectionError;

/// A multiple-choice question as fetched from the trivia source.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Question {
    pub prompt: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
    pub category: String,
    pub difficulty: String,
}
impl Question {
    pub fn new(prompt: String, correct_answer: String, incorrect_answers: Vec<String>) -> Self {
        Self {
            prompt,
            correct_answer,
            incorrect_answers,
            category: String::new(),
            difficulty: String::new(),
        }
    }
}

/// One displayed answer option. `is_correct` never leaves the bot's own state.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RenderedChoice {
    pub question_index: usize,
    pub answer_text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RenderedQuestion {
    pub prompt: String,
    pub category: String,
    pub difficulty: String,
    pub choices: Vec<RenderedChoice>,
}

/// The rendered questions of one round together with the player's selections.
///
/// `selections[i]` holds the position (within `questions[i].choices`) of the
/// choice picked for question `i`. Picking another choice replaces it.
/// `round` tells buttons of this form apart from those of earlier forms.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuizForm {
    #[serde(default)]
    pub round: u32,
    pub questions: Vec<RenderedQuestion>,
    pub selections: Vec<Option<usize>>,
}

impl QuizForm {
    pub fn new(round: u32, questions: Vec<RenderedQuestion>) -> Self {
        let selections = vec![None; questions.len()];
        Self {
            round,
            questions,
            selections,
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn select(&mut self, question_index: usize, choice_index: usize) -> Result<(), SelectionError> {
        let question = self
            .questions
            .get(question_index)
            .ok_or(SelectionError::UnknownQuestion(question_index))?;
        if choice_index >= question.choices.len() {
            return Err(SelectionError::UnknownChoice {
                question: question_index,
                choice: choice_index,
            });
        }
        self.selections[question_index] = Some(choice_index);
        Ok(())
    }

    pub fn selected_choice(&self, question_index: usize) -> Option<&RenderedChoice> {
        let choice_index = (*self.selections.get(question_index)?)?;
        self.questions.get(question_index)?.choices.get(choice_index)
    }

    pub fn answered_count(&self) -> usize {
        self.selections.iter().filter(|s| s.is_some()).count()
    }
}
