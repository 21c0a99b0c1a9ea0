use rand::seq::SliceRandom;
use rand::Rng;

use crate::quiz::{Question, QuizForm, RenderedChoice, RenderedQuestion};

/// Builds a fresh form out of `questions`, one shuffled set of choices per question.
/// Every form gets a new random round id.
pub fn render<R: Rng + ?Sized>(questions: &[Question], rng: &mut R) -> QuizForm {
    let round = rng.gen();
    let rendered = questions
        .iter()
        .enumerate()
        .map(|(index, question)| render_question(index, question, rng))
        .collect();
    QuizForm::new(round, rendered)
}

fn render_question<R: Rng + ?Sized>(
    question_index: usize,
    question: &Question,
    rng: &mut R,
) -> RenderedQuestion {
    let mut choices = Vec::with_capacity(question.incorrect_answers.len() + 1);
    choices.push(RenderedChoice {
        question_index,
        answer_text: question.correct_answer.clone(),
        is_correct: true,
    });
    choices.extend(
        question
            .incorrect_answers
            .iter()
            .map(|answer| RenderedChoice {
                question_index,
                answer_text: answer.clone(),
                is_correct: false,
            }),
    );
    // We shuffle the answers so the correct one isn't always the first one
    choices.shuffle(rng);

    RenderedQuestion {
        prompt: question.prompt.clone(),
        category: question.category.clone(),
        difficulty: question.difficulty.clone(),
        choices,
    }
}
