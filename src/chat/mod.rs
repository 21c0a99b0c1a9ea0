pub mod loading;
pub mod views;

use std::sync::Arc;

use chrono::Duration;
use log::{debug, error, info, warn};
use teloxide::{
    dispatching::{
        dialogue::{self, ErasedStorage},
        UpdateHandler,
    },
    prelude::*,
    types::KeyboardRemove,
};

use crate::config::Config;
use crate::error::{LoadError, StoreError};
use crate::quiz::loader::QuestionLoader;
use crate::quiz::{render::render, score, QuizForm};
use crate::store::ledger::{ScoreEntry, ScoreLedger};
use crate::store::session::{validate_username, SessionStore};
use loading::ChatLoadingIndicator;
use views::FormAction;

pub type TriviaDialogue = Dialogue<State, ErasedStorage<State>>;
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    ReceiveUsername,
    Idle,
    Answering {
        form: QuizForm,
    },
}

/// Everything the handlers share across chats.
pub struct Game {
    pub sessions: SessionStore,
    pub ledger: ScoreLedger,
    pub loader: QuestionLoader,
}

impl Game {
    pub fn open(config: &Config) -> Result<Self, LoadError> {
        Ok(Self {
            sessions: SessionStore::open(
                &config.session_path,
                Duration::days(i64::from(config.session_ttl_days)),
            ),
            ledger: ScoreLedger::open(&config.ledger_path),
            loader: QuestionLoader::new(config.api_url.clone(), config.question_amount)?,
        })
    }

    // The stores do blocking file I/O, keep it off the dispatcher's workers.

    pub async fn identify(self: &Arc<Self>, chat_id: ChatId, username: &str) -> Result<(), StoreError> {
        let game = Arc::clone(self);
        let username = username.to_string();
        tokio::task::spawn_blocking(move || game.sessions.identify(chat_id.0, &username).map(|_| ()))
            .await?
    }

    pub async fn logout(self: &Arc<Self>, chat_id: ChatId) -> Result<(), StoreError> {
        let game = Arc::clone(self);
        tokio::task::spawn_blocking(move || game.sessions.logout(chat_id.0)).await?
    }

    pub async fn record_score(self: &Arc<Self>, username: &str, score: u32) -> Result<(), StoreError> {
        let game = Arc::clone(self);
        let username = username.to_string();
        tokio::task::spawn_blocking(move || game.ledger.record_score(&username, score)).await?
    }

    pub async fn scores(self: &Arc<Self>) -> Result<Vec<ScoreEntry>, StoreError> {
        let game = Arc::clone(self);
        Ok(tokio::task::spawn_blocking(move || game.ledger.list_scores()).await?)
    }
}

pub fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    let message_handler = Update::filter_message()
        .branch(dptree::case![State::Start].endpoint(start))
        .branch(dptree::case![State::ReceiveUsername].endpoint(receive_username))
        .branch(dptree::case![State::Idle].endpoint(receive_menu_choice))
        .branch(dptree::case![State::Answering { form }].endpoint(receive_round_message));

    let callback_handler = Update::filter_callback_query()
        .branch(dptree::case![State::Answering { form }].endpoint(receive_selection))
        .branch(dptree::endpoint(stale_selection));

    dialogue::enter::<Update, ErasedStorage<State>, State, _>()
        .branch(message_handler)
        .branch(callback_handler)
}

async fn start(bot: Bot, dialogue: TriviaDialogue, game: Arc<Game>, msg: Message) -> HandlerResult {
    match game.sessions.current_player(msg.chat.id.0) {
        Some(player) => {
            bot.send_message(msg.chat.id, format!("Welcome back, {}!", player.username))
                .reply_markup(views::menu_keyboard())
                .await?;
            dialogue.update(State::Idle).await?;
        }
        None => {
            bot.send_message(
                msg.chat.id,
                "Welcome to the trivia quiz! Enter your username to start.",
            )
            .reply_markup(KeyboardRemove::new())
            .await?;
            dialogue.update(State::ReceiveUsername).await?;
        }
    }
    Ok(())
}

async fn receive_username(
    bot: Bot,
    dialogue: TriviaDialogue,
    game: Arc<Game>,
    msg: Message,
) -> HandlerResult {
    let username = match validate_username(msg.text().unwrap_or_default()) {
        Ok(username) => username,
        Err(err) => {
            bot.send_message(msg.chat.id, err.to_string()).await?;
            return Ok(());
        }
    };

    if let Err(err) = game.identify(msg.chat.id, &username).await {
        error!("Could not save the session of chat {}: {}", msg.chat.id, err);
        bot.send_message(msg.chat.id, "Could not save your username, please try again.")
            .await?;
        return Ok(());
    }

    bot.send_message(
        msg.chat.id,
        format!("Username saved. Welcome, {}! Press Play to start a round.", username),
    )
    .reply_markup(views::menu_keyboard())
    .await?;
    dialogue.update(State::Idle).await?;
    Ok(())
}

async fn receive_menu_choice(
    bot: Bot,
    dialogue: TriviaDialogue,
    game: Arc<Game>,
    msg: Message,
) -> HandlerResult {
    match msg.text() {
        Some(views::PLAY) => start_round(bot, dialogue, game, msg.chat.id).await,
        Some(views::NEW_PLAYER) => new_player(bot, dialogue, game, msg.chat.id).await,
        Some(views::LEADERBOARD) => {
            let scores = game.scores().await?;
            bot.send_message(msg.chat.id, views::format_leaderboard(&scores))
                .reply_markup(views::menu_keyboard())
                .await?;
            Ok(())
        }
        _ => {
            bot.send_message(msg.chat.id, "Please choose one of the options.")
                .reply_markup(views::menu_keyboard())
                .await?;
            Ok(())
        }
    }
}

async fn receive_round_message(
    bot: Bot,
    dialogue: TriviaDialogue,
    game: Arc<Game>,
    form: QuizForm,
    msg: Message,
) -> HandlerResult {
    match msg.text() {
        Some(views::FINISH_GAME) => finish_round(bot, dialogue, game, msg.chat.id, form).await,
        Some(views::NEW_PLAYER) => new_player(bot, dialogue, game, msg.chat.id).await,
        _ => {
            bot.send_message(
                msg.chat.id,
                "Pick one answer under each question, then press \"Submit answers\".",
            )
            .reply_markup(views::round_keyboard())
            .await?;
            Ok(())
        }
    }
}

async fn receive_selection(
    bot: Bot,
    dialogue: TriviaDialogue,
    game: Arc<Game>,
    mut form: QuizForm,
    q: CallbackQuery,
) -> HandlerResult {
    let chat_id = dialogue.chat_id();
    let action = match q.data.as_deref().and_then(FormAction::parse) {
        Some(action) if action.belongs_to(&form) => action,
        Some(action) => {
            debug!(
                "Chat {} pressed a button of round {}, current round is {}",
                chat_id,
                action.round(),
                form.round
            );
            return stale_selection(bot, q).await;
        }
        None => {
            warn!("Unknown callback data in chat {}: {:?}", chat_id, q.data);
            bot.answer_callback_query(q.id).await?;
            return Ok(());
        }
    };
    bot.answer_callback_query(q.id.clone()).await?;

    match action {
        FormAction::Submit { .. } => finish_round(bot, dialogue, game, chat_id, form).await,
        FormAction::Answer {
            question, choice, ..
        } => {
            if let Err(err) = form.select(question, choice) {
                warn!("Ignoring selection in chat {}: {}", chat_id, err);
                return Ok(());
            }
            debug!("Chat {} picked choice {} for question {}", chat_id, choice, question);

            if let Some(message) = &q.message {
                let keyboard = views::question_keyboard(&form, question);
                // Fails when the same choice is picked twice, which is harmless
                if let Err(err) = bot
                    .edit_message_reply_markup(message.chat.id, message.id)
                    .reply_markup(keyboard)
                    .await
                {
                    debug!("Keyboard not updated: {}", err);
                }
            }
            dialogue.update(State::Answering { form }).await?;
            Ok(())
        }
    }
}

async fn stale_selection(bot: Bot, q: CallbackQuery) -> HandlerResult {
    bot.answer_callback_query(q.id)
        .text("This round is already over.")
        .await?;
    Ok(())
}

async fn start_round(
    bot: Bot,
    dialogue: TriviaDialogue,
    game: Arc<Game>,
    chat_id: ChatId,
) -> HandlerResult {
    if game.sessions.current_player(chat_id.0).is_none() {
        bot.send_message(chat_id, "Your session has expired. Please enter your username.")
            .reply_markup(KeyboardRemove::new())
            .await?;
        dialogue.update(State::ReceiveUsername).await?;
        return Ok(());
    }

    let mut indicator = ChatLoadingIndicator::new(bot.clone(), chat_id);
    let questions = game.loader.fetch_questions(&mut indicator).await;
    if questions.is_empty() {
        bot.send_message(
            chat_id,
            "Could not load any questions right now. Press Play to try again.",
        )
        .reply_markup(views::menu_keyboard())
        .await?;
        return Ok(());
    }

    let form = render(&questions, &mut rand::thread_rng());
    info!("Chat {} started a round of {} questions", chat_id, form.len());

    bot.send_message(
        chat_id,
        format!(
            "{} questions coming up. Pick one answer under each question, then press \"Submit answers\".",
            form.len()
        ),
    )
    .reply_markup(views::round_keyboard())
    .await?;

    for index in 0..form.len() {
        bot.send_message(chat_id, views::question_text(&form, index))
            .reply_markup(views::question_keyboard(&form, index))
            .await?;
    }
    bot.send_message(chat_id, "Done?")
        .reply_markup(views::submit_keyboard(&form))
        .await?;

    dialogue.update(State::Answering { form }).await?;
    Ok(())
}

async fn finish_round(
    bot: Bot,
    dialogue: TriviaDialogue,
    game: Arc<Game>,
    chat_id: ChatId,
    form: QuizForm,
) -> HandlerResult {
    let report = score::report(&form);
    bot.send_message(chat_id, views::score_text(&report)).await?;

    let Some(player) = game.sessions.current_player(chat_id.0) else {
        bot.send_message(
            chat_id,
            "Your session has expired, so this score was not saved. Please enter your username.",
        )
        .reply_markup(KeyboardRemove::new())
        .await?;
        dialogue.update(State::ReceiveUsername).await?;
        return Ok(());
    };

    if let Err(err) = game.record_score(&player.username, report.score).await {
        error!("Could not record score of {}: {}", player.username, err);
        bot.send_message(chat_id, "Could not save your score.").await?;
    }

    let scores = game.scores().await?;
    bot.send_message(chat_id, views::format_leaderboard(&scores))
        .reply_markup(views::menu_keyboard())
        .await?;
    dialogue.update(State::Idle).await?;
    Ok(())
}

async fn new_player(
    bot: Bot,
    dialogue: TriviaDialogue,
    game: Arc<Game>,
    chat_id: ChatId,
) -> HandlerResult {
    if let Err(err) = game.logout(chat_id).await {
        error!("Could not clear the session of chat {}: {}", chat_id, err);
    }
    bot.send_message(
        chat_id,
        "Starting a new game... Welcome, new player! Enter your username.",
    )
    .reply_markup(KeyboardRemove::new())
    .await?;
    dialogue.update(State::ReceiveUsername).await?;
    Ok(())
}
