use std::sync::Arc;

use dotenv::dotenv;
use teloxide::{
    dispatching::dialogue::{serializer::Json, ErasedStorage, SqliteStorage, Storage},
    prelude::*,
};
use trivia_bot::chat::{self, Game, State};
use trivia_bot::config::Config;

type DialogueStorage = Arc<ErasedStorage<State>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // A missing .env file is fine, the variables may come from the environment
    dotenv().ok();
    pretty_env_logger::init();
    log::info!("Starting trivia bot...");

    let config = Config::from_env()?;
    let bot = Bot::from_env();

    log::info!("Opening dialogue storage at {}", config.dialogue_db_path);
    let storage: DialogueStorage = SqliteStorage::open(&config.dialogue_db_path, Json)
        .await?
        .erase();

    let game = Arc::new(Game::open(&config)?);
    log::info!(
        "Serving {} questions per round from {}",
        config.question_amount,
        config.api_url
    );

    Dispatcher::builder(bot, chat::schema())
        .dependencies(dptree::deps![storage, game])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
