use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::api::AppState;
use crate::core::AppConfig;
use crate::core::db::{async_db, initialize_db};
use crate::history::ConversationId;

/// Interactive session that goes through the same history and rate
/// limiting as the Telegram webhook.
pub async fn run(config: AppConfig, conversation_id: String) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    let db = async_db(&config.db_path).await?;
    db.call(|conn| Ok(initialize_db(conn)?)).await?;
    let service = AppState::new(db, config).service;
    let conversation_id = ConversationId::new(conversation_id);

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                match service.handle_turn(&conversation_id, &line).await {
                    Ok(reply) => println!("{}", reply),
                    Err(e) => println!("{}", e.user_message()),
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
