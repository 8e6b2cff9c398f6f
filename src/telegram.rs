// Telegram side of the relay: transport over teloxide and the update dispatcher

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId, ParseMode,
};
use teloxide::utils::command::BotCommands;
use teloxide::utils::html;
use teloxide::RequestError;
use tracing::{debug, warn};

use crate::downloader::errors::TransportError;
use crate::downloader::models::{ChoiceSet, MessageRef, SIZE_LIMIT};
use crate::downloader::traits::ChatTransport;
use crate::relay::messages::GREETING;
use crate::relay::{Relay, SessionKey};

impl From<RequestError> for TransportError {
    fn from(e: RequestError) -> Self {
        TransportError(e.to_string())
    }
}

/// Slowest link a full-size upload is still given time to finish on (bytes/s)
const MIN_UPLOAD_RATE: u64 = 64 * 1024;

/// Whole-request deadline for uploads: room for a `SIZE_LIMIT` file at
/// `MIN_UPLOAD_RATE` on top of the per-operation timeout
pub fn upload_deadline(per_operation: Duration) -> Duration {
    per_operation + Duration::from_secs(SIZE_LIMIT / MIN_UPLOAD_RATE)
}

/// Bot whose HTTP client tolerates slow multipart uploads
#[derive(Clone)]
pub struct UploadBot(pub Bot);

impl UploadBot {
    /// `per_operation` bounds connecting and detects dead peers via TCP
    /// keepalive; the request as a whole gets `upload_deadline`.
    pub fn new(token: &str, per_operation: Duration) -> Result<Self, reqwest::Error> {
        let client = teloxide::net::default_reqwest_settings()
            .connect_timeout(per_operation)
            .tcp_keepalive(per_operation)
            .timeout(upload_deadline(per_operation))
            .build()?;
        Ok(Self(Bot::with_client(token, client)))
    }
}

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    #[command(description = "start the bot")]
    Start,
    #[command(description = "show usage")]
    Help,
}

/// One chat, seen through `ChatTransport`
pub struct TelegramChat {
    bot: Bot,
    upload_bot: Bot,
    chat_id: ChatId,
}

impl TelegramChat {
    pub fn new(bot: Bot, upload_bot: UploadBot, chat_id: ChatId) -> Self {
        Self {
            bot,
            upload_bot: upload_bot.0,
            chat_id,
        }
    }
}

fn menu_text(title: &str) -> String {
    format!("<b>{}</b>\nChoose quality:", html::escape(title))
}

/// One button per row, in choice-set order
fn choice_keyboard(choices: &ChoiceSet) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        choices
            .entries()
            .iter()
            .map(|entry| vec![InlineKeyboardButton::callback(entry.label.clone(), entry.token.clone())]),
    )
}

fn remote(url: &str) -> Result<InputFile, TransportError> {
    let parsed = url::Url::parse(url).map_err(|e| TransportError(format!("bad media URL {}: {}", url, e)))?;
    Ok(InputFile::url(parsed))
}

#[async_trait]
impl ChatTransport for TelegramChat {
    async fn send_text(&self, text: &str) -> Result<MessageRef, TransportError> {
        let sent = self.bot.send_message(self.chat_id, text).await?;
        Ok(MessageRef(sent.id.0))
    }

    async fn edit_text(&self, message: MessageRef, text: &str) -> Result<(), TransportError> {
        self.bot
            .edit_message_text(self.chat_id, MessageId(message.0), text)
            .await?;
        Ok(())
    }

    async fn delete_message(&self, message: MessageRef) -> Result<(), TransportError> {
        self.bot
            .delete_message(self.chat_id, MessageId(message.0))
            .await?;
        Ok(())
    }

    async fn send_choice_set(
        &self,
        title: &str,
        choices: &ChoiceSet,
    ) -> Result<MessageRef, TransportError> {
        let sent = self
            .bot
            .send_message(self.chat_id, menu_text(title))
            .parse_mode(ParseMode::Html)
            .reply_markup(choice_keyboard(choices))
            .await?;
        Ok(MessageRef(sent.id.0))
    }

    async fn send_audio_file(&self, path: &Path) -> Result<(), TransportError> {
        debug!(path = %path.display(), "Uploading audio");
        self.upload_bot
            .send_audio(self.chat_id, InputFile::file(path))
            .await?;
        Ok(())
    }

    async fn send_video_file(&self, path: &Path) -> Result<(), TransportError> {
        debug!(path = %path.display(), "Uploading video");
        self.upload_bot
            .send_video(self.chat_id, InputFile::file(path))
            .supports_streaming(true)
            .await?;
        Ok(())
    }

    async fn send_video_url(&self, url: &str) -> Result<(), TransportError> {
        self.bot.send_video(self.chat_id, remote(url)?).await?;
        Ok(())
    }

    async fn send_photo_url(&self, url: &str) -> Result<(), TransportError> {
        self.bot.send_photo(self.chat_id, remote(url)?).await?;
        Ok(())
    }
}

pub fn schema() -> UpdateHandler<RequestError> {
    dptree::entry()
        .branch(
            Update::filter_message()
                .branch(dptree::entry().filter_command::<Command>().endpoint(handle_command))
                .branch(dptree::endpoint(handle_message)),
        )
        .branch(Update::filter_callback_query().endpoint(handle_callback))
}

async fn handle_command(bot: Bot, msg: Message, cmd: Command) -> ResponseResult<()> {
    debug!(?cmd, chat = msg.chat.id.0, "Command received");
    bot.send_message(msg.chat.id, GREETING).await?;
    Ok(())
}

async fn handle_message(
    bot: Bot,
    upload_bot: UploadBot,
    relay: Arc<Relay>,
    msg: Message,
) -> ResponseResult<()> {
    let (Some(text), Some(user)) = (msg.text(), msg.from.as_ref()) else {
        return Ok(());
    };

    let key = SessionKey {
        chat_id: msg.chat.id.0,
        user_id: user.id.0,
    };
    let chat = TelegramChat::new(bot, upload_bot, msg.chat.id);
    relay.handle_link(&chat, key, text).await;
    Ok(())
}

async fn handle_callback(
    bot: Bot,
    upload_bot: UploadBot,
    relay: Arc<Relay>,
    q: CallbackQuery,
) -> ResponseResult<()> {
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        warn!(error = %e, "Failed to answer callback query");
    }

    let (Some(token), Some(message)) = (q.data.clone(), q.message.as_ref()) else {
        return Ok(());
    };

    let chat_id = message.chat().id;
    let menu = MessageRef(message.id().0);
    let key = SessionKey {
        chat_id: chat_id.0,
        user_id: q.from.id.0,
    };
    let chat = TelegramChat::new(bot, upload_bot, chat_id);

    // Downloads can take minutes; keep the dispatcher free for other updates
    tokio::spawn(async move {
        relay.handle_selection(&chat, key, menu, &token).await;
    });
    Ok(())
}
