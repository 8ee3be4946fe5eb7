use std::{error::Error, sync::Arc};

use lettre::{transport::stub::StubTransport, Message, SmtpTransport, Transport};
use log::{debug, info};

use crate::log_feed::feed::LogFeed;

/// A trait, necessary for every entity that will deliver the letters of a batch.
pub trait LetterSender {
    fn send_letter(&self, letter: &Message) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// Allows SmtpTransport to deliver letters via its native send method.
impl LetterSender for SmtpTransport {
    fn send_letter(&self, letter: &Message) -> Result<(), Box<dyn Error + Send + Sync>> {
        let response = self.send(letter)?;
        debug!("SMTP server answered {:?}", response.code());
        Ok(())
    }
}

/// Keeps letters in memory, so a batch can be checked without a server.
impl LetterSender for StubTransport {
    fn send_letter(&self, letter: &Message) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.send(letter)?;
        Ok(())
    }
}

/// Dry run sender: nothing leaves the machine, every letter is only reported
/// to the log feed.
pub struct LogOnlySender {
    feed: Arc<LogFeed>,
}

impl LogOnlySender {
    pub fn new(feed: Arc<LogFeed>) -> Self {
        LogOnlySender { feed }
    }
}

impl LetterSender for LogOnlySender {
    fn send_letter(&self, letter: &Message) -> Result<(), Box<dyn Error + Send + Sync>> {
        let to = letter
            .envelope()
            .to()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        info!(
            "Dry run letter to {}:\n{}",
            to,
            String::from_utf8_lossy(&letter.formatted())
        );
        self.feed.warning(format!("Dry run: letter to {} was not sent", to));
        Ok(())
    }
}
