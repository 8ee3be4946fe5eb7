use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    log_feed::{
        feed::{LogFeed, Subscription},
        models::LogEntry,
    },
    mailing::{
        error::SendMailError,
        helpers::build_smtp_transport,
        letter_sender::{LetterSender, LogOnlySender},
        models::{Config, MailRequest, Recipient},
        run_tool::run,
    },
};

/// What a front end binds to: one call to send a batch, one to read the
/// feed so far, one to follow it live.
pub struct App {
    feed: Arc<LogFeed>,
    config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        App::with_feed(config, Arc::new(LogFeed::new()))
    }

    pub fn with_feed(config: Config, feed: Arc<LogFeed>) -> Self {
        App { feed, config }
    }

    pub fn feed(&self) -> &Arc<LogFeed> {
        &self.feed
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Delivers through SMTP with the request's credentials, or only logs the
    /// letters on a dry run. Nothing is sent before every check passed.
    pub fn send_mail(
        &self,
        request: &MailRequest,
        recipients: &[Recipient],
    ) -> Result<usize, SendMailError> {
        let letter_sender: Box<dyn LetterSender> = if self.config.dry_run {
            Box::new(LogOnlySender::new(self.feed.clone()))
        } else {
            let transport =
                build_smtp_transport(&self.config, &request.sender, &request.password)
                    .map_err(|err| {
                        self.feed.error(format!(
                            "Could not set up SMTP relay {}: {}",
                            self.config.email_relay, err
                        ));
                        SendMailError::Transport(err)
                    })?;
            Box::new(transport)
        };

        run(
            letter_sender.as_ref(),
            &self.feed,
            request,
            recipients,
            self.config.email_pattern,
        )
    }

    pub fn get_logs(&self) -> Vec<LogEntry> {
        self.feed.get_logs()
    }

    pub fn subscribe(&self, cancel: CancellationToken) -> Subscription {
        self.feed.subscribe(cancel)
    }
}
