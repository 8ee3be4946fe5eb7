use log::{debug, info};

use crate::log_feed::feed::LogFeed;

use super::{
    error::SendMailError,
    helpers::{generate_email, prepare_body},
    letter_sender::LetterSender,
    models::{EmailPattern, MailRequest, Recipient},
    validation::find_invalid_entries,
};

/// Sender, password, subject and body must all be filled in.
pub fn check_request(feed: &LogFeed, request: &MailRequest) -> Result<(), SendMailError> {
    if request.has_empty_fields() {
        feed.error("Invalid input: One of the required fields is empty");
        return Err(SendMailError::InvalidInput);
    }
    Ok(())
}

/// Reports every bad entry to the feed before failing, so the whole list can
/// be fixed in one go.
pub fn check_recipients(
    feed: &LogFeed,
    recipients: &[Recipient],
    pattern: EmailPattern,
) -> Result<(), SendMailError> {
    feed.info("Checking if recipients are valid");
    let invalid = find_invalid_entries(recipients, pattern);
    for entry in invalid.iter() {
        feed.error(entry.to_string());
    }
    if !invalid.is_empty() {
        return Err(SendMailError::InvalidRecipients {
            count: invalid.len(),
        });
    }
    feed.info("Check was successful");
    Ok(())
}

/// Sends one letter per recipient, in list order. The first failure stops the
/// batch; letters already sent stay sent. Returns how many letters went out.
pub fn send_letters<LS: LetterSender + ?Sized>(
    letter_sender: &LS,
    feed: &LogFeed,
    request: &MailRequest,
    recipients: &[Recipient],
) -> Result<usize, SendMailError> {
    let html_body = prepare_body(&request.message_body);

    for (idx, recipient) in recipients.iter().enumerate() {
        let delivered = generate_email(request, recipient, &html_body)
            .and_then(|letter| letter_sender.send_letter(&letter));

        if let Err(source) = delivered {
            debug!("Delivery to {} failed: {}", recipient.email, source);
            if idx != 0 {
                feed.error(format!("Email sent to {} recipient(s)", idx));
            }
            feed.error(format!(
                "sending mail to {} failed at entry number: {}. The whole process has been terminated",
                recipient.email,
                idx + 1
            ));
            return Err(SendMailError::Delivery {
                sent: idx,
                failed_at: idx + 1,
                source,
            });
        }

        feed.info(format!("Email sent to {} successfully", recipient.email));
    }

    Ok(recipients.len())
}

/// Full batch: input check, recipient check, then delivery.
pub fn run<LS: LetterSender + ?Sized>(
    letter_sender: &LS,
    feed: &LogFeed,
    request: &MailRequest,
    recipients: &[Recipient],
    pattern: EmailPattern,
) -> Result<usize, SendMailError> {
    check_request(feed, request)?;
    check_recipients(feed, recipients, pattern)?;
    let sent = send_letters(letter_sender, feed, request, recipients)?;
    info!("Batch finished, {} letter(s) sent", sent);
    Ok(sent)
}
