use thiserror::Error;

/// Outcome of a failed batch as reported back to the front end. Details are
/// always written to the log feed first, so the messages stay short.
#[derive(Debug, Error)]
pub enum SendMailError {
    #[error("error: check logs")]
    InvalidInput,
    #[error("recipient entries contain errors: see logs for more details")]
    InvalidRecipients { count: usize },
    #[error("error: check logs")]
    Transport(#[source] lettre::transport::smtp::Error),
    #[error("error: check logs")]
    Delivery {
        sent: usize,
        failed_at: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
