use std::{path::PathBuf, sync::LazyLock};

use clap::{command, Parser};
use regex::Regex;
use serde::{Deserialize, Serialize};

pub mod recipient_model;

pub use recipient_model::Recipient;

static STRICT_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z0-9_\.-]+)@([0-9a-z\.-]+)\.([a-z\.]{2,6})$")
        .expect("strict email pattern compiles")
});

static RELAXED_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([a-z0-9_\.+-]+)@([0-9a-z\.-]+)\.([a-z\.]{2,24})$")
        .expect("relaxed email pattern compiles")
});

/// Which shape of address is accepted when recipients are checked.
/// 1. `strict`: lowercase only, top level domain of 2 to 6 letters
/// 2. `relaxed`: any case, `+` tags allowed, top level domain up to 24 letters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailPattern {
    #[default]
    Strict,
    Relaxed,
}

impl EmailPattern {
    pub fn regex(self) -> &'static Regex {
        match self {
            EmailPattern::Strict => &STRICT_EMAIL,
            EmailPattern::Relaxed => &RELAXED_EMAIL,
        }
    }

    pub fn is_match(self, email: &str) -> bool {
        self.regex().is_match(email)
    }
}

/// A model for describing ARGS of the tool.
/// Consists of:
/// 1. Path to config.json, that contains email sender configuration parameters.
/// 2. Path to the recipient list, either a CSV or XLSX sheet with `Surname`, `Other Names` and `E-mail address` columns or a JSON array of recipients.
/// 3. Path to a text file with the message body.
/// 4. Subject of the letters.
/// 5. Optional path of a file that receives the log feed as JSON lines.
/// 6. Whether letters should only be logged instead of sent.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(long, value_name = "FILE", default_value = "config.json")]
    pub config_json_path: PathBuf,
    #[arg(long, value_name = "FILE", default_value = "recipients.csv")]
    pub recipients_path: PathBuf,
    #[arg(long, value_name = "FILE", default_value = "message.txt")]
    pub message_path: PathBuf,
    #[arg(long)]
    pub subject: String,
    #[arg(long, value_name = "FILE")]
    pub log_feed_path: Option<PathBuf>,
    #[arg(long)]
    pub dry_run: bool,
}

fn default_relay() -> String {
    "smtp.gmail.com".to_owned()
}

fn default_port() -> u16 {
    465
}

/// A model for describing configuration of the tool.
/// Consists of:
/// 1. SMTP server address and its implicit TLS port
/// 2. Email address from which the letters will be sent
/// 3. Optional display name shown next to that address
/// 4. Password for email account from which the letters will be sent
/// 5. Address pattern recipients are checked against
/// 6. Dry run switch, letters are only logged when it is on
#[derive(Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_relay")]
    pub email_relay: String,
    #[serde(default = "default_port")]
    pub email_port: u16,
    #[serde(default)]
    pub email_sender_username: String,
    #[serde(default)]
    pub email_sender_fullname: Option<String>,
    #[serde(default)]
    pub email_sender_password: String,
    #[serde(default)]
    pub email_pattern: EmailPattern,
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            email_relay: default_relay(),
            email_port: default_port(),
            email_sender_username: String::new(),
            email_sender_fullname: None,
            email_sender_password: String::new(),
            email_pattern: EmailPattern::default(),
            dry_run: false,
        }
    }
}

/// Everything one batch needs besides the recipients: who sends, with which
/// password, and what.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailRequest {
    pub sender: String,
    #[serde(default)]
    pub sender_name: Option<String>,
    pub password: String,
    pub subject: String,
    pub message_body: String,
}

impl MailRequest {
    pub fn from_config(config: &Config, subject: String, message_body: String) -> Self {
        MailRequest {
            sender: config.email_sender_username.to_owned(),
            sender_name: config.email_sender_fullname.to_owned(),
            password: config.email_sender_password.to_owned(),
            subject,
            message_body,
        }
    }

    pub fn has_empty_fields(&self) -> bool {
        self.sender.is_empty()
            || self.password.is_empty()
            || self.subject.is_empty()
            || self.message_body.is_empty()
    }
}
