use std::{
    error::Error,
    fs::File,
    io::{BufReader, Read, Seek},
    path::Path,
};

use calamine::{Reader, Xlsx};
use csv::{ReaderBuilder, Trim};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::{Credentials, Mechanism},
    Message, SmtpTransport,
};
use log::{debug, info};

use crate::mailing::models::{Config, MailRequest, Recipient};

/// Columns a recipient sheet must have, matched case-insensitively.
pub const REQUIRED_COLUMNS: [&str; 3] = ["Surname", "Other Names", "E-mail address"];

const STARTTLS_PORT: u16 = 587;

pub fn log_all_recipients(recipients: &[Recipient]) {
    for recipient in recipients.iter() {
        debug!(
            "Serving {}, who will receive a letter at {}",
            recipient.full_name(),
            recipient.email
        );
    }
}

pub fn read_recipients(path: &Path) -> Result<Vec<Recipient>, Box<dyn Error>> {
    info!(
        "Reading recipients from {}",
        std::path::absolute(path)?.display()
    );
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);
    let file = BufReader::new(File::open(path)?);
    let recipients = match extension.as_deref() {
        Some("csv") => parse_recipients_csv(file)?,
        Some("xlsx") => parse_recipients_xlsx(file)?,
        Some("json") => serde_json::from_reader(file)?,
        _ => {
            return Err(format!(
                "Unsupported recipients file {}: expected .csv, .xlsx or .json",
                path.display()
            )
            .into())
        }
    };
    log_all_recipients(&recipients);
    Ok(recipients)
}

/* find a column by its header, ignoring case and surrounding spaces */
fn find_column(headers: &[String], name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(name))
}

/// Rules shared by every sheet format: required columns are looked up by
/// header, rows where every cell is blank are skipped, cells are trimmed and
/// names are title-cased.
fn recipients_from_rows<I>(headers: &[String], rows: I) -> Result<Vec<Recipient>, Box<dyn Error>>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let columns = REQUIRED_COLUMNS
        .iter()
        .map(|name| find_column(headers, name))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| {
            format!(
                "Missing required fields. Please ensure your file includes: {}",
                REQUIRED_COLUMNS.join(", ")
            )
        })?;
    let (surname_idx, other_names_idx, email_idx) = (columns[0], columns[1], columns[2]);

    let mut recipients = Vec::new();
    for row in rows {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let cell = |idx: usize| row.get(idx).map(|c| c.trim()).unwrap_or("");
        recipients.push(Recipient {
            surname: title_case(cell(surname_idx)),
            other_names: title_case(cell(other_names_idx)),
            email: cell(email_idx).to_owned(),
        });
    }
    Ok(recipients)
}

pub fn parse_recipients_csv<R: Read>(reader: R) -> Result<Vec<Recipient>, Box<dyn Error>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()?
        .iter()
        .map(str::to_owned)
        .collect::<Vec<_>>();
    let rows = csv_reader
        .records()
        .map(|record| record.map(|r| r.iter().map(str::to_owned).collect::<Vec<_>>()))
        .collect::<Result<Vec<_>, _>>()?;
    recipients_from_rows(&headers, rows)
}

/// Reads the first sheet of a workbook; its first row holds the headers.
pub fn parse_recipients_xlsx<R: Read + Seek>(
    reader: R,
) -> Result<Vec<Recipient>, Box<dyn Error>> {
    let mut workbook: Xlsx<R> = Xlsx::new(reader)?;
    let sheet = workbook
        .worksheet_range_at(0)
        .ok_or("Workbook has no sheets")??;
    let mut rows = sheet
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>());
    let headers = rows.next().unwrap_or_default();
    recipients_from_rows(&headers, rows)
}

/// `mARY-jane o'neil` becomes `Mary-Jane O'Neil`: every letter that starts a
/// word is upper-cased, the rest lower-cased.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_word = false;
    for ch in name.chars() {
        if in_word {
            out.extend(ch.to_lowercase());
        } else {
            out.extend(ch.to_uppercase());
        }
        in_word = ch.is_alphanumeric() || ch == '_';
    }
    out
}

pub fn read_message_body(path: &Path) -> Result<String, Box<dyn Error>> {
    info!(
        "Reading message body from {}",
        std::path::absolute(path)?.display()
    );
    Ok(std::fs::read_to_string(path)?)
}

/// Line breaks typed in the message become HTML breaks.
pub fn prepare_body(message_body: &str) -> String {
    message_body.replace("\r\n", "\n").replace('\n', "<br>")
}

pub fn generate_email(
    request: &MailRequest,
    recipient: &Recipient,
    html_body: &str,
) -> Result<Message, Box<dyn Error + Send + Sync>> {
    let display_name = recipient.full_name().trim().to_owned();
    let email = Message::builder()
        .from(Mailbox::new(
            request.sender_name.clone(),
            request.sender.parse()?,
        ))
        .to(Mailbox::new(Some(display_name), recipient.email.parse()?))
        .subject(request.subject.clone())
        .header(ContentType::TEXT_HTML)
        .body(format!(
            "Dear {},<br><br>{}",
            recipient.full_name(),
            html_body
        ))?;

    Ok(email)
}

/// Relay on implicit TLS, or STARTTLS when the submission port is configured.
pub fn build_smtp_transport(
    config: &Config,
    sender: &str,
    password: &str,
) -> Result<SmtpTransport, lettre::transport::smtp::Error> {
    info!(
        "Using SMTP relay {}:{} as {}",
        config.email_relay, config.email_port, sender
    );
    let builder = if config.email_port == STARTTLS_PORT {
        SmtpTransport::starttls_relay(&config.email_relay)?
    } else {
        SmtpTransport::relay(&config.email_relay)?
    };
    Ok(builder
        .port(config.email_port)
        .credentials(Credentials::new(sender.to_owned(), password.to_owned()))
        .authentication(vec![Mechanism::Plain, Mechanism::Login])
        .build())
}

#[cfg(test)]
#[path = "tests/tests.rs"]
mod tests;
