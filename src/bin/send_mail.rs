use std::{error::Error, fs::File, io::BufWriter, sync::Arc};

use clap::Parser;
use figment::{
    providers::{Env, Format, Json},
    Figment,
};
use lib::app::App;
use lib::log_feed::{emitter::JsonLinesEmitter, feed::LogFeed};
use lib::mailing::helpers::{read_message_body, read_recipients};
use lib::mailing::models::{Args, Config, MailRequest};
use log::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    /* Setup logging */
    env_logger::builder()
        .target(env_logger::Target::Stdout)
        .filter_level(log::LevelFilter::Info)
        .init();

    /* Get config, recipients and message from corresponding files */
    let args = Args::parse();
    let mut config: Config = Figment::new()
        .merge(Json::file(&args.config_json_path))
        .merge(Env::prefixed("MAILER_"))
        .extract()?;
    info!(
        "Read config.json from {}",
        std::path::absolute(&args.config_json_path)?.display()
    );
    config.dry_run |= args.dry_run;

    let recipients = read_recipients(&args.recipients_path)?;
    let message_body = read_message_body(&args.message_path)?;
    let request = MailRequest::from_config(&config, args.subject.clone(), message_body);

    /* Every feed entry is pushed into the JSON lines file as it is recorded */
    let feed = match &args.log_feed_path {
        Some(path) => {
            info!(
                "Writing log feed to {}",
                std::path::absolute(path)?.display()
            );
            let writer = BufWriter::new(File::create(path)?);
            LogFeed::with_emitter(JsonLinesEmitter::new(writer))
        }
        None => LogFeed::new(),
    };
    let app = App::with_feed(config, Arc::new(feed));

    /* Letters go out over blocking SMTP calls */
    let sent = tokio::task::spawn_blocking(move || app.send_mail(&request, &recipients)).await??;
    info!("Done, {} letter(s) sent", sent);
    Ok(())
}
