use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use funbox_learn::config::KioskConfig;
use funbox_learn::kiosk::{self, ActiveStudent, ApiClient, HttpApiClient, MeetingRun};
use funbox_learn::meeting::MeetingSession;
use funbox_learn::serial::FunBox;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "funbox_learn=info,funbox_kiosk=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = KioskConfig::new_from_env()?;
    let api: Arc<dyn ApiClient> = Arc::new(HttpApiClient::new(&config.api_url)?);
    let student = ActiveStudent::new(config.student_id.clone());

    let meeting = api.fetch_meeting(config.meeting_id).await?;
    match api.fetch_module(meeting.module_id).await {
        Ok(module) => info!(
            "loaded meeting {} ({}) of module {}",
            meeting.id, meeting.title, module.title
        ),
        Err(e) => warn!(
            "loaded meeting {} ({}) but not module {}: {}",
            meeting.id, meeting.title, meeting.module_id, e
        ),
    }

    let funbox = match &config.device {
        Some(path) => match FunBox::open_device(path).await {
            Ok(funbox) => funbox,
            Err(e) => {
                error!("could not open {}: {}", path, e);
                FunBox::keyboard(tokio::io::stdin(), tokio::io::stdout())
            }
        },
        None => FunBox::keyboard(tokio::io::stdin(), tokio::io::stdout()),
    };

    let session = MeetingSession::new(meeting);
    let run = kiosk::run_meeting(session, &funbox.handle(), api.as_ref(), &student).await;
    funbox.disconnect().await;

    match run? {
        MeetingRun::Finished { outcome, saved } => {
            info!(
                "score {} ({} of {} correct), {} stars{}",
                outcome.score,
                outcome.raw_points,
                outcome.total_questions,
                outcome.stars,
                if saved { "" } else { ", not saved" }
            );
        }
        MeetingRun::Exited => info!("left the meeting"),
    }

    Ok(())
}
