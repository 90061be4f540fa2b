mod config;
mod host;
mod session;

use std::process::ExitCode;

use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let config = match config::HostConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::from(2);
        }
    };
    info!(?config, "joy headless host");

    match session::run(config).await {
        Ok(report) => {
            info!(
                frames = report.frames,
                images = report.images_drawn,
                texts = report.texts_drawn,
                x = report.actor_position.0,
                y = report.actor_position.1,
                sprite_frame = report.sprite_frame,
                frame_rate = report.frame_rate.as_deref().unwrap_or("-"),
                "session finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "session failed");
            ExitCode::FAILURE
        }
    }
}
