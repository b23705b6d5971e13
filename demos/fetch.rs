//! Fetch example
//!
//! Downloads (or converts) one video and prints job events as they happen.
//! Ctrl+C cancels the job and removes its partial files.
//!
//! ```text
//! cargo run --example fetch -- <url> [profile] [start end]
//! cargo run --example fetch -- https://youtu.be/abc 720p 00:00:10 00:00:20
//! ```
//!
//! `RUST_LOG=media_dl=debug` shows every stage transition and tool invocation.

use media_dl::{Config, Event, JobController, JobRequest, Profile, cancel_on_shutdown};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("media_dl=info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(url) = args.next() else {
        eprintln!("usage: fetch <url> [profile] [start end]");
        std::process::exit(2);
    };
    let profile = args.next().map(Profile::from).unwrap_or(Profile::Original);
    let trim = args.next().zip(args.next());

    let controller = JobController::new(Config::default())?;

    let mut events = controller.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::Started { action, url } => println!("▶ {action:?} {url}"),
                Event::StageChanged { stage, detail } => println!("  {stage:?}: {detail}"),
                Event::TrimDropped => println!("⚠ trim failed, converting full length"),
                Event::Complete { path } => println!("✓ {}", path.display()),
                Event::Failed { error } => println!("✗ {error}"),
                Event::Cancelled { reason } => println!("■ {reason}"),
            }
        }
    });

    tokio::spawn(cancel_on_shutdown(controller.clone()));

    let mut request = JobRequest::convert(url, profile, "downloads");
    if let Some((start, end)) = trim {
        request = request.with_trim(start, end);
    }

    match controller.start(request).await {
        Ok(_) => {}
        Err(e) if e.is_cancelled() => {}
        Err(e) => {
            eprintln!("job failed: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}
