use ai_hustle_shorts::api::youtube::YouTubeApiError;
use ai_hustle_shorts::init;
use ai_hustle_shorts::pipeline::run_pipeline;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = init::ensure_directories().await {
        eprintln!("[ERROR] Failed to create directories: {}", e);
        return;
    }

    if !init::check_ffmpeg().await {
        tracing::warn!("FFmpeg not found in PATH. Please install FFmpeg.");
    }

    // Best-effort: failures are logged and the process still exits normally.
    match run_pipeline().await {
        Ok(published) => {
            eprintln!("[OK] Pipeline finished successfully ({} video published).", published);
        }
        Err(err) => {
            if let Some(api) = err.downcast_ref::<YouTubeApiError>() {
                eprintln!("[ERROR] YouTube API error: {}", api);
            } else {
                eprintln!("[ERROR] Pipeline failed: {:#}", err);
            }
        }
    }
}
