use crate::api::{elevenlabs, pexels, youtube};
use crate::config::Config;
use crate::content::{self, Topic};
use crate::ffmpeg;
use crate::seo;
use crate::thumbnail;
use crate::{logi, logok, logw};
use anyhow::{Context, Result};
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use walkdir::WalkDir;

const STOCK_QUERY: &str = "artificial intelligence technology";
const STOCK_COUNT: usize = 4;
const CAPTION_COLS: usize = 28;

const NARRATION_MP3: &str = "assets/voice.mp3";
const FOOTAGE_MP4: &str = "assets/footage.mp4";
const CAPTION_TXT: &str = "assets/caption.txt";
const OUTPUT_MP4: &str = "output/final.mp4";
const THUMBNAIL_JPG: &str = "output/thumbnail.jpg";

fn now_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

async fn dir_exists(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}

async fn ensure_dir(path: &Path) -> Result<()> {
    if !dir_exists(path).await {
        fs::create_dir_all(path).await?;
    }
    Ok(())
}

async fn clear_directory_contents(dir_path: &Path) -> Result<()> {
    if !dir_exists(dir_path).await {
        return Ok(());
    }

    for entry in WalkDir::new(dir_path).min_depth(1).contents_first(true) {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            fs::remove_dir(path).await.ok();
        } else {
            fs::remove_file(path).await.ok();
        }
    }

    Ok(())
}

async fn fetch_stock_assets(
    client: &reqwest::Client,
    cfg: &Config,
) -> Result<Vec<PathBuf>> {
    logi(format!(
        "Searching Pexels videos: '{}' (want {})",
        STOCK_QUERY, STOCK_COUNT
    ));
    let mut assets = pexels::search_videos(client, &cfg.pexels_key, STOCK_QUERY, STOCK_COUNT).await?;

    if assets.is_empty() {
        logw("No stock videos returned; falling back to a single stock photo.".to_string());
        assets = pexels::search_photos(client, &cfg.pexels_key, STOCK_QUERY, 1).await?;
    }

    if assets.is_empty() {
        anyhow::bail!("Pexels returned no usable stock assets for '{}'", STOCK_QUERY);
    }

    if assets.len() < STOCK_COUNT {
        logw(format!(
            "Pexels returned {} assets (wanted {}); continuing with fewer.",
            assets.len(),
            STOCK_COUNT
        ));
    }

    pexels::download_assets(client, &assets, Path::new("assets/stock")).await
}

async fn compose_video(
    stock_paths: &[PathBuf],
    narration_dur: f64,
    title: &str,
) -> Result<PathBuf> {
    // Each normalized segment gets an equal share of the narration, with a
    // little slack so the trim has footage to cut into.
    let per_clip = narration_dur / stock_paths.len() as f64 + 1.0;

    let concat_list = PathBuf::from("assets/concat_list.txt");
    let mut listf = fs::File::create(&concat_list).await?;

    let mut normalized = 0usize;
    for (idx, stock) in stock_paths.iter().enumerate() {
        let norm_name = format!("norm_{}.mp4", idx + 1);
        let norm_path = PathBuf::from(format!("assets/{}", norm_name));
        logi(format!(
            "Normalizing stock {}/{}: {} -> {}",
            idx + 1,
            stock_paths.len(),
            stock.display(),
            norm_path.display()
        ));
        if !ffmpeg::ffmpeg_normalize_clip(stock, per_clip, &norm_path).await? {
            logw(format!("Normalize failed for {}", stock.display()));
            continue;
        }
        listf
            .write_all(format!("file '{}'\n", norm_name).as_bytes())
            .await?;
        normalized += 1;
    }
    listf.flush().await?;

    if normalized == 0 {
        anyhow::bail!("No stock assets survived normalization");
    }

    let footage = PathBuf::from(FOOTAGE_MP4);
    logi(format!("Concatenating {} segments -> {}", normalized, footage.display()));
    if !ffmpeg::ffmpeg_concat_videos(&concat_list, &footage).await? {
        anyhow::bail!("Stock footage concat failed");
    }

    let footage_dur = ffmpeg::ffprobe_duration_seconds(&footage).await?;
    if footage_dur + 0.05 < narration_dur {
        logw(format!(
            "Stock footage ({:.2}s) is shorter than narration ({:.2}s); output will be cut short.",
            footage_dur, narration_dur
        ));
    }

    let caption = PathBuf::from(CAPTION_TXT);
    fs::write(&caption, thumbnail::wrap_phrase(title, CAPTION_COLS))
        .await
        .context("Failed to write caption file")?;

    let out = PathBuf::from(OUTPUT_MP4);
    logi(format!("Rendering final video -> {}", out.display()));
    if !ffmpeg::ffmpeg_compose_final(
        &footage,
        Path::new(NARRATION_MP3),
        &caption,
        narration_dur,
        &out,
    )
    .await?
    {
        anyhow::bail!("Final render failed");
    }

    Ok(out)
}

pub async fn run_pipeline() -> Result<i32> {
    let cfg = Config::load("config.json").await?;
    let client = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")?;

    ensure_dir(Path::new("assets")).await?;
    ensure_dir(Path::new("output")).await?;

    logi("Clearing assets/ folder...".to_string());
    clear_directory_contents(Path::new("assets")).await?;
    ensure_dir(Path::new("assets")).await?;
    ensure_dir(Path::new("assets/stock")).await?;

    let mut rng = rand::rngs::StdRng::seed_from_u64(now_seed());
    let Topic { title, narration } = content::pick_topic(&mut rng);
    logok(format!("Topic: {}", title));

    let nar_mp3 = Path::new(NARRATION_MP3);
    logi(format!("Synthesizing narration -> {}", nar_mp3.display()));
    if !elevenlabs::elevenlabs_tts_to_mp3(&client, &cfg, &narration, nar_mp3).await? {
        anyhow::bail!("Narration synthesis failed");
    }

    let nar_dur = ffmpeg::ffprobe_duration_seconds(nar_mp3)
        .await
        .context("Bad narration duration")?;
    logok(format!("Narration ready: {:.2}s", nar_dur));

    let stock_paths = fetch_stock_assets(&client, &cfg).await?;
    logok(format!("Stock assets downloaded: {}", stock_paths.len()));

    let video_path = compose_video(&stock_paths, nar_dur, &title).await?;
    logok(format!("Video rendered: {}", video_path.display()));

    let phrase = thumbnail::pick_phrase(&mut rng);
    let thumb_path = Path::new(THUMBNAIL_JPG);
    logi(format!("Rendering thumbnail ('{}') -> {}", phrase, thumb_path.display()));
    if !thumbnail::render_thumbnail(&phrase, thumb_path).await? {
        anyhow::bail!("Thumbnail render failed");
    }

    let meta = seo::build_metadata(&title);

    let token = youtube::get_credentials(&client, &cfg.client_secret_path, &cfg.token_path).await?;
    let video_id =
        youtube::upload_video(&client, &token, &video_path, &meta, &cfg.privacy_status).await?;
    youtube::set_thumbnail(&client, &token, &video_id, thumb_path).await?;

    logok(format!("Published video: {}", video_id));
    Ok(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clear_removes_nested_contents_but_keeps_root() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("stock");
        fs::create_dir_all(&sub).await.unwrap();
        fs::write(dir.path().join("voice.mp3"), b"x").await.unwrap();
        fs::write(sub.join("stock_1.mp4"), b"x").await.unwrap();

        clear_directory_contents(dir.path()).await.unwrap();

        let mut entries = fs::read_dir(dir.path()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
        assert!(dir.path().is_dir());
    }

    #[tokio::test]
    async fn clear_missing_directory_is_ok() {
        assert!(clear_directory_contents(Path::new("no/such/dir")).await.is_ok());
    }
}
