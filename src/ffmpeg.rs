use anyhow::{Context, Result};
use std::path::Path;
use tokio::process::Command;

pub const FRAME_W: i32 = 1920;
pub const FRAME_H: i32 = 1080;

async fn run_cmd(args: &[String]) -> Result<()> {
    if args.is_empty() {
        return Ok(());
    }

    let mut cmd = Command::new(&args[0]);
    if args.len() > 1 {
        cmd.args(&args[1..]);
    }

    let status = cmd.status().await.context("Command execution failed")?;
    if !status.success() {
        return Err(anyhow::anyhow!("Command failed: {:?}", args));
    }

    Ok(())
}

pub async fn ffprobe_duration_seconds(path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .await
        .context("ffprobe duration failed")?;

    if !output.status.success() {
        return Err(anyhow::anyhow!("ffprobe failed"));
    }

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let duration = text.parse::<f64>().unwrap_or(-1.0);
    if duration <= 0.1 {
        return Err(anyhow::anyhow!("Invalid duration"));
    }
    Ok(duration)
}

pub fn is_still_image(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("jpg") | Some("jpeg") | Some("png")
    )
}

/// Args to re-encode one stock asset into a uniform 1920x1080/30fps segment
/// so the concat demuxer can join them. Still images are looped for
/// `seconds`; video clips are capped at `seconds`.
pub fn normalize_clip_args(input: &Path, seconds: f64, out_mp4: &Path) -> Vec<String> {
    let scale = format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:black,setsar=1,fps=30",
        w = FRAME_W,
        h = FRAME_H
    );

    let mut args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
    ];

    if is_still_image(input) {
        args.push("-loop".to_string());
        args.push("1".to_string());
    }

    args.extend([
        "-i".to_string(),
        input.display().to_string(),
        "-t".to_string(),
        format!("{:.3}", seconds),
        "-vf".to_string(),
        scale,
        "-an".to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-crf".to_string(),
        "22".to_string(),
        out_mp4.display().to_string(),
    ]);

    args
}

pub async fn ffmpeg_normalize_clip(input: &Path, seconds: f64, out_mp4: &Path) -> Result<bool> {
    let args = normalize_clip_args(input, seconds, out_mp4);
    run_cmd(&args).await?;
    Ok(out_mp4.exists())
}

pub async fn ffmpeg_concat_videos(list_txt: &Path, out_mp4: &Path) -> Result<bool> {
    let args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        list_txt.display().to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-crf".to_string(),
        "22".to_string(),
        out_mp4.display().to_string(),
    ];
    run_cmd(&args).await?;
    Ok(out_mp4.exists())
}

/// Args for the final pass: trim the concatenated footage to exactly the
/// narration duration, draw the title caption, and mux the narration track.
pub fn compose_final_args(
    footage_mp4: &Path,
    narration_mp3: &Path,
    caption_textfile: &Path,
    narration_dur: f64,
    out_mp4: &Path,
) -> Vec<String> {
    let filter = format!(
        "[0:v]drawtext=textfile='{}':fontcolor=white:fontsize=64:box=1:boxcolor=black@0.5:boxborderw=18:x=(w-text_w)/2:y=h*0.08[v]",
        caption_textfile.display()
    );

    vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        footage_mp4.display().to_string(),
        "-i".to_string(),
        narration_mp3.display().to_string(),
        "-t".to_string(),
        format!("{:.3}", narration_dur),
        "-filter_complex".to_string(),
        filter,
        "-map".to_string(),
        "[v]".to_string(),
        "-map".to_string(),
        "1:a".to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-crf".to_string(),
        "22".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        "192k".to_string(),
        "-shortest".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        out_mp4.display().to_string(),
    ]
}

pub async fn ffmpeg_compose_final(
    footage_mp4: &Path,
    narration_mp3: &Path,
    caption_textfile: &Path,
    narration_dur: f64,
    out_mp4: &Path,
) -> Result<bool> {
    let args = compose_final_args(
        footage_mp4,
        narration_mp3,
        caption_textfile,
        narration_dur,
        out_mp4,
    );
    run_cmd(&args).await?;
    Ok(out_mp4.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn still_image_detection() {
        assert!(is_still_image(Path::new("assets/stock/bg.jpg")));
        assert!(is_still_image(Path::new("bg.PNG")));
        assert!(!is_still_image(Path::new("assets/stock/stock_1.mp4")));
    }

    #[test]
    fn normalize_loops_images_but_not_videos() {
        let out = PathBuf::from("assets/norm_1.mp4");
        let img = normalize_clip_args(Path::new("bg.jpg"), 12.0, &out);
        assert!(img.contains(&"-loop".to_string()));

        let vid = normalize_clip_args(Path::new("stock_1.mp4"), 12.0, &out);
        assert!(!vid.contains(&"-loop".to_string()));
        assert!(vid.contains(&"12.000".to_string()));
        assert!(vid.iter().any(|a| a.contains("scale=1920:1080")));
    }

    #[test]
    fn final_pass_trims_to_narration_duration() {
        let args = compose_final_args(
            Path::new("assets/footage.mp4"),
            Path::new("assets/voice.mp3"),
            Path::new("assets/caption.txt"),
            33.48,
            Path::new("output/final.mp4"),
        );

        let t_pos = args.iter().position(|a| a == "-t").unwrap();
        assert_eq!(args[t_pos + 1], "33.480");
        assert!(args.contains(&"-shortest".to_string()));
        assert!(args.iter().any(|a| a.contains("drawtext")));
        assert!(args.contains(&"1:a".to_string()));
    }
}
