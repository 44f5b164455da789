use anyhow::{Context, Result};
use rand::Rng;
use std::path::Path;
use tokio::fs;
use tokio::process::Command;

pub const THUMB_W: i32 = 1280;
pub const THUMB_H: i32 = 720;
const WRAP_COLS: usize = 22;

const PHRASE_CANDIDATES: &[&str] = &[
    "AI PAYS MY BILLS",
    "$500/DAY WITH AI?!",
    "NOBODY TALKS ABOUT THIS",
    "FREE AI MONEY MACHINE",
    "START THIS TODAY",
];

pub fn pick_phrase<R: Rng>(rng: &mut R) -> String {
    PHRASE_CANDIDATES[rng.gen_range(0..PHRASE_CANDIDATES.len())].to_string()
}

/// Greedy word wrap so long phrases stay inside the canvas. A single word
/// longer than the column limit gets its own line, unbroken.
pub fn wrap_phrase(phrase: &str, cols: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in phrase.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.len() + 1 + word.len() <= cols {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines.join("\n")
}

pub fn thumbnail_args(caption_textfile: &Path, out_jpg: &Path) -> Vec<String> {
    let filter = format!(
        "drawtext=textfile='{}':fontcolor=white:fontsize=96:line_spacing=20:x=(w-text_w)/2:y=(h-text_h)/2",
        caption_textfile.display()
    );

    vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "lavfi".to_string(),
        "-i".to_string(),
        format!("color=c=0x1e1e1e:s={}x{}", THUMB_W, THUMB_H),
        "-frames:v".to_string(),
        "1".to_string(),
        "-vf".to_string(),
        filter,
        "-q:v".to_string(),
        "2".to_string(),
        out_jpg.display().to_string(),
    ]
}

pub async fn render_thumbnail(phrase: &str, out_jpg: &Path) -> Result<bool> {
    let textfile = out_jpg.with_extension("txt");
    fs::write(&textfile, wrap_phrase(phrase, WRAP_COLS))
        .await
        .with_context(|| format!("Failed to write caption file {}", textfile.display()))?;

    let args = thumbnail_args(&textfile, out_jpg);
    let mut cmd = Command::new(&args[0]);
    cmd.args(&args[1..]);
    let status = cmd.status().await.context("ffmpeg thumbnail render failed")?;
    if !status.success() {
        return Err(anyhow::anyhow!("Thumbnail render failed: {:?}", args));
    }

    Ok(out_jpg.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_respects_column_limit() {
        let wrapped = wrap_phrase("NOBODY TALKS ABOUT THIS HIDDEN AI HUSTLE", 22);
        for line in wrapped.lines() {
            assert!(line.len() <= 22, "line too long: {:?}", line);
        }
        assert!(wrapped.lines().count() > 1);
    }

    #[test]
    fn wrap_keeps_short_phrase_on_one_line() {
        assert_eq!(wrap_phrase("START THIS TODAY", 22), "START THIS TODAY");
    }

    #[test]
    fn wrap_handles_oversized_word() {
        let wrapped = wrap_phrase("SUPERCALIFRAGILISTICEXPIALIDOCIOUS AI", 10);
        assert_eq!(wrapped.lines().count(), 2);
        assert_eq!(wrapped.lines().next().unwrap(), "SUPERCALIFRAGILISTICEXPIALIDOCIOUS");
    }

    #[test]
    fn canvas_is_fixed_size_regardless_of_phrase() {
        let args = thumbnail_args(
            Path::new("assets/thumb.txt"),
            Path::new("output/thumbnail.jpg"),
        );
        assert!(args.contains(&"color=c=0x1e1e1e:s=1280x720".to_string()));
        assert!(args.contains(&"1".to_string()));
    }

    #[test]
    fn picked_phrase_is_a_candidate() {
        use rand::SeedableRng;
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let p = pick_phrase(&mut rng);
            assert!(PHRASE_CANDIDATES.contains(&p.as_str()));
        }
    }
}
