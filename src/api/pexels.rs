use crate::{logi, logw};
use anyhow::{Context, Result};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs;

const SEARCH_VIDEOS_URL: &str = "https://api.pexels.com/videos/search";
const SEARCH_PHOTOS_URL: &str = "https://api.pexels.com/v1/search";

/// One downloadable search hit: the asset id plus the direct URL of the
/// best rendition the API offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockAsset {
    pub id: u64,
    pub url: String,
    pub kind: AssetKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Video,
    Photo,
}

impl AssetKind {
    pub fn extension(self) -> &'static str {
        match self {
            AssetKind::Video => "mp4",
            AssetKind::Photo => "jpg",
        }
    }
}

/// Pull the asset list out of a videos-search payload. A missing or
/// malformed field is an error, matching the API contract.
pub fn parse_video_search(raw: &str) -> Result<Vec<StockAsset>> {
    let root: serde_json::Value =
        serde_json::from_str(raw).context("Pexels video search: invalid JSON")?;
    let videos = root
        .get("videos")
        .and_then(|v| v.as_array())
        .context("Pexels video search: missing 'videos' array")?;

    let mut out = Vec::with_capacity(videos.len());
    for video in videos {
        let id = video
            .get("id")
            .and_then(|v| v.as_u64())
            .context("Pexels video entry: missing 'id'")?;
        let files = video
            .get("video_files")
            .and_then(|v| v.as_array())
            .context("Pexels video entry: missing 'video_files'")?;

        // Widest rendition wins.
        let mut best: Option<(u64, &str)> = None;
        for file in files {
            let width = file.get("width").and_then(|v| v.as_u64()).unwrap_or(0);
            let link = file.get("link").and_then(|v| v.as_str());
            if let Some(link) = link {
                if best.map(|(w, _)| width > w).unwrap_or(true) {
                    best = Some((width, link));
                }
            }
        }

        let (_, link) = best.context("Pexels video entry: no usable video file link")?;
        out.push(StockAsset {
            id,
            url: link.to_string(),
            kind: AssetKind::Video,
        });
    }

    Ok(out)
}

/// Pull the asset list out of a photos-search payload (`src.large` per hit).
pub fn parse_photo_search(raw: &str) -> Result<Vec<StockAsset>> {
    let root: serde_json::Value =
        serde_json::from_str(raw).context("Pexels photo search: invalid JSON")?;
    let photos = root
        .get("photos")
        .and_then(|v| v.as_array())
        .context("Pexels photo search: missing 'photos' array")?;

    let mut out = Vec::with_capacity(photos.len());
    for photo in photos {
        let id = photo
            .get("id")
            .and_then(|v| v.as_u64())
            .context("Pexels photo entry: missing 'id'")?;
        let large = photo
            .get("src")
            .and_then(|s| s.get("large"))
            .and_then(|v| v.as_str())
            .context("Pexels photo entry: missing 'src.large'")?;
        out.push(StockAsset {
            id,
            url: large.to_string(),
            kind: AssetKind::Photo,
        });
    }

    Ok(out)
}

async fn search(
    client: &Client,
    api_key: &str,
    url: &str,
    query: &str,
    per_page: usize,
) -> Result<String> {
    let per_page = per_page.to_string();
    let resp = client
        .get(url)
        .header("Authorization", api_key)
        .query(&[("query", query), ("per_page", per_page.as_str())])
        .timeout(std::time::Duration::from_secs(30))
        .send()
        .await
        .context("Pexels search request failed")?;

    let status = resp.status();
    let raw = resp.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(anyhow::anyhow!(
            "Pexels search HTTP {}: {}",
            status.as_u16(),
            raw.chars().take(200).collect::<String>()
        ));
    }

    Ok(raw)
}

pub async fn search_videos(
    client: &Client,
    api_key: &str,
    query: &str,
    per_page: usize,
) -> Result<Vec<StockAsset>> {
    let raw = search(client, api_key, SEARCH_VIDEOS_URL, query, per_page).await?;
    parse_video_search(&raw)
}

pub async fn search_photos(
    client: &Client,
    api_key: &str,
    query: &str,
    per_page: usize,
) -> Result<Vec<StockAsset>> {
    let raw = search(client, api_key, SEARCH_PHOTOS_URL, query, per_page).await?;
    parse_photo_search(&raw)
}

/// Download each asset into `dir` in API order, one at a time. No retry; a
/// failed download fails the run.
pub async fn download_assets(
    client: &Client,
    assets: &[StockAsset],
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create dir {}", dir.display()))?;

    let mut paths = Vec::with_capacity(assets.len());
    for (idx, asset) in assets.iter().enumerate() {
        let dest = dir.join(format!("stock_{}.{}", idx + 1, asset.kind.extension()));
        logi(format!(
            "Downloading stock asset {}/{} (id {}) -> {}",
            idx + 1,
            assets.len(),
            asset.id,
            dest.display()
        ));

        let resp = client
            .get(&asset.url)
            .timeout(std::time::Duration::from_secs(120))
            .send()
            .await
            .with_context(|| format!("Stock download failed: {}", asset.url))?;

        if !resp.status().is_success() {
            logw(format!(
                "Stock download HTTP {} for asset {}",
                resp.status().as_u16(),
                asset.id
            ));
            return Err(anyhow::anyhow!("Stock download failed for asset {}", asset.id));
        }

        let bytes = resp.bytes().await.context("Stock download read failed")?;
        fs::write(&dest, &bytes).await?;
        paths.push(dest);
    }

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_search_yields_entries_in_order() {
        let raw = r#"{"videos":[
            {"id":11,"video_files":[
                {"link":"https://v.example/a-sd.mp4","width":640},
                {"link":"https://v.example/a-hd.mp4","width":1920}]},
            {"id":22,"video_files":[
                {"link":"https://v.example/b.mp4","width":1280}]},
            {"id":33,"video_files":[
                {"link":"https://v.example/c.mp4","width":1920}]}
        ]}"#;

        let assets = parse_video_search(raw).unwrap();
        assert_eq!(assets.len(), 3);
        assert_eq!(assets[0].id, 11);
        assert_eq!(assets[0].url, "https://v.example/a-hd.mp4");
        assert_eq!(assets[1].id, 22);
        assert_eq!(assets[2].id, 33);
        assert!(assets.iter().all(|a| a.kind == AssetKind::Video));
    }

    #[test]
    fn empty_video_list_is_ok() {
        let assets = parse_video_search(r#"{"videos":[]}"#).unwrap();
        assert!(assets.is_empty());
    }

    #[test]
    fn missing_videos_field_errors() {
        assert!(parse_video_search(r#"{"page":1}"#).is_err());
        assert!(parse_video_search("not json").is_err());
    }

    #[test]
    fn video_entry_without_links_errors() {
        let raw = r#"{"videos":[{"id":1,"video_files":[{"width":640}]}]}"#;
        assert!(parse_video_search(raw).is_err());
    }

    #[test]
    fn photo_search_picks_large_src() {
        let raw = r#"{"photos":[
            {"id":7,"src":{"original":"https://p.example/o.jpg","large":"https://p.example/l.jpg"}}
        ]}"#;
        let assets = parse_photo_search(raw).unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].url, "https://p.example/l.jpg");
        assert_eq!(assets[0].kind, AssetKind::Photo);
    }

    #[test]
    fn photo_without_large_errors() {
        let raw = r#"{"photos":[{"id":7,"src":{"original":"https://p.example/o.jpg"}}]}"#;
        assert!(parse_photo_search(raw).is_err());
    }
}
