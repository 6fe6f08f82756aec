//! Writing extraction and layout results to disk

use anyhow::{Context, Result};
use screenflow_extract::{ExtractionReport, ExtractionStats};
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

/// Name of the manifest written next to the extracted frames
pub const MANIFEST_NAME: &str = "frames.json";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub index: usize,
    pub time: f64,
    pub width: u32,
    pub height: u32,
    /// File name relative to the manifest
    pub file: String,
}

/// Describes the frames written by `write_frames`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameManifest {
    pub source: String,
    pub frames: Vec<ManifestEntry>,
    pub stats: ExtractionStats,
}

/// Writes every kept frame into `dir` as `frame_NNN.<ext>` plus a manifest
pub fn write_frames(dir: &Path, source: &Path, report: &ExtractionReport) -> Result<FrameManifest> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut frames = Vec::with_capacity(report.frames.len());
    for (index, frame) in report.frames.iter().enumerate() {
        let file = format!("frame_{:03}.{}", index, frame.encoding.extension());
        let path = dir.join(&file);
        fs::write(&path, &frame.data)
            .with_context(|| format!("Failed to write frame {}", path.display()))?;
        frames.push(ManifestEntry {
            index,
            time: frame.time,
            width: frame.width,
            height: frame.height,
            file,
        });
    }

    let manifest = FrameManifest {
        source: source.display().to_string(),
        frames,
        stats: report.stats.clone(),
    };
    write_json(&dir.join(MANIFEST_NAME), &manifest)?;
    Ok(manifest)
}

/// Pretty-prints `value` as JSON into `path`
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use screenflow_core::{CapturedFrame, ImageEncoding};
    use tempfile::TempDir;

    fn report() -> ExtractionReport {
        ExtractionReport {
            frames: vec![
                CapturedFrame::new(0.0, 4, 3, ImageEncoding::Jpeg, vec![0xFF, 0xD8, 1]),
                CapturedFrame::new(9.95, 4, 3, ImageEncoding::Jpeg, vec![0xFF, 0xD8, 2]),
            ],
            stats: ExtractionStats {
                checkpoints: 11,
                scanned: 11,
                kept: 2,
                low_complexity: 9,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_write_frames_and_manifest() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("frames");
        let manifest = write_frames(&out, Path::new("demo.mp4"), &report()).unwrap();

        assert_eq!(manifest.frames.len(), 2);
        assert_eq!(fs::read(out.join("frame_000.jpg")).unwrap(), vec![0xFF, 0xD8, 1]);
        assert_eq!(fs::read(out.join("frame_001.jpg")).unwrap(), vec![0xFF, 0xD8, 2]);

        let json: serde_json::Value =
            serde_json::from_slice(&fs::read(out.join(MANIFEST_NAME)).unwrap()).unwrap();
        assert_eq!(json["source"], "demo.mp4");
        assert_eq!(json["frames"][1]["time"], 9.95);
        assert_eq!(json["frames"][1]["file"], "frame_001.jpg");
        assert_eq!(json["stats"]["lowComplexity"], 9);
    }

    #[test]
    fn test_write_json_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/out/layout.json");
        write_json(&path, &vec![1, 2, 3]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().split_whitespace().collect::<String>(), "[1,2,3]");
    }
}
