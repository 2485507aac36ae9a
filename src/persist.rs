use std::path::{Path, PathBuf};

use crate::error::{StreaklabError, StreaklabResult};

/// One raster snapshot, premultiplied RGBA8.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRgba {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

/// Persistence collaborator for stage snapshots. `save` must capture the
/// frame at call time; the pipeline relies on that to keep drawing from
/// racing a pending write. A returned error aborts the rest of the
/// pipeline.
pub trait SnapshotSink {
    fn save(&mut self, frame: &FrameRgba, name: &str) -> StreaklabResult<()>;
}

/// Writes each snapshot as `<dir>/<name>.png`.
pub struct PngDirSink {
    dir: PathBuf,
}

impl PngDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.png"))
    }
}

impl SnapshotSink for PngDirSink {
    fn save(&mut self, frame: &FrameRgba, name: &str) -> StreaklabResult<()> {
        let path = self.path_for(name);
        let data = if frame.premultiplied {
            unpremultiply(&frame.data)
        } else {
            frame.data.clone()
        };
        write_png(&path, &data, frame.width, frame.height)
    }
}

fn write_png(path: &Path, data: &[u8], width: u32, height: u32) -> StreaklabResult<()> {
    image::save_buffer_with_format(
        path,
        data,
        width,
        height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .map_err(|e| StreaklabError::persist(format!("write '{}': {e}", path.display())))
}

/// Collects snapshots in memory, in save order. Useful for capturing stage
/// output without touching the file system.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub frames: Vec<(String, FrameRgba)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<&str> {
        self.frames.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn frame(&self, name: &str) -> Option<&FrameRgba> {
        self.frames
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, frame)| frame)
    }
}

impl SnapshotSink for MemorySink {
    fn save(&mut self, frame: &FrameRgba, name: &str) -> StreaklabResult<()> {
        self.frames.push((name.to_string(), frame.clone()));
        Ok(())
    }
}

fn unpremultiply(premul: &[u8]) -> Vec<u8> {
    let mut out = premul.to_vec();
    for px in out.chunks_exact_mut(4) {
        let a = px[3];
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            let v = (u32::from(*c) * 255 + u32::from(a) / 2) / u32::from(a);
            *c = v.min(255) as u8;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(byte: u8) -> FrameRgba {
        FrameRgba {
            width: 2,
            height: 2,
            data: vec![byte; 16],
            premultiplied: true,
        }
    }

    #[test]
    fn unpremultiply_recovers_straight_color() {
        // white at 50% coverage: premul (128,128,128,128) -> straight 255
        let premul = [128u8, 128, 128, 128];
        let out = unpremultiply(&premul);
        assert_eq!(out, vec![255, 255, 255, 128]);
    }

    #[test]
    fn unpremultiply_keeps_opaque_and_empty_pixels() {
        let premul = [10u8, 20, 30, 255, 0, 0, 0, 0];
        assert_eq!(unpremultiply(&premul), premul.to_vec());
    }

    #[test]
    fn memory_sink_records_in_save_order() {
        let mut sink = MemorySink::new();
        sink.save(&frame(1), "stage1").unwrap();
        sink.save(&frame(2), "stage2").unwrap();
        assert_eq!(sink.names(), vec!["stage1", "stage2"]);
        assert_eq!(sink.frame("stage2").unwrap().data[0], 2);
        assert!(sink.frame("stage9").is_none());
    }

    #[test]
    fn memory_sink_captures_a_copy_at_call_time() {
        let mut sink = MemorySink::new();
        let mut f = frame(7);
        sink.save(&f, "stage1").unwrap();
        f.data.fill(0);
        assert_eq!(sink.frame("stage1").unwrap().data[0], 7);
    }

    #[test]
    fn png_sink_builds_stage_paths() {
        let sink = PngDirSink::new("out");
        assert_eq!(sink.path_for("stage3"), PathBuf::from("out/stage3.png"));
    }

    #[test]
    fn png_sink_save_to_missing_dir_is_a_persist_error() {
        let mut sink = PngDirSink::new("target/definitely/missing/dir");
        let err = sink.save(&frame(1), "stage1").unwrap_err();
        assert!(err.to_string().contains("persist error:"));
    }
}
