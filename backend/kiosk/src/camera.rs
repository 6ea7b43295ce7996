//! # Directory Camera
//!
//! Stands in for a webcam on hosts without one. Every `.jpg`, `.jpeg` and
//! `.png` file in a folder is loaded at open, sorted by name, and shown in a
//! loop at a fixed frame rate.
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use anyhow::{Context, Error, bail};
use bytes::Bytes;
use claim::{CaptureBackend, Frame, FrameSource};
use tokio::{runtime::Handle, task::JoinHandle, time::interval};
use tracing::{debug, info};

pub struct DirectoryCamera {
    dir: PathBuf,
    fps: u32,
}

impl DirectoryCamera {
    pub fn new(dir: impl Into<PathBuf>, fps: u32) -> Self {
        Self {
            dir: dir.into(),
            fps: fps.max(1),
        }
    }
}

fn content_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();

    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        _ => None,
    }
}

fn load_frames(dir: &Path) -> Result<Vec<Frame>, Error> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("opening frame directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| content_type(path).is_some())
        .collect();
    paths.sort();

    let mut frames = Vec::with_capacity(paths.len());
    for path in paths {
        let data = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        let content_type = content_type(&path).unwrap_or("image/jpeg");

        frames.push(Frame {
            data: Bytes::from(data),
            content_type: content_type.to_string(),
        });
    }

    if frames.is_empty() {
        bail!("no images in {}", dir.display());
    }

    Ok(frames)
}

impl CaptureBackend for DirectoryCamera {
    fn open(&self) -> Result<Box<dyn FrameSource>, Error> {
        let frames = load_frames(&self.dir)?;
        let runtime = Handle::try_current().context("camera needs a tokio runtime")?;

        info!(frames = frames.len(), fps = self.fps, dir = %self.dir.display(), "Directory camera started");

        let latest = Arc::new(Mutex::new(Some(frames[0].clone())));
        let period = Duration::from_secs(1) / self.fps;

        let feed = latest.clone();
        let task = runtime.spawn(async move {
            let mut ticker = interval(period);
            for frame in frames.iter().cycle() {
                ticker.tick().await;
                *feed.lock().unwrap_or_else(PoisonError::into_inner) = Some(frame.clone());
            }
        });

        Ok(Box::new(DirectoryFeed { latest, task }))
    }
}

struct DirectoryFeed {
    latest: Arc<Mutex<Option<Frame>>>,
    task: JoinHandle<()>,
}

impl FrameSource for DirectoryFeed {
    fn latest_frame(&self) -> Option<Frame> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn stop(&mut self) {
        self.task.abort();
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        debug!("Directory camera stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::{env, process};

    use super::*;

    fn frame_dir(name: &str, files: &[(&str, &[u8])]) -> PathBuf {
        let dir = env::temp_dir().join(format!("kiosk-{name}-{}", process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        for (file, data) in files {
            fs::write(dir.join(file), data).unwrap();
        }

        dir
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type(Path::new("a.JPG")), Some("image/jpeg"));
        assert_eq!(content_type(Path::new("a.png")), Some("image/png"));
        assert_eq!(content_type(Path::new("notes.txt")), None);
        assert_eq!(content_type(Path::new("noext")), None);
    }

    #[test]
    fn test_load_frames_sorted_images_only() {
        let dir = frame_dir(
            "sorted",
            &[("b.png", b"second"), ("a.jpg", b"first"), ("readme.txt", b"skip")],
        );

        let frames = load_frames(&dir).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].data.as_ref(), b"first");
        assert_eq!(frames[0].content_type, "image/jpeg");
        assert_eq!(frames[1].content_type, "image/png");

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_empty_dir_fails() {
        let dir = frame_dir("empty", &[]);
        assert!(load_frames(&dir).is_err());

        fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_cycles_and_stops() {
        let dir = frame_dir("cycle", &[("1.jpg", b"one"), ("2.jpg", b"two")]);
        let camera = DirectoryCamera::new(&dir, 10);

        let mut feed = camera.open().unwrap();
        assert_eq!(feed.latest_frame().unwrap().data.as_ref(), b"one");

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(feed.latest_frame().unwrap().data.as_ref(), b"two");

        feed.stop();
        assert!(feed.latest_frame().is_none());

        fs::remove_dir_all(dir).unwrap();
    }
}
