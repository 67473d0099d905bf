//! Display host that writes delivered frames to a directory.

use std::cell::Cell;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rview_core::{DisplayHost, EncodedImage};
use tracing::{debug, warn};

pub struct FrameDirectory {
    dir: PathBuf,
    written: Rc<Cell<u64>>,
}

impl FrameDirectory {
    /// Use `dir` as the frame sink, creating it if needed.
    pub fn create(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            written: Rc::new(Cell::new(0)),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Shared count of frames written successfully. Stays readable after
    /// the host has moved into a session.
    pub fn written(&self) -> Rc<Cell<u64>> {
        self.written.clone()
    }

    /// `frame-NNNNN.<ext>` for a frame.
    pub fn file_name(image: &EncodedImage) -> String {
        format!("frame-{:05}.{}", image.frame_number, image.format.extension())
    }
}

impl DisplayHost for FrameDirectory {
    fn deliver(&mut self, image: EncodedImage) {
        let path = self.dir.join(Self::file_name(&image));
        match std::fs::write(&path, &image.data) {
            Ok(()) => {
                self.written.set(self.written.get() + 1);
                debug!(path = %path.display(), bytes = image.data.len(), "frame written");
            }
            Err(e) => warn!("failed to write {}: {e}", path.display()),
        }
    }
}
