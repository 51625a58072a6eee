use crate::{AssetError, TextureImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

type LoadResult = Result<Arc<TextureImage>, AssetError>;

/// State of a pending texture load as seen by one poll.
#[derive(Debug)]
pub enum LoadPoll {
    /// Decode still running.
    Pending,
    /// The load finished. Returned exactly once per load.
    Ready(LoadResult),
    /// The result was already handed out by an earlier poll.
    Consumed,
}

/// Loads textures relative to an asset root on a background thread.
#[derive(Debug, Clone)]
pub struct TextureLoader {
    root: PathBuf,
}

impl TextureLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an asset path. Leading `/` is treated as the asset root, the
    /// way a static file server maps `/assets/...`.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        let relative = relative.as_ref();
        let trimmed = relative.strip_prefix("/").unwrap_or(relative);
        self.root.join(trimmed)
    }

    /// Start decoding `relative` on a worker thread.
    pub fn load(&self, relative: impl AsRef<Path>) -> PendingTexture {
        let path = self.resolve(relative);
        let (tx, rx) = mpsc::channel();
        let worker_path = path.clone();

        tracing::debug!(path = %path.display(), "spawning texture load");
        let spawned = std::thread::Builder::new()
            .name("texture-loader".into())
            .spawn(move || {
                let result = TextureImage::decode_file(&worker_path).map(Arc::new);
                if let Ok(tex) = &result {
                    tracing::debug!(
                        path = %worker_path.display(),
                        width = tex.width(),
                        height = tex.height(),
                        "texture decoded"
                    );
                }
                // Receiver gone means nobody is waiting anymore.
                let _ = tx.send(result);
            });

        match spawned {
            Ok(_) => PendingTexture {
                path,
                rx: Some(rx),
            },
            Err(source) => PendingTexture::ready(
                path.clone(),
                Err(AssetError::Io { path, source }),
            ),
        }
    }
}

/// One-shot completion handle for a texture load.
#[derive(Debug)]
pub struct PendingTexture {
    path: PathBuf,
    rx: Option<Receiver<LoadResult>>,
}

impl PendingTexture {
    /// A load that has already completed with `result`.
    pub fn ready(path: impl Into<PathBuf>, result: LoadResult) -> Self {
        let (tx, rx) = mpsc::channel();
        // The receiver is held right here, so the send cannot fail.
        let _ = tx.send(result);
        Self {
            path: path.into(),
            rx: Some(rx),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True once the result has been handed out.
    pub fn is_consumed(&self) -> bool {
        self.rx.is_none()
    }

    /// Non-blocking check for completion.
    pub fn poll(&mut self) -> LoadPoll {
        let Some(rx) = &self.rx else {
            return LoadPoll::Consumed;
        };
        match rx.try_recv() {
            Ok(result) => {
                self.rx = None;
                LoadPoll::Ready(result)
            }
            Err(TryRecvError::Empty) => LoadPoll::Pending,
            Err(TryRecvError::Disconnected) => {
                self.rx = None;
                LoadPoll::Ready(Err(AssetError::Disconnected(self.path.clone())))
            }
        }
    }

    /// Block for up to `timeout` waiting for completion.
    pub fn wait(&mut self, timeout: Duration) -> LoadPoll {
        let Some(rx) = &self.rx else {
            return LoadPoll::Consumed;
        };
        match rx.recv_timeout(timeout) {
            Ok(result) => {
                self.rx = None;
                LoadPoll::Ready(result)
            }
            Err(RecvTimeoutError::Timeout) => LoadPoll::Pending,
            Err(RecvTimeoutError::Disconnected) => {
                self.rx = None;
                LoadPoll::Ready(Err(AssetError::Disconnected(self.path.clone())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_secs(10);

    fn write_png(dir: &Path, name: &str) {
        let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([255, 0, 0, 255]));
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn resolve_strips_leading_slash() {
        let loader = TextureLoader::new("/srv/public");
        assert_eq!(
            loader.resolve("/assets/earth_day_4096.jpg"),
            PathBuf::from("/srv/public/assets/earth_day_4096.jpg")
        );
        assert_eq!(
            loader.resolve("assets/a.png"),
            PathBuf::from("/srv/public/assets/a.png")
        );
    }

    #[test]
    fn load_delivers_once() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "earth.png");
        let loader = TextureLoader::new(dir.path());

        let mut pending = loader.load("earth.png");
        match pending.wait(WAIT) {
            LoadPoll::Ready(Ok(tex)) => assert_eq!(tex.width(), 4),
            other => panic!("expected decoded texture, got {other:?}"),
        }
        assert!(pending.is_consumed());
        assert!(matches!(pending.poll(), LoadPoll::Consumed));
        assert!(matches!(pending.wait(WAIT), LoadPoll::Consumed));
    }

    #[test]
    fn load_missing_file_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let loader = TextureLoader::new(dir.path());
        let mut pending = loader.load("/assets/nope.jpg");
        match pending.wait(WAIT) {
            LoadPoll::Ready(Err(AssetError::Io { path, .. })) => {
                assert!(path.ends_with("assets/nope.jpg"));
            }
            other => panic!("expected IO error, got {other:?}"),
        }
    }

    #[test]
    fn ready_handle_is_immediately_settled() {
        let tex = Arc::new(TextureImage::solid(1, 1, [0, 0, 0, 255]));
        let mut pending = PendingTexture::ready("mem", Ok(tex));
        assert!(!pending.is_consumed());
        assert!(matches!(pending.poll(), LoadPoll::Ready(Ok(_))));
        assert!(matches!(pending.poll(), LoadPoll::Consumed));
    }

    #[test]
    fn dropped_sender_is_reported_as_disconnected() {
        let (tx, rx) = mpsc::channel::<LoadResult>();
        drop(tx);
        let mut pending = PendingTexture {
            path: PathBuf::from("gone.png"),
            rx: Some(rx),
        };
        assert!(matches!(
            pending.poll(),
            LoadPoll::Ready(Err(AssetError::Disconnected(_)))
        ));
    }
}
