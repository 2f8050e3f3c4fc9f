//! Learning an image's size before the canvas becomes interactive.
//!
//! The fetch never fails the widget: errors are logged and turned into an
//! unknown size, and the canvas shows its placeholder until the size arrives.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use image::metadata::Orientation;
use image::{ImageDecoder, ImageReader};

use crate::constants::{FETCH_USER_AGENT, MAX_FETCH_BYTES};
use crate::error::FetchError;

/// Looks up the displayed size of an image by URL.
pub trait ImageSizeFetcher: Send {
    /// `(width, height)` after applying EXIF orientation.
    fn fetch_size(&self, url: &str) -> Result<(u32, u32), FetchError>;
}

/// Fetch a size, degrading any failure to `None` with a warning.
pub fn image_size_or_none(fetcher: &dyn ImageSizeFetcher, url: &str) -> Option<(u32, u32)> {
    match fetcher.fetch_size(url) {
        Ok(size) => Some(size),
        Err(e) => {
            log::warn!("Could not get image size for {}: {}", url, e);
            None
        }
    }
}

/// Read `(width, height)` from encoded image bytes, honoring EXIF orientation.
///
/// Only the header is decoded.
pub fn size_from_bytes(bytes: &[u8]) -> Result<(u32, u32), FetchError> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_decoder()?;
    let (width, height) = decoder.dimensions();
    let orientation = decoder.orientation()?;
    log::debug!("Raw dimensions {}x{}, orientation {:?}", width, height, orientation);

    let rotated = matches!(
        orientation,
        Orientation::Rotate90
            | Orientation::Rotate270
            | Orientation::Rotate90FlipH
            | Orientation::Rotate270FlipH
    );
    Ok(if rotated { (height, width) } else { (width, height) })
}

/// Fetches the image over HTTP and reads its header.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpImageSizeFetcher;

impl ImageSizeFetcher for HttpImageSizeFetcher {
    fn fetch_size(&self, url: &str) -> Result<(u32, u32), FetchError> {
        let start = web_time::Instant::now();

        let response = ureq::get(url)
            .set("User-Agent", FETCH_USER_AGENT)
            .call()
            .map_err(Box::new)?;

        let mut bytes = Vec::new();
        response.into_reader().take(MAX_FETCH_BYTES).read_to_end(&mut bytes)?;

        let size = size_from_bytes(&bytes)?;
        log::info!(
            "Fetched size {}x{} for {} ({} bytes) in {:?}",
            size.0,
            size.1,
            url,
            bytes.len(),
            start.elapsed()
        );
        Ok(size)
    }
}

/// Serves sizes from a fixed table. Unknown URLs fail like a 404.
#[derive(Debug, Clone, Default)]
pub struct StaticSizeFetcher {
    sizes: HashMap<String, (u32, u32)>,
}

impl StaticSizeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, size: (u32, u32)) -> Self {
        self.sizes.insert(url.into(), size);
        self
    }
}

impl ImageSizeFetcher for StaticSizeFetcher {
    fn fetch_size(&self, url: &str) -> Result<(u32, u32), FetchError> {
        self.sizes.get(url).copied().ok_or_else(|| {
            FetchError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no image at {}", url),
            ))
        })
    }
}

/// Identity of one displayed image. Bumped on every mount or image change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ImageTicket(pub u64);

impl ImageTicket {
    pub fn next(self) -> Self {
        ImageTicket(self.0 + 1)
    }
}

/// Outcome of one background size fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeResult {
    pub ticket: ImageTicket,
    pub url: String,
    /// `None` when the fetch failed
    pub size: Option<(u32, u32)>,
}

struct SizeRequest {
    ticket: ImageTicket,
    url: String,
}

/// Message sent to the fetch thread.
enum ThreadMessage {
    Fetch(SizeRequest),
    Shutdown,
}

/// Runs size fetches on a background thread so pointer handling never waits
/// on the network.
///
/// Results are polled with [`SizeFetchThread::take_one_result`]; it is up to
/// the caller to drop results whose ticket is no longer current.
pub struct SizeFetchThread {
    request_tx: Sender<ThreadMessage>,
    result_rx: Receiver<SizeResult>,
    thread_handle: Option<JoinHandle<()>>,
    pending: usize,
}

impl SizeFetchThread {
    /// Spawn the fetch thread around a fetcher.
    pub fn spawn(fetcher: Box<dyn ImageSizeFetcher>) -> std::io::Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<ThreadMessage>();
        let (result_tx, result_rx) = mpsc::channel::<SizeResult>();

        let thread_handle = thread::Builder::new()
            .name("image-size-fetch".to_string())
            .spawn(move || {
                log::debug!("Image size fetch thread started");
                Self::thread_loop(fetcher.as_ref(), request_rx, result_tx);
                log::debug!("Image size fetch thread exiting");
            })?;

        Ok(Self {
            request_tx,
            result_rx,
            thread_handle: Some(thread_handle),
            pending: 0,
        })
    }

    fn thread_loop(
        fetcher: &dyn ImageSizeFetcher,
        request_rx: Receiver<ThreadMessage>,
        result_tx: Sender<SizeResult>,
    ) {
        loop {
            match request_rx.recv() {
                Ok(ThreadMessage::Fetch(request)) => {
                    let size = image_size_or_none(fetcher, &request.url);
                    let result = SizeResult {
                        ticket: request.ticket,
                        url: request.url,
                        size,
                    };
                    if result_tx.send(result).is_err() {
                        log::warn!("Result channel closed, fetch thread exiting");
                        break;
                    }
                }
                Ok(ThreadMessage::Shutdown) | Err(_) => break,
            }
        }
    }

    /// Queue a fetch for the image identified by `ticket`.
    pub fn request(&mut self, ticket: ImageTicket, url: &str) {
        let request = SizeRequest {
            ticket,
            url: url.to_string(),
        };
        if self.request_tx.send(ThreadMessage::Fetch(request)).is_err() {
            log::error!("Failed to send size request: channel closed");
        } else {
            self.pending += 1;
            log::debug!("Requested size for {} ({:?})", url, ticket);
        }
    }

    /// Take one completed result. Non-blocking.
    pub fn take_one_result(&mut self) -> Option<SizeResult> {
        match self.result_rx.try_recv() {
            Ok(result) => {
                self.pending = self.pending.saturating_sub(1);
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                log::warn!("Size fetch thread disconnected");
                None
            }
        }
    }

    /// Block until one result arrives or the thread is gone.
    pub fn wait_one_result(&mut self) -> Option<SizeResult> {
        let result = self.result_rx.recv().ok()?;
        self.pending = self.pending.saturating_sub(1);
        Some(result)
    }

    /// Number of requests without a result yet.
    pub fn pending_count(&self) -> usize {
        self.pending
    }
}

impl Drop for SizeFetchThread {
    fn drop(&mut self) {
        let _ = self.request_tx.send(ThreadMessage::Shutdown);
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                log::warn!("Size fetch thread panicked: {:?}", e);
            }
        }
    }
}
