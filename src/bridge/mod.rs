//! Everything that crosses the boundary to the embedding host: call-time
//! parameters, the props sent to the frontend, the image size lookup, and the
//! sink that receives committed values.

pub mod fetch;
pub mod host;
pub mod props;
pub mod request;

pub use fetch::{
    HttpImageSizeFetcher, ImageSizeFetcher, ImageTicket, SizeFetchThread, SizeResult,
    StaticSizeFetcher, image_size_or_none, size_from_bytes,
};
pub use host::{HostSink, RecordingHost, encode_value};
pub use props::{ComponentProps, IngestedBoxes};
pub use request::{DetectionRequest, ImageSource, InMemoryMediaStore, MediaStore};
