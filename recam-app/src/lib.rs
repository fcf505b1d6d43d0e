//! Recam App
//!
//! Command line tools that normalize a camera track and its video to the
//! frame count and resolution the re-synthesis model expects.
//!
//! Binaries:
//! - `change_camera_framecount`: resample a camera JSON file
//! - `change_video_framecount`: resample and re-encode a video
//! - `prepare_pair`: both, for one clip, with inference defaults

pub mod cli;
pub mod logging;
pub mod pair;

pub use logging::{LoggingConfig, init_logging};
pub use pair::{PairError, PairJob, PairReport};
