pub mod compose;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod synth;
pub mod video;

pub use error::{BlendError, BlendResult};
pub use extract::ObjectExtractor;
pub use synth::BackgroundSynthesizer;
pub use video::VideoSink;
