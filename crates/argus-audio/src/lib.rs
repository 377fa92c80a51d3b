pub mod adapter;
pub mod chunker;
pub mod fanout;
pub mod frame;
pub mod queue;
pub mod resampler;

pub use adapter::{AudioFrameAdapter, PcmFrameAdapter};
pub use chunker::PcmChunker;
pub use fanout::{AudioFanOut, FanOutDrops};
pub use frame::AudioFrame;
pub use queue::AudioFrameQueue;
pub use resampler::StreamResampler;
