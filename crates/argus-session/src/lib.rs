pub mod channel;
pub mod emitter;
pub mod events;
pub mod http_sink;
pub mod pipeline;
pub mod registry;
pub mod session;

pub use channel::DataChannel;
pub use emitter::{DataChannelSink, Emitter};
pub use events::{AnalysisEvent, SessionConfigPayload, SessionSummary};
pub use http_sink::{HttpSink, SinkClient};
pub use pipeline::{PipelineDependencies, SessionPipeline};
pub use registry::SessionRegistry;
pub use session::Session;
