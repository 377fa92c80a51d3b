use argus_foundation::error::EmitError;

/// Contract for the client's bidirectional data channel.
///
/// The transport attaches one channel per session at most once. Senders
/// capture the reference under the session lock and test `is_open()`
/// before writing; a closed channel drops events silently.
pub trait DataChannel: Send + Sync {
    fn label(&self) -> &str;

    fn is_open(&self) -> bool;

    /// Send one newline-free JSON object.
    fn send(&self, text: &str) -> Result<(), EmitError>;

    /// Close the underlying channel. Default is a no-op for transports
    /// that tear down on their own.
    fn close(&self) {}
}
