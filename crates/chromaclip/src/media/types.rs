/// A decoded frame ready for GPU upload.
pub struct DecodedFrame {
    pub data: Vec<u8>, // RGBA8
    pub width: u32,
    pub height: u32,
}

/// Lifecycle of one clip session.
///
/// Transitions are driven by the initiating `play` call and by decoder
/// events, never by the render loop directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No decoder-creation request issued yet.
    Uninitialized,
    /// Decoder creation requested on the media runtime.
    AwaitingDecoder,
    /// A prepare request has been issued; waiting on the decoder.
    Preparing,
    /// Prepared and started; frames may arrive.
    Playing,
    /// The clip ran to its end.
    Completed,
    /// The decoder reported an error; draws become no-ops.
    Failed,
}

/// Asynchronous decoder notification, delivered serialized from the decoder's
/// callback context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Prepared,
    Completed,
    Error { code: i32, detail: String },
}

/// Pure transition function for the playback state machine.
///
/// Events that have no meaning in the current state leave it unchanged; a
/// stale `Prepared` after a session restart, for example, must not move the
/// new session forward.
pub fn transition(state: PlaybackState, event: &LifecycleEvent) -> PlaybackState {
    use LifecycleEvent as E;
    use PlaybackState as S;
    match (state, event) {
        (S::Preparing, E::Prepared) => S::Playing,
        (S::Preparing | S::Playing, E::Completed) => S::Completed,
        (S::Preparing | S::Playing, E::Error { .. }) => S::Failed,
        (s, _) => s,
    }
}
