//! Playback lifecycle: decoder creation, source binding, preparation, and
//! the state machine driven by decoder events.
//!
//! The render loop only ever asks non-blocking questions of this module
//! (`is_drawable`, `is_started`, `state`); the single blocking wait in the
//! system is `play` waiting for the decoder instance to exist.

pub mod decoder;
pub mod runtime;
pub mod sync;
pub mod types;

use std::sync::{Arc, Mutex};

use crate::assets::AssetProvider;
use crate::error::ClipError;
use decoder::{ClipDecoder, FrameSink};
use runtime::MediaRuntime;
use sync::{FrameMailbox, ReadyGate};
use types::{LifecycleEvent, PlaybackState, transition};

type SharedDecoder = Arc<Mutex<Option<Box<dyn ClipDecoder>>>>;

/// Guarded session record: the state machine plus the started/prepared flags
/// the render loop reads.
#[derive(Debug)]
struct Session {
    state: PlaybackState,
    started: bool,
    prepared: bool,
}

impl Session {
    fn new() -> Self {
        Self {
            state: PlaybackState::Uninitialized,
            started: false,
            prepared: false,
        }
    }
}

/// Governs one clip session: decoder creation, `play`, and status queries.
///
/// The decoder instance is created asynchronously on the media runtime and
/// persists for the controller's lifetime; re-entrant `play` calls reuse it.
pub struct PlaybackController {
    session: Arc<Mutex<Session>>,
    decoder: SharedDecoder,
    gate: Arc<ReadyGate>,
    frames: Arc<FrameMailbox>,
}

impl PlaybackController {
    pub fn new(frames: Arc<FrameMailbox>) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::new())),
            decoder: Arc::new(Mutex::new(None)),
            gate: Arc::new(ReadyGate::new()),
            frames,
        }
    }

    /// Issue the asynchronous decoder-creation request on the media runtime.
    ///
    /// The factory runs on the media thread; once the instance is stored the
    /// ready gate opens and any `play` call blocked on it proceeds.
    pub fn request_decoder<F>(&self, runtime: &MediaRuntime, factory: F)
    where
        F: FnOnce(LifecycleSink) -> Box<dyn ClipDecoder> + Send + 'static,
    {
        if let Ok(mut session) = self.session.lock() {
            if session.state == PlaybackState::Uninitialized {
                session.state = PlaybackState::AwaitingDecoder;
            }
        }

        let sink = self.lifecycle_sink();
        let decoder = self.decoder.clone();
        let gate = self.gate.clone();
        runtime.post(move || {
            let instance = factory(sink);
            if let Ok(mut slot) = decoder.lock() {
                *slot = Some(instance);
            }
            gate.open();
            log::info!("decoder instance created");
        });
    }

    /// Bind the named source and issue a prepare request.
    ///
    /// Blocks only if the decoder instance does not exist yet. Asset lookup
    /// failure returns before any state is touched. Success means the prepare
    /// request was issued — preparation itself completes (or fails)
    /// asynchronously. Calling `play` on a live session restarts it from
    /// `Preparing`, reusing the decoder and frame sink.
    ///
    /// The session is moved to `Preparing` before the prepare request goes
    /// out: the decoder's callback thread may deliver `Prepared` the instant
    /// `prepare_async` returns, and the transition function only accepts it
    /// from `Preparing`. `reset` has already discarded any in-flight
    /// preparation, so no stale event can slip into that window.
    pub fn play(&self, source: &str, assets: &dyn AssetProvider) -> Result<(), ClipError> {
        self.gate.wait()?;
        let clip = assets.open(source)?;

        {
            let mut guard = self.decoder.lock().map_err(|_| ClipError::Interrupted)?;
            let Some(dec) = guard.as_mut() else {
                // Gate open but no instance: the creation task died.
                return Err(ClipError::Interrupted);
            };
            dec.reset();
            dec.set_sink(FrameSink::new(self.frames.clone()));
            dec.set_source(clip)?;
        }

        if let Ok(mut session) = self.session.lock() {
            session.started = true;
            session.prepared = false;
            session.state = PlaybackState::Preparing;
        }

        {
            let mut guard = self.decoder.lock().map_err(|_| ClipError::Interrupted)?;
            if let Some(dec) = guard.as_mut() {
                dec.prepare_async();
            }
        }
        log::info!("clip '{source}': prepare requested");
        Ok(())
    }

    /// True once a `play` call has issued a prepare request, whether or not
    /// preparation has completed.
    pub fn is_started(&self) -> bool {
        self.session.lock().map(|s| s.started).unwrap_or(false)
    }

    pub fn state(&self) -> PlaybackState {
        self.session
            .lock()
            .map(|s| s.state)
            .unwrap_or(PlaybackState::Failed)
    }

    /// Non-blocking render-loop query: should `draw` do any GPU work?
    pub fn is_drawable(&self) -> bool {
        self.session
            .lock()
            .map(|s| s.prepared && s.state == PlaybackState::Playing)
            .unwrap_or(false)
    }

    /// Mint the adapter that carries decoder events into the state machine.
    pub fn lifecycle_sink(&self) -> LifecycleSink {
        LifecycleSink {
            session: self.session.clone(),
            decoder: self.decoder.clone(),
        }
    }
}

/// Thin adapter from the decoder's callback context into the pure transition
/// function. Cloneable so the decoder can own one.
#[derive(Clone)]
pub struct LifecycleSink {
    session: Arc<Mutex<Session>>,
    decoder: SharedDecoder,
}

impl LifecycleSink {
    /// Apply one decoder event to the session.
    ///
    /// Holds the session guard only for the transition, then (for an accepted
    /// `Prepared`) takes the decoder guard to issue `start` — never both at
    /// once.
    pub fn dispatch(&self, event: LifecycleEvent) {
        match &event {
            LifecycleEvent::Error { code, detail } => {
                log::error!("decoder error {code}: {detail}");
            }
            LifecycleEvent::Completed => log::info!("clip completed"),
            LifecycleEvent::Prepared => {}
        }

        let begin_playback = {
            let Ok(mut session) = self.session.lock() else {
                return;
            };
            let next = transition(session.state, &event);
            let begin =
                session.state == PlaybackState::Preparing && next == PlaybackState::Playing;
            if begin {
                session.prepared = true;
            }
            session.state = next;
            begin
        };

        if begin_playback {
            if let Ok(mut guard) = self.decoder.lock() {
                if let Some(dec) = guard.as_mut() {
                    dec.start();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ClipSource;
    use std::io;
    use std::thread;
    use std::time::{Duration, Instant};

    type CallLog = Arc<Mutex<Vec<&'static str>>>;

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    struct FakeDecoder {
        calls: CallLog,
        reject_source: bool,
    }

    impl ClipDecoder for FakeDecoder {
        fn reset(&mut self) {
            self.calls.lock().unwrap().push("reset");
        }

        fn set_sink(&mut self, _sink: FrameSink) {
            self.calls.lock().unwrap().push("set_sink");
        }

        fn set_source(&mut self, _source: ClipSource) -> Result<(), ClipError> {
            if self.reject_source {
                return Err(ClipError::Decoder("unsupported container".into()));
            }
            self.calls.lock().unwrap().push("set_source");
            Ok(())
        }

        fn prepare_async(&mut self) {
            self.calls.lock().unwrap().push("prepare_async");
        }

        fn start(&mut self) {
            self.calls.lock().unwrap().push("start");
        }
    }

    struct MemAssets;

    impl AssetProvider for MemAssets {
        fn open(&self, name: &str) -> io::Result<ClipSource> {
            if name == "missing.mp4" {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no such clip"));
            }
            Ok(ClipSource {
                reader: Box::new(io::Cursor::new(vec![0u8; 16])),
                len: 16,
            })
        }
    }

    fn ready_controller(reject_source: bool) -> (MediaRuntime, Arc<PlaybackController>, CallLog) {
        init_logs();
        let runtime = MediaRuntime::new().unwrap();
        let controller = Arc::new(PlaybackController::new(Arc::new(FrameMailbox::new())));
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let factory_calls = calls.clone();
        controller.request_decoder(&runtime, move |_sink| {
            Box::new(FakeDecoder {
                calls: factory_calls,
                reject_source,
            })
        });
        (runtime, controller, calls)
    }

    #[test]
    fn play_blocks_until_decoder_creation_completes() {
        let runtime = MediaRuntime::new().unwrap();
        let controller = Arc::new(PlaybackController::new(Arc::new(FrameMailbox::new())));

        // Keep the media thread busy so decoder creation lands late.
        runtime.post(|| thread::sleep(Duration::from_millis(120)));
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let factory_calls = calls.clone();
        controller.request_decoder(&runtime, move |_sink| {
            Box::new(FakeDecoder {
                calls: factory_calls,
                reject_source: false,
            })
        });
        assert_eq!(controller.state(), PlaybackState::AwaitingDecoder);

        let waiter = {
            let controller = controller.clone();
            thread::spawn(move || {
                let begun = Instant::now();
                controller.play("clip.mp4", &MemAssets).map(|()| begun.elapsed())
            })
        };

        let elapsed = waiter.join().unwrap().unwrap();
        assert!(elapsed >= Duration::from_millis(100));
        assert!(controller.is_started());
        assert_eq!(controller.state(), PlaybackState::Preparing);
    }

    #[test]
    fn play_drives_the_decoder_in_order() {
        let (_runtime, controller, calls) = ready_controller(false);
        controller.play("clip.mp4", &MemAssets).unwrap();
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["reset", "set_sink", "set_source", "prepare_async"]
        );
        assert!(!controller.is_drawable());
    }

    #[test]
    fn prepared_event_starts_playback() {
        let (_runtime, controller, calls) = ready_controller(false);
        controller.play("clip.mp4", &MemAssets).unwrap();

        controller.lifecycle_sink().dispatch(LifecycleEvent::Prepared);
        assert_eq!(controller.state(), PlaybackState::Playing);
        assert!(controller.is_drawable());
        assert_eq!(calls.lock().unwrap().last(), Some(&"start"));
    }

    #[test]
    fn replay_after_playing_reenters_preparing() {
        let (_runtime, controller, _calls) = ready_controller(false);
        controller.play("clip.mp4", &MemAssets).unwrap();
        controller.lifecycle_sink().dispatch(LifecycleEvent::Prepared);
        assert_eq!(controller.state(), PlaybackState::Playing);

        controller.play("clip.mp4", &MemAssets).unwrap();
        assert_eq!(controller.state(), PlaybackState::Preparing);
        assert!(controller.is_started());
        assert!(!controller.is_drawable());
    }

    #[test]
    fn completion_makes_session_undrawable() {
        let (_runtime, controller, _calls) = ready_controller(false);
        controller.play("clip.mp4", &MemAssets).unwrap();
        let sink = controller.lifecycle_sink();
        sink.dispatch(LifecycleEvent::Prepared);
        sink.dispatch(LifecycleEvent::Completed);

        assert_eq!(controller.state(), PlaybackState::Completed);
        assert!(!controller.is_drawable());
    }

    #[test]
    fn decoder_error_during_preparing_fails_but_stays_started() {
        let (_runtime, controller, _calls) = ready_controller(false);
        controller.play("clip.mp4", &MemAssets).unwrap();

        controller.lifecycle_sink().dispatch(LifecycleEvent::Error {
            code: 100,
            detail: "media server died".into(),
        });
        assert_eq!(controller.state(), PlaybackState::Failed);
        assert!(controller.is_started());
        assert!(!controller.is_drawable());
    }

    #[test]
    fn missing_source_returns_io_error_without_state_mutation() {
        let (_runtime, controller, calls) = ready_controller(false);
        let err = controller.play("missing.mp4", &MemAssets).unwrap_err();
        assert!(matches!(err, ClipError::Io(_)));
        assert!(!controller.is_started());
        assert_eq!(controller.state(), PlaybackState::AwaitingDecoder);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn rejected_source_is_not_marked_started() {
        let (_runtime, controller, _calls) = ready_controller(true);
        let err = controller.play("clip.mp4", &MemAssets).unwrap_err();
        assert!(matches!(err, ClipError::Decoder(_)));
        assert!(!controller.is_started());
    }

    /// Decoder whose callback thread reports `Prepared` the moment the
    /// prepare request lands, leaving `play` no grace period to catch up.
    struct EagerDecoder {
        calls: CallLog,
        sink: LifecycleSink,
    }

    impl ClipDecoder for EagerDecoder {
        fn reset(&mut self) {
            self.calls.lock().unwrap().push("reset");
        }

        fn set_sink(&mut self, _sink: FrameSink) {}

        fn set_source(&mut self, _source: ClipSource) -> Result<(), ClipError> {
            Ok(())
        }

        fn prepare_async(&mut self) {
            self.calls.lock().unwrap().push("prepare_async");
            let sink = self.sink.clone();
            thread::spawn(move || sink.dispatch(LifecycleEvent::Prepared));
        }

        fn start(&mut self) {
            self.calls.lock().unwrap().push("start");
        }
    }

    #[test]
    fn prepared_arriving_right_after_prepare_request_is_not_lost() {
        init_logs();
        let runtime = MediaRuntime::new().unwrap();
        let controller = Arc::new(PlaybackController::new(Arc::new(FrameMailbox::new())));
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let factory_calls = calls.clone();
        controller.request_decoder(&runtime, move |sink| {
            Box::new(EagerDecoder {
                calls: factory_calls,
                sink,
            })
        });

        controller.play("clip.mp4", &MemAssets).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while !controller.is_drawable() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(controller.state(), PlaybackState::Playing);
        assert!(controller.is_drawable());
        assert!(calls.lock().unwrap().contains(&"start"));
    }

    #[test]
    fn events_before_any_play_are_ignored() {
        let (_runtime, controller, calls) = ready_controller(false);
        controller.gate.wait().unwrap();

        let sink = controller.lifecycle_sink();
        sink.dispatch(LifecycleEvent::Prepared);
        assert_eq!(controller.state(), PlaybackState::AwaitingDecoder);
        assert!(calls.lock().unwrap().is_empty());
    }
}
