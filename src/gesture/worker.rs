//! The gesture input worker.
//!
//! Runs as one blocking task for its whole lifetime: the camera is opened
//! on that thread, read in a loop, and released when the loop ends.
//!
//! ```text
//! open camera ── fail ──▶ log, return (mode stays, nothing moves)
//!   │
//!   └─▶ while ctx.should_run():
//!         read_frame ── fail ──▶ skip
//!         mirror → detect ── no hand ──▶ state unchanged
//!         read_gesture → overwrite position + is_animating
//! drop camera
//! ```

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::controller::WorkerContext;
use crate::state::{SharedCharacter, Viewport};

use super::camera::{CameraProvider, FrameSource};
use super::detector::{DetectError, HandDetector};
use super::landmarks::{read_gesture, GestureReading};

/// Pause after a failed frame read or a panicked frame.
const FRAME_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Detector shared across successive gesture sessions.
pub type SharedDetector = Arc<Mutex<Box<dyn HandDetector>>>;

/// Result of one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Tracked(GestureReading),
    NoHand,
    Skipped,
    /// Detector can never work; the loop should end.
    DetectorGone,
    Cancelled,
}

#[derive(Clone)]
pub struct GestureWorker {
    camera: Arc<dyn CameraProvider>,
    detector: SharedDetector,
    viewport: Viewport,
}

impl GestureWorker {
    pub fn new(camera: Arc<dyn CameraProvider>, detector: SharedDetector, viewport: Viewport) -> Self {
        Self {
            camera,
            detector,
            viewport,
        }
    }

    /// Run until `ctx` says stop.
    pub async fn run(self, ctx: WorkerContext, character: SharedCharacter) {
        let joined =
            tokio::task::spawn_blocking(move || self.run_blocking(&ctx, &character)).await;
        if let Err(e) = joined {
            log::error!("gesture: worker task failed: {e}");
        }
    }

    fn run_blocking(&self, ctx: &WorkerContext, character: &SharedCharacter) {
        let mut source = match self.camera.open() {
            Ok(s) => s,
            Err(e) => {
                log::error!("gesture: {e}");
                return;
            }
        };
        log::info!("gesture: tracking started");

        while ctx.should_run() {
            let step = catch_unwind(AssertUnwindSafe(|| {
                self.process_frame(source.as_mut(), ctx, character)
            }));
            match step {
                Ok(FrameOutcome::DetectorGone) => break,
                Ok(_) => {}
                Err(_) => {
                    log::error!("gesture: frame processing panicked");
                    std::thread::sleep(FRAME_RETRY_DELAY);
                }
            }
        }

        drop(source);
        log::info!("gesture: tracking stopped");
    }

    /// Read, detect and apply a single frame.
    pub(crate) fn process_frame(
        &self,
        source: &mut dyn FrameSource,
        ctx: &WorkerContext,
        character: &SharedCharacter,
    ) -> FrameOutcome {
        let frame = match source.read_frame() {
            Ok(f) => f.mirrored(),
            Err(e) => {
                log::debug!("gesture: {e}");
                std::thread::sleep(FRAME_RETRY_DELAY);
                return FrameOutcome::Skipped;
            }
        };

        let detection = self
            .detector
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .detect(&frame);

        match detection {
            Ok(Some(hand)) => {
                if !ctx.should_run() {
                    return FrameOutcome::Cancelled;
                }
                let reading = read_gesture(&hand, &self.viewport);
                character.update(|s| {
                    s.position = reading.position;
                    s.is_animating = reading.is_animating;
                });
                FrameOutcome::Tracked(reading)
            }
            Ok(None) => FrameOutcome::NoHand,
            Err(DetectError::Unavailable(reason)) => {
                log::warn!("gesture: hand detector unavailable ({reason}); tracking disabled");
                FrameOutcome::DetectorGone
            }
            Err(e) => {
                log::warn!("gesture: {e}");
                FrameOutcome::Skipped
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::*;
    use crate::gesture::camera::{CameraError, Frame, FrameError};
    use crate::gesture::landmarks::HandLandmarks;

    /// Camera whose frames are blank; tracks whether a source is open.
    #[derive(Default)]
    pub struct FakeCamera {
        pub fail_open: bool,
        pub open: Arc<AtomicBool>,
        pub opened: Arc<AtomicUsize>,
        /// Number of initial reads that fail.
        pub bad_reads: usize,
    }

    pub struct FakeSource {
        open: Arc<AtomicBool>,
        bad_reads: usize,
    }

    impl CameraProvider for FakeCamera {
        fn open(&self) -> Result<Box<dyn FrameSource>, CameraError> {
            if self.fail_open {
                return Err(CameraError::Open {
                    index: 0,
                    reason: "no such device".into(),
                });
            }
            self.open.store(true, Ordering::Release);
            self.opened.fetch_add(1, Ordering::AcqRel);
            Ok(Box::new(FakeSource {
                open: Arc::clone(&self.open),
                bad_reads: self.bad_reads,
            }))
        }
    }

    impl FrameSource for FakeSource {
        fn read_frame(&mut self) -> Result<Frame, FrameError> {
            std::thread::sleep(Duration::from_millis(1));
            if self.bad_reads > 0 {
                self.bad_reads -= 1;
                return Err(FrameError::Capture("glitch".into()));
            }
            Ok(Frame {
                width: 4,
                height: 4,
                rgb: vec![0; 4 * 4 * 3],
            })
        }
    }

    impl Drop for FakeSource {
        fn drop(&mut self) {
            self.open.store(false, Ordering::Release);
        }
    }

    pub enum Scripted {
        Hand(HandLandmarks),
        Fail(DetectError),
        Panic,
    }

    /// Replays scripted detections, then reports no hand forever.
    pub struct ScriptedDetector(pub VecDeque<Scripted>);

    impl HandDetector for ScriptedDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Option<HandLandmarks>, DetectError> {
            match self.0.pop_front() {
                Some(Scripted::Hand(h)) => Ok(Some(h)),
                Some(Scripted::Fail(e)) => Err(e),
                Some(Scripted::Panic) => panic!("detector crashed"),
                None => Ok(None),
            }
        }
    }

    pub fn shared(detector: impl HandDetector + 'static) -> SharedDetector {
        let boxed: Box<dyn HandDetector> = Box::new(detector);
        Arc::new(Mutex::new(boxed))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::testing::{shared, FakeCamera, Scripted, ScriptedDetector};
    use super::*;
    use crate::gesture::camera::Frame;
    use crate::gesture::landmarks::{hand_with, HandLandmarks};
    use crate::state::{CharacterState, Mode, ModeCell, Position};

    fn gesture_ctx() -> (WorkerContext, ModeCell) {
        let cell = ModeCell::new(Mode::GestureControl);
        let (ctx, _cancel) = WorkerContext::detached(cell.clone(), Mode::GestureControl);
        (ctx, cell)
    }

    fn centred() -> SharedCharacter {
        SharedCharacter::new(CharacterState::new(&Viewport::default()))
    }

    fn worker(camera: FakeCamera, script: Vec<Scripted>) -> GestureWorker {
        GestureWorker::new(
            Arc::new(camera),
            shared(ScriptedDetector(VecDeque::from(script))),
            Viewport::default(),
        )
    }

    fn open_source(w: &GestureWorker) -> Box<dyn FrameSource> {
        w.camera.open().expect("fake camera opens")
    }

    #[test]
    fn raised_thumb_frame_sets_position_and_dancing() {
        let w = worker(
            FakeCamera::default(),
            vec![Scripted::Hand(hand_with((0.5, 0.25), 0.3, 0.5))],
        );
        let (ctx, _cell) = gesture_ctx();
        let character = centred();
        let mut source = open_source(&w);

        let outcome = w.process_frame(source.as_mut(), &ctx, &character);

        assert!(matches!(outcome, FrameOutcome::Tracked(_)));
        let s = character.snapshot();
        assert_eq!(s.position, Position::new(400, 150));
        assert!(s.is_animating);
    }

    #[test]
    fn flag_follows_each_frame_without_memory() {
        let w = worker(
            FakeCamera::default(),
            vec![
                Scripted::Hand(hand_with((0.5, 0.5), 0.3, 0.5)),
                Scripted::Hand(hand_with((0.5, 0.5), 0.7, 0.5)),
            ],
        );
        let (ctx, _cell) = gesture_ctx();
        let character = centred();
        let mut source = open_source(&w);

        w.process_frame(source.as_mut(), &ctx, &character);
        assert!(character.snapshot().is_animating);
        w.process_frame(source.as_mut(), &ctx, &character);
        assert!(!character.snapshot().is_animating);
    }

    #[test]
    fn no_hand_leaves_state_unchanged() {
        let w = worker(FakeCamera::default(), Vec::new());
        let (ctx, _cell) = gesture_ctx();
        let character = centred();
        let before = character.snapshot();
        let mut source = open_source(&w);

        assert_eq!(
            w.process_frame(source.as_mut(), &ctx, &character),
            FrameOutcome::NoHand
        );
        assert_eq!(character.snapshot(), before);
    }

    #[test]
    fn bad_frame_is_skipped() {
        let w = worker(
            FakeCamera {
                bad_reads: 1,
                ..FakeCamera::default()
            },
            vec![Scripted::Hand(hand_with((0.1, 0.1), 0.3, 0.5))],
        );
        let (ctx, _cell) = gesture_ctx();
        let character = centred();
        let mut source = open_source(&w);

        assert_eq!(
            w.process_frame(source.as_mut(), &ctx, &character),
            FrameOutcome::Skipped
        );
        assert!(matches!(
            w.process_frame(source.as_mut(), &ctx, &character),
            FrameOutcome::Tracked(_)
        ));
    }

    #[test]
    fn inference_error_is_skipped_not_fatal() {
        let w = worker(
            FakeCamera::default(),
            vec![Scripted::Fail(DetectError::Inference("bad tensor".into()))],
        );
        let (ctx, _cell) = gesture_ctx();
        let mut source = open_source(&w);
        assert_eq!(
            w.process_frame(source.as_mut(), &ctx, &centred()),
            FrameOutcome::Skipped
        );
    }

    #[tokio::test]
    async fn camera_open_failure_ends_worker_quietly() {
        let w = worker(
            FakeCamera {
                fail_open: true,
                ..FakeCamera::default()
            },
            Vec::new(),
        );
        let (ctx, _cell) = gesture_ctx();
        let character = centred();
        let before = character.snapshot();

        tokio::time::timeout(Duration::from_secs(2), w.run(ctx, character.clone()))
            .await
            .expect("worker should return");
        assert_eq!(character.snapshot(), before);
    }

    #[tokio::test]
    async fn unavailable_detector_stops_and_releases_camera() {
        let camera = FakeCamera::default();
        let open = Arc::clone(&camera.open);
        let w = worker(
            camera,
            vec![Scripted::Fail(DetectError::Unavailable("no model".into()))],
        );
        let (ctx, _cell) = gesture_ctx();

        tokio::time::timeout(Duration::from_secs(2), w.run(ctx, centred()))
            .await
            .expect("worker should return");
        assert!(!open.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn panic_in_one_frame_does_not_end_tracking() {
        let w = worker(
            FakeCamera::default(),
            vec![
                Scripted::Panic,
                Scripted::Hand(hand_with((0.25, 0.5), 0.7, 0.5)),
            ],
        );
        let (ctx, cell) = gesture_ctx();
        let character = centred();
        let task = tokio::spawn(w.run(ctx, character.clone()));

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while character.snapshot().position != Position::new(200, 300)
            && std::time::Instant::now() < deadline
        {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(character.snapshot().position, Position::new(200, 300));

        cell.set(Mode::Menu);
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("worker should stop")
            .expect("worker should not panic");
    }

    struct AlwaysPanics(Arc<AtomicUsize>);

    impl HandDetector for AlwaysPanics {
        fn detect(&mut self, _frame: &Frame) -> Result<Option<HandLandmarks>, DetectError> {
            self.0.fetch_add(1, Ordering::AcqRel);
            panic!("detector crashed");
        }
    }

    #[tokio::test]
    async fn repeated_panics_are_throttled() {
        let calls = Arc::new(AtomicUsize::new(0));
        let w = GestureWorker::new(
            Arc::new(FakeCamera::default()),
            shared(AlwaysPanics(Arc::clone(&calls))),
            Viewport::default(),
        );
        let (ctx, cell) = gesture_ctx();
        let task = tokio::spawn(w.run(ctx, centred()));

        tokio::time::sleep(Duration::from_millis(200)).await;
        cell.set(Mode::Menu);
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("worker should stop")
            .expect("worker should not panic");

        // Each panicked frame waits FRAME_RETRY_DELAY before the next read.
        let n = calls.load(Ordering::Acquire);
        assert!(n >= 1);
        assert!(n <= 25, "{n} detections in 200 ms");
    }

    #[tokio::test]
    async fn leaving_mode_releases_camera_and_freezes_state() {
        let camera = FakeCamera::default();
        let open = Arc::clone(&camera.open);
        let w = worker(camera, Vec::new());
        let (ctx, cell) = gesture_ctx();
        let character = centred();
        let task = tokio::spawn(w.run(ctx, character.clone()));

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while !open.load(Ordering::Acquire) && std::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(open.load(Ordering::Acquire));

        cell.set(Mode::Menu);
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("worker should stop")
            .expect("worker should not panic");

        assert!(!open.load(Ordering::Acquire));
        let frozen = character.snapshot();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(character.snapshot(), frozen);
    }
}
