//! Display capture backed by `xcap`.

use std::time::Duration;

use async_trait::async_trait;
use image::RgbaImage;
use tokio::sync::oneshot;
use xcap::{Monitor, Window};

use super::source::{CaptureError, CaptureRequest, CaptureSource};
use super::stream::{FrameSink, MediaStream};

/// Polls a monitor, or a window matched by title, on a dedicated thread.
#[derive(Debug, Default, Clone)]
pub struct ScreenCaptureSource;

impl ScreenCaptureSource {
    pub fn new() -> Self {
        Self
    }
}

enum Target {
    Monitor(Monitor),
    Window(Window),
}

impl Target {
    fn capture(&self) -> Result<RgbaImage, String> {
        let captured = match self {
            Target::Monitor(monitor) => monitor.capture_image(),
            Target::Window(window) => window.capture_image(),
        }
        .map_err(|e| e.to_string())?;

        let (width, height) = (captured.width(), captured.height());
        RgbaImage::from_raw(width, height, captured.into_raw())
            .ok_or_else(|| "Captured buffer does not match its dimensions".to_string())
    }

    fn describe(&self) -> String {
        match self {
            Target::Monitor(monitor) => format!("monitor {}", monitor.name()),
            Target::Window(window) => format!("window '{}'", window.title()),
        }
    }
}

fn own_title_hint() -> Option<String> {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.file_stem().map(|s| s.to_string_lossy().to_lowercase()))
}

fn select_target(request: &CaptureRequest) -> Result<Target, CaptureError> {
    if let Some(wanted) = &request.prefer_window_title {
        let wanted = wanted.to_lowercase();
        let own = request.exclude_own_surface.then(own_title_hint).flatten();
        let windows = Window::all().map_err(|e| CaptureError::unavailable(e.to_string()))?;
        let found = windows.into_iter().find(|w| {
            let title = w.title().to_lowercase();
            !w.is_minimized()
                && title.contains(&wanted)
                && own.as_deref().map_or(true, |own| !title.contains(own))
        });
        match found {
            Some(window) => return Ok(Target::Window(window)),
            None => tracing::warn!(
                "No window matching '{}', falling back to the primary monitor",
                wanted
            ),
        }
    }

    let monitors = Monitor::all().map_err(|e| CaptureError::unavailable(e.to_string()))?;
    monitors
        .into_iter()
        .next()
        .map(Target::Monitor)
        .ok_or_else(|| CaptureError::unavailable("No monitor found"))
}

fn run_capture_loop(
    request: CaptureRequest,
    sink: FrameSink,
    ready: oneshot::Sender<Result<(), CaptureError>>,
) {
    let target = match select_target(&request) {
        Ok(target) => target,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    // A refused first grab is how the platforms report a denied permission.
    match target.capture() {
        Ok(frame) => {
            sink.push(frame.into());
            let _ = ready.send(Ok(()));
        }
        Err(e) => {
            tracing::warn!("First capture of {} failed: {}", target.describe(), e);
            let _ = ready.send(Err(CaptureError::PermissionDenied));
            return;
        }
    }

    tracing::info!(
        "Capturing {} at {} fps",
        target.describe(),
        request.frame_rate
    );
    let period = Duration::from_secs_f64(1.0 / request.frame_rate.max(1) as f64);
    while !sink.is_ended() {
        std::thread::sleep(period);
        match target.capture() {
            Ok(frame) => {
                if !sink.push(frame.into()) {
                    break;
                }
            }
            Err(e) => tracing::debug!("Dropped capture frame: {}", e),
        }
    }
    tracing::debug!("Capture loop for {} ended", target.describe());
}

#[async_trait]
impl CaptureSource for ScreenCaptureSource {
    async fn acquire(&self, request: &CaptureRequest) -> Result<MediaStream, CaptureError> {
        let (sink, stream) = MediaStream::channel("display");
        let (ready_tx, ready_rx) = oneshot::channel();
        let request = request.clone();

        std::thread::Builder::new()
            .name("adproof-capture".to_string())
            .spawn(move || run_capture_loop(request, sink, ready_tx))
            .map_err(|e| CaptureError::unavailable(format!("Failed to start capture thread: {}", e)))?;

        match ready_rx.await {
            Ok(Ok(())) => Ok(stream),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(CaptureError::unavailable("Capture thread exited early")),
        }
    }
}
