//! OS-specific screen and window access, implemented by shelling out to the
//! platform's own tools.

use std::io::Cursor;
use std::process::Command;

use codebuddy_core::{CaptureError, Frame, FrameFormat, FrameSource, WindowId, WindowInspector};
use image::imageops::FilterType;
use image::{GenericImageView, ImageFormat};
use tracing::debug;

fn run_command(program: &str, args: &[&str]) -> Result<Vec<u8>, CaptureError> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| CaptureError::Command {
            command: program.to_string(),
            message: e.to_string(),
        })?;
    if !output.status.success() {
        return Err(CaptureError::Command {
            command: program.to_string(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output.stdout)
}

fn run_text(program: &str, args: &[&str]) -> Result<String, CaptureError> {
    run_command(program, args).map(|out| String::from_utf8_lossy(&out).trim().to_string())
}

/// Reports the focused window of the real desktop.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemWindowInspector;

#[cfg(target_os = "macos")]
const FRONT_WINDOW_SCRIPT: &str = r#"
tell application "System Events"
    set frontProc to first application process whose frontmost is true
    set procName to name of frontProc
    try
        set winTitle to name of front window of frontProc
    on error
        set winTitle to ""
    end try
end tell
return procName & ": " & winTitle
"#;

#[cfg(target_os = "macos")]
const FRONT_PID_SCRIPT: &str = r#"tell application "System Events" to get unix id of first application process whose frontmost is true"#;

impl WindowInspector for SystemWindowInspector {
    fn active_window_label(&self) -> String {
        #[cfg(target_os = "macos")]
        let label = run_text("osascript", &["-e", FRONT_WINDOW_SCRIPT]);
        #[cfg(target_os = "linux")]
        let label = run_text("xdotool", &["getactivewindow", "getwindowname"]);
        #[cfg(not(any(target_os = "macos", target_os = "linux")))]
        let label: Result<String, CaptureError> = Ok(format!("Unsupported OS: {}", std::env::consts::OS));

        match label {
            Ok(label) if !label.is_empty() => label,
            Ok(_) => "Unknown".to_string(),
            Err(e) => {
                debug!(error = %e, "Could not read active window title");
                "Unknown".to_string()
            }
        }
    }

    fn active_window_identity(&self) -> WindowId {
        #[cfg(target_os = "macos")]
        let id = run_text("osascript", &["-e", FRONT_PID_SCRIPT]);
        #[cfg(target_os = "linux")]
        let id = run_text("xdotool", &["getactivewindow"]);
        #[cfg(not(any(target_os = "macos", target_os = "linux")))]
        let id: Result<String, CaptureError> = Err(CaptureError::Unsupported(std::env::consts::OS.to_string()));

        match id {
            Ok(id) if !id.is_empty() => WindowId::Known(id),
            _ => WindowId::Unsupported,
        }
    }
}

/// Grabs the full screen as PNG and shrinks it to fit the configured box.
#[derive(Debug, Clone, Copy)]
pub struct SystemFrameSource {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for SystemFrameSource {
    fn default() -> Self {
        Self {
            max_width: 2000,
            max_height: 768,
        }
    }
}

impl SystemFrameSource {
    #[cfg(target_os = "macos")]
    fn grab_png(&self) -> Result<Vec<u8>, CaptureError> {
        let path = std::env::temp_dir().join(format!("codebuddy-{}.png", std::process::id()));
        let target = path.to_string_lossy().to_string();
        run_command("screencapture", &["-x", "-t", "png", &target])?;
        let bytes = std::fs::read(&path)?;
        let _ = std::fs::remove_file(&path);
        Ok(bytes)
    }

    #[cfg(target_os = "linux")]
    fn grab_png(&self) -> Result<Vec<u8>, CaptureError> {
        run_command("import", &["-window", "root", "png:-"])
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    fn grab_png(&self) -> Result<Vec<u8>, CaptureError> {
        Err(CaptureError::Unsupported(std::env::consts::OS.to_string()))
    }
}

impl FrameSource for SystemFrameSource {
    fn capture_frame(&self) -> Result<Frame, CaptureError> {
        let raw = self.grab_png()?;
        let bytes = downscale_png(&raw, self.max_width, self.max_height)?;
        Ok(Frame {
            bytes,
            format: FrameFormat::Png,
        })
    }
}

/// Fit an image inside `max_width` x `max_height`, keeping its aspect ratio.
///
/// Images that already fit are returned untouched.
pub fn downscale_png(bytes: &[u8], max_width: u32, max_height: u32) -> Result<Vec<u8>, CaptureError> {
    let img = image::load_from_memory(bytes).map_err(|e| CaptureError::Image(e.to_string()))?;
    let (width, height) = img.dimensions();
    if width <= max_width && height <= max_height {
        return Ok(bytes.to_vec());
    }

    let resized = img.resize(max_width, max_height, FilterType::Lanczos3);
    debug!(
        from = %format!("{width}x{height}"),
        to = %format!("{}x{}", resized.width(), resized.height()),
        "Downscaled screenshot"
    );
    let mut out = Cursor::new(Vec::new());
    resized
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| CaptureError::Image(e.to_string()))?;
    Ok(out.into_inner())
}
