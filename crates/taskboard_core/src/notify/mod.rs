use crate::error::AppError;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::LinuxNotifier;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WindowsNotifier;

pub const DISABLE_ENV_VAR: &str = "TASKBOARD_DISABLE_NOTIFICATIONS";
const APP_NAME: &str = "taskboard";

/// Delivers a user-visible notice.
pub trait Notifier {
    fn notice(&self, message: &str) -> Result<(), AppError>;
}

pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notice(&self, message: &str) -> Result<(), AppError> {
        eprintln!("NOTICE: {message}");
        Ok(())
    }
}

/// Desktop notification, falling back to stderr if the desktop refuses it.
pub struct FallbackNotifier {
    primary: Box<dyn Notifier>,
}

impl Notifier for FallbackNotifier {
    fn notice(&self, message: &str) -> Result<(), AppError> {
        if let Err(err) = self.primary.notice(message) {
            tracing::warn!(error = %err, "desktop notification failed");
            return StderrNotifier.notice(message);
        }
        Ok(())
    }
}

pub fn notifier_for(desktop_notices: bool) -> Box<dyn Notifier> {
    if !desktop_notices || std::env::var(DISABLE_ENV_VAR).is_ok() {
        return Box::new(StderrNotifier);
    }

    match platform_notifier() {
        Ok(primary) => Box::new(FallbackNotifier { primary }),
        Err(err) => {
            tracing::debug!(error = %err, "desktop notifications unavailable");
            Box::new(StderrNotifier)
        }
    }
}

#[cfg(target_os = "linux")]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(LinuxNotifier))
}

#[cfg(windows)]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(WindowsNotifier))
}

#[cfg(not(any(target_os = "linux", windows)))]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Err(AppError::invalid_data(
        "notifications are not supported on this platform",
    ))
}
