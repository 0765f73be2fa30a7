use crate::error::AppError;
use crate::notify::{APP_NAME, Notifier};
use notify_rust::Notification;

pub struct LinuxNotifier;

impl Notifier for LinuxNotifier {
    fn notice(&self, message: &str) -> Result<(), AppError> {
        Notification::new()
            .summary(APP_NAME)
            .body(message)
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;
        Ok(())
    }
}
