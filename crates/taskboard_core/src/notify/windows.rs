use crate::error::AppError;
use crate::notify::{APP_NAME, Notifier};
use tauri_winrt_notification::Toast;

pub struct WindowsNotifier;

impl Notifier for WindowsNotifier {
    fn notice(&self, message: &str) -> Result<(), AppError> {
        Toast::new(Toast::POWERSHELL_APP_ID)
            .title(APP_NAME)
            .text1(message)
            .show()
            .map_err(|err| AppError::io(err.to_string()))
    }
}
