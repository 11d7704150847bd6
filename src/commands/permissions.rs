use crate::errors::RecorderError;
use crate::permissions::{PermissionInfo, PermissionStatus};
use tauri::command;

/// Check microphone permission status
#[command]
pub async fn check_microphone_permission() -> Result<PermissionInfo, RecorderError> {
    log::debug!("Checking microphone permission status");
    super::recorder::with_service(|service| Ok(service.permission_status()))
}

/// Trigger the OS microphone prompt where the platform has one.
///
/// The prompt is answered asynchronously; the returned info is the status
/// at the time of the request.
#[command]
pub async fn request_microphone_permission() -> Result<PermissionInfo, RecorderError> {
    super::recorder::with_service(|service| {
        let current = service.permission_status();

        if current.status == PermissionStatus::Granted {
            log::info!("Microphone permission already granted");
            return Ok(current);
        }

        if !current.can_request {
            log::warn!("Cannot request microphone permission: {}", current.message);
            return Ok(current);
        }

        log::info!("Requesting microphone permission");
        service.request_permission();
        Ok(current)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_check_permission_returns_info() {
        let info = check_microphone_permission().await.unwrap();
        assert!(!info.message.is_empty());
    }
}
