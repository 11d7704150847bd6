use serde::{Deserialize, Serialize};

/// Permission status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionStatus {
    /// Permission granted
    Granted,
    /// Permission denied
    Denied,
    /// Permission not determined (user hasn't been asked yet)
    NotDetermined,
    /// Permission restricted (parental controls, MDM, etc)
    Restricted,
}

impl std::fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionStatus::Granted => write!(f, "granted"),
            PermissionStatus::Denied => write!(f, "denied"),
            PermissionStatus::NotDetermined => write!(f, "not_determined"),
            PermissionStatus::Restricted => write!(f, "restricted"),
        }
    }
}

/// Detailed permission information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionInfo {
    pub status: PermissionStatus,
    pub message: String,
    pub can_request: bool,
}

impl PermissionInfo {
    pub fn is_granted(&self) -> bool {
        self.status == PermissionStatus::Granted
    }
}

/// Microphone permission query and request.
///
/// `request` only triggers the OS prompt; the outcome arrives later and is
/// observed by the next `check`.
pub trait MicrophonePermission: Send {
    fn check(&self) -> PermissionInfo;
    fn request(&self);
}

/// The host operating system's microphone permission
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPermission;

impl MicrophonePermission for SystemPermission {
    fn check(&self) -> PermissionInfo {
        check_permission_detailed()
    }

    fn request(&self) {
        request_permission();
    }
}

/// Check microphone permission status
pub fn check_permission() -> PermissionStatus {
    check_permission_detailed().status
}

/// Check microphone permission status with detailed information
pub fn check_permission_detailed() -> PermissionInfo {
    #[cfg(target_os = "macos")]
    {
        check_permission_macos()
    }

    #[cfg(any(target_os = "windows", target_os = "linux"))]
    {
        check_permission_by_device()
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "Platform not supported".to_string(),
            can_request: false,
        }
    }
}

/// Ask the OS for microphone access without waiting for the answer
pub fn request_permission() {
    #[cfg(target_os = "macos")]
    {
        request_permission_macos();
    }

    #[cfg(target_os = "windows")]
    {
        log::warn!(
            "Microphone access must be enabled in Windows Settings > Privacy > Microphone"
        );
    }

    #[cfg(target_os = "linux")]
    {
        log::warn!(
            "Microphone access is group based: run `sudo usermod -a -G audio $USER` and log in again"
        );
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        log::warn!("Microphone permission request not supported on this platform");
    }
}

// Windows privacy settings and Linux device ACLs both hide the input device
// from enumeration, so a usable default input is the grant signal.
#[cfg(any(target_os = "windows", target_os = "linux"))]
fn check_permission_by_device() -> PermissionInfo {
    use cpal::traits::{DeviceTrait, HostTrait};

    let host = cpal::default_host();
    match host.default_input_device() {
        Some(device) if device.default_input_config().is_ok() => PermissionInfo {
            status: PermissionStatus::Granted,
            message: format!(
                "Microphone available: {}",
                device.name().unwrap_or_else(|_| "default input".to_string())
            ),
            can_request: false,
        },
        Some(_) => PermissionInfo {
            status: PermissionStatus::Denied,
            message: "Default microphone exists but cannot be opened".to_string(),
            can_request: true,
        },
        None => no_input_device_info(),
    }
}

#[cfg(target_os = "linux")]
fn no_input_device_info() -> PermissionInfo {
    if std::path::Path::new("/dev/snd").exists() {
        PermissionInfo {
            status: PermissionStatus::Denied,
            message: "Sound devices exist but none is accessible - run: sudo usermod -a -G audio $USER"
                .to_string(),
            can_request: true,
        }
    } else {
        PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "No audio input devices found".to_string(),
            can_request: false,
        }
    }
}

#[cfg(target_os = "windows")]
fn no_input_device_info() -> PermissionInfo {
    PermissionInfo {
        status: PermissionStatus::NotDetermined,
        message: "No microphone found - permission may not be granted".to_string(),
        can_request: true,
    }
}

#[cfg(target_os = "macos")]
fn audio_media_type() -> Option<*mut objc::runtime::Object> {
    use objc::runtime::{Class, Object};
    use objc::{msg_send, sel, sel_impl};

    // AVMediaTypeAudio
    let ns_string = Class::get("NSString")?;
    let media_type: *mut Object =
        unsafe { msg_send![ns_string, stringWithUTF8String: b"soun\0".as_ptr()] };
    if media_type.is_null() {
        None
    } else {
        Some(media_type)
    }
}

#[cfg(target_os = "macos")]
fn check_permission_macos() -> PermissionInfo {
    use objc::runtime::Class;
    use objc::{msg_send, sel, sel_impl};

    let (Some(device_class), Some(media_type)) = (Class::get("AVCaptureDevice"), audio_media_type())
    else {
        return PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "AVFoundation not available".to_string(),
            can_request: false,
        };
    };

    // AVAuthorizationStatus: 0 NotDetermined, 1 Restricted, 2 Denied, 3 Authorized
    let auth_status: i64 =
        unsafe { msg_send![device_class, authorizationStatusForMediaType: media_type] };

    match auth_status {
        3 => PermissionInfo {
            status: PermissionStatus::Granted,
            message: "Microphone access authorized".to_string(),
            can_request: false,
        },
        2 => PermissionInfo {
            status: PermissionStatus::Denied,
            message: "Microphone access denied - enable in System Settings > Privacy & Security > Microphone".to_string(),
            can_request: false,
        },
        1 => PermissionInfo {
            status: PermissionStatus::Restricted,
            message: "Microphone access restricted by system policy".to_string(),
            can_request: false,
        },
        _ => PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "Microphone permission not yet requested".to_string(),
            can_request: true,
        },
    }
}

#[cfg(target_os = "macos")]
fn request_permission_macos() {
    use block::ConcreteBlock;
    use objc::runtime::Class;
    use objc::{msg_send, sel, sel_impl};

    let (Some(device_class), Some(media_type)) = (Class::get("AVCaptureDevice"), audio_media_type())
    else {
        log::warn!("AVFoundation not available, cannot request microphone access");
        return;
    };

    let handler = ConcreteBlock::new(move |granted: bool| {
        if granted {
            log::info!("Microphone permission granted");
        } else {
            log::warn!("Microphone permission denied by user");
        }
    });
    let handler = handler.copy();

    log::info!("Requesting macOS microphone permission");
    unsafe {
        let _: () = msg_send![device_class, requestAccessForMediaType: media_type completionHandler: &*handler];
    }
}
