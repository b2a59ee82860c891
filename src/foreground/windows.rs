use super::{ForegroundError, ForegroundQuery};
use ::windows::core::PWSTR;
use ::windows::Win32::Foundation::CloseHandle;
use ::windows::Win32::System::Threading::{
    OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32,
    PROCESS_QUERY_LIMITED_INFORMATION,
};
use ::windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowThreadProcessId};
use std::path::Path;

/// Resolves the foreground window to its process image name (`Code.exe`).
#[derive(Debug, Default)]
pub struct WindowsForeground;

impl WindowsForeground {
    pub fn new() -> Self {
        Self
    }
}

/// File name part of a full image path.
fn image_file_name(path: &str) -> Option<String> {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

impl ForegroundQuery for WindowsForeground {
    fn query_owner_name(&mut self) -> Result<Option<String>, ForegroundError> {
        unsafe {
            let hwnd = GetForegroundWindow();
            if hwnd.is_invalid() {
                return Ok(None);
            }

            let mut pid = 0u32;
            GetWindowThreadProcessId(hwnd, Some(&mut pid));
            if pid == 0 {
                return Ok(None);
            }

            let process = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid)
                .map_err(|e| ForegroundError::QueryFailed(e.to_string()))?;

            let mut buffer = [0u16; 1024];
            let mut len = buffer.len() as u32;
            let result = QueryFullProcessImageNameW(
                process,
                PROCESS_NAME_WIN32,
                PWSTR(buffer.as_mut_ptr()),
                &mut len,
            );
            let _ = CloseHandle(process);
            result.map_err(|e| ForegroundError::QueryFailed(e.to_string()))?;

            let path = String::from_utf16_lossy(&buffer[..len as usize]);
            Ok(image_file_name(&path))
        }
    }
}
