use super::{ForegroundError, ForegroundQuery};
use objc2::rc::autoreleasepool;
use objc2_app_kit::NSWorkspace;

/// Reads `NSWorkspace.frontmostApplication.localizedName`.
///
/// AppKit refreshes `frontmostApplication` from the main run loop. The CLI
/// never runs one, so this query can keep returning the program that was
/// frontmost at launch. Hosts that embed the monitor in an app with a
/// running main loop get live values.
#[derive(Debug, Default)]
pub struct MacOSForeground;

impl MacOSForeground {
    pub fn new() -> Self {
        Self
    }
}

impl ForegroundQuery for MacOSForeground {
    fn query_owner_name(&mut self) -> Result<Option<String>, ForegroundError> {
        // Runs on a worker thread with no pool of its own
        let name = autoreleasepool(|_| unsafe {
            let workspace = NSWorkspace::sharedWorkspace();
            workspace
                .frontmostApplication()
                .and_then(|app| app.localizedName())
                .map(|name| name.to_string())
        });
        Ok(name)
    }
}
