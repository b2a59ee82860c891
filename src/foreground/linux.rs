use super::{ForegroundError, ForegroundQuery};
use tracing::warn;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{AtomEnum, ConnectionExt, Window};
use x11rb::rust_connection::RustConnection;

/// Reads the active window's `WM_CLASS` over EWMH.
pub struct LinuxForeground {
    display: Option<(RustConnection, Window)>,
}

impl LinuxForeground {
    /// Connect to the X server once. Without one, every query reports
    /// the capability as unavailable.
    pub fn new() -> Self {
        let display = match x11rb::connect(None) {
            Ok((conn, screen_num)) => {
                let root = conn.setup().roots[screen_num].root;
                Some((conn, root))
            }
            Err(e) => {
                warn!(error = %e, "cannot connect to X server");
                None
            }
        };
        Self { display }
    }
}

impl Default for LinuxForeground {
    fn default() -> Self {
        Self::new()
    }
}

fn failed(e: impl std::fmt::Display) -> ForegroundError {
    ForegroundError::QueryFailed(e.to_string())
}

fn get_atom(conn: &RustConnection, name: &str) -> Result<u32, ForegroundError> {
    Ok(conn
        .intern_atom(false, name.as_bytes())
        .map_err(failed)?
        .reply()
        .map_err(failed)?
        .atom)
}

fn active_window(conn: &RustConnection, root: Window) -> Result<Option<Window>, ForegroundError> {
    let atom = get_atom(conn, "_NET_ACTIVE_WINDOW")?;
    let reply = conn
        .get_property(false, root, atom, AtomEnum::WINDOW, 0, 1)
        .map_err(failed)?
        .reply()
        .map_err(failed)?;

    let window = reply
        .value32()
        .and_then(|mut values| values.next())
        .filter(|&id| id != 0);
    Ok(window)
}

/// `WM_CLASS` holds `instance\0class\0`; prefer the class.
fn class_name(raw: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(raw);
    let mut parts = text.split('\0').filter(|s| !s.is_empty());
    let instance = parts.next();
    parts.next().or(instance).map(str::to_string)
}

impl ForegroundQuery for LinuxForeground {
    fn query_owner_name(&mut self) -> Result<Option<String>, ForegroundError> {
        let Some((conn, root)) = self.display.as_ref() else {
            return Err(ForegroundError::Unavailable("no X11 display".to_string()));
        };

        let Some(window) = active_window(conn, *root)? else {
            return Ok(None);
        };

        let reply = conn
            .get_property(false, window, AtomEnum::WM_CLASS, AtomEnum::STRING, 0, 1024)
            .map_err(failed)?
            .reply()
            .map_err(failed)?;

        Ok(class_name(&reply.value))
    }
}
