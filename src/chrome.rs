//! Best-effort terminal window setup: UTF-8 output, size and position.
//!
//! Only the Windows console supports all of it; elsewhere this is a no-op.
//! Failures are returned to the caller to log, never to act on.

use thiserror::Error;

use crate::layout::{BOX_WIDTH, MARGIN_BOTTOM, MARGIN_LEFT, MARGIN_TOP};

/// Rows the dashboard is expected to need, before margins.
const DASHBOARD_ROWS: usize = 50;

#[derive(Debug, Error)]
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
pub enum ChromeError {
    #[error("cannot switch console to UTF-8")]
    Encoding,
    #[error("cannot resize terminal: {0}")]
    Resize(#[source] std::io::Error),
    #[error("no console window to move")]
    NoWindow,
    #[error("cannot move console window")]
    Move,
}

/// Where and how large the terminal window should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub cols: u16,
    pub rows: u16,
    /// Screen position in pixels.
    pub x: i32,
    pub y: i32,
}

impl WindowGeometry {
    pub fn for_dashboard() -> Self {
        Self {
            cols: (BOX_WIDTH + MARGIN_LEFT + 4) as u16,
            rows: (DASHBOARD_ROWS + MARGIN_TOP + MARGIN_BOTTOM) as u16,
            x: 500,
            y: 100,
        }
    }
}

pub trait TerminalChrome {
    fn set_utf8(&self) -> Result<(), ChromeError>;
    fn resize(&self, cols: u16, rows: u16) -> Result<(), ChromeError>;
    fn move_to(&self, x: i32, y: i32) -> Result<(), ChromeError>;

    /// Apply every step, collecting failures instead of stopping at the first.
    fn prepare(&self, geometry: &WindowGeometry) -> Vec<ChromeError> {
        [
            self.set_utf8(),
            self.resize(geometry.cols, geometry.rows),
            self.move_to(geometry.x, geometry.y),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect()
    }
}

/// Leaves the terminal alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopChrome;

impl TerminalChrome for NoopChrome {
    fn set_utf8(&self) -> Result<(), ChromeError> {
        Ok(())
    }

    fn resize(&self, _cols: u16, _rows: u16) -> Result<(), ChromeError> {
        Ok(())
    }

    fn move_to(&self, _x: i32, _y: i32) -> Result<(), ChromeError> {
        Ok(())
    }
}

#[cfg(target_os = "windows")]
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleChrome;

#[cfg(target_os = "windows")]
impl TerminalChrome for ConsoleChrome {
    fn set_utf8(&self) -> Result<(), ChromeError> {
        use windows_sys::Win32::System::Console::SetConsoleOutputCP;
        const CP_UTF8: u32 = 65001;
        // SAFETY: SetConsoleOutputCP takes a plain code page id.
        if unsafe { SetConsoleOutputCP(CP_UTF8) } == 0 {
            return Err(ChromeError::Encoding);
        }
        Ok(())
    }

    fn resize(&self, cols: u16, rows: u16) -> Result<(), ChromeError> {
        crossterm::execute!(std::io::stdout(), crossterm::terminal::SetSize(cols, rows))
            .map_err(ChromeError::Resize)
    }

    fn move_to(&self, x: i32, y: i32) -> Result<(), ChromeError> {
        use windows_sys::Win32::System::Console::GetConsoleWindow;
        use windows_sys::Win32::UI::WindowsAndMessaging::{
            SetWindowPos, SWP_NOSIZE, SWP_NOZORDER,
        };
        // SAFETY: GetConsoleWindow has no preconditions; a null handle is
        // checked before use. SetWindowPos only reads its arguments.
        unsafe {
            let hwnd = GetConsoleWindow();
            if hwnd.is_null() {
                return Err(ChromeError::NoWindow);
            }
            if SetWindowPos(hwnd, std::ptr::null_mut(), x, y, 0, 0, SWP_NOSIZE | SWP_NOZORDER) == 0 {
                return Err(ChromeError::Move);
            }
        }
        Ok(())
    }
}

/// The chrome implementation for this platform.
pub fn platform_chrome() -> Box<dyn TerminalChrome> {
    #[cfg(target_os = "windows")]
    {
        Box::new(ConsoleChrome)
    }
    #[cfg(not(target_os = "windows"))]
    {
        Box::new(NoopChrome)
    }
}
