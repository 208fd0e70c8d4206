//! Environment detection (session type).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    X11,
    /// Wayland, tty, or anything unknown.
    Other,
}

impl SessionKind {
    pub fn from_session_type(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("x11") => Self::X11,
            _ => Self::Other,
        }
    }
}

pub fn detect_session() -> SessionKind {
    let value = std::env::var("XDG_SESSION_TYPE").ok();
    SessionKind::from_session_type(value.as_deref())
}
