use skirmish_shared::SessionId;

pub const MAX_USERNAME_CHARS: usize = 16;
pub const MAX_COLOR_CHARS: usize = 32;

const PALETTE: [&str; 8] = [
    "#3b82f6", "#ef4444", "#22c55e", "#a855f7", "#f97316", "#06b6d4", "#ec4899", "#eab308",
];

// Stable default color per session
pub fn generate_color(session: SessionId) -> String {
    let index = (session as usize).saturating_sub(1) % PALETTE.len();
    PALETTE[index].to_string()
}

// Trimmed and capped display name, `Player <id>` when blank
pub fn sanitize_username(raw: Option<&str>, session: SessionId) -> String {
    let name: String = raw
        .map(str::trim)
        .unwrap_or_default()
        .chars()
        .take(MAX_USERNAME_CHARS)
        .collect();
    if name.is_empty() {
        format!("Player {}", session)
    } else {
        name
    }
}

pub fn sanitize_color(raw: Option<&str>, session: SessionId) -> String {
    let color: String = raw
        .map(str::trim)
        .unwrap_or_default()
        .chars()
        .take(MAX_COLOR_CHARS)
        .collect();
    if color.is_empty() {
        generate_color(session)
    } else {
        color
    }
}
