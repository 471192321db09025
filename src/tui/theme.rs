use crate::change::ChangeType;
use ratatui::style::{Color, Modifier, Style};

/// Colour roles shared by the full-screen preview and the plain console.
///
/// Values are xterm 256-colour indexes so both screens render the same
/// palette whether or not the terminal supports true colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Text,
    Muted,
    Accent,
    Added,
    Removed,
    Warning,
}

impl Tone {
    pub const fn index(self) -> u8 {
        match self {
            Tone::Text => 223,
            Tone::Muted => 246,
            Tone::Accent => 214,
            Tone::Added => 142,
            Tone::Removed => 167,
            Tone::Warning => 180,
        }
    }

    pub fn style(self) -> Style {
        Style::default().fg(Color::Indexed(self.index()))
    }

    pub fn bold(self) -> Style {
        self.style().add_modifier(Modifier::BOLD)
    }

    pub fn for_change(change: ChangeType) -> Self {
        match change {
            ChangeType::Added => Tone::Added,
            ChangeType::Deleted => Tone::Removed,
            ChangeType::Modified | ChangeType::Renamed => Tone::Accent,
        }
    }

    /// Zero counts fade out.
    pub fn for_count(count: usize, tone: Tone) -> Self {
        if count > 0 { tone } else { Tone::Muted }
    }

    pub fn for_notice(is_error: bool) -> Self {
        if is_error { Tone::Removed } else { Tone::Warning }
    }
}
