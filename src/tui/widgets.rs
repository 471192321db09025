use crate::change::ChangeSummary;
use crate::error::SmartCommitError;
use crate::message::CommitMessage;
use crate::tui::Tone;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, BorderType, Clear, Padding, Paragraph, Wrap},
};

const MAX_LISTED_FILES: usize = 12;
const KEY_HINTS: &str = "c commit  ·  e edit  ·  r regenerate  ·  q quit";

/// Text shown under the preview until the next keypress.
#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub hint: Option<String>,
    pub is_error: bool,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            hint: None,
            is_error: false,
        }
    }

    pub fn error(error: &SmartCommitError) -> Self {
        Self {
            text: error.to_string(),
            hint: error.hint(),
            is_error: true,
        }
    }

    fn lines(&self) -> Vec<Line<'_>> {
        let tone = Tone::for_notice(self.is_error);
        let mut lines: Vec<Line> = self
            .text
            .lines()
            .map(|line| Line::from(Span::styled(line, tone.style())))
            .collect();
        if let Some(hint) = &self.hint {
            lines.push(Line::from(Span::styled(hint.as_str(), Tone::Muted.style())));
        }
        lines
    }
}

pub fn draw_preview(
    f: &mut Frame,
    summary: &ChangeSummary,
    message: Option<&CommitMessage>,
    notice: Option<&Notice>,
) {
    let area = f.area();
    let footer_height = footer_height(notice, area);
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(6),
        Constraint::Length(footer_height),
    ])
    .areas(area);
    let [files_area, msg_area] =
        Layout::horizontal([Constraint::Percentage(44), Constraint::Percentage(56)])
            .areas(body_area);

    draw_header(f, summary, header_area);
    draw_files(f, summary, files_area);
    draw_message(f, message, msg_area);
    draw_footer(f, notice, footer_area);

    if message.is_none()
        && let Some(notice) = notice.filter(|n| n.is_error)
    {
        draw_error(f, notice);
    }
}

/// Rows the footer needs for the notice (wrapped), its hint and the key line,
/// capped at half the screen.
fn footer_height(notice: Option<&Notice>, area: Rect) -> u16 {
    let inner_width = area.width.saturating_sub(4).max(1) as usize;
    let notice_rows: usize = notice.map_or(0, |n| {
        n.text
            .lines()
            .chain(n.hint.as_deref())
            .map(|line| line.chars().count().div_ceil(inner_width).max(1))
            .sum()
    });
    let wanted = (notice_rows + 1 + 2) as u16;
    wanted.clamp(3, (area.height / 2).max(3))
}

fn draw_header(f: &mut Frame, summary: &ChangeSummary, area: Rect) {
    let block = Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(Tone::Accent.style())
        .padding(Padding::horizontal(1));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let line = Line::from(vec![
        Span::styled("smart-commit", Tone::Accent.bold()),
        Span::raw("   "),
        Span::styled(summary.branch.as_str(), Tone::Warning.style()),
        Span::raw("   "),
        Span::styled(format!("{} files", summary.files.len()), Tone::Muted.style()),
        Span::raw("  "),
        Span::styled(format!("+{}", summary.total_additions()), Tone::Added.style()),
        Span::raw(" "),
        Span::styled(format!("-{}", summary.total_deletions()), Tone::Removed.style()),
    ]);
    f.render_widget(Paragraph::new(line), inner);
}

fn draw_files(f: &mut Frame, summary: &ChangeSummary, area: Rect) {
    let block = Block::bordered()
        .title(Span::styled(" staged ", Tone::Muted.style()))
        .border_type(BorderType::Rounded)
        .border_style(Tone::Muted.style())
        .padding(Padding::horizontal(1));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let path_width = (inner.width.saturating_sub(12) as usize).clamp(12, 52);
    let mut lines: Vec<Line> = summary
        .files
        .iter()
        .take(MAX_LISTED_FILES)
        .map(|file| {
            Line::from(vec![
                Span::styled(
                    format!("{} ", file.change_type.letter()),
                    Tone::for_change(file.change_type).bold(),
                ),
                Span::styled(
                    format!("{:<path_width$}", ellipsize_path(&file.path, path_width)),
                    Tone::Text.style(),
                ),
                Span::styled(
                    format!("{:>5}", count_text('+', file.additions)),
                    Tone::for_count(file.additions, Tone::Added).style(),
                ),
                Span::styled(
                    format!("{:>5}", count_text('-', file.deletions)),
                    Tone::for_count(file.deletions, Tone::Removed).style(),
                ),
            ])
        })
        .collect();

    if summary.files.len() > MAX_LISTED_FILES {
        lines.push(Line::from(Span::styled(
            format!("... {} more files", summary.files.len() - MAX_LISTED_FILES),
            Tone::Muted.style(),
        )));
    }
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_message(f: &mut Frame, message: Option<&CommitMessage>, area: Rect) {
    let block = Block::bordered()
        .title(Span::styled(" commit message ", Tone::Muted.style()))
        .border_type(BorderType::Rounded)
        .border_style(Tone::Muted.style())
        .padding(Padding::horizontal(1));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(message) = message else {
        let waiting = Line::from(Span::styled(
            "no proposal yet, press r to regenerate",
            Tone::Muted.style(),
        ));
        f.render_widget(Paragraph::new(waiting), inner);
        return;
    };

    let mut lines = vec![Line::from(Span::styled(
        message.title.as_str(),
        Tone::Accent.bold(),
    ))];
    if !message.body.is_empty() {
        lines.push(Line::default());
        lines.extend(
            message
                .body
                .iter()
                .map(|l| Line::from(Span::styled(l.as_str(), Tone::Text.style()))),
        );
    }

    let warnings = message.warnings();
    if !warnings.is_empty() {
        lines.push(Line::default());
        lines.extend(
            warnings
                .into_iter()
                .map(|w| Line::from(Span::styled(format!("! {w}"), Tone::Warning.style()))),
        );
    }

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn draw_footer(f: &mut Frame, notice: Option<&Notice>, area: Rect) {
    let border = notice.map_or(Tone::Accent, |n| Tone::for_notice(n.is_error));
    let block = Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(border.style())
        .padding(Padding::horizontal(1));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines = notice.map(Notice::lines).unwrap_or_default();
    lines.push(Line::from(Span::styled(KEY_HINTS, Tone::Muted.style())));
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn draw_error(f: &mut Frame, notice: &Notice) {
    let area = centered_rect(66, 40, f.area());
    f.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled("generation failed", Tone::Removed.bold())),
        Line::default(),
    ];
    lines.extend(notice.lines());
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "r regenerate  ·  q quit",
        Tone::Muted.style(),
    )));

    let para = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::bordered()
            .title(Span::styled(" no proposal ", Tone::Removed.style()))
            .border_type(BorderType::Rounded)
            .border_style(Tone::Removed.style())
            .padding(Padding::horizontal(1)),
    );
    f.render_widget(para, area);
}

pub fn draw_status_panel(f: &mut Frame, headline: &str, detail: &str) {
    let area = centered_rect(60, 24, f.area());
    f.render_widget(Clear, area);

    let block = Block::bordered()
        .title(Span::styled(" working ", Tone::Accent.style()))
        .border_type(BorderType::Rounded)
        .border_style(Tone::Accent.style())
        .padding(Padding::horizontal(1));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines = vec![
        Line::from(Span::styled(headline, Tone::Accent.bold())),
        Line::default(),
        Line::from(Span::styled(detail, Tone::Text.style())),
    ];
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

fn count_text(sign: char, count: usize) -> String {
    if count > 0 {
        format!("{sign}{count}")
    } else {
        "-".to_string()
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(rows[1])[1]
}

/// Keeps the end of the path, which is the part that tells files apart.
fn ellipsize_path(path: &str, max_chars: usize) -> String {
    let len = path.chars().count();
    if max_chars == 0 || len <= max_chars {
        return path.to_string();
    }
    if max_chars <= 3 {
        return ".".repeat(max_chars);
    }
    let tail: String = path.chars().skip(len - (max_chars - 3)).collect();
    format!("...{tail}")
}
