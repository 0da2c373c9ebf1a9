/*!
format.rs - terminal styling for the human output paths.

  - StyleOptions::detect()      NO_COLOR / NO_EMOJI / COLUMNS
  - color(role, text, style)    ANSI 256-color wrapping
  - emoji(tag, style)           status glyphs, empty when disabled
  - box_header(title, sub, style)
  - table(headers, rows, style)

Helpers return strings and never print. JSON output must not go through
this module.
*/

use std::borrow::Cow;

/* ---- Style Options ---- */

#[derive(Debug, Clone)]
pub struct StyleOptions {
    pub use_color: bool,
    pub use_emoji: bool,
    pub term_width: usize,
}

impl StyleOptions {
    pub fn detect() -> Self {
        Self::from_env(|k| std::env::var(k).ok())
    }

    fn from_env(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut style = Self::plain();
        style.use_color = var("NO_COLOR").is_none();
        style.use_emoji = var("NO_EMOJI").is_none();
        if let Some(width) = var("COLUMNS").and_then(|v| v.trim().parse::<usize>().ok()) {
            style.term_width = width.clamp(40, 220);
        }
        style
    }

    /// No color, no emoji, default width.
    pub fn plain() -> Self {
        StyleOptions {
            use_color: false,
            use_emoji: false,
            term_width: 100,
        }
    }
}

/* ---- Color / Emoji ---- */

#[derive(Debug, Clone, Copy)]
pub enum Role {
    Primary,
    Secondary,
    Accent,
    Success,
    Error,
    Dim,
}

pub fn color(role: Role, text: impl AsRef<str>, style: &StyleOptions) -> String {
    let text = text.as_ref();
    if !style.use_color {
        return text.to_string();
    }
    let code = match role {
        Role::Primary => "38;5;45",
        Role::Secondary => "38;5;250",
        Role::Accent => "38;5;213",
        Role::Success => "38;5;82",
        Role::Error => "38;5;196",
        Role::Dim => "2",
    };
    format!("\x1b[{code}m{text}\x1b[0m")
}

pub fn emoji(tag: &str, style: &StyleOptions) -> &'static str {
    if !style.use_emoji {
        return "";
    }
    match tag {
        "success" => "✔",
        "error" => "✖",
        "info" => "ℹ",
        "money" => "💰",
        "goal" => "🎯",
        "receipt" => "🧾",
        "tools" => "🧰",
        "skip" => "⏭",
        _ => "",
    }
}

/* ---- Box Header ---- */

/// Single-line boxed title with an optional dimmed subtitle. Long content
/// is cut to the terminal width rather than wrapped.
pub fn box_header(
    title: impl AsRef<str>,
    subtitle: Option<impl AsRef<str>>,
    style: &StyleOptions,
) -> String {
    let mut inner = color(Role::Primary, title.as_ref(), style);
    if let Some(sub) = subtitle {
        inner.push_str("  ");
        inner.push_str(&color(Role::Secondary, sub.as_ref(), style));
    }

    let max_inner = style.term_width.saturating_sub(4).max(16);
    let mut width = display_width(&inner);
    if width > max_inner {
        inner = truncate_plain(&strip_ansi(&inner), max_inner);
        width = display_width(&inner);
    }

    let bar = "─".repeat(width + 2);
    format!("┌{bar}┐\n│ {inner} │\n└{bar}┘")
}

/* ---- Table ---- */

/// Left-aligned columns separated by two spaces, header underlined with
/// dashes. Cells wider than their share of the terminal are cut with `…`.
pub fn table(headers: &[&str], rows: &[Vec<String>], style: &StyleOptions) -> String {
    if headers.is_empty() {
        return String::new();
    }
    let cols = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(cols) {
            widths[i] = widths[i].max(display_width(cell));
        }
    }

    // Shrink the widest column first until the table fits.
    let gap = 2 * (cols - 1);
    while widths.iter().sum::<usize>() + gap > style.term_width {
        let Some((idx, w)) = widths.iter().copied().enumerate().max_by_key(|(_, w)| *w) else {
            break;
        };
        if w <= 4 {
            break;
        }
        widths[idx] = w - 1;
    }

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(color(Role::Accent, render_row(&widths, headers), style));
    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push(color(Role::Dim, sep.join("  "), style));
    for row in rows {
        out.push(render_row(&widths, row));
    }
    out.join("\n")
}

fn render_row<S: AsRef<str>>(widths: &[usize], cells: &[S]) -> String {
    let parts: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, w)| fit(cells.get(i).map(AsRef::as_ref).unwrap_or(""), *w))
        .collect();
    parts.join("  ").trim_end().to_string()
}

fn fit(cell: &str, width: usize) -> String {
    let len = display_width(cell);
    if len > width {
        truncate_plain(&strip_ansi(cell), width)
    } else {
        format!("{cell}{}", " ".repeat(width - len))
    }
}

fn truncate_plain(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

/* ---- ANSI ---- */

/// Remove `ESC [ ... <letter>` sequences.
pub fn strip_ansi(s: &str) -> Cow<'_, str> {
    if !s.contains('\x1b') {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for n in chars.by_ref() {
                if n.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }
        out.push(c);
    }
    Cow::Owned(out)
}

fn display_width(s: &str) -> usize {
    strip_ansi(s).chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_switches() {
        let style = StyleOptions::from_env(|k| match k {
            "NO_COLOR" => Some("1".into()),
            "COLUMNS" => Some("10".into()),
            _ => None,
        });
        assert!(!style.use_color);
        assert!(style.use_emoji);
        assert_eq!(style.term_width, 40);
        assert_eq!(color(Role::Error, "x", &style), "x");
    }

    #[test]
    fn box_header_frames_title() {
        let b = box_header("Subscriptions", Some("2 items"), &StyleOptions::plain());
        let lines: Vec<&str> = b.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "│ Subscriptions  2 items │");
        assert_eq!(lines[0].chars().count(), lines[1].chars().count());
    }

    #[test]
    fn table_aligns_columns() {
        let t = table(
            &["ALIAS", "OPERATION"],
            &[
                vec!["get_goals".into(), "get_goals".into()],
                vec!["manage_goals".into(), "get_goals | put_goal".into()],
            ],
            &StyleOptions::plain(),
        );
        let lines: Vec<&str> = t.lines().collect();
        assert_eq!(lines[0], "ALIAS         OPERATION");
        assert!(lines[1].starts_with("------------  ---"));
        assert_eq!(lines[3], "manage_goals  get_goals | put_goal");
    }

    #[test]
    fn narrow_tables_truncate() {
        let style = StyleOptions {
            term_width: 40,
            ..StyleOptions::plain()
        };
        let long = "x".repeat(80);
        let t = table(&["A", "B"], &[vec!["a".into(), long]], &style);
        assert!(t.lines().all(|l| l.chars().count() <= 40));
        assert!(t.contains('…'));
    }

    #[test]
    fn strips_escape_sequences() {
        assert_eq!(strip_ansi("\x1b[38;5;196mRED\x1b[0m"), "RED");
        assert_eq!(strip_ansi("plain"), "plain");
    }
}
