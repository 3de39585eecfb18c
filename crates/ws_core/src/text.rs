//! Text cleanup shared by every scraper.

/// Longest file name produced by [`sanitize_filename`], in bytes.
pub const MAX_FILENAME_BYTES: usize = 200;

const RESERVED_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

fn is_invisible(c: char) -> bool {
    matches!(c, '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{2060}' | '\u{feff}')
}

fn is_wide_space(c: char) -> bool {
    matches!(c, '\u{a0}' | '\u{2007}' | '\u{202f}' | '\t')
}

fn collapse_spaces(line: &str) -> String {
    line.split(' ').filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" ")
}

/// Normalizes scraped text.
///
/// Line breaks survive; every other control character is dropped, runs of
/// spaces collapse to one, each line is trimmed and blank lines are removed.
pub fn sanitize_str(text: &str) -> String {
    let normalized: String = text
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter(|c| !is_invisible(*c))
        .map(|c| if is_wide_space(c) { ' ' } else { c })
        .filter(|c| *c == '\n' || !c.is_control())
        .collect();

    normalized
        .lines()
        .map(collapse_spaces)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Turns a title into a single, portable path component.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = sanitize_str(name)
        .chars()
        .map(|c| {
            if c.is_control() || RESERVED_FILENAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    let mut name = collapse_spaces(&replaced);
    if name.len() > MAX_FILENAME_BYTES {
        let mut end = MAX_FILENAME_BYTES;
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        name.truncate(end);
    }

    let name = name.trim_end_matches(['.', ' ']).trim_start();
    if name.is_empty() {
        "untitled".to_string()
    } else {
        name.to_string()
    }
}
