// Greedy word wrap for bounded boxes on the panel. Width is measured
// through a caller-supplied oracle so the algorithm stays independent of
// the font in use.

/// Break `text` into at most `max_lines` lines of at most `max_width`
/// pixels, as measured by `width_of`.
///
/// Lines break at spaces (consumed) or, on non-final lines, at hyphens
/// (kept on the emitted line). On the final allowed line the remainder is
/// truncated at a space and `...` is appended when the result still fits.
/// A fragment with no break point at all is emitted as-is, wider than the
/// box, so the loop always makes progress.
pub fn wrap<F>(text: &str, max_width: u32, max_lines: usize, mut width_of: F) -> Vec<String>
where
    F: FnMut(&str) -> u32,
{
    let mut lines = Vec::new();
    let mut remain = text.to_string();
    let mut current = 0usize;

    while current < max_lines && !remain.is_empty() {
        let mut w = width_of(&remain);
        // Byte offsets are safe here: breaks happen only at ASCII ' ' / '-'.
        let mut end_index = remain.len() as isize;
        let mut sub = remain.clone();
        let mut split_at: Option<usize> = Some(0);
        let mut keep_hyphen = false;

        while w > max_width && split_at.is_some() {
            if keep_hyphen {
                sub.pop();
            }
            split_at = if current < max_lines - 1 {
                sub.rfind(' ').max(sub.rfind('-'))
            } else {
                sub.rfind(' ')
            };
            if let Some(at) = split_at {
                end_index = at as isize;
                sub.truncate(at + 1);
                if sub.as_bytes()[at] == b' ' {
                    keep_hyphen = false;
                    sub.truncate(at);
                    end_index -= 1;
                } else {
                    keep_hyphen = true;
                }
                if current == max_lines - 1 {
                    let trial = format!("{sub}...");
                    if width_of(&trial) <= max_width {
                        sub = trial;
                    }
                }
                w = width_of(&sub);
            }
        }

        lines.push(sub);
        let consume = (end_index + 2 - isize::from(keep_hyphen))
            .clamp(0, remain.len() as isize) as usize;
        remain.drain(..consume);
        current += 1;
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    // Ten pixels per character keeps the arithmetic in the tests readable.
    fn char_width(s: &str) -> u32 {
        s.chars().count() as u32 * 10
    }

    #[test]
    fn short_text_is_a_single_line() {
        let lines = wrap("cloudy", 100, 3, char_width);
        assert_eq!(lines, vec!["cloudy"]);
    }

    #[test]
    fn breaks_at_spaces_and_consumes_them() {
        let lines = wrap("heavy rain until noon", 100, 4, char_width);
        assert_eq!(lines, vec!["heavy rain", "until noon"]);
    }

    #[test]
    fn line_count_never_exceeds_the_limit() {
        let text = "one two three four five six seven eight nine ten";
        for max_lines in 1..=5 {
            let lines = wrap(text, 50, max_lines, char_width);
            assert!(lines.len() <= max_lines);
        }
    }

    #[test]
    fn hyphen_break_keeps_the_hyphen() {
        let lines = wrap("south-westerly gusts", 80, 3, char_width);
        assert_eq!(lines[0], "south-");
        assert_eq!(lines[1], "westerly");
        assert_eq!(lines[2], "gusts");
    }

    #[test]
    fn final_line_gets_an_ellipsis_when_it_fits() {
        let lines = wrap("freezing drizzle advisory in effect", 150, 2, char_width);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "freezing");
        // "drizzle..." is 10 chars, exactly the box width.
        assert_eq!(lines[1], "drizzle...");
    }

    #[test]
    fn ellipsis_is_skipped_when_it_would_overflow() {
        // Box fits 8 chars. "drizzle..." (10) overflows, and no earlier
        // break point exists, so the bare word stands without dots.
        let lines = wrap("drizzle advisory", 80, 1, char_width);
        assert_eq!(lines, vec!["drizzle"]);
    }

    #[test]
    fn unbreakable_word_terminates_and_overflows() {
        let lines = wrap("Donaudampfschifffahrt", 50, 3, char_width);
        assert_eq!(lines, vec!["Donaudampfschifffahrt"]);
    }

    #[test]
    fn unbreakable_tail_still_consumes_input() {
        // Second fragment has no break point and exceeds the box; it must
        // still be emitted and the loop must end.
        let lines = wrap("ok Donaudampfschifffahrt", 50, 4, char_width);
        assert_eq!(lines[0], "ok");
        assert_eq!(lines[1], "Donaudampfschifffahrt");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn emitted_lines_reconstruct_a_prefix_of_the_input() {
        let text = "light snow showers expected through tomorrow evening";
        let lines = wrap(text, 120, 3, char_width);
        assert!(lines.len() <= 3);
        let mut rebuilt = String::new();
        for line in &lines {
            let piece = line.strip_suffix("...").unwrap_or(line);
            if !rebuilt.is_empty() && !rebuilt.ends_with('-') {
                rebuilt.push(' ');
            }
            rebuilt.push_str(piece);
        }
        assert!(
            text.starts_with(&rebuilt),
            "{rebuilt:?} is not a prefix of {text:?}"
        );
    }

    #[test]
    fn wide_glyph_text_breaks_without_panicking() {
        // Multibyte text with ASCII spaces, byte offsets must stay on
        // character boundaries.
        let lines = wrap("雷阵雨 转 多云", 40, 3, char_width);
        assert!(!lines.is_empty());
        for line in &lines {
            assert!(line.len() <= "雷阵雨 转 多云".len());
        }
    }
}
