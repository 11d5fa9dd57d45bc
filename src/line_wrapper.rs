// @module: Balanced two-line caption wrapping

/// Wrap a caption into at most two visually balanced lines.
///
/// Lengths are measured in visible characters: ASS override blocks (`{...}`)
/// take no space and an escaped brace (`\{`, `\}`) counts once. Text no
/// longer than `max_length`, or without an internal word boundary, is
/// returned unchanged. Otherwise the text is split at the whitespace run
/// whose visible offset is closest to the visible midpoint (first such run on
/// ties). The halves are joined with an ASS hard break carrying a transient
/// `\fs` override so the gap between the lines is `spacer_size` tall instead
/// of a full line.
pub fn wrap(text: &str, max_length: usize, spacer_size: u32, font_size: u32) -> String {
    let chars: Vec<char> = text.chars().collect();
    let layout = VisibleLayout::scan(&chars);
    if layout.visible_len() <= max_length {
        return text.to_string();
    }

    let Some((run_start, run_end)) = balanced_boundary(&chars, &layout) else {
        return text.to_string();
    };

    let first: String = chars[..run_start].iter().collect();
    let second: String = chars[run_end..].iter().collect();

    format!(
        "{}{{\\fs{}}}\\N{{\\fs{}}}{}",
        first, spacer_size, font_size, second
    )
}

// @struct: Visible character offsets of a caption with inline ASS markup
struct VisibleLayout {
    // @field: Visible characters before each position, plus the total at the end
    offsets: Vec<usize>,
    // @field: Position lies inside an override block
    hidden: Vec<bool>,
}

impl VisibleLayout {
    fn scan(chars: &[char]) -> Self {
        let mut offsets = Vec::with_capacity(chars.len() + 1);
        let mut hidden = vec![false; chars.len()];
        let mut visible = 0;
        let mut in_override = false;
        let mut i = 0;

        while i < chars.len() {
            offsets.push(visible);
            match chars[i] {
                '}' if in_override => {
                    hidden[i] = true;
                    in_override = false;
                }
                _ if in_override => hidden[i] = true,
                '{' => {
                    hidden[i] = true;
                    in_override = true;
                }
                '\\' if matches!(chars.get(i + 1), Some('{') | Some('}')) => {
                    offsets.push(visible);
                    visible += 1;
                    i += 2;
                    continue;
                }
                _ => visible += 1,
            }
            i += 1;
        }
        offsets.push(visible);

        Self { offsets, hidden }
    }

    fn visible_len(&self) -> usize {
        self.offsets.last().copied().unwrap_or(0)
    }

    fn is_break(&self, chars: &[char], i: usize) -> bool {
        chars[i].is_whitespace() && !self.hidden[i]
    }
}

/// Find the whitespace run nearest the visible midpoint, as `(start, end)` char offsets.
///
/// Leading and trailing whitespace never count as boundaries.
fn balanced_boundary(chars: &[char], layout: &VisibleLayout) -> Option<(usize, usize)> {
    let len = chars.len();
    let visible_len = layout.visible_len();
    let mut best: Option<(usize, usize, usize)> = None;
    let mut i = 0;

    while i < len {
        if !layout.is_break(chars, i) {
            i += 1;
            continue;
        }

        let start = i;
        while i < len && layout.is_break(chars, i) {
            i += 1;
        }

        let visible_start = layout.offsets[start];
        // @invariant: both halves must contain a visible word
        if visible_start == 0 || layout.offsets[i] == visible_len {
            continue;
        }

        // Doubled to stay in integers: |start - len/2| * 2
        let distance = (2 * visible_start).abs_diff(visible_len);
        match best {
            Some((best_distance, _, _)) if best_distance <= distance => {}
            _ => best = Some((distance, start, i)),
        }
    }

    best.map(|(_, start, end)| (start, end))
}

/// Remove markup, leaving the visible text on a single line.
///
/// Override blocks are dropped, hard breaks become spaces and escaped braces
/// become literal braces.
pub fn unwrap_markup(text: &str) -> String {
    let mut plain = String::with_capacity(text.len());
    let mut in_override = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => in_override = true,
            '}' if in_override => in_override = false,
            _ if in_override => {}
            '\\' => match chars.peek() {
                Some('N') | Some('n') => {
                    chars.next();
                    plain.push(' ');
                }
                Some(&brace) if brace == '{' || brace == '}' => {
                    chars.next();
                    plain.push(brace);
                }
                _ => plain.push(c),
            },
            _ => plain.push(c),
        }
    }

    plain
}
