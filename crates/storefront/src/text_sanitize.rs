//! Cleanup for text that arrives from the backend (error messages, names)
//! before it is shown in a terminal.

const MAX_DISPLAY_CHARS: usize = 512;

#[derive(Clone, Copy)]
enum Escape {
    Start,
    Csi,
    // OSC/DCS style strings terminated by BEL or ST.
    Str { saw_esc: bool },
}

pub fn sanitize_server_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len().min(MAX_DISPLAY_CHARS));
    let mut escape: Option<Escape> = None;
    let mut kept = 0usize;
    let mut last_was_space = false;

    for c in input.chars() {
        if let Some(state) = escape {
            escape = match state {
                Escape::Start => match c {
                    '[' => Some(Escape::Csi),
                    ']' | 'P' | 'X' | '^' | '_' => Some(Escape::Str { saw_esc: false }),
                    _ => None,
                },
                Escape::Csi if ('@'..='~').contains(&c) => None,
                Escape::Csi => Some(Escape::Csi),
                Escape::Str { .. } if c == '\x07' => None,
                Escape::Str { saw_esc: true } if c == '\\' => None,
                Escape::Str { .. } => Some(Escape::Str {
                    saw_esc: c == '\x1b',
                }),
            };
            continue;
        }

        if c == '\x1b' {
            escape = Some(Escape::Start);
            continue;
        }

        // Whitespace runs (including newlines and tabs) collapse to one space.
        if c.is_whitespace() {
            if !last_was_space && kept > 0 {
                out.push(' ');
                kept += 1;
            }
            last_was_space = true;
        } else if c.is_control() || is_bidi_control(c) {
            continue;
        } else {
            out.push(c);
            kept += 1;
            last_was_space = false;
        }

        if kept >= MAX_DISPLAY_CHARS {
            out.push_str("...");
            break;
        }
    }

    out.trim_end().to_string()
}

fn is_bidi_control(c: char) -> bool {
    matches!(c, '\u{061C}' | '\u{200E}' | '\u{200F}')
        || ('\u{202A}'..='\u{202E}').contains(&c)
        || ('\u{2066}'..='\u{2069}').contains(&c)
}
