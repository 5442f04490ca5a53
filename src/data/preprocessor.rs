// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Cleans one line of a parallel corpus before tokenisation.
//
// Corpus files scraped from the web or exported from editors
// often carry non-breaking spaces, zero-width spaces, byte
// order marks and stray control characters. Left alone, the
// word-level tokenizer would treat "word\u{00A0}" and "word"
// as different entries and waste vocabulary slots.
//
// Cleaning steps (applied in order):
//   1. Replace Unicode whitespace variants and control chars with a space
//   2. Collapse runs of spaces into one
//   3. Trim leading/trailing whitespace
//
// Reference: Rust Book §8 (Strings in Rust)

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean a single corpus line. Line breaks inside the input
    /// are treated as whitespace, so the result is always one line.
    pub fn clean_line(&self, line: &str) -> String {
        let mut out        = String::with_capacity(line.len());
        let mut last_space = true; // drops leading spaces

        for c in line.chars().map(normalise_char) {
            if c == ' ' {
                if !last_space {
                    out.push(' ');
                }
                last_space = true;
            } else {
                out.push(c);
                last_space = false;
            }
        }

        // At most one trailing space survives the loop
        if out.ends_with(' ') {
            out.pop();
        }
        out
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

fn normalise_char(c: char) -> char {
    match c {
        '\t' | '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
        c if c.is_control() || c.is_whitespace() => ' ',
        c => c,
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_multiple_spaces() {
        let p = Preprocessor::new();
        assert_eq!(p.clean_line("hello   world"), "hello world");
    }

    #[test]
    fn test_trims_edges() {
        let p = Preprocessor::new();
        assert_eq!(p.clean_line("  hello world  "), "hello world");
    }

    #[test]
    fn test_removes_control_chars() {
        let p = Preprocessor::new();
        assert_eq!(p.clean_line("hello\x01world"), "hello world");
        assert_eq!(p.clean_line("hello\r\n"), "hello");
    }

    #[test]
    fn test_unicode_spaces() {
        let p = Preprocessor::new();
        assert_eq!(p.clean_line("\u{FEFF}guten\u{00A0}\u{200B}tag\t"), "guten tag");
    }

    #[test]
    fn test_empty_and_blank() {
        let p = Preprocessor::new();
        assert_eq!(p.clean_line(""), "");
        assert_eq!(p.clean_line(" \t \u{00A0} "), "");
    }
}
