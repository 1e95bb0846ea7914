//! TypeScript formatting utilities.
//!
//! Provides string escaping, property-name quoting, and indentation management.

/// Escape a string for use in a single-quoted TypeScript literal.
#[must_use]
pub fn escape_ts_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '\'' => result.push_str("\\'"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\0' => result.push_str("\\0"),
            c => result.push(c),
        }
    }
    result
}

/// Quote a string literal with single quotes.
#[must_use]
pub fn quote_string(s: &str) -> String {
    format!("'{}'", escape_ts_string(s))
}

/// Check if a string is a valid TypeScript identifier (ASCII subset).
#[must_use]
pub fn is_valid_ts_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Quote a class property name if it is not a plain identifier.
///
/// Reserved words are legal property names and stay bare.
#[must_use]
pub fn quote_property(name: &str) -> String {
    if is_valid_ts_identifier(name) {
        name.to_string()
    } else {
        quote_string(name)
    }
}

/// Indentation style for emitted TypeScript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Indent {
    Tabs,
    Spaces(usize),
}

impl Default for Indent {
    fn default() -> Self {
        Indent::Spaces(2)
    }
}

impl Indent {
    /// Indentation from a configured width; zero means tabs.
    #[must_use]
    pub fn from_width(width: usize) -> Self {
        if width == 0 {
            Indent::Tabs
        } else {
            Indent::Spaces(width)
        }
    }

    fn unit(&self) -> String {
        match self {
            Indent::Tabs => "\t".to_string(),
            Indent::Spaces(n) => " ".repeat(*n),
        }
    }
}

/// A writer that manages indentation.
pub struct IndentWriter {
    buffer: String,
    indent_str: String,
    current_indent: usize,
}

impl IndentWriter {
    #[must_use]
    pub fn new(indent: &Indent) -> Self {
        Self {
            buffer: String::new(),
            indent_str: indent.unit(),
            current_indent: 0,
        }
    }

    pub fn indent(&mut self) {
        self.current_indent += 1;
    }

    pub fn dedent(&mut self) {
        self.current_indent = self.current_indent.saturating_sub(1);
    }

    /// Write a complete line at the current indentation.
    pub fn write_line(&mut self, s: &str) {
        for _ in 0..self.current_indent {
            self.buffer.push_str(&self.indent_str);
        }
        self.buffer.push_str(s);
        self.buffer.push('\n');
    }

    /// Write a blank line (no trailing whitespace).
    pub fn blank_line(&mut self) {
        self.buffer.push('\n');
    }

    /// Write a `//` comment line.
    pub fn write_comment(&mut self, comment: &str) {
        self.write_line(&format!("// {}", comment));
    }

    /// Write an opening line, indent, run `body`, dedent, write the closing line.
    pub fn block(&mut self, open: &str, close: &str, body: impl FnOnce(&mut Self)) {
        self.write_line(open);
        self.indent();
        body(self);
        self.dedent();
        self.write_line(close);
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.buffer
    }
}

impl Default for IndentWriter {
    fn default() -> Self {
        Self::new(&Indent::default())
    }
}
