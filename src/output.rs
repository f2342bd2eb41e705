/// Completed output lines plus the line still being written.
#[derive(Debug, Default, Clone)]
pub struct Output {
    lines: Vec<String>,
    current: String,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the in-progress line without ending it.
    pub fn write(&mut self, text: &str) {
        self.current.push_str(text);
    }

    /// Move the in-progress line, even when empty, into the completed lines.
    pub fn flush_line(&mut self) {
        self.lines.push(std::mem::take(&mut self.current));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Completed lines, with a non-empty in-progress line flushed last.
    pub fn finish(mut self) -> Vec<String> {
        if !self.current.is_empty() {
            self.flush_line();
        }
        self.lines
    }
}
