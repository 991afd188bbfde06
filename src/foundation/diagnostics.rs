use std::fmt;

/// Field delimiter of the caller-facing result string; never allowed inside a line.
pub const FIELD_DELIMITER: char = '|';

/// Ordered diagnostic lines collected during one entry-point call.
///
/// Every line is mirrored to `tracing` so a subscriber sees the same trail the caller receives.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiagnosticLog {
    lines: Vec<String>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&mut self, msg: impl Into<String>) {
        let line = sanitize(msg.into());
        tracing::debug!("{line}");
        self.lines.push(line);
    }

    pub fn info(&mut self, msg: impl Into<String>) {
        let line = sanitize(msg.into());
        tracing::info!("{line}");
        self.lines.push(format!("info: {line}"));
    }

    pub fn error(&mut self, context: &str, err: &dyn fmt::Display) {
        let line = sanitize(format!("error: {context}: {err}"));
        tracing::error!("{line}");
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

pub(crate) fn sanitize(line: String) -> String {
    if line.contains(FIELD_DELIMITER) || line.contains('\n') {
        line.replace(FIELD_DELIMITER, "/").replace('\n', " ")
    } else {
        line
    }
}
