//! AsciiDoc building blocks

use std::fmt::Write as _;

/// Append-only AsciiDoc text
#[derive(Debug, Clone, Default)]
pub struct AsciiDoc {
    text: String,
}

impl AsciiDoc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, line: impl AsRef<str>) {
        self.text.push_str(line.as_ref());
        self.text.push('\n');
    }

    pub fn blank(&mut self) {
        self.text.push('\n');
    }

    /// A top-level section whose content is shifted one level down and tagged for inclusion
    pub fn begin_section(&mut self, section: &str) {
        self.line(format!("== {}", section));
        self.line(":leveloffset: +1");
        self.blank();
        self.begin_tag(section);
    }

    pub fn end_section(&mut self, section: &str) {
        self.end_tag(section);
        self.blank();
        self.line(":leveloffset: -1");
    }

    pub fn begin_tag(&mut self, tag: &str) {
        self.line(format!("// tag::{}[]", tag));
    }

    pub fn end_tag(&mut self, tag: &str) {
        self.line(format!("// end::{}[]", tag));
    }

    /// An `[IMPORTANT]` admonition block
    pub fn important(&mut self, headline: &str, detail: &str) {
        self.line("[IMPORTANT]");
        self.line("====");
        self.line(format!("*{}* + ", headline));
        if !detail.trim().is_empty() {
            self.line(format!(" {}", detail));
        }
        self.line("====");
        self.blank();
    }

    /// A titled bullet list; nothing is written for an empty list
    pub fn bullets(&mut self, title: &str, items: &[String]) {
        if items.is_empty() {
            return;
        }
        self.line(format!(".{}", title));
        for item in items {
            self.line(format!("* {}", item));
        }
        self.blank();
    }

    /// A PlantUML listing block with a caption
    pub fn plantuml(&mut self, caption: &str, diagram: &str) {
        self.line(format!(".{}", caption));
        self.line("[plantuml]");
        self.line("....");
        self.text.push_str(diagram);
        if !diagram.ends_with('\n') {
            self.blank();
        }
        self.line("....");
    }

    /// The payload table of a message: name, short type, description
    pub fn payload_table(&mut self, rows: &[(String, String, String)]) {
        if rows.is_empty() {
            return;
        }
        self.line("[caption=]");
        self.line(".Payload fields");
        self.line("[%header,cols=\"s,1,3\"]");
        self.line("|===");
        self.line("|Attribute|Type|Description");
        for (name, type_name, description) in rows {
            let _ = writeln!(self.text, "|{}\n|{}\n|{}\n", name, type_name, description);
        }
        self.line("|===");
        self.blank();
    }

    pub fn push_str(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_wraps_tag() {
        let mut doc = AsciiDoc::new();
        doc.begin_section("events");
        doc.end_section("events");
        assert_eq!(
            doc.as_str(),
            "== events\n:leveloffset: +1\n\n// tag::events[]\n// end::events[]\n\n:leveloffset: -1\n"
        );
    }

    #[test]
    fn test_empty_lists_are_skipped() {
        let mut doc = AsciiDoc::new();
        doc.bullets("Event published by", &[]);
        doc.payload_table(&[]);
        assert!(doc.as_str().is_empty());
    }

    #[test]
    fn test_important_without_detail() {
        let mut doc = AsciiDoc::new();
        doc.important("Event is deprecated", "");
        assert_eq!(doc.as_str(), "[IMPORTANT]\n====\n*Event is deprecated* + \n====\n\n");
    }
}
