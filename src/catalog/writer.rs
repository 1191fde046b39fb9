//! Serialization of catalogs back to TS XML.
//!
//! The layout mirrors what Qt's own tools write so that diffs against
//! tool-generated files stay small: unindented `context` elements, four
//! spaces per nesting level below them.

use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{
    BytesDecl,
    BytesEnd,
    BytesStart,
    BytesText,
    Event,
};

use super::CatalogError;
use super::model::{
    Catalog,
    Context,
    Message,
    Translation,
    TranslationBody,
};
use crate::types::SourceLocation;

/// Indentation unit.
const INDENT: &str = "    ";

/// Serializes a catalog to a TS document.
pub fn write_catalog(catalog: &Catalog) -> Result<String, CatalogError> {
    let mut writer = TsWriter { writer: Writer::new(Vec::new()) };
    writer.write_document(catalog).map_err(CatalogError::Write)?;
    let bytes = writer.writer.into_inner();
    String::from_utf8(bytes).map_err(|e| {
        CatalogError::Write(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

/// Splits text into runs of XML-safe text and characters that need `<byte/>`.
fn text_segments(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut start = 0;
    for (index, ch) in text.char_indices() {
        if needs_byte_element(ch) {
            if start < index {
                segments.push(Segment::Text(text.get(start..index).unwrap_or_default()));
            }
            segments.push(Segment::Byte(ch));
            start = index + ch.len_utf8();
        }
    }
    if start < text.len() {
        segments.push(Segment::Text(text.get(start..).unwrap_or_default()));
    }
    segments
}

const fn needs_byte_element(ch: char) -> bool {
    (ch as u32) < 0x20 && !matches!(ch, '\t' | '\n' | '\r')
}

/// A piece of element text.
enum Segment<'a> {
    Text(&'a str),
    Byte(char),
}

/// quick-xml writer with TS layout rules.
struct TsWriter {
    /// Output buffer.
    writer: Writer<Vec<u8>>,
}

impl TsWriter {
    fn newline_indent(&mut self, depth: usize) -> std::io::Result<()> {
        let out = self.writer.get_mut();
        out.write_all(b"\n")?;
        for _ in 0..depth {
            out.write_all(INDENT.as_bytes())?;
        }
        Ok(())
    }

    fn write_document(&mut self, catalog: &Catalog) -> std::io::Result<()> {
        self.writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        self.newline_indent(0)?;
        self.writer.write_event(Event::DocType(BytesText::from_escaped("TS")))?;
        self.newline_indent(0)?;

        let mut root = BytesStart::new("TS");
        root.push_attribute(("version", catalog.version.as_str()));
        if let Some(language) = &catalog.language {
            root.push_attribute(("language", language.as_str()));
        }
        if let Some(source_language) = &catalog.source_language {
            root.push_attribute(("sourcelanguage", source_language.as_str()));
        }
        self.writer.write_event(Event::Start(root))?;

        for context in &catalog.contexts {
            self.newline_indent(0)?;
            self.write_context(context)?;
        }

        self.newline_indent(0)?;
        self.writer.write_event(Event::End(BytesEnd::new("TS")))?;
        self.newline_indent(0)
    }

    fn write_context(&mut self, context: &Context) -> std::io::Result<()> {
        self.writer.write_event(Event::Start(BytesStart::new("context")))?;
        self.newline_indent(1)?;
        self.write_text_element("name", &context.name)?;
        for message in &context.messages {
            self.newline_indent(1)?;
            self.write_message(message)?;
        }
        self.newline_indent(0)?;
        self.writer.write_event(Event::End(BytesEnd::new("context")))
    }

    fn write_message(&mut self, message: &Message) -> std::io::Result<()> {
        let mut start = BytesStart::new("message");
        if let Some(id) = &message.id {
            start.push_attribute(("id", id.as_str()));
        }
        if message.plural {
            start.push_attribute(("numerus", "yes"));
        }
        self.writer.write_event(Event::Start(start))?;

        for location in &message.locations {
            self.newline_indent(2)?;
            self.write_location(location)?;
        }

        let optional = [
            ("oldsource", message.old_source.as_deref()),
            ("comment", message.comment.as_deref()),
            ("oldcomment", message.old_comment.as_deref()),
            ("extracomment", message.extra_comment.as_deref()),
            ("translatorcomment", message.translator_comment.as_deref()),
        ];
        self.newline_indent(2)?;
        self.write_text_element("source", &message.source)?;
        for (tag, value) in optional {
            if let Some(value) = value {
                self.newline_indent(2)?;
                self.write_text_element(tag, value)?;
            }
        }

        self.newline_indent(2)?;
        self.write_translation(&message.translation)?;

        for (tag, value) in &message.extras {
            self.newline_indent(2)?;
            self.write_text_element(tag, value)?;
        }

        self.newline_indent(1)?;
        self.writer.write_event(Event::End(BytesEnd::new("message")))
    }

    fn write_location(&mut self, location: &SourceLocation) -> std::io::Result<()> {
        let mut start = BytesStart::new("location");
        if let Some(filename) = &location.filename {
            start.push_attribute(("filename", filename.as_str()));
        }
        let line = location.line.map(|line| line.to_string());
        if let Some(line) = &line {
            start.push_attribute(("line", line.as_str()));
        }
        self.writer.write_event(Event::Empty(start))
    }

    fn write_translation(&mut self, translation: &Translation) -> std::io::Result<()> {
        let mut start = BytesStart::new("translation");
        if let Some(state) = translation.state.attribute() {
            start.push_attribute(("type", state));
        }
        self.writer.write_event(Event::Start(start))?;
        match &translation.body {
            TranslationBody::Text(text) => self.write_text(text)?,
            TranslationBody::Forms(forms) => {
                for form in forms {
                    self.newline_indent(3)?;
                    self.write_text_element("numerusform", form)?;
                }
                self.newline_indent(2)?;
            }
        }
        self.writer.write_event(Event::End(BytesEnd::new("translation")))
    }

    fn write_text_element(&mut self, tag: &str, text: &str) -> std::io::Result<()> {
        self.writer.write_event(Event::Start(BytesStart::new(tag)))?;
        self.write_text(text)?;
        self.writer.write_event(Event::End(BytesEnd::new(tag)))
    }

    fn write_text(&mut self, text: &str) -> std::io::Result<()> {
        for segment in text_segments(text) {
            match segment {
                Segment::Text(chunk) => {
                    self.writer.write_event(Event::Text(BytesText::new(chunk)))?;
                }
                Segment::Byte(ch) => {
                    let mut byte = BytesStart::new("byte");
                    let value = format!("x{:x}", ch as u32);
                    byte.push_attribute(("value", value.as_str()));
                    self.writer.write_event(Event::Empty(byte))?;
                }
            }
        }
        Ok(())
    }
}
