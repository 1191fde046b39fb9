//! Streaming parser for TS documents.

use quick_xml::Reader;
use quick_xml::events::{
    BytesStart,
    Event,
};

use super::CatalogError;
use super::model::{
    Catalog,
    Context,
    DEFAULT_FORMAT_VERSION,
    Message,
    Translation,
    TranslationBody,
    TranslationState,
};
use crate::types::{
    LineRef,
    SourceLocation,
};

/// Parses a TS document.
///
/// Only structure is checked here. Cross-message rules (duplicate sources,
/// plural variant counts) belong to [`crate::validate`].
///
/// # Examples
/// ```
/// use ts_catalog::catalog::parse_catalog;
///
/// let xml = r#"<TS version="2.1" language="en">
/// <context>
///     <name>VBoxGlobal</name>
///     <message numerus="yes">
///         <source>%n year(s)</source>
///         <translation>
///             <numerusform>%n year</numerusform>
///             <numerusform>%n years</numerusform>
///         </translation>
///     </message>
/// </context>
/// </TS>"#;
///
/// let catalog = parse_catalog(xml).unwrap();
/// assert_eq!(catalog.language.as_deref(), Some("en"));
/// assert!(catalog.message("VBoxGlobal", "%n year(s)").is_some_and(|m| m.plural));
/// ```
pub fn parse_catalog(xml: &str) -> Result<Catalog, CatalogError> {
    TsReader::new(xml).read_document()
}

/// Element and attribute names as owned strings.
fn utf8(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn tag_name(start: &BytesStart<'_>) -> String {
    utf8(start.name().as_ref())
}

/// Decodes the `value` of a `<byte/>` element: `x1b` (hex) or `27` (decimal).
fn decode_byte_value(value: &str) -> Option<char> {
    let code = match value.strip_prefix('x').or_else(|| value.strip_prefix('X')) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => value.parse::<u32>().ok()?,
    };
    char::from_u32(code)
}

fn parse_yes_no(value: &str) -> Option<bool> {
    match value {
        "yes" | "true" => Some(true),
        "no" | "false" => Some(false),
        _ => None,
    }
}

/// Recursive-descent reader over quick-xml events.
struct TsReader<'a> {
    /// Underlying event source.
    reader: Reader<&'a [u8]>,
}

impl<'a> TsReader<'a> {
    fn new(xml: &'a str) -> Self {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);
        Self { reader }
    }

    fn parse_error(&self, message: impl Into<String>) -> CatalogError {
        CatalogError::Parse { position: self.reader.error_position(), message: message.into() }
    }

    fn next(&mut self) -> Result<Event<'a>, CatalogError> {
        self.reader.read_event().map_err(|e| self.parse_error(e.to_string()))
    }

    fn attributes(&self, start: &BytesStart<'_>) -> Result<Vec<(String, String)>, CatalogError> {
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| self.parse_error(e.to_string()))?;
            let value = attr.unescape_value().map_err(|e| self.parse_error(e.to_string()))?;
            attributes.push((utf8(attr.key.as_ref()), value.into_owned()));
        }
        Ok(attributes)
    }

    /// Consumes events up to and including the end of an element whose start
    /// tag has already been read.
    fn skip_element(&mut self) -> Result<(), CatalogError> {
        let mut depth = 1_usize;
        loop {
            match self.next()? {
                Event::Start(_) => depth += 1,
                Event::End(_) => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Event::Eof => return Err(self.parse_error("unexpected end of document")),
                _ => {}
            }
        }
    }

    fn read_document(mut self) -> Result<Catalog, CatalogError> {
        let catalog = loop {
            match self.next()? {
                Event::Start(start) if start.name().as_ref() == b"TS" => {
                    let mut catalog = self.read_root_attributes(&start)?;
                    self.read_root_children(&mut catalog)?;
                    break catalog;
                }
                Event::Empty(start) if start.name().as_ref() == b"TS" => {
                    break self.read_root_attributes(&start)?;
                }
                Event::Start(start) | Event::Empty(start) => {
                    return Err(CatalogError::schema(
                        None,
                        format!("expected <TS> root element, found <{}>", tag_name(&start)),
                    ));
                }
                Event::Text(text) if text.iter().all(u8::is_ascii_whitespace) => {}
                Event::Text(_) | Event::CData(_) => {
                    return Err(CatalogError::schema(None, "text outside the <TS> root element"));
                }
                Event::Eof => {
                    return Err(CatalogError::schema(None, "missing <TS> root element"));
                }
                _ => {}
            }
        };

        loop {
            match self.next()? {
                Event::Eof => break,
                Event::Start(start) | Event::Empty(start) => {
                    return Err(CatalogError::schema(
                        None,
                        format!("unexpected <{}> after the <TS> root element", tag_name(&start)),
                    ));
                }
                Event::Text(text) if !text.iter().all(u8::is_ascii_whitespace) => {
                    return Err(CatalogError::schema(None, "text after the <TS> root element"));
                }
                _ => {}
            }
        }

        tracing::debug!(
            contexts = catalog.contexts.len(),
            messages = catalog.message_count(),
            "Parsed TS catalog"
        );
        Ok(catalog)
    }

    fn read_root_attributes(&self, start: &BytesStart<'_>) -> Result<Catalog, CatalogError> {
        let mut catalog = Catalog::default();
        let mut version = None;
        for (key, value) in self.attributes(start)? {
            match key.as_str() {
                "version" => version = Some(value),
                "language" => catalog.language = Some(value),
                "sourcelanguage" => catalog.source_language = Some(value),
                _ => tracing::debug!(attribute = %key, "Ignoring unknown TS attribute"),
            }
        }
        catalog.version = version.unwrap_or_else(|| DEFAULT_FORMAT_VERSION.to_string());
        Ok(catalog)
    }

    fn read_root_children(&mut self, catalog: &mut Catalog) -> Result<(), CatalogError> {
        loop {
            match self.next()? {
                Event::Start(start) => match start.name().as_ref() {
                    b"context" => {
                        let context = self.read_context()?;
                        catalog.contexts.push(context);
                    }
                    b"defaultcodec" | b"dependencies" => self.skip_element()?,
                    name if name.starts_with(b"extra-") => self.skip_element()?,
                    _ => {
                        return Err(CatalogError::schema(
                            None,
                            format!("unexpected <{}> in <TS>", tag_name(&start)),
                        ));
                    }
                },
                Event::Empty(start) => match start.name().as_ref() {
                    b"context" => {
                        return Err(CatalogError::schema(None, "context without a <name> child"));
                    }
                    b"defaultcodec" | b"dependencies" => {}
                    name if name.starts_with(b"extra-") => {}
                    _ => {
                        return Err(CatalogError::schema(
                            None,
                            format!("unexpected <{}> in <TS>", tag_name(&start)),
                        ));
                    }
                },
                Event::Text(text) if !text.iter().all(u8::is_ascii_whitespace) => {
                    return Err(CatalogError::schema(None, "unexpected text in <TS>"));
                }
                Event::End(_) => return Ok(()),
                Event::Eof => return Err(self.parse_error("unexpected end of document")),
                _ => {}
            }
        }
    }

    fn read_context(&mut self) -> Result<Context, CatalogError> {
        let mut name: Option<String> = None;
        let mut messages = Vec::new();

        loop {
            match self.next()? {
                Event::Start(start) => match start.name().as_ref() {
                    b"name" => {
                        if name.is_some() {
                            return Err(CatalogError::schema(
                                name.as_deref(),
                                "context has more than one <name>",
                            ));
                        }
                        name = Some(self.read_text("name", name.as_deref())?);
                    }
                    b"message" => {
                        let message = self.read_message(&start, name.as_deref())?;
                        messages.push(message);
                    }
                    b"comment" => self.skip_element()?,
                    other if other.starts_with(b"extra-") => self.skip_element()?,
                    _ => {
                        return Err(CatalogError::schema(
                            name.as_deref(),
                            format!("unexpected <{}> in <context>", tag_name(&start)),
                        ));
                    }
                },
                Event::Empty(start) => match start.name().as_ref() {
                    b"name" => {
                        if name.is_some() {
                            return Err(CatalogError::schema(
                                name.as_deref(),
                                "context has more than one <name>",
                            ));
                        }
                        name = Some(String::new());
                    }
                    b"message" => {
                        return Err(CatalogError::schema(
                            name.as_deref(),
                            "message without a <source> child",
                        ));
                    }
                    b"comment" => {}
                    other if other.starts_with(b"extra-") => {}
                    _ => {
                        return Err(CatalogError::schema(
                            name.as_deref(),
                            format!("unexpected <{}> in <context>", tag_name(&start)),
                        ));
                    }
                },
                Event::Text(text) if !text.iter().all(u8::is_ascii_whitespace) => {
                    return Err(CatalogError::schema(name.as_deref(), "unexpected text in <context>"));
                }
                Event::End(_) => break,
                Event::Eof => return Err(self.parse_error("unexpected end of document")),
                _ => {}
            }
        }

        let Some(name) = name else {
            return Err(CatalogError::schema(None, "context without a <name> child"));
        };
        Ok(Context { name, messages })
    }

    fn read_message(
        &mut self,
        start: &BytesStart<'_>,
        context: Option<&str>,
    ) -> Result<Message, CatalogError> {
        let mut message = Message::default();
        for (key, value) in self.attributes(start)? {
            match key.as_str() {
                "numerus" => {
                    message.plural = parse_yes_no(&value).ok_or_else(|| {
                        CatalogError::schema(context, format!("unknown numerus value '{value}'"))
                    })?;
                }
                "id" => message.id = Some(value),
                _ => {}
            }
        }

        let mut source = None;
        let mut translation = None;

        loop {
            match self.next()? {
                Event::Start(child) => {
                    let tag = tag_name(&child);
                    match tag.as_str() {
                        "location" => {
                            message.locations.push(self.read_location(&child)?);
                            self.skip_element()?;
                        }
                        "source" => source = Some(self.read_text("source", context)?),
                        "oldsource" => {
                            message.old_source = Some(self.read_text("oldsource", context)?);
                        }
                        "comment" => message.comment = Some(self.read_text("comment", context)?),
                        "oldcomment" => {
                            message.old_comment = Some(self.read_text("oldcomment", context)?);
                        }
                        "extracomment" => {
                            message.extra_comment = Some(self.read_text("extracomment", context)?);
                        }
                        "translatorcomment" => {
                            message.translator_comment =
                                Some(self.read_text("translatorcomment", context)?);
                        }
                        "translation" => {
                            translation =
                                Some(self.read_translation(&child, message.plural, context)?);
                        }
                        "userdata" => self.skip_element()?,
                        other if other.starts_with("extra-") => {
                            let text = self.read_text(other, context)?;
                            message.extras.push((other.to_string(), text));
                        }
                        _ => {
                            return Err(CatalogError::schema(
                                context,
                                format!("unexpected <{tag}> in <message>"),
                            ));
                        }
                    }
                }
                Event::Empty(child) => {
                    let tag = tag_name(&child);
                    match tag.as_str() {
                        "location" => message.locations.push(self.read_location(&child)?),
                        "source" => source = Some(String::new()),
                        "oldsource" => message.old_source = Some(String::new()),
                        "comment" => message.comment = Some(String::new()),
                        "oldcomment" => message.old_comment = Some(String::new()),
                        "extracomment" => message.extra_comment = Some(String::new()),
                        "translatorcomment" => message.translator_comment = Some(String::new()),
                        "translation" => {
                            let mut empty = self.read_translation_attributes(&child, context)?;
                            if message.plural {
                                empty.body = TranslationBody::Forms(Vec::new());
                            }
                            translation = Some(empty);
                        }
                        "userdata" => {}
                        other if other.starts_with("extra-") => {
                            message.extras.push((other.to_string(), String::new()));
                        }
                        _ => {
                            return Err(CatalogError::schema(
                                context,
                                format!("unexpected <{tag}> in <message>"),
                            ));
                        }
                    }
                }
                Event::Text(text) if !text.iter().all(u8::is_ascii_whitespace) => {
                    return Err(CatalogError::schema(context, "unexpected text in <message>"));
                }
                Event::End(_) => break,
                Event::Eof => return Err(self.parse_error("unexpected end of document")),
                _ => {}
            }
        }

        let Some(source) = source else {
            return Err(CatalogError::schema(context, "message without a <source> child"));
        };
        message.source = source;
        message.translation = translation.unwrap_or_else(|| {
            let body = if message.plural {
                TranslationBody::Forms(Vec::new())
            } else {
                TranslationBody::Text(String::new())
            };
            Translation { state: TranslationState::Unfinished, body }
        });
        Ok(message)
    }

    /// Reads `filename` and `line`; a malformed line is dropped with a warning.
    fn read_location(&self, start: &BytesStart<'_>) -> Result<SourceLocation, CatalogError> {
        let mut location = SourceLocation::default();
        for (key, value) in self.attributes(start)? {
            match key.as_str() {
                "filename" => location.filename = Some(value),
                "line" => match value.parse::<LineRef>() {
                    Ok(line) => location.line = Some(line),
                    Err(e) => tracing::warn!(
                        filename = ?location.filename,
                        "Ignoring location line: {e}"
                    ),
                },
                _ => {}
            }
        }
        Ok(location)
    }

    fn read_translation_attributes(
        &self,
        start: &BytesStart<'_>,
        context: Option<&str>,
    ) -> Result<Translation, CatalogError> {
        let mut translation = Translation::default();
        for (key, value) in self.attributes(start)? {
            match key.as_str() {
                "type" => {
                    translation.state = value
                        .parse::<TranslationState>()
                        .map_err(|e| CatalogError::schema(context, e))?;
                }
                "variants" if parse_yes_no(&value) == Some(true) => {
                    return Err(CatalogError::schema(
                        context,
                        "length variants are not supported",
                    ));
                }
                _ => {}
            }
        }
        Ok(translation)
    }

    fn read_translation(
        &mut self,
        start: &BytesStart<'_>,
        plural: bool,
        context: Option<&str>,
    ) -> Result<Translation, CatalogError> {
        let mut translation = self.read_translation_attributes(start, context)?;
        let mut text = String::new();
        let mut forms: Vec<String> = Vec::new();

        loop {
            match self.next()? {
                Event::Text(chunk) => {
                    let chunk = chunk.unescape().map_err(|e| self.parse_error(e.to_string()))?;
                    text.push_str(&chunk);
                }
                Event::CData(cdata) => text.push_str(&String::from_utf8_lossy(&cdata.into_inner())),
                Event::Start(child) => match child.name().as_ref() {
                    b"numerusform" => {
                        self.reject_length_variants(&child, context)?;
                        forms.push(self.read_text("numerusform", context)?);
                    }
                    b"lengthvariant" => {
                        return Err(CatalogError::schema(
                            context,
                            "length variants are not supported",
                        ));
                    }
                    _ => {
                        return Err(CatalogError::schema(
                            context,
                            format!("unexpected <{}> in <translation>", tag_name(&child)),
                        ));
                    }
                },
                Event::Empty(child) => match child.name().as_ref() {
                    b"numerusform" => {
                        self.reject_length_variants(&child, context)?;
                        forms.push(String::new());
                    }
                    b"byte" => text.push(self.read_byte(&child, context)?),
                    b"lengthvariant" => {
                        return Err(CatalogError::schema(
                            context,
                            "length variants are not supported",
                        ));
                    }
                    _ => {
                        return Err(CatalogError::schema(
                            context,
                            format!("unexpected <{}> in <translation>", tag_name(&child)),
                        ));
                    }
                },
                Event::End(_) => break,
                Event::Eof => return Err(self.parse_error("unexpected end of document")),
                _ => {}
            }
        }

        translation.body = if !forms.is_empty() {
            if !text.trim().is_empty() {
                return Err(CatalogError::schema(
                    context,
                    "translation mixes plain text with <numerusform> children",
                ));
            }
            TranslationBody::Forms(forms)
        } else if text.trim().is_empty() {
            // Indentation inside an untranslated element is not a translation.
            if plural {
                TranslationBody::Forms(Vec::new())
            } else {
                TranslationBody::Text(String::new())
            }
        } else {
            TranslationBody::Text(text)
        };
        Ok(translation)
    }

    fn reject_length_variants(
        &self,
        start: &BytesStart<'_>,
        context: Option<&str>,
    ) -> Result<(), CatalogError> {
        let variants = self
            .attributes(start)?
            .into_iter()
            .any(|(key, value)| key == "variants" && parse_yes_no(&value) == Some(true));
        if variants {
            return Err(CatalogError::schema(context, "length variants are not supported"));
        }
        Ok(())
    }

    fn read_byte(&self, start: &BytesStart<'_>, context: Option<&str>) -> Result<char, CatalogError> {
        let value = self
            .attributes(start)?
            .into_iter()
            .find_map(|(key, value)| (key == "value").then_some(value))
            .unwrap_or_default();
        decode_byte_value(&value)
            .ok_or_else(|| CatalogError::schema(context, format!("invalid <byte> value '{value}'")))
    }

    /// Reads the text content of a leaf element, decoding `<byte/>` children.
    fn read_text(&mut self, tag: &str, context: Option<&str>) -> Result<String, CatalogError> {
        let mut text = String::new();
        loop {
            match self.next()? {
                Event::Text(chunk) => {
                    let chunk = chunk.unescape().map_err(|e| self.parse_error(e.to_string()))?;
                    text.push_str(&chunk);
                }
                Event::CData(cdata) => text.push_str(&String::from_utf8_lossy(&cdata.into_inner())),
                Event::Empty(child) if child.name().as_ref() == b"byte" => {
                    text.push(self.read_byte(&child, context)?);
                }
                Event::Start(child) | Event::Empty(child) => {
                    return Err(CatalogError::schema(
                        context,
                        format!("unexpected <{}> inside <{tag}>", tag_name(&child)),
                    ));
                }
                Event::End(_) => return Ok(text),
                Event::Eof => return Err(self.parse_error("unexpected end of document")),
                _ => {}
            }
        }
    }
}
