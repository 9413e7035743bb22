// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Control file primitives.

Repository indices (`Release`, `Packages`) are *control files*: sequences of
*paragraphs* (stanzas) separated by blank lines, where each paragraph is a
series of `Field: value` lines. A value may continue across multiple lines;
continuation lines begin with whitespace and are folded into the owning field.

See <https://www.debian.org/doc/debian-policy/ch-controlfields.html> for the
canonical definition.
*/

use {
    crate::error::{DebrootError, Result},
    std::{borrow::Cow, io::BufRead},
};

/// A field in a control file paragraph.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ControlField<'a> {
    name: Cow<'a, str>,
    value: Cow<'a, str>,
}

impl<'a> ControlField<'a> {
    /// Construct an instance from a field name and value.
    pub fn new(name: Cow<'a, str>, value: Cow<'a, str>) -> Self {
        Self { name, value }
    }

    /// The name of this field.
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// Obtain the value as a [&str].
    ///
    /// Continuation lines (including their newlines) are part of the value.
    pub fn value_str(&self) -> &str {
        self.value.as_ref()
    }

    /// Obtain an iterator of lines in the value.
    ///
    /// Leading whitespace from each line is stripped.
    pub fn iter_lines(&self) -> impl Iterator<Item = &str> {
        self.value.lines().map(|x| x.trim_start())
    }

    /// Obtain an iterator of whitespace-delimited words in the value.
    pub fn iter_words(&self) -> impl Iterator<Item = &str> {
        self.value.split_ascii_whitespace()
    }
}

/// A paragraph in a control file.
///
/// A paragraph is an ordered series of control fields. Field names are
/// case sensitive, as written in the source document. Paragraphs contain a
/// single occurrence of a field; setting an existing field replaces its value.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ControlParagraph<'a> {
    fields: Vec<ControlField<'a>>,
}

impl<'a> ControlParagraph<'a> {
    /// Whether the paragraph has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Set the value of a field via a [ControlField].
    ///
    /// An existing field of the same name has its value replaced.
    pub fn set_field(&mut self, field: ControlField<'a>) {
        self.fields.retain(|cf| cf.name != field.name);
        self.fields.push(field);
    }

    /// Set the value of a field defined via strings.
    pub fn set_field_from_string(&mut self, name: Cow<'a, str>, value: Cow<'a, str>) {
        self.set_field(ControlField::new(name, value));
    }

    /// Whether a named field is present in this paragraph.
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Iterate over fields in this paragraph, in insertion order.
    pub fn iter_fields(&self) -> impl Iterator<Item = &ControlField<'a>> {
        self.fields.iter()
    }

    /// Obtain the field with a given name in this paragraph.
    pub fn field(&self, name: &str) -> Option<&ControlField<'a>> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Obtain the raw string value of the named field.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.field(name).map(|f| f.value_str())
    }

    /// Obtain the named field's value, line by line.
    pub fn field_iter_lines(&self, name: &str) -> Option<impl Iterator<Item = &str>> {
        self.field(name).map(|f| f.iter_lines())
    }

    /// Obtain the named field's value, word by word.
    pub fn field_iter_words(&self, name: &str) -> Option<impl Iterator<Item = &str>> {
        self.field(name).map(|f| f.iter_words())
    }
}

/// Holds parsing state for control files.
///
/// Instances are fed lines of text and emit [ControlParagraph] instances as
/// they are completed.
#[derive(Clone, Debug, Default)]
pub struct ControlFileParser {
    paragraph: ControlParagraph<'static>,
    field: Option<String>,
}

impl ControlFileParser {
    /// Write a line to the parser.
    ///
    /// If the line terminates an in-progress paragraph, that paragraph is
    /// returned. Otherwise `Ok(None)` is returned.
    pub fn write_line(&mut self, line: &str) -> Result<Option<ControlParagraph<'static>>> {
        let is_empty_line = line.trim().is_empty();
        let is_indented = (line.starts_with(' ') || line.starts_with('\t')) && line.len() > 1;

        let current_field = self.field.take();

        // Empty lines terminate the paragraph. Flush any state.
        if is_empty_line {
            if let Some(field) = current_field {
                self.flush_field(field)?;
            }

            return Ok(if self.paragraph.is_empty() {
                None
            } else {
                let para = std::mem::take(&mut self.paragraph);
                Some(para)
            });
        }

        match (current_field, is_indented) {
            // A field is on the stack and an unindented line arrived. This is
            // the beginning of a new field. Flush the old one.
            (Some(v), false) => {
                self.flush_field(v)?;
                self.field = Some(line.to_string());

                Ok(None)
            }
            // No field in progress. This starts a new field.
            (None, _) => {
                self.field = Some(line.to_string());

                Ok(None)
            }
            // A field is on the stack and an indented line arrived: value
            // continuation. Append to the current field.
            (Some(v), true) => {
                self.field = Some(v + line);

                Ok(None)
            }
        }
    }

    /// Finish parsing, consuming self.
    ///
    /// Returns a final paragraph if unflushed state remains.
    pub fn finish(mut self) -> Result<Option<ControlParagraph<'static>>> {
        if let Some(field) = self.field.take() {
            self.flush_field(field)?;
        }

        Ok(if self.paragraph.is_empty() {
            None
        } else {
            Some(self.paragraph)
        })
    }

    fn flush_field(&mut self, v: String) -> Result<()> {
        let mut parts = v.splitn(2, ':');

        let name = parts.next().ok_or_else(|| {
            DebrootError::ControlParseError(format!("error parsing line '{}'; missing colon", v))
        })?;
        let value = parts
            .next()
            .ok_or_else(|| {
                DebrootError::ControlParseError(format!(
                    "error parsing field '{}'; could not detect value",
                    v
                ))
            })?
            .trim();

        // Stanzas should not repeat a field. If one does, the first
        // occurrence wins.
        if !self.paragraph.has_field(name) {
            self.paragraph.set_field_from_string(
                Cow::Owned(name.to_string()),
                Cow::Owned(value.to_string()),
            );
        }

        Ok(())
    }
}

/// A streaming reader of [ControlParagraph] instances.
///
/// Instances are bound to a reader and can be consumed as an iterator. Each
/// call into the iterator reads a full paragraph from the underlying reader.
pub struct ControlParagraphReader<R: BufRead> {
    reader: R,
    parser: Option<ControlFileParser>,
}

impl<R: BufRead> ControlParagraphReader<R> {
    /// Create a new instance bound to a reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            parser: Some(ControlFileParser::default()),
        }
    }

    fn get_next(&mut self) -> Result<Option<ControlParagraph<'static>>> {
        let mut parser = self.parser.take().expect("parser should be present");

        loop {
            let mut line = String::new();

            let bytes_read = self.reader.read_line(&mut line)?;

            if bytes_read != 0 {
                if let Some(paragraph) = parser.write_line(&line)? {
                    self.parser.replace(parser);
                    return Ok(Some(paragraph));
                }
                // Continue reading.
            } else {
                return parser.finish();
            }
        }
    }
}

impl<R: BufRead> Iterator for ControlParagraphReader<R> {
    type Item = Result<ControlParagraph<'static>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.parser.is_none() {
            None
        } else {
            match self.get_next() {
                Ok(Some(para)) => Some(Ok(para)),
                Ok(None) => None,
                Err(e) => Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn paragraph_field_semantics() {
        let mut p = ControlParagraph::default();

        p.set_field_from_string("Package".into(), "foo".into());
        p.set_field_from_string("Package".into(), "bar".into());
        assert_eq!(p.field_str("Package"), Some("bar"));

        // Lookup is case sensitive.
        assert!(p.field("package").is_none());
    }

    #[test]
    fn parse_paragraphs() -> Result<()> {
        let source = "Package: base-files\nPriority: required\n\nPackage: bash\nDepends: base-files\n";

        let paragraphs = ControlParagraphReader::new(std::io::Cursor::new(source))
            .collect::<Result<Vec<_>>>()?;

        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].field_str("Package"), Some("base-files"));
        assert_eq!(paragraphs[0].field_str("Priority"), Some("required"));
        assert_eq!(paragraphs[1].field_str("Package"), Some("bash"));

        // Fields do not leak across paragraph boundaries.
        assert!(paragraphs[0].field("Depends").is_none());
        assert!(paragraphs[1].field("Priority").is_none());

        Ok(())
    }

    #[test]
    fn continuation_lines_fold() -> Result<()> {
        let source = "Package: foo\nDescription: first line\n second line\n third line\n";

        let paragraphs = ControlParagraphReader::new(std::io::Cursor::new(source))
            .collect::<Result<Vec<_>>>()?;

        assert_eq!(paragraphs.len(), 1);

        let description = paragraphs[0].field("Description").unwrap();
        let lines = description.iter_lines().collect::<Vec<_>>();
        assert_eq!(lines, vec!["first line", "second line", "third line"]);

        Ok(())
    }

    #[test]
    fn multiline_digest_field() -> Result<()> {
        let source = "Suite: jammy\nSHA256:\n aabb 10 main/binary-amd64/Packages\n ccdd 20 main/binary-amd64/Packages.gz\n";

        let paragraphs = ControlParagraphReader::new(std::io::Cursor::new(source))
            .collect::<Result<Vec<_>>>()?;

        assert_eq!(paragraphs.len(), 1);

        let entries = paragraphs[0]
            .field_iter_lines("SHA256")
            .unwrap()
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], "aabb 10 main/binary-amd64/Packages");

        Ok(())
    }

    #[test]
    fn repeated_field_first_occurrence_wins() -> Result<()> {
        let source = "Package: foo\nSHA256: first\nSHA256: second\n";

        let paragraphs = ControlParagraphReader::new(std::io::Cursor::new(source))
            .collect::<Result<Vec<_>>>()?;

        assert_eq!(paragraphs[0].field_str("SHA256"), Some("first"));

        Ok(())
    }

    #[test]
    fn trailing_paragraph_without_blank_line() -> Result<()> {
        let source = "Package: foo";

        let paragraphs = ControlParagraphReader::new(std::io::Cursor::new(source))
            .collect::<Result<Vec<_>>>()?;

        assert_eq!(paragraphs.len(), 1);
        assert_eq!(paragraphs[0].field_str("Package"), Some("foo"));

        Ok(())
    }

    #[test]
    fn line_without_colon_is_error() {
        let mut parser = ControlFileParser::default();
        parser.write_line("Package: foo\n").unwrap();
        assert!(parser.write_line("garbage line\n").is_err() || parser.finish().is_err());
    }
}
