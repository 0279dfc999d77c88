//! Serialize a [`DocxDocument`] as a `.docx` package.
//!
//!     The output is a zip archive following the Open Packaging Conventions. It holds five
//!     parts:
//!
//!     - `[Content_Types].xml`: content types of the parts
//!     - `_rels/.rels`: points at the main document
//!     - `word/document.xml`: the body
//!     - `word/_rels/document.xml.rels`: the styles part and one entry per external link
//!     - `word/styles.xml`: generated, or taken from a template
//!
//!     Style names in the model are the names users see ("List Bullet 2"); the XML refers to
//!     style ids, which are the names with spaces removed. Generated styles cover every name the
//!     document uses. With a template, styles it already defines are kept as they are and the
//!     missing ones are appended with generated definitions.

use super::{BlockItem, DocxDocument, Hyperlink, LinkTarget, Paragraph, ParagraphItem, Run, Table};
use crate::error::ConvertError;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

const RELS_CONTENT_TYPE: &str = "application/vnd.openxmlformats-package.relationships+xml";
const DOCUMENT_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
const STYLES_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";

const OFFICE_DOCUMENT_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const STYLES_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const HYPERLINK_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const PACKAGE_RELS_PART: &str = "_rels/.rels";
pub const DOCUMENT_PART: &str = "word/document.xml";
pub const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
pub const STYLES_PART: &str = "word/styles.xml";

/// Style id of a style name.
pub fn style_id(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Serialize `document` to the bytes of a `.docx` file.
///
/// `template` is the text of a `styles.xml` part. It must be well-formed XML with a `w:styles`
/// root, otherwise the conversion fails.
pub fn to_docx(document: &DocxDocument, template: Option<&str>) -> Result<Vec<u8>, ConvertError> {
    let template = template.map(StylesTemplate::parse).transpose()?;
    let relationships = Relationships::collect(document);
    let styles = used_styles(document);

    let mut parts: Vec<(&str, String)> = Vec::with_capacity(5);

    let mut out = XmlOut::part()?;
    write_content_types(&mut out)?;
    parts.push((CONTENT_TYPES_PART, out.finish()?));

    let mut out = XmlOut::part()?;
    out.start("Relationships", &[("xmlns", RELS_NS)])?;
    out.empty(
        "Relationship",
        &[
            ("Id", "rId1"),
            ("Type", OFFICE_DOCUMENT_REL),
            ("Target", DOCUMENT_PART),
        ],
    )?;
    out.end("Relationships")?;
    parts.push((PACKAGE_RELS_PART, out.finish()?));

    let mut out = XmlOut::part()?;
    write_document(&mut out, document, &relationships)?;
    parts.push((DOCUMENT_PART, out.finish()?));

    let mut out = XmlOut::part()?;
    relationships.write(&mut out)?;
    parts.push((DOCUMENT_RELS_PART, out.finish()?));

    let mut out = XmlOut::part()?;
    match &template {
        Some(template) => template.write(&mut out, &styles)?,
        None => write_styles(&mut out, &styles)?,
    }
    parts.push((STYLES_PART, out.finish()?));

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, xml) in parts {
        archive.start_file(name, options)?;
        archive.write_all(xml.as_bytes())?;
    }
    Ok(archive.finish()?.into_inner())
}

fn write_content_types(out: &mut XmlOut) -> Result<(), ConvertError> {
    out.start("Types", &[("xmlns", CONTENT_TYPES_NS)])?;
    out.empty(
        "Default",
        &[("Extension", "rels"), ("ContentType", RELS_CONTENT_TYPE)],
    )?;
    out.empty(
        "Default",
        &[("Extension", "xml"), ("ContentType", "application/xml")],
    )?;
    out.empty(
        "Override",
        &[
            ("PartName", "/word/document.xml"),
            ("ContentType", DOCUMENT_CONTENT_TYPE),
        ],
    )?;
    out.empty(
        "Override",
        &[
            ("PartName", "/word/styles.xml"),
            ("ContentType", STYLES_CONTENT_TYPE),
        ],
    )?;
    out.end("Types")
}

/// Thin event helper over a quick-xml writer.
struct XmlOut {
    writer: Writer<Vec<u8>>,
}

impl XmlOut {
    /// A writer for one package part, XML declaration written.
    fn part() -> Result<Self, ConvertError> {
        let mut out = Self {
            writer: Writer::new(Vec::new()),
        };
        out.decl()?;
        Ok(out)
    }

    fn decl(&mut self) -> Result<(), ConvertError> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(())
    }

    fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), ConvertError> {
        let mut element = BytesStart::new(name);
        for attribute in attributes {
            element.push_attribute(*attribute);
        }
        self.writer.write_event(Event::Start(element))?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), ConvertError> {
        let mut element = BytesStart::new(name);
        for attribute in attributes {
            element.push_attribute(*attribute);
        }
        self.writer.write_event(Event::Empty(element))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<(), ConvertError> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), ConvertError> {
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    /// Write markup that is already escaped XML.
    fn raw(&mut self, markup: &str) -> Result<(), ConvertError> {
        self.writer
            .write_event(Event::Text(BytesText::from_escaped(markup)))?;
        Ok(())
    }

    fn finish(self) -> Result<String, ConvertError> {
        String::from_utf8(self.writer.into_inner())
            .map_err(|e| ConvertError::SerializationError(format!("UTF-8 conversion failed: {e}")))
    }
}

/// Relationship ids of the document part. `rId1` is always the styles part.
struct Relationships {
    external: Vec<String>,
    ids: HashMap<String, String>,
}

impl Relationships {
    fn collect(document: &DocxDocument) -> Self {
        let mut external = Vec::new();
        let mut ids = HashMap::new();

        for paragraph in document.paragraphs() {
            for item in &paragraph.items {
                if let ParagraphItem::Hyperlink(Hyperlink {
                    target: LinkTarget::External(url),
                    ..
                }) = item
                {
                    if !ids.contains_key(url) {
                        ids.insert(url.clone(), format!("rId{}", external.len() + 2));
                        external.push(url.clone());
                    }
                }
            }
        }

        Self { external, ids }
    }

    fn id(&self, url: &str) -> Option<&str> {
        self.ids.get(url).map(String::as_str)
    }

    fn write(&self, out: &mut XmlOut) -> Result<(), ConvertError> {
        out.start("Relationships", &[("xmlns", RELS_NS)])?;
        out.empty(
            "Relationship",
            &[("Id", "rId1"), ("Type", STYLES_REL), ("Target", "styles.xml")],
        )?;
        for url in &self.external {
            if let Some(id) = self.id(url) {
                out.empty(
                    "Relationship",
                    &[
                        ("Id", id),
                        ("Type", HYPERLINK_REL),
                        ("Target", url.as_str()),
                        ("TargetMode", "External"),
                    ],
                )?;
            }
        }
        out.end("Relationships")
    }
}

fn write_document(
    out: &mut XmlOut,
    document: &DocxDocument,
    relationships: &Relationships,
) -> Result<(), ConvertError> {
    out.start("w:document", &[("xmlns:w", W_NS), ("xmlns:r", R_NS)])?;
    out.start("w:body", &[])?;
    for block in &document.body {
        write_block(out, block, relationships)?;
    }
    out.start("w:sectPr", &[])?;
    out.empty(
        "w:pgMar",
        &[
            ("w:top", "1440"),
            ("w:right", "1440"),
            ("w:bottom", "1440"),
            ("w:left", "1440"),
        ],
    )?;
    out.end("w:sectPr")?;
    out.end("w:body")?;
    out.end("w:document")
}

fn write_block(
    out: &mut XmlOut,
    block: &BlockItem,
    relationships: &Relationships,
) -> Result<(), ConvertError> {
    match block {
        BlockItem::Paragraph(paragraph) => write_paragraph(out, paragraph, relationships),
        BlockItem::Table(table) => write_table(out, table, relationships),
    }
}

fn write_paragraph(
    out: &mut XmlOut,
    paragraph: &Paragraph,
    relationships: &Relationships,
) -> Result<(), ConvertError> {
    out.start("w:p", &[])?;

    if paragraph.style.is_some() || paragraph.border_bottom {
        out.start("w:pPr", &[])?;
        if let Some(style) = &paragraph.style {
            out.empty("w:pStyle", &[("w:val", style_id(style).as_str())])?;
        }
        if paragraph.border_bottom {
            out.start("w:pBdr", &[])?;
            out.empty(
                "w:bottom",
                &[
                    ("w:val", "single"),
                    ("w:sz", "6"),
                    ("w:space", "1"),
                    ("w:color", "auto"),
                ],
            )?;
            out.end("w:pBdr")?;
        }
        out.end("w:pPr")?;
    }

    for item in &paragraph.items {
        match item {
            ParagraphItem::Run(run) => write_run(out, run, None)?,
            ParagraphItem::Hyperlink(link) => {
                match &link.target {
                    LinkTarget::Anchor(anchor) => {
                        out.start("w:hyperlink", &[("w:anchor", anchor.as_str())])?
                    }
                    LinkTarget::External(url) => {
                        let id = relationships.id(url).ok_or_else(|| {
                            ConvertError::SerializationError(format!(
                                "no relationship for link target '{url}'"
                            ))
                        })?;
                        out.start("w:hyperlink", &[("r:id", id)])?
                    }
                }
                for run in &link.runs {
                    write_run(out, run, Some("Hyperlink"))?;
                }
                out.end("w:hyperlink")?;
            }
            ParagraphItem::BookmarkStart { id, name } => {
                out.empty(
                    "w:bookmarkStart",
                    &[("w:id", id.to_string().as_str()), ("w:name", name.as_str())],
                )?
            }
            ParagraphItem::BookmarkEnd { id } => {
                out.empty("w:bookmarkEnd", &[("w:id", id.to_string().as_str())])?
            }
        }
    }

    out.end("w:p")
}

fn write_run(out: &mut XmlOut, run: &Run, character_style: Option<&str>) -> Result<(), ConvertError> {
    out.start("w:r", &[])?;

    let has_properties = character_style.is_some()
        || run.font.is_some()
        || run.bold
        || run.italic
        || run.underline;
    if has_properties {
        out.start("w:rPr", &[])?;
        if let Some(style) = character_style {
            out.empty("w:rStyle", &[("w:val", style_id(style).as_str())])?;
        }
        if let Some(font) = &run.font {
            let font = font.as_str();
            out.empty("w:rFonts", &[("w:ascii", font), ("w:hAnsi", font), ("w:cs", font)])?;
        }
        if run.bold {
            out.empty("w:b", &[])?;
        }
        if run.italic {
            out.empty("w:i", &[])?;
        }
        if run.underline {
            out.empty("w:u", &[("w:val", "single")])?;
        }
        out.end("w:rPr")?;
    }

    if run.line_break {
        out.empty("w:br", &[])?;
    } else {
        for (index, line) in run.text.split('\n').enumerate() {
            if index > 0 {
                out.empty("w:br", &[])?;
            }
            if !line.is_empty() {
                out.start("w:t", &[("xml:space", "preserve")])?;
                out.text(line)?;
                out.end("w:t")?;
            }
        }
    }

    out.end("w:r")
}

fn write_table(
    out: &mut XmlOut,
    table: &Table,
    relationships: &Relationships,
) -> Result<(), ConvertError> {
    out.start("w:tbl", &[])?;

    out.start("w:tblPr", &[])?;
    if let Some(style) = &table.style {
        out.empty("w:tblStyle", &[("w:val", style_id(style).as_str())])?;
    }
    out.empty("w:tblW", &[("w:w", "5000"), ("w:type", "pct")])?;
    out.end("w:tblPr")?;

    let columns = table.column_count();
    out.start("w:tblGrid", &[])?;
    let width = (9000 / columns.max(1)).to_string();
    for _ in 0..columns {
        out.empty("w:gridCol", &[("w:w", width.as_str())])?;
    }
    out.end("w:tblGrid")?;

    for row in &table.rows {
        out.start("w:tr", &[])?;
        if row.header {
            out.start("w:trPr", &[])?;
            out.empty("w:tblHeader", &[])?;
            out.end("w:trPr")?;
        }
        for cell in &row.cells {
            out.start("w:tc", &[])?;
            out.start("w:tcPr", &[])?;
            out.empty("w:tcW", &[("w:w", "0"), ("w:type", "auto")])?;
            out.end("w:tcPr")?;
            if cell.blocks.is_empty() {
                out.empty("w:p", &[])?;
            }
            for block in &cell.blocks {
                write_block(out, block, relationships)?;
            }
            // A cell may not end with a table.
            if matches!(cell.blocks.last(), Some(BlockItem::Table(_))) {
                out.empty("w:p", &[])?;
            }
            out.end("w:tc")?;
        }
        out.end("w:tr")?;
    }

    out.end("w:tbl")
}

/// Names of every style the document refers to, sorted.
fn used_styles(document: &DocxDocument) -> BTreeSet<String> {
    let mut styles = BTreeSet::new();
    collect_styles(&document.body, &mut styles);
    styles
}

fn collect_styles(blocks: &[BlockItem], styles: &mut BTreeSet<String>) {
    for block in blocks {
        match block {
            BlockItem::Paragraph(paragraph) => {
                if let Some(style) = &paragraph.style {
                    styles.insert(style.clone());
                }
                if paragraph
                    .items
                    .iter()
                    .any(|item| matches!(item, ParagraphItem::Hyperlink(_)))
                {
                    styles.insert("Hyperlink".to_string());
                }
            }
            BlockItem::Table(table) => {
                if let Some(style) = &table.style {
                    styles.insert(style.clone());
                }
                for row in &table.rows {
                    for cell in &row.cells {
                        collect_styles(&cell.blocks, styles);
                    }
                }
            }
        }
    }
}

fn write_styles(out: &mut XmlOut, styles: &BTreeSet<String>) -> Result<(), ConvertError> {
    out.start("w:styles", &[("xmlns:w", W_NS)])?;

    out.start("w:docDefaults", &[])?;
    out.start("w:rPrDefault", &[])?;
    out.start("w:rPr", &[])?;
    out.empty("w:rFonts", &[("w:ascii", "Calibri"), ("w:hAnsi", "Calibri")])?;
    out.empty("w:sz", &[("w:val", "22")])?;
    out.end("w:rPr")?;
    out.end("w:rPrDefault")?;
    out.end("w:docDefaults")?;

    out.start(
        "w:style",
        &[("w:type", "paragraph"), ("w:default", "1"), ("w:styleId", "Normal")],
    )?;
    out.empty("w:name", &[("w:val", "Normal")])?;
    out.end("w:style")?;

    for name in styles {
        if name != "Normal" {
            write_style(out, name)?;
        }
    }

    out.end("w:styles")
}

/// Generated definition of one named style.
fn write_style(out: &mut XmlOut, name: &str) -> Result<(), ConvertError> {
    let id = style_id(name);
    let id = id.as_str();

    if name == "Hyperlink" {
        out.start("w:style", &[("w:type", "character"), ("w:styleId", id)])?;
        out.empty("w:name", &[("w:val", name)])?;
        out.start("w:rPr", &[])?;
        out.empty("w:color", &[("w:val", "0563C1")])?;
        out.empty("w:u", &[("w:val", "single")])?;
        out.end("w:rPr")?;
        return out.end("w:style");
    }

    if name == "Table Grid" {
        out.start("w:style", &[("w:type", "table"), ("w:styleId", id)])?;
        out.empty("w:name", &[("w:val", name)])?;
        out.start("w:tblPr", &[])?;
        out.start("w:tblBorders", &[])?;
        for side in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
            out.empty(
                side,
                &[("w:val", "single"), ("w:sz", "4"), ("w:space", "0"), ("w:color", "auto")],
            )?;
        }
        out.end("w:tblBorders")?;
        out.end("w:tblPr")?;
        return out.end("w:style");
    }

    out.start("w:style", &[("w:type", "paragraph"), ("w:styleId", id)])?;
    out.empty("w:name", &[("w:val", name)])?;
    out.empty("w:basedOn", &[("w:val", "Normal")])?;

    if let Some(level) = heading_level(name) {
        out.empty("w:next", &[("w:val", "Normal")])?;
        out.start("w:pPr", &[])?;
        out.empty("w:keepNext", &[])?;
        out.empty("w:spacing", &[("w:before", "240"), ("w:after", "60")])?;
        out.empty("w:outlineLvl", &[("w:val", (level - 1).to_string().as_str())])?;
        out.end("w:pPr")?;
        out.start("w:rPr", &[])?;
        out.empty("w:b", &[])?;
        let size = 36usize.saturating_sub(2 * level as usize).max(22);
        out.empty("w:sz", &[("w:val", size.to_string().as_str())])?;
        out.end("w:rPr")?;
    } else if let Some(depth) = list_depth(name) {
        let indent = (360 * depth).to_string();
        out.start("w:pPr", &[])?;
        out.empty("w:ind", &[("w:left", indent.as_str()), ("w:hanging", "360")])?;
        out.end("w:pPr")?;
    } else if name == "Quote" {
        out.start("w:pPr", &[])?;
        out.empty("w:ind", &[("w:left", "720")])?;
        out.end("w:pPr")?;
        out.start("w:rPr", &[])?;
        out.empty("w:i", &[])?;
        out.end("w:rPr")?;
    } else if name == "Code" {
        out.start("w:pPr", &[])?;
        out.empty("w:spacing", &[("w:after", "0")])?;
        out.end("w:pPr")?;
        out.start("w:rPr", &[])?;
        out.empty("w:rFonts", &[("w:ascii", "Consolas"), ("w:hAnsi", "Consolas")])?;
        out.end("w:rPr")?;
    }

    out.end("w:style")
}

fn heading_level(name: &str) -> Option<u8> {
    name.strip_prefix("Heading ")?
        .parse()
        .ok()
        .filter(|level| (1..=9).contains(level))
}

fn list_depth(name: &str) -> Option<usize> {
    let rest = name
        .strip_prefix("List Bullet")
        .or_else(|| name.strip_prefix("List Number"))?;
    if rest.is_empty() {
        return Some(1);
    }
    rest.trim_start().parse().ok()
}

/// A user supplied styles part.
struct StylesTemplate<'t> {
    /// Text of the root element, start tag to end tag
    element: &'t str,
    root_name: String,
    style_ids: HashSet<String>,
}

impl<'t> StylesTemplate<'t> {
    fn parse(source: &'t str) -> Result<Self, ConvertError> {
        let document = roxmltree::Document::parse(source)
            .map_err(|e| ConvertError::Template(format!("not well-formed XML: {e}")))?;
        let root = document.root_element();

        if root.tag_name().name() != "styles" || root.tag_name().namespace() != Some(W_NS) {
            return Err(ConvertError::Template(format!(
                "expected a w:styles root element, found '{}'",
                root.tag_name().name()
            )));
        }
        if root.lookup_prefix(W_NS) != Some("w") {
            return Err(ConvertError::Template(
                "the WordprocessingML namespace must use the 'w' prefix".to_string(),
            ));
        }

        let style_ids = root
            .children()
            .filter(|node| node.is_element() && node.tag_name().name() == "style")
            .filter_map(|node| node.attribute((W_NS, "styleId")))
            .map(str::to_string)
            .collect();

        Ok(Self {
            element: &source[root.range()],
            root_name: "w:styles".to_string(),
            style_ids,
        })
    }

    fn write(&self, out: &mut XmlOut, used: &BTreeSet<String>) -> Result<(), ConvertError> {
        let missing: Vec<&String> = used
            .iter()
            .filter(|name| !self.style_ids.contains(&style_id(name)))
            .collect();

        match self.element.rfind("</") {
            Some(split) => {
                out.raw(&self.element[..split])?;
                for name in missing {
                    write_style(out, name)?;
                }
                out.raw(&self.element[split..])
            }
            None => {
                // Self-closing root: reopen it so the missing styles have somewhere to go.
                let open = self.element.trim_end().trim_end_matches("/>").trim_end();
                out.raw(open)?;
                out.raw(">")?;
                for name in missing {
                    write_style(out, name)?;
                }
                out.raw(&format!("</{}>", self.root_name))
            }
        }
    }
}
