//! XLIFF 2.0
//!
//! The model is trans-unit shaped, so each `<segment>` or `<ignorable>`
//! of a `<unit>` becomes one [`TransUnit`]:
//!
//! - a unit with one segment keeps the unit id and `unit_id` stays empty
//! - a unit with several segments sets `unit_id` on every part and uses the
//!   segment id, or `{unit}-{n}` when the segment has none
//! - unit-level notes, matches, extensions, `name` and `type` are kept on
//!   the first part, `translate` on all of them
//!
//! On output, consecutive parts sharing a `unit_id` are written back as one
//! `<unit>`.

use std::collections::BTreeSet;

use xliffkit_ast::{
    AltTrans, BodyItem, Dialect, Document, File, Group, Header, InlineKind, Note, TransUnit,
};

use crate::diagnostics::{Diagnostic, ErrorCategory, ErrorType, Severity};
use crate::dialects::{
    borrowed, foreign_inline_kinds, is_foreign_name, looks_like_2_0, needs_preserve, read_content,
    strip_names, for_each_unit_mut, units_with_file,
};
use crate::error::Result;
use crate::navigate::{
    self, attr, child, children, extra_attributes, non_empty_attr, path_segment, yes_no,
    yes_no_str,
};
use crate::parser::{ParseContext, XliffParser};
use crate::states::{check_state, StatePolicy};
use crate::tree::XmlElement;
use crate::writer::XmlWriter;

/// Namespace of the translation candidates module
pub const MATCHES_NAMESPACE: &str = "urn:oasis:names:tc:xliff:matches:2.0";

const FILE_ATTRIBUTES: &[&str] = &["id", "original"];
const GROUP_ATTRIBUTES: &[&str] = &["id", "name", "type", "translate"];
const UNIT_ATTRIBUTES: &[&str] = &["id", "name", "type", "translate"];
const MATCH_ATTRIBUTES: &[&str] = &["matchQuality", "origin", "type"];
const ROOT_OWN: &[&str] = &["version", "xmlns", "srcLang", "trgLang"];

const CTYPE: &str = "type";

/// Parser for unit/segment based XLIFF 2.0
#[derive(Debug, Clone, Copy, Default)]
pub struct Xliff20Parser {
    state_policy: StatePolicy,
}

impl Xliff20Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report unknown states according to a policy
    pub fn with_state_policy(mut self, policy: StatePolicy) -> Self {
        self.state_policy = policy;
        self
    }
}

impl XliffParser for Xliff20Parser {
    fn dialect(&self) -> Dialect {
        Dialect::Xliff20
    }

    fn detect_version(&self, text: &str) -> bool {
        looks_like_2_0(text)
    }

    fn parse_document(&self, root: &XmlElement, ctx: &mut ParseContext<'_>) -> Result<Document> {
        let mut doc = Document::new(Dialect::Xliff20);
        ctx.enter_scope(root);
        doc.attributes = navigate::attributes(root);
        if let Some(version) = root.attr("version") {
            doc.version = version.to_string();
        }
        let src_lang = attr(root, "srcLang").unwrap_or_default();
        let trg_lang = attr(root, "trgLang");

        let files = children(root, "file");
        if files.is_empty() {
            ctx.report_at(
                root,
                Diagnostic::new(
                    ErrorType::MissingElement,
                    ErrorCategory::Structural,
                    Severity::Critical,
                    "Document contains no <file> element",
                )
                .with_code("PARSE010")
                .with_element("file"),
            );
            return Ok(doc);
        }

        for (index, element) in files.into_iter().enumerate() {
            ctx.path.push(path_segment(element, index));
            let mut file = read_file(element, ctx);
            file.source_language = src_lang.clone();
            file.target_language = trg_lang.clone();
            doc.files.push(file);
            ctx.path.pop();
        }
        Ok(doc)
    }

    fn serialize(&self, document: &Document) -> Result<String> {
        let mut writer = XmlWriter::new();

        let first = document.files.first();
        let src_lang = first
            .map(|f| f.source_language.as_str())
            .filter(|s| !s.is_empty())
            .or_else(|| document.attributes.get("srcLang").map(String::as_str))
            .unwrap_or_default();
        let trg_lang = first
            .and_then(|f| f.target_language.as_deref())
            .or_else(|| document.attributes.get("trgLang").map(String::as_str));

        let (mtc, declare_mtc) = matches_prefix(document);
        let mtc_declaration = format!("xmlns:{}", mtc);
        let mut root: Vec<(&str, &str)> = vec![
            ("version", Dialect::Xliff20.version_attribute()),
            ("xmlns", Dialect::Xliff20.namespace()),
            ("srcLang", src_lang),
        ];
        if let Some(trg_lang) = trg_lang {
            root.push(("trgLang", trg_lang));
        }
        let has_matches = document
            .all_trans_units()
            .iter()
            .any(|u| !u.alt_trans.is_empty());
        if has_matches && declare_mtc {
            root.push((mtc_declaration.as_str(), MATCHES_NAMESPACE));
        }
        root.extend(borrowed(&document.attributes).filter(|(k, _)| !ROOT_OWN.contains(k)));
        writer.open("xliff", root);

        for (index, file) in document.files.iter().enumerate() {
            write_file(&mut writer, file, index, &mtc);
        }

        writer.close("xliff");
        Ok(writer.finish())
    }

    /// Drop extension attributes and elements, keep core and match data
    fn normalize_document(&self, document: &Document) -> Document {
        let mut doc = document.clone();
        doc.dialect = Dialect::Xliff20;
        doc.version = "2.0".to_string();
        strip_names(&mut doc, &is_foreign_name);
        for file in &mut doc.files {
            if let Some(ref mut header) = file.header {
                header.extensions.clear();
            }
            for_each_unit_mut(&mut file.body.items, &mut |unit| unit.extensions.clear());
        }
        doc
    }

    fn validate_version_specific(&self, document: &Document) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        if document.version != "2.0" {
            diagnostics.push(
                Diagnostic::new(
                    ErrorType::SchemaViolation,
                    ErrorCategory::Schema,
                    Severity::Major,
                    format!("Expected version 2.0, found \"{}\"", document.version),
                )
                .with_code("V20001")
                .with_path("xliff")
                .with_element("xliff")
                .with_attribute("version"),
            );
        }

        let src_declared = document
            .attributes
            .get("srcLang")
            .is_some_and(|s| !s.trim().is_empty())
            || document
                .files
                .iter()
                .all(|f| !f.source_language.trim().is_empty());
        if !src_declared {
            diagnostics.push(
                Diagnostic::new(
                    ErrorType::MissingElement,
                    ErrorCategory::Structural,
                    Severity::Major,
                    "Document does not declare srcLang",
                )
                .with_code("V20002")
                .with_path("xliff")
                .with_element("xliff")
                .with_attribute("srcLang"),
            );
        }

        let mut seen = BTreeSet::new();
        for (index, file) in document.files.iter().enumerate() {
            let Some(id) = file.id.as_deref().filter(|id| !id.is_empty()) else {
                continue;
            };
            if !seen.insert(id) {
                diagnostics.push(
                    Diagnostic::new(
                        ErrorType::SchemaViolation,
                        ErrorCategory::Structural,
                        Severity::Major,
                        format!("Duplicate file id '{}'", id),
                    )
                    .with_code("V20004")
                    .with_path(format!("xliff/file[{}]", index))
                    .with_element("file")
                    .with_attribute("id"),
                );
            }
        }

        for (file_index, unit) in units_with_file(document) {
            let path = unit_path(document, file_index, unit);

            if let Some(ref state) = unit.state {
                if let Some(diag) =
                    check_state(Dialect::Xliff20, state, self.state_policy, "V20005")
                {
                    diagnostics.push(diag.with_path(path.clone()).with_element("segment"));
                }
            }

            if unit.state_qualifier.is_some() && unit.state.is_none() {
                diagnostics.push(
                    Diagnostic::new(
                        ErrorType::InvalidAttribute,
                        ErrorCategory::Schema,
                        Severity::Minor,
                        "subState is set without state",
                    )
                    .with_code("V20003")
                    .with_path(path.clone())
                    .with_element("segment")
                    .with_attribute("state"),
                );
            }

            for kind in foreign_inline_kinds(unit, Dialect::Xliff20) {
                diagnostics.push(
                    Diagnostic::new(
                        ErrorType::SchemaViolation,
                        ErrorCategory::Schema,
                        Severity::Minor,
                        format!("Inline element <{}> is not part of XLIFF 2.0", kind.tag()),
                    )
                    .with_code("V20007")
                    .with_path(path.clone())
                    .with_element(kind.tag())
                    .with_recoverable(false),
                );
            }
        }

        let has_targets = document.all_trans_units().iter().any(|u| u.has_target());
        let trg_declared = document.attributes.contains_key("trgLang")
            || document.files.iter().any(|f| f.target_language.is_some());
        if has_targets && !trg_declared {
            diagnostics.push(
                Diagnostic::new(
                    ErrorType::MissingElement,
                    ErrorCategory::Schema,
                    Severity::Minor,
                    "Document has translations but declares no trgLang",
                )
                .with_code("V20006")
                .with_path("xliff")
                .with_element("xliff")
                .with_attribute("trgLang"),
            );
        }

        diagnostics
    }
}

fn unit_path(doc: &Document, file_index: usize, unit: &TransUnit) -> String {
    let file = match doc.files.get(file_index).and_then(|f| f.id.as_deref()) {
        Some(id) if !id.is_empty() => format!("xliff/file[id={}]", id),
        _ => format!("xliff/file[{}]", file_index),
    };
    match unit.unit_id {
        Some(ref unit_id) => format!("{}/unit[id={}]/segment[id={}]", file, unit_id, unit.id),
        None => format!("{}/unit[id={}]", file, unit.id),
    }
}

fn read_file(element: &XmlElement, ctx: &mut ParseContext<'_>) -> File {
    let preserve = ctx.preserve_whitespace();
    let mark = ctx.enter_scope(element);
    let mut file = File::new(
        attr(element, "original").unwrap_or_default(),
        String::new(),
        String::new(),
    );
    file.id = attr(element, "id");
    file.attributes = extra_attributes(element, FILE_ATTRIBUTES);

    let mut header = Header::default();
    for (index, child) in element.elements().enumerate() {
        match child.name.as_str() {
            "unit" | "group" => read_body_child(child, index, ctx, &mut file.body.items),
            "notes" => header.notes.extend(read_notes(child, preserve)),
            "skeleton" if header.skeleton.is_none() => header.skeleton = Some(child.to_xml()),
            _ => header.extensions.push(child.to_xml()),
        }
    }
    if header != Header::default() {
        file.header = Some(header);
    }
    ctx.leave_scope(mark);
    file
}

fn read_body_child(
    element: &XmlElement,
    index: usize,
    ctx: &mut ParseContext<'_>,
    items: &mut Vec<BodyItem>,
) {
    ctx.path.push(path_segment(element, index));
    match element.name.as_str() {
        "unit" => items.extend(read_unit(element, ctx).into_iter().map(BodyItem::Unit)),
        "group" => items.push(BodyItem::Group(read_group(element, ctx))),
        other => ctx.report_at(
            element,
            Diagnostic::warning(
                ErrorCategory::Compatibility,
                format!("Unsupported element <{}> in group was skipped", other),
            )
            .with_code("PARSE012"),
        ),
    }
    ctx.path.pop();
}

fn read_group(element: &XmlElement, ctx: &mut ParseContext<'_>) -> Group {
    let mut group = Group {
        id: attr(element, "id"),
        name: attr(element, "name"),
        restype: attr(element, "type"),
        translate: yes_no(element.attr("translate")),
        attributes: extra_attributes(element, GROUP_ATTRIBUTES),
        ..Default::default()
    };
    let mark = ctx.enter_scope(element);
    for (index, child) in element.elements().enumerate() {
        if child.name == "notes" {
            group
                .notes
                .extend(read_notes(child, ctx.preserve_whitespace()));
        } else {
            read_body_child(child, index, ctx, &mut group.items);
        }
    }
    ctx.leave_scope(mark);
    group
}

fn read_unit(element: &XmlElement, ctx: &mut ParseContext<'_>) -> Vec<TransUnit> {
    let preserve = ctx.preserve_whitespace();
    let unit_id = attr(element, "id").unwrap_or_default();
    let parts: Vec<&XmlElement> = element
        .elements()
        .filter(|e| e.name == "segment" || e.name == "ignorable")
        .collect();

    if parts.is_empty() {
        ctx.report_at(
            element,
            Diagnostic::new(
                ErrorType::MissingElement,
                ErrorCategory::Structural,
                Severity::Major,
                format!("Unit '{}' has no <segment>", unit_id),
            )
            .with_code("PARSE014")
            .with_element("segment"),
        );
        return Vec::new();
    }

    let multi = parts.len() > 1;
    let translate = yes_no(element.attr("translate"));
    let mut units = Vec::with_capacity(parts.len());

    for (n, part) in parts.into_iter().enumerate() {
        ctx.path.push(path_segment(part, n));
        let id = if multi {
            non_empty_attr(part, "id").unwrap_or_else(|| format!("{}-{}", unit_id, n + 1))
        } else {
            unit_id.clone()
        };

        let source = match child(part, "source") {
            Some(source) => read_content(source, &InlineKind::XLIFF20, CTYPE, preserve),
            None => {
                ctx.report_at(
                    part,
                    Diagnostic::new(
                        ErrorType::MissingElement,
                        ErrorCategory::Structural,
                        Severity::Major,
                        format!("Segment '{}' has no <source>", id),
                    )
                    .with_code("PARSE013")
                    .with_element("source"),
                );
                Default::default()
            }
        };

        let mut unit = TransUnit::new(id, source);
        if multi {
            unit.unit_id = Some(unit_id.clone());
        }
        unit.target =
            child(part, "target").map(|t| read_content(t, &InlineKind::XLIFF20, CTYPE, preserve));
        unit.state = attr(part, "state");
        unit.state_qualifier = attr(part, "subState");
        unit.ignorable = part.name == "ignorable";
        unit.translate = translate;
        units.push(unit);
        ctx.path.pop();
    }

    let mark = ctx.enter_scope(element);
    if let Some(first) = units.first_mut() {
        first.resname = attr(element, "name");
        first.restype = attr(element, "type");
        first.attributes = extra_attributes(element, UNIT_ATTRIBUTES);
        for child in element.elements() {
            match child.name.as_str() {
                "segment" | "ignorable" => {}
                "notes" => first.notes.extend(read_notes(child, preserve)),
                _ if is_candidates(ctx, child, "matches") => {
                    let inner = ctx.enter_scope(child);
                    let scope = &*ctx;
                    let found: Vec<AltTrans> = child
                        .elements()
                        .filter(|m| is_candidates(scope, m, "match"))
                        .map(|m| read_match(m, preserve))
                        .collect();
                    ctx.leave_scope(inner);
                    first.alt_trans.extend(found);
                }
                _ => first.extensions.push(child.to_xml()),
            }
        }
    }
    ctx.leave_scope(mark);
    units
}

/// Whether an element is `local` of the candidates module, whatever the prefix
fn is_candidates(ctx: &ParseContext<'_>, element: &XmlElement, local: &str) -> bool {
    element.local_name() == local && ctx.namespace_of(element) == Some(MATCHES_NAMESPACE)
}

fn read_notes(element: &XmlElement, preserve: bool) -> Vec<Note> {
    children(element, "note")
        .into_iter()
        .map(|note| Note {
            text: navigate::text(note, preserve),
            from: None,
            priority: note.attr("priority").and_then(|p| p.trim().parse().ok()),
            lang: attr(note, "xml:lang"),
            annotates: attr(note, "appliesTo"),
            category: attr(note, "category"),
        })
        .collect()
}

fn read_match(element: &XmlElement, preserve: bool) -> AltTrans {
    let read = |name: &str| {
        child(element, name).map(|e| read_content(e, &InlineKind::XLIFF20, CTYPE, preserve))
    };
    AltTrans {
        match_quality: attr(element, "matchQuality"),
        tool_id: None,
        origin: attr(element, "origin"),
        alt_type: attr(element, "type"),
        source: read("source"),
        target: read("target").unwrap_or_default(),
        attributes: extra_attributes(element, MATCH_ATTRIBUTES),
    }
}

/// Prefix for the candidates module on output, and whether the root still
/// has to declare it
///
/// A binding the document already carries is reused; otherwise the first
/// free name of `mtc`, `mtc1`, ... is taken.
fn matches_prefix(document: &Document) -> (String, bool) {
    let bound = document.attributes.iter().find_map(|(key, value)| {
        key.strip_prefix("xmlns:")
            .filter(|_| value == MATCHES_NAMESPACE)
    });
    if let Some(prefix) = bound {
        return (prefix.to_string(), false);
    }
    let mut prefix = "mtc".to_string();
    let mut n = 1;
    while document.attributes.contains_key(&format!("xmlns:{}", prefix)) {
        prefix = format!("mtc{}", n);
        n += 1;
    }
    (prefix, true)
}

fn write_file(writer: &mut XmlWriter, file: &File, index: usize, mtc: &str) {
    let fallback_id = format!("f{}", index + 1);
    let mut attrs: Vec<(&str, &str)> = vec![("id", file.id.as_deref().unwrap_or(&fallback_id))];
    if !file.original.is_empty() {
        attrs.push(("original", &file.original));
    }
    attrs.extend(borrowed(&file.attributes));
    writer.open("file", attrs);

    if let Some(ref header) = file.header {
        if let Some(ref skeleton) = header.skeleton {
            writer.raw(skeleton);
        }
        for extension in &header.extensions {
            writer.raw(extension);
        }
        write_notes(writer, &header.notes);
    }
    write_items(writer, &file.body.items, mtc);
    writer.close("file");
}

fn write_items(writer: &mut XmlWriter, items: &[BodyItem], mtc: &str) {
    let mut index = 0;
    while index < items.len() {
        match &items[index] {
            BodyItem::Unit(unit) => {
                let mut end = index + 1;
                if let Some(ref unit_id) = unit.unit_id {
                    while let Some(BodyItem::Unit(next)) = items.get(end) {
                        if next.unit_id.as_ref() != Some(unit_id) {
                            break;
                        }
                        end += 1;
                    }
                }
                let parts: Vec<&TransUnit> = items[index..end]
                    .iter()
                    .filter_map(|item| match item {
                        BodyItem::Unit(unit) => Some(unit),
                        _ => None,
                    })
                    .collect();
                write_unit(writer, &parts, mtc);
                index = end;
            }
            BodyItem::Group(group) => {
                write_group(writer, group, mtc);
                index += 1;
            }
            BodyItem::Binary(binary) => {
                tracing::debug!(id = %binary.id, "binary unit has no 2.0 form, skipped");
                index += 1;
            }
        }
    }
}

fn write_group(writer: &mut XmlWriter, group: &Group, mtc: &str) {
    let mut attrs: Vec<(&str, &str)> = Vec::new();
    for (key, value) in [
        ("id", &group.id),
        ("name", &group.name),
        ("type", &group.restype),
    ] {
        if let Some(value) = value {
            attrs.push((key, value));
        }
    }
    if let Some(translate) = group.translate {
        attrs.push(("translate", yes_no_str(translate)));
    }
    attrs.extend(borrowed(&group.attributes));
    writer.open("group", attrs);
    write_notes(writer, &group.notes);
    write_items(writer, &group.items, mtc);
    writer.close("group");
}

/// Write one `<unit>` from its parts; `parts` is never empty
///
/// `mtc` is the prefix bound to the candidates module on the root.
fn write_unit(writer: &mut XmlWriter, parts: &[&TransUnit], mtc: &str) {
    let Some(first) = parts.first() else {
        return;
    };
    let multi = parts.len() > 1;

    let mut attrs: Vec<(&str, &str)> =
        vec![("id", first.unit_id.as_deref().unwrap_or(&first.id))];
    if let Some(ref name) = first.resname {
        attrs.push(("name", name));
    }
    if let Some(ref restype) = first.restype {
        attrs.push(("type", restype));
    }
    if let Some(translate) = first.translate {
        attrs.push(("translate", yes_no_str(translate)));
    }
    attrs.extend(borrowed(&first.attributes));
    writer.open("unit", attrs);

    let matches: Vec<&AltTrans> = parts.iter().flat_map(|p| &p.alt_trans).collect();
    if !matches.is_empty() {
        let name = format!("{}:matches", mtc);
        writer.open(&name, []);
        for alt in matches {
            write_match(writer, alt, mtc);
        }
        writer.close(&name);
    }
    let notes: Vec<Note> = parts.iter().flat_map(|p| p.notes.iter().cloned()).collect();
    write_notes(writer, &notes);
    for extension in parts.iter().flat_map(|p| &p.extensions) {
        writer.raw(extension);
    }

    let space = |preserve: bool| preserve.then_some(("xml:space", "preserve"));
    for part in parts {
        let mut attrs: Vec<(&str, &str)> = Vec::new();
        if multi {
            attrs.push(("id", &part.id));
        }
        let tag = if part.ignorable {
            "ignorable"
        } else {
            if let Some(ref state) = part.state {
                attrs.push(("state", state));
            }
            if let Some(ref sub_state) = part.state_qualifier {
                attrs.push(("subState", sub_state));
            }
            "segment"
        };
        writer.open(tag, attrs);
        writer.content_element(
            "source",
            space(needs_preserve(&part.source)),
            &part.source.parts,
            CTYPE,
        );
        if let Some(ref target) = part.target {
            writer.content_element("target", space(needs_preserve(target)), &target.parts, CTYPE);
        }
        writer.close(tag);
    }
    writer.close("unit");
}

fn write_notes(writer: &mut XmlWriter, notes: &[Note]) {
    if notes.is_empty() {
        return;
    }
    writer.open("notes", []);
    for note in notes {
        let priority = note.priority.map(|p| p.to_string());
        let mut attrs: Vec<(&str, &str)> = Vec::new();
        if let Some(ref category) = note.category {
            attrs.push(("category", category));
        }
        if let Some(ref priority) = priority {
            attrs.push(("priority", priority));
        }
        if let Some(ref applies_to) = note.annotates {
            attrs.push(("appliesTo", applies_to));
        }
        if let Some(ref lang) = note.lang {
            attrs.push(("xml:lang", lang));
        }
        writer.text_element("note", attrs, &note.text);
    }
    writer.close("notes");
}

fn write_match(writer: &mut XmlWriter, alt: &AltTrans, mtc: &str) {
    let mut attrs: Vec<(&str, &str)> = Vec::new();
    for (key, value) in [
        ("matchQuality", &alt.match_quality),
        ("origin", &alt.origin),
        ("type", &alt.alt_type),
    ] {
        if let Some(value) = value {
            attrs.push((key, value));
        }
    }
    attrs.extend(borrowed(&alt.attributes));
    let name = format!("{}:match", mtc);
    writer.open(&name, attrs);
    if let Some(ref source) = alt.source {
        writer.content_element("source", [], &source.parts, CTYPE);
    }
    writer.content_element("target", [], &alt.target.parts, CTYPE);
    writer.close(&name);
}
