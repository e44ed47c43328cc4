//! Reading, writing and checking the XLIFF 1.2 tree shape
//!
//! Shared by the 1.2 and MQXLIFF parsers. Vendor attributes stay in the
//! entities' attribute maps and vendor elements in their extensions, so
//! both dialects round-trip through the same code.

use xliffkit_ast::{
    AltTrans, BinaryUnit, BodyItem, Dialect, Document, File, Group, Header, InlineKind, Note,
    TransUnit,
};

use crate::diagnostics::{Diagnostic, ErrorCategory, ErrorType, Severity};
use crate::dialects::{borrowed, foreign_inline_kinds, needs_preserve, read_content, units_with_file};
use crate::error::Result;
use crate::navigate::{self, attr, child, children, extra_attributes, path_segment, yes_no, yes_no_str};
use crate::parser::ParseContext;
use crate::states::{check_state, StatePolicy};
use crate::tree::{XmlElement, XmlNode};
use crate::writer::XmlWriter;

const FILE_ATTRIBUTES: &[&str] = &[
    "original",
    "source-language",
    "target-language",
    "datatype",
    "tool-id",
    "product-name",
    "product-version",
    "build-num",
];
const GROUP_ATTRIBUTES: &[&str] = &["id", "resname", "datatype", "restype", "translate"];
const UNIT_ATTRIBUTES: &[&str] = &["id", "approved", "translate", "resname", "restype"];
const ALT_ATTRIBUTES: &[&str] = &["match-quality", "tool-id", "origin", "alttranstype"];

const CTYPE: &str = "ctype";

/// Translate a `<xliff>` tree of the 1.2 shape
pub(crate) fn read_document(
    dialect: Dialect,
    root: &XmlElement,
    ctx: &mut ParseContext<'_>,
) -> Document {
    let mut doc = Document::new(dialect);
    doc.attributes = navigate::attributes(root);
    if let Some(version) = root.attr("version") {
        doc.version = version.to_string();
    }

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
        return doc;
    }

    for (index, element) in files.into_iter().enumerate() {
        ctx.path.push(path_segment(element, index));
        doc.files.push(read_file(dialect, element, ctx));
        ctx.path.pop();
    }
    doc
}

fn read_file(dialect: Dialect, element: &XmlElement, ctx: &mut ParseContext<'_>) -> File {
    let get = |name: &str| attr(element, name).unwrap_or_default();
    let mut file = File::new(get("original"), get("source-language"), get("datatype"));
    file.target_language = attr(element, "target-language");
    file.tool_id = attr(element, "tool-id");
    file.product_name = attr(element, "product-name");
    file.product_version = attr(element, "product-version");
    file.build_num = attr(element, "build-num");
    file.attributes = extra_attributes(element, FILE_ATTRIBUTES);

    if let Some(header) = child(element, "header") {
        file.header = Some(read_header(header, ctx));
    }

    match child(element, "body") {
        Some(body) => {
            ctx.path.push("body");
            file.body.items = read_items(dialect, body, ctx);
            ctx.path.pop();
        }
        None => ctx.report_at(
            element,
            Diagnostic::new(
                ErrorType::MissingElement,
                ErrorCategory::Structural,
                Severity::Major,
                "File has no <body> element",
            )
            .with_code("PARSE011")
            .with_element("body"),
        ),
    }
    file
}

fn read_header(element: &XmlElement, ctx: &ParseContext<'_>) -> Header {
    let mut header = Header::default();
    for child in element.elements() {
        match child.name.as_str() {
            "note" => header.notes.push(read_note(child, ctx)),
            "prop-group" => {
                for prop in children(child, "prop") {
                    if let Some(key) = prop.attr("prop-type") {
                        header
                            .properties
                            .insert(key.to_string(), navigate::text(prop, false));
                    }
                }
            }
            "skl" if header.skeleton.is_none() => header.skeleton = Some(child.to_xml()),
            "tool" if header.tool.is_none() => header.tool = Some(child.to_xml()),
            "phase-group" if header.phase_group.is_none() => {
                header.phase_group = Some(child.to_xml())
            }
            _ => header.extensions.push(child.to_xml()),
        }
    }
    header
}

fn read_items(dialect: Dialect, element: &XmlElement, ctx: &mut ParseContext<'_>) -> Vec<BodyItem> {
    let mut items = Vec::new();
    for (index, child) in element.elements().enumerate() {
        ctx.path.push(path_segment(child, index));
        match child.name.as_str() {
            "trans-unit" => items.push(BodyItem::Unit(read_unit(child, ctx))),
            "group" => items.push(BodyItem::Group(read_group(dialect, child, ctx))),
            "bin-unit" => items.push(BodyItem::Binary(BinaryUnit {
                id: attr(child, "id").unwrap_or_default(),
                mime_type: attr(child, "mime-type"),
                raw: child.to_xml(),
            })),
            other => ctx.report_at(
                child,
                Diagnostic::warning(
                    ErrorCategory::Compatibility,
                    format!("Unsupported element <{}> in body was skipped", other),
                )
                .with_code("PARSE012"),
            ),
        }
        ctx.path.pop();
    }
    items
}

fn read_group(dialect: Dialect, element: &XmlElement, ctx: &mut ParseContext<'_>) -> Group {
    let mut group = Group {
        id: attr(element, "id"),
        name: attr(element, "resname"),
        datatype: attr(element, "datatype"),
        restype: attr(element, "restype"),
        translate: yes_no(element.attr("translate")),
        attributes: extra_attributes(element, GROUP_ATTRIBUTES),
        ..Default::default()
    };
    group.notes = children(element, "note")
        .into_iter()
        .map(|n| read_note(n, ctx))
        .collect();

    // Notes are read above; everything else is body content
    let mut content = element.clone();
    content
        .children
        .retain(|node| !matches!(node, XmlNode::Element(e) if e.name == "note"));
    group.items = read_items(dialect, &content, ctx);
    group
}

fn read_unit(element: &XmlElement, ctx: &mut ParseContext<'_>) -> TransUnit {
    let preserve = ctx.preserve_whitespace();
    let id = attr(element, "id").unwrap_or_default();

    let source = match child(element, "source") {
        Some(source) => read_content(source, &InlineKind::XLIFF12, CTYPE, preserve),
        None => {
            ctx.report_at(
                element,
                Diagnostic::new(
                    ErrorType::MissingElement,
                    ErrorCategory::Structural,
                    Severity::Major,
                    format!("Translation unit '{}' has no <source>", id),
                )
                .with_code("PARSE013")
                .with_element("source"),
            );
            Default::default()
        }
    };

    let mut unit = TransUnit::new(id, source);
    if let Some(target) = child(element, "target") {
        // A childless <target/> only carries the state of an untranslated unit
        if !target.children.is_empty() {
            unit.target = Some(read_content(target, &InlineKind::XLIFF12, CTYPE, preserve));
        }
        unit.state = attr(target, "state");
        unit.state_qualifier = attr(target, "state-qualifier");
    }
    unit.approved = yes_no(element.attr("approved"));
    unit.translate = yes_no(element.attr("translate"));
    unit.resname = attr(element, "resname");
    unit.restype = attr(element, "restype");
    unit.attributes = extra_attributes(element, UNIT_ATTRIBUTES);

    for child in element.elements() {
        match child.name.as_str() {
            "source" | "target" => {}
            "note" => unit.notes.push(read_note(child, ctx)),
            "alt-trans" => unit.alt_trans.push(read_alt_trans(child, preserve)),
            _ => unit.extensions.push(child.to_xml()),
        }
    }
    unit
}

fn read_note(element: &XmlElement, ctx: &ParseContext<'_>) -> Note {
    Note {
        text: navigate::text(element, ctx.preserve_whitespace()),
        from: attr(element, "from"),
        priority: element.attr("priority").and_then(|p| p.trim().parse().ok()),
        lang: attr(element, "xml:lang"),
        annotates: attr(element, "annotates"),
        category: attr(element, "category"),
    }
}

fn read_alt_trans(element: &XmlElement, preserve: bool) -> AltTrans {
    let read = |name: &str| {
        child(element, name).map(|e| read_content(e, &InlineKind::XLIFF12, CTYPE, preserve))
    };
    AltTrans {
        match_quality: attr(element, "match-quality"),
        tool_id: attr(element, "tool-id"),
        origin: attr(element, "origin"),
        alt_type: attr(element, "alttranstype"),
        source: read("source"),
        target: read("target").unwrap_or_default(),
        attributes: extra_attributes(element, ALT_ATTRIBUTES),
    }
}

/// Write a document in the 1.2 shape
///
/// `required_namespaces` are declared on the root when the document does
/// not already declare them.
pub(crate) fn write_document(
    doc: &Document,
    dialect: Dialect,
    required_namespaces: &[(&str, &str)],
) -> Result<String> {
    let mut writer = XmlWriter::new();

    let mut root: Vec<(&str, &str)> = vec![
        ("version", dialect.version_attribute()),
        ("xmlns", dialect.namespace()),
    ];
    for &(key, value) in required_namespaces {
        if !doc.attributes.contains_key(key) {
            root.push((key, value));
        }
    }
    root.extend(borrowed(&doc.attributes).filter(|(k, _)| *k != "version" && *k != "xmlns"));
    writer.open("xliff", root);

    for file in &doc.files {
        write_file(&mut writer, file);
    }

    writer.close("xliff");
    Ok(writer.finish())
}

fn write_file(writer: &mut XmlWriter, file: &File) {
    let mut attrs: Vec<(&str, &str)> = vec![
        ("original", file.original.as_str()),
        ("source-language", file.source_language.as_str()),
    ];
    if let Some(ref lang) = file.target_language {
        attrs.push(("target-language", lang));
    }
    attrs.push(("datatype", file.datatype.as_str()));
    for (key, value) in [
        ("tool-id", &file.tool_id),
        ("product-name", &file.product_name),
        ("product-version", &file.product_version),
        ("build-num", &file.build_num),
    ] {
        if let Some(value) = value {
            attrs.push((key, value));
        }
    }
    attrs.extend(borrowed(&file.attributes));
    writer.open("file", attrs);

    if let Some(ref header) = file.header {
        write_header(writer, header);
    }

    writer.open("body", []);
    write_items(writer, &file.body.items);
    writer.close("body");
    writer.close("file");
}

fn write_header(writer: &mut XmlWriter, header: &Header) {
    writer.open("header", []);
    if let Some(ref skeleton) = header.skeleton {
        writer.raw(skeleton);
    }
    if let Some(ref phase_group) = header.phase_group {
        writer.raw(phase_group);
    }
    if let Some(ref tool) = header.tool {
        writer.raw(tool);
    }
    if !header.properties.is_empty() {
        writer.open("prop-group", []);
        for (key, value) in &header.properties {
            writer.text_element("prop", [("prop-type", key.as_str())], value);
        }
        writer.close("prop-group");
    }
    for note in &header.notes {
        write_note(writer, note);
    }
    for extension in &header.extensions {
        writer.raw(extension);
    }
    writer.close("header");
}

fn write_items(writer: &mut XmlWriter, items: &[BodyItem]) {
    for item in items {
        match item {
            BodyItem::Unit(unit) => write_unit(writer, unit),
            BodyItem::Group(group) => write_group(writer, group),
            BodyItem::Binary(binary) => writer.raw(&binary.raw),
        }
    }
}

fn write_group(writer: &mut XmlWriter, group: &Group) {
    let mut attrs: Vec<(&str, &str)> = Vec::new();
    for (key, value) in [
        ("id", &group.id),
        ("resname", &group.name),
        ("datatype", &group.datatype),
        ("restype", &group.restype),
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
    for note in &group.notes {
        write_note(writer, note);
    }
    write_items(writer, &group.items);
    writer.close("group");
}

fn write_unit(writer: &mut XmlWriter, unit: &TransUnit) {
    let mut attrs: Vec<(&str, &str)> = vec![("id", unit.id.as_str())];
    if let Some(approved) = unit.approved {
        attrs.push(("approved", yes_no_str(approved)));
    }
    if let Some(translate) = unit.translate {
        attrs.push(("translate", yes_no_str(translate)));
    }
    if let Some(ref resname) = unit.resname {
        attrs.push(("resname", resname));
    }
    if let Some(ref restype) = unit.restype {
        attrs.push(("restype", restype));
    }
    attrs.extend(borrowed(&unit.attributes));
    writer.open("trans-unit", attrs);

    let space = |preserve: bool| preserve.then_some(("xml:space", "preserve"));
    writer.content_element(
        "source",
        space(needs_preserve(&unit.source)),
        &unit.source.parts,
        CTYPE,
    );
    let mut target_attrs: Vec<(&str, &str)> = Vec::new();
    if let Some(ref state) = unit.state {
        target_attrs.push(("state", state));
    }
    if let Some(ref qualifier) = unit.state_qualifier {
        target_attrs.push(("state-qualifier", qualifier));
    }
    match unit.target {
        Some(ref target) => {
            target_attrs.extend(space(needs_preserve(target)));
            writer.content_element("target", target_attrs, &target.parts, CTYPE);
        }
        None if !target_attrs.is_empty() => writer.empty("target", target_attrs),
        None => {}
    }
    for note in &unit.notes {
        write_note(writer, note);
    }
    for alt in &unit.alt_trans {
        write_alt_trans(writer, alt);
    }
    for extension in &unit.extensions {
        writer.raw(extension);
    }
    writer.close("trans-unit");
}

fn write_note(writer: &mut XmlWriter, note: &Note) {
    let priority = note.priority.map(|p| p.to_string());
    let mut attrs: Vec<(&str, &str)> = Vec::new();
    if let Some(ref lang) = note.lang {
        attrs.push(("xml:lang", lang));
    }
    if let Some(ref from) = note.from {
        attrs.push(("from", from));
    }
    if let Some(ref priority) = priority {
        attrs.push(("priority", priority));
    }
    if let Some(ref annotates) = note.annotates {
        attrs.push(("annotates", annotates));
    }
    writer.text_element("note", attrs, &note.text);
}

fn write_alt_trans(writer: &mut XmlWriter, alt: &AltTrans) {
    let mut attrs: Vec<(&str, &str)> = Vec::new();
    for (key, value) in [
        ("match-quality", &alt.match_quality),
        ("tool-id", &alt.tool_id),
        ("origin", &alt.origin),
        ("alttranstype", &alt.alt_type),
    ] {
        if let Some(value) = value {
            attrs.push((key, value));
        }
    }
    attrs.extend(borrowed(&alt.attributes));
    writer.open("alt-trans", attrs);
    if let Some(ref source) = alt.source {
        writer.content_element("source", [], &source.parts, CTYPE);
    }
    writer.content_element("target", [], &alt.target.parts, CTYPE);
    writer.close("alt-trans");
}

/// Checks shared by 1.2 and MQXLIFF
///
/// Codes are `{prefix}001` for the version, `{prefix}002` for states,
/// `{prefix}003` for foreign inline markup, `{prefix}004` for match
/// quality and `{prefix}005` for a missing target language.
pub(crate) fn check_common(
    doc: &Document,
    dialect: Dialect,
    policy: StatePolicy,
    prefix: &str,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if doc.version != "1.2" {
        diagnostics.push(
            Diagnostic::new(
                ErrorType::SchemaViolation,
                ErrorCategory::Schema,
                Severity::Major,
                format!("Expected version 1.2, found \"{}\"", doc.version),
            )
            .with_code(format!("{}001", prefix))
            .with_path("xliff")
            .with_element("xliff")
            .with_attribute("version"),
        );
    }

    for (file_index, unit) in units_with_file(doc) {
        let path = format!("xliff/file[{}]/body/trans-unit[id={}]", file_index, unit.id);

        if let Some(ref state) = unit.state {
            if let Some(diag) = check_state(dialect, state, policy, &format!("{}002", prefix)) {
                diagnostics.push(diag.with_path(path.clone()).with_element("target"));
            }
        }

        for kind in foreign_inline_kinds(unit, dialect) {
            diagnostics.push(
                Diagnostic::new(
                    ErrorType::SchemaViolation,
                    ErrorCategory::Schema,
                    Severity::Minor,
                    format!("Inline element <{}> is not part of {}", kind.tag(), dialect),
                )
                .with_code(format!("{}003", prefix))
                .with_path(path.clone())
                .with_element(kind.tag())
                .with_recoverable(false),
            );
        }

        for alt in &unit.alt_trans {
            if let Some(ref quality) = alt.match_quality {
                if quality.trim().trim_end_matches('%').parse::<f64>().is_err() {
                    diagnostics.push(
                        Diagnostic::warning(
                            ErrorCategory::Content,
                            format!("Match quality \"{}\" is not a number", quality),
                        )
                        .with_code(format!("{}004", prefix))
                        .with_path(path.clone())
                        .with_element("alt-trans")
                        .with_attribute("match-quality"),
                    );
                }
            }
        }
    }

    for (index, file) in doc.files.iter().enumerate() {
        let has_targets = file.all_trans_units().iter().any(|u| u.has_target());
        if has_targets && file.target_language.is_none() {
            diagnostics.push(
                Diagnostic::warning(
                    ErrorCategory::Schema,
                    "File has translations but declares no target-language",
                )
                .with_code(format!("{}005", prefix))
                .with_path(format!("xliff/file[{}]", index))
                .with_element("file")
                .with_attribute("target-language"),
            );
        }
    }

    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParseOptions;
    use crate::tree::parse_xml;

    const SAMPLE: &str = r#"<xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2">
  <file original="t.txt" source-language="en" target-language="de" datatype="plaintext" tool-id="x">
    <header>
      <skl><external-file href="t.skl"/></skl>
      <prop-group><prop prop-type="client">ACME</prop></prop-group>
      <note from="pm">Deadline Friday</note>
    </header>
    <body>
      <group id="g1" resname="menu">
        <note>Menu strings</note>
        <trans-unit id="1" resname="open" approved="yes">
          <source>Open <g id="a" ctype="bold">file</g></source>
          <target state="final">Datei <g id="a" ctype="bold">öffnen</g></target>
          <alt-trans match-quality="85" origin="tm"><target>Öffnen</target></alt-trans>
          <context-group><context context-type="x">y</context></context-group>
        </trans-unit>
      </group>
      <bin-unit id="b1" mime-type="image/png"><bin-source/></bin-unit>
      <trans-unit id="2"><source>Close</source></trans-unit>
    </body>
  </file>
</xliff>"#;

    fn read(text: &str) -> (Document, Vec<Diagnostic>) {
        let options = ParseOptions::default();
        let mut ctx = ParseContext::new(text, &options);
        let root = parse_xml(text).unwrap();
        let doc = read_document(Dialect::Xliff12, &root, &mut ctx);
        (doc, ctx.diagnostics().to_vec())
    }

    #[test]
    fn test_read_full_file() {
        let (doc, diags) = read(SAMPLE);
        assert!(diags.is_empty(), "{:?}", diags);
        let file = &doc.files[0];
        assert_eq!(file.target_language.as_deref(), Some("de"));
        assert_eq!(file.tool_id.as_deref(), Some("x"));

        let header = file.header.as_ref().unwrap();
        assert_eq!(header.properties.get("client").map(String::as_str), Some("ACME"));
        assert_eq!(header.notes[0].from.as_deref(), Some("pm"));
        assert!(header.skeleton.as_deref().unwrap().starts_with("<skl>"));

        assert_eq!(file.body.items.len(), 3);
        let units = doc.all_trans_units();
        assert_eq!(units.len(), 2);
        let first = units[0];
        assert_eq!(first.source_text(), "Open file");
        assert_eq!(first.target_text().as_deref(), Some("Datei öffnen"));
        assert_eq!(first.state.as_deref(), Some("final"));
        assert_eq!(first.approved, Some(true));
        assert_eq!(first.alt_trans[0].match_quality.as_deref(), Some("85"));
        assert_eq!(first.extensions.len(), 1);
        match &file.body.items[0] {
            BodyItem::Group(group) => {
                assert_eq!(group.name.as_deref(), Some("menu"));
                assert_eq!(group.notes.len(), 1);
                assert_eq!(group.items.len(), 1);
            }
            other => panic!("expected group, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_critical() {
        let (doc, diags) = read(r#"<xliff version="1.2"></xliff>"#);
        assert!(doc.files.is_empty());
        assert_eq!(diags[0].code, "PARSE010");
        assert_eq!(diags[0].severity, Severity::Critical);
        assert!(diags[0].recoverable);
    }

    #[test]
    fn test_missing_body_and_source() {
        let (_, diags) = read(
            r#"<xliff version="1.2"><file original="a" source-language="en" datatype="x"></file>
               <file original="b" source-language="en" datatype="x"><body><trans-unit id="1"/></body></file></xliff>"#,
        );
        let codes: Vec<_> = diags.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, vec!["PARSE011", "PARSE013"]);
        assert_eq!(diags[0].location.line, Some(1));
        assert_eq!(
            diags[1].location.path.as_deref(),
            Some("xliff/file[1]/body/trans-unit[id=1]")
        );
    }

    #[test]
    fn test_write_then_read_keeps_structure() {
        let (doc, _) = read(SAMPLE);
        let xml = write_document(&doc, Dialect::Xliff12, &[]).unwrap();
        let (again, diags) = read(&xml);
        assert!(diags.is_empty(), "{:?}", diags);
        assert_eq!(again.files[0].header, doc.files[0].header);
        assert_eq!(again.files[0].body, doc.files[0].body);
    }

    #[test]
    fn test_check_common_states_and_version() {
        let (mut doc, _) = read(SAMPLE);
        doc.version = "1.1".to_string();
        if let BodyItem::Unit(unit) = &mut doc.files[0].body.items[2] {
            unit.target = Some("Schließen".into());
            unit.state = Some("done".to_string());
        }
        let diags = check_common(&doc, Dialect::Xliff12, StatePolicy::Strict, "V12");
        let codes: Vec<_> = diags.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, vec!["V12001", "V12002"]);
        assert_eq!(diags[1].severity, Severity::Major);
    }
}
