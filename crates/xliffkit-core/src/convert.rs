//! Conversion between dialects
//!
//! Converting keeps the translatable content (units, sources, targets,
//! notes, groups and matches) and drops what has no counterpart in the
//! target dialect. Inline markup is mapped element by element, and states
//! go through [`map_state`].
//!
//! MQXLIFF sources are normalized to plain 1.2 first, so vendor data never
//! leaks into another dialect.

use std::collections::BTreeMap;

use xliffkit_ast::{
    AltTrans, BodyItem, Content, ContentPart, Dialect, Document, Group, InlineElement, InlineKind,
    TransUnit,
};

use crate::dialects::{for_each_group_mut, for_each_unit_mut, MqXliffParser};
use crate::parser::XliffParser;
use crate::states::map_state;

/// Convert a document to another dialect
///
/// The input is left untouched. Converting to the document's own dialect
/// returns a copy.
pub fn convert_document(doc: &Document, to: Dialect) -> Document {
    if doc.dialect == to {
        return doc.clone();
    }
    tracing::debug!(from = %doc.dialect, to = %to, "converting document");

    let base = match doc.dialect {
        Dialect::MqXliff => MqXliffParser::new().normalize_document(doc),
        _ => doc.clone(),
    };

    match (base.dialect, to) {
        (Dialect::Xliff20, Dialect::Xliff12) => to_1_2(base),
        (Dialect::Xliff20, Dialect::MqXliff) => {
            let mut converted = to_1_2(base);
            converted.dialect = Dialect::MqXliff;
            converted
        }
        (_, Dialect::Xliff20) => to_2_0(base, doc.dialect),
        (_, Dialect::MqXliff) => {
            let mut converted = base;
            converted.dialect = Dialect::MqXliff;
            converted
        }
        _ => base,
    }
}

fn to_2_0(mut doc: Document, from: Dialect) -> Document {
    doc.dialect = Dialect::Xliff20;
    doc.version = "2.0".to_string();

    let mut root = BTreeMap::new();
    if let Some(first) = doc.files.first() {
        root.insert("srcLang".to_string(), first.source_language.clone());
        if let Some(ref trg) = first.target_language {
            root.insert("trgLang".to_string(), trg.clone());
        }
    }
    doc.attributes = root;

    for (index, file) in doc.files.iter_mut().enumerate() {
        if file.id.as_deref().map_or(true, str::is_empty) {
            file.id = Some(format!("f{}", index + 1));
        }
        file.datatype.clear();
        file.tool_id = None;
        file.product_name = None;
        file.product_version = None;
        file.build_num = None;
        file.attributes.clear();
        if let Some(ref mut header) = file.header {
            header.properties.clear();
            header.skeleton = None;
            header.tool = None;
            header.phase_group = None;
            header.extensions.clear();
        }

        remove_binaries(&mut file.body.items);
        for_each_group_mut(&mut file.body.items, &mut |group: &mut Group| {
            group.datatype = None;
            group.restype = None;
            group.attributes.clear();
        });
        for_each_unit_mut(&mut file.body.items, &mut |unit: &mut TransUnit| {
            unit.state = unit
                .state
                .as_deref()
                .map(|s| map_state(from, Dialect::Xliff20, s));
            unit.state_qualifier = None;
            unit.approved = None;
            unit.restype = None;
            unit.attributes.clear();
            unit.extensions.clear();
            convert_unit_content(unit, Dialect::Xliff20);
        });
    }
    doc
}

fn to_1_2(mut doc: Document) -> Document {
    doc.dialect = Dialect::Xliff12;
    doc.version = "1.2".to_string();
    doc.attributes.clear();

    for file in &mut doc.files {
        if file.datatype.trim().is_empty() {
            file.datatype = "plaintext".to_string();
        }
        if file.original.trim().is_empty() {
            file.original = file
                .id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| "unknown".to_string());
        }
        file.id = None;
        file.attributes.clear();
        if let Some(ref mut header) = file.header {
            header.skeleton = None;
            header.extensions.clear();
        }

        for_each_group_mut(&mut file.body.items, &mut |group: &mut Group| {
            group.restype = None;
            group.attributes.clear();
        });
        for_each_unit_mut(&mut file.body.items, &mut |unit: &mut TransUnit| {
            if let Some(unit_id) = unit.unit_id.take() {
                unit.id = format!("{}_{}", unit_id, unit.id);
            }
            if unit.ignorable {
                unit.ignorable = false;
                unit.translate = Some(false);
            }
            unit.state = unit
                .state
                .as_deref()
                .map(|s| map_state(Dialect::Xliff20, Dialect::Xliff12, s));
            unit.state_qualifier = None;
            unit.restype = None;
            unit.attributes.clear();
            unit.extensions.clear();
            convert_unit_content(unit, Dialect::Xliff12);
        });
    }
    doc
}

fn remove_binaries(items: &mut Vec<BodyItem>) {
    items.retain(|item| !matches!(item, BodyItem::Binary(_)));
    for item in items {
        if let BodyItem::Group(group) = item {
            remove_binaries(&mut group.items);
        }
    }
}

fn convert_unit_content(unit: &mut TransUnit, to: Dialect) {
    unit.source = convert_content(&unit.source, to);
    unit.target = unit.target.as_ref().map(|t| convert_content(t, to));
    for alt in &mut unit.alt_trans {
        convert_alt(alt, to);
    }
}

fn convert_alt(alt: &mut AltTrans, to: Dialect) {
    alt.source = alt.source.as_ref().map(|s| convert_content(s, to));
    alt.target = convert_content(&alt.target, to);
    alt.tool_id = None;
    alt.alt_type = None;
    alt.attributes.clear();
    if to == Dialect::Xliff20 {
        // Match quality is a bare number in 2.0
        alt.match_quality = alt
            .match_quality
            .as_deref()
            .map(|q| q.trim().trim_end_matches('%').to_string());
    }
}

/// Map inline markup of content to another dialect
pub fn convert_content(content: &Content, to: Dialect) -> Content {
    let mut out = Content::new();
    for part in convert_parts(&content.parts, to) {
        match part {
            ContentPart::Text(text) => out.push_text(&text),
            ContentPart::Inline(element) => out.push_inline(element),
        }
    }
    out
}

fn convert_parts(parts: &[ContentPart], to: Dialect) -> Vec<ContentPart> {
    let mut out = Vec::with_capacity(parts.len());
    for part in parts {
        match part {
            ContentPart::Text(text) => out.push(ContentPart::Text(text.clone())),
            ContentPart::Inline(element) if to == Dialect::Xliff20 => {
                out.push(ContentPart::Inline(inline_to_2_0(element)))
            }
            ContentPart::Inline(element) => out.push(inline_to_1_2(element)),
        }
    }
    out
}

fn inline_to_2_0(element: &InlineElement) -> InlineElement {
    let start_ref = element
        .attributes
        .get("rid")
        .cloned()
        .or_else(|| element.id.clone());

    let mut out = match element.kind {
        InlineKind::G => {
            let mut pc = InlineElement::new(InlineKind::Pc);
            pc.content = convert_parts(&element.content, Dialect::Xliff20);
            if let Some(ref ctype) = element.ctype {
                let (kind, sub_type) = ctype_to_type(ctype);
                pc.ctype = Some(kind.to_string());
                if let Some(sub_type) = sub_type {
                    pc.attributes.insert("subType".to_string(), sub_type.to_string());
                }
            }
            pc.id = element.id.clone();
            return pc;
        }
        InlineKind::X | InlineKind::Ph | InlineKind::It => InlineElement::new(InlineKind::Ph),
        InlineKind::Bx | InlineKind::Bpt => {
            let mut sc = InlineElement::new(InlineKind::Sc);
            sc.id = start_ref;
            return sc;
        }
        InlineKind::Ex | InlineKind::Ept => {
            let mut ec = InlineElement::new(InlineKind::Ec);
            if let Some(start_ref) = start_ref {
                ec.attributes.insert("startRef".to_string(), start_ref);
            }
            return ec;
        }
        InlineKind::Mrk | InlineKind::Sub => {
            let mut mrk = InlineElement::new(InlineKind::Mrk);
            mrk.content = convert_parts(&element.content, Dialect::Xliff20);
            let mtype = element.attributes.get("mtype").map(String::as_str);
            mrk.ctype = Some(
                match mtype {
                    Some("term") => "term",
                    _ => "generic",
                }
                .to_string(),
            );
            mrk
        }
        // Already 2.0 markup
        _ => return element.clone(),
    };
    out.id = element.id.clone();
    out
}

fn inline_to_1_2(element: &InlineElement) -> ContentPart {
    let converted = match element.kind {
        InlineKind::Pc => {
            let mut g = InlineElement::new(InlineKind::G);
            g.id = element.id.clone();
            g.ctype = element.ctype.as_deref().map(|kind| {
                type_to_ctype(kind, element.attributes.get("subType").map(String::as_str))
            });
            g.content = convert_parts(&element.content, Dialect::Xliff12);
            g
        }
        InlineKind::Ph => {
            let mut x = InlineElement::new(InlineKind::X);
            x.id = element.id.clone();
            x
        }
        InlineKind::Sc | InlineKind::Sm => {
            let mut bx = InlineElement::new(InlineKind::Bx);
            bx.id = element.id.clone();
            if let Some(ref id) = element.id {
                bx.attributes.insert("rid".to_string(), id.clone());
            }
            bx
        }
        InlineKind::Ec | InlineKind::Em => {
            let start_ref = element.attributes.get("startRef").cloned();
            let mut ex = InlineElement::new(InlineKind::Ex);
            ex.id = element.id.clone().or_else(|| start_ref.clone());
            if let Some(start_ref) = start_ref {
                ex.attributes.insert("rid".to_string(), start_ref);
            }
            ex
        }
        InlineKind::Cp => return ContentPart::Text(element.text()),
        InlineKind::Mrk => {
            let mut mrk = InlineElement::new(InlineKind::Mrk);
            mrk.id = element.id.clone();
            let mtype = match element.ctype.as_deref() {
                Some("term") => "term".to_string(),
                Some(other) => format!("x-{}", other),
                None => "x-generic".to_string(),
            };
            mrk.attributes.insert("mtype".to_string(), mtype);
            mrk.content = convert_parts(&element.content, Dialect::Xliff12);
            mrk
        }
        // Already 1.2 markup
        _ => element.clone(),
    };
    ContentPart::Inline(converted)
}

fn ctype_to_type(ctype: &str) -> (&'static str, Option<&'static str>) {
    match ctype {
        "bold" => ("fmt", Some("xlf:b")),
        "italic" => ("fmt", Some("xlf:i")),
        "underline" => ("fmt", Some("xlf:u")),
        "link" | "x-html-a" => ("link", None),
        "image" => ("image", None),
        _ => ("other", None),
    }
}

fn type_to_ctype(kind: &str, sub_type: Option<&str>) -> String {
    match (kind, sub_type) {
        ("fmt", Some("xlf:b")) => "bold".to_string(),
        ("fmt", Some("xlf:i")) => "italic".to_string(),
        ("fmt", Some("xlf:u")) => "underline".to_string(),
        ("link", _) => "link".to_string(),
        ("image", _) => "image".to_string(),
        (other, _) => format!("x-{}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xliffkit_ast::File;

    fn sample_1_2() -> Document {
        let mut source = Content::text_only("Click ");
        source.push_inline(
            InlineElement::new(InlineKind::G)
                .with_id("1")
                .with_ctype("bold")
                .with_part(ContentPart::Text("here".to_string())),
        );
        source.push_inline(InlineElement::new(InlineKind::Bx).with_id("2").with_attribute("rid", "r1"));
        source.push_inline(InlineElement::new(InlineKind::Ex).with_id("3").with_attribute("rid", "r1"));

        let mut doc = Document::new(Dialect::Xliff12);
        let mut file = File::new("ui.txt", "en", "plaintext").with_target_language("de");
        file.tool_id = Some("tool".to_string());
        let mut unit = TransUnit::new("1", source).with_target("Hier klicken", Some("signed-off"));
        unit.approved = Some(true);
        unit.attributes.insert("x:flag".to_string(), "1".to_string());
        file.body.push_unit(unit);
        doc.files.push(file);
        doc
    }

    #[test]
    fn test_1_2_to_2_0() {
        let converted = convert_document(&sample_1_2(), Dialect::Xliff20);
        assert_eq!(converted.dialect, Dialect::Xliff20);
        assert_eq!(converted.attributes.get("srcLang").map(String::as_str), Some("en"));
        let file = &converted.files[0];
        assert_eq!(file.id.as_deref(), Some("f1"));
        assert!(file.tool_id.is_none());

        let unit = converted.all_trans_units()[0];
        assert_eq!(unit.state.as_deref(), Some("reviewed"));
        assert!(unit.attributes.is_empty());
        assert_eq!(unit.source_text(), "Click here");
        let kinds: Vec<_> = unit.source.inline_elements().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![InlineKind::Pc, InlineKind::Sc, InlineKind::Ec]);
        let inlines = unit.source.inline_elements();
        assert_eq!(inlines[0].ctype.as_deref(), Some("fmt"));
        assert_eq!(inlines[1].id.as_deref(), Some("r1"));
        assert_eq!(inlines[2].attributes.get("startRef").map(String::as_str), Some("r1"));
    }

    #[test]
    fn test_2_0_to_1_2() {
        let mut doc = Document::new(Dialect::Xliff20);
        let mut file = File::new("", "en", "").with_id("main");
        for (id, state) in [("s1", "final"), ("s2", "initial")] {
            let mut source = Content::text_only("A");
            source.push_inline(InlineElement::new(InlineKind::Cp).with_attribute("hex", "41"));
            let mut unit = TransUnit::new(id, source).with_target("B", Some(state));
            unit.unit_id = Some("u1".to_string());
            file.body.push_unit(unit);
        }
        let mut ignorable = TransUnit::new("u2", " ");
        ignorable.ignorable = true;
        file.body.push_unit(ignorable);
        doc.files.push(file);

        let converted = convert_document(&doc, Dialect::Xliff12);
        let file = &converted.files[0];
        assert_eq!(file.original, "main");
        assert_eq!(file.datatype, "plaintext");

        let units = converted.all_trans_units();
        let ids: Vec<_> = units.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["u1_s1", "u1_s2", "u2"]);
        assert_eq!(units[0].source.parts, vec![ContentPart::Text("AA".to_string())]);
        assert_eq!(units[1].state.as_deref(), Some("new"));
        assert_eq!(units[2].translate, Some(false));
        assert!(!units[2].ignorable);
    }

    #[test]
    fn test_mq_conversion_drops_vendor_data() {
        let mut doc = sample_1_2();
        doc.dialect = Dialect::MqXliff;
        doc.attributes.insert("xmlns:mq".to_string(), "MQXliff".to_string());
        doc.set_metadata("vendor:xliff@mq:x", "1");
        if let BodyItem::Unit(unit) = &mut doc.files[0].body.items[0] {
            unit.state = Some("proofread".to_string());
            unit.attributes.insert("mq:status".to_string(), "Editing".to_string());
        }

        let plain = convert_document(&doc, Dialect::Xliff12);
        assert_eq!(plain.dialect, Dialect::Xliff12);
        assert!(plain.metadata.is_empty());
        let unit = plain.all_trans_units()[0];
        assert_eq!(unit.state.as_deref(), Some("signed-off"));
        assert!(!unit.attributes.contains_key("mq:status"));

        let v20 = convert_document(&doc, Dialect::Xliff20);
        assert_eq!(v20.all_trans_units()[0].state.as_deref(), Some("reviewed"));
    }

    #[test]
    fn test_same_dialect_is_a_copy() {
        let doc = sample_1_2();
        assert_eq!(convert_document(&doc, Dialect::Xliff12), doc);
    }
}
