use redline_core::model::{Attachment, BlockId, BlockKind};
use redline_docx::builder::DocxBuilder;
use redline_docx::package::Package;
use redline_docx::redline::{DIFF_FALLBACK_WARNING, DIFF_TOO_LARGE_WARNING};
use redline_docx::xml::{XmlDocument, XmlElement};
use redline_docx::{DocxDocument, RedlineOptions, RenderError, ReplaceMode};

fn id(n: u32) -> BlockId {
    BlockId::from_ordinal(n)
}

fn options() -> RedlineOptions {
    RedlineOptions::new("Reviewer", None, Some("2026-03-01T12:00:00Z".into()))
}

fn sample() -> DocxBuilder {
    DocxBuilder::new()
        .title("Master Services Agreement")
        .heading(2, "Payment")
        .paragraph("The customer shall pay within thirty days.")
        .image()
        .paragraph("")
        .table(&[&["Party", "Role"], &["Acme", "Supplier\nPrimary"]])
        .page_break()
        .runs(&[("Bold lead. ", true), ("Plain tail.", false)])
}

fn open(builder: &DocxBuilder) -> DocxDocument {
    DocxDocument::from_bytes(&builder.build().unwrap()).unwrap()
}

fn main_part(bytes: &[u8]) -> XmlDocument {
    Package::from_bytes(bytes)
        .unwrap()
        .xml_part("word/document.xml")
        .unwrap()
}

fn count(root: &XmlElement, name: &str) -> usize {
    let mut n = 0;
    root.walk(&mut |e: &XmlElement| {
        if e.is(name) {
            n += 1;
        }
    });
    n
}

fn find_all<'a>(el: &'a XmlElement, name: &str, out: &mut Vec<&'a XmlElement>) {
    if el.is(name) {
        out.push(el);
    }
    for child in el.elements() {
        find_all(child, name, out);
    }
}

fn texts(doc: &DocxDocument) -> Vec<String> {
    doc.model().iter().map(|b| b.text.clone()).collect()
}

#[test]
fn extraction_assigns_ordinal_ids_in_document_order() {
    let doc = open(&sample());
    let model = doc.model();

    let summary: Vec<(String, BlockKind, Option<u8>)> = model
        .iter()
        .map(|b| (b.id.to_string(), b.kind, b.level))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("b00001".into(), BlockKind::Heading, Some(1)),
            ("b00002".into(), BlockKind::Heading, Some(2)),
            ("b00003".into(), BlockKind::Paragraph, None),
            ("b00004".into(), BlockKind::TableCell, None),
            ("b00005".into(), BlockKind::TableCell, None),
            ("b00006".into(), BlockKind::TableCell, None),
            ("b00007".into(), BlockKind::TableCell, None),
            ("b00008".into(), BlockKind::Paragraph, None),
        ]
    );

    assert_eq!(model.get(id(7)).unwrap().text, "Supplier\nPrimary");
    assert_eq!(model.get(id(8)).unwrap().text, "Bold lead. Plain tail.");
    assert_eq!(model.get(id(3)).unwrap().attachments, vec![Attachment::Image]);
    assert_eq!(model.get(id(7)).unwrap().attachments, vec![Attachment::PageBreak]);
    assert_eq!(model.outline().len(), 2);
    assert_eq!(model.fingerprint().len(), 64);
}

#[test]
fn extraction_is_deterministic() {
    let bytes = sample().build().unwrap();
    let a = DocxDocument::from_bytes(&bytes).unwrap().into_model();
    let b = DocxDocument::from_bytes(&bytes).unwrap().into_model();
    assert_eq!(
        serde_json::to_value(&a).unwrap(),
        serde_json::to_value(&b).unwrap()
    );
}

#[test]
fn malformed_packages_are_structural_errors() {
    assert!(DocxDocument::from_bytes(b"not a zip").is_err());

    let mut pkg = DocxBuilder::new().paragraph("x").package();
    pkg.set_part("word/document.xml", b"<w:document><w:body>".to_vec());
    assert!(DocxDocument::from_package(pkg).is_err());

    let mut pkg = DocxBuilder::new().package();
    pkg.set_part("word/document.xml", b"<root/>".to_vec());
    assert!(DocxDocument::from_package(pkg).is_err());
}

#[test]
fn empty_redline_leaves_the_main_part_untouched() {
    let builder = sample();
    let original = builder.build().unwrap();
    let mut doc = DocxDocument::from_bytes(&original).unwrap();
    doc.redliner(options()).finish().unwrap();

    let out = doc.to_bytes().unwrap();
    let before = Package::from_bytes(&original).unwrap();
    let after = Package::from_bytes(&out).unwrap();
    assert_eq!(before, after);

    let reopened = DocxDocument::from_bytes(&out).unwrap();
    assert_eq!(texts(&reopened), texts(&open(&builder)));
}

#[test]
fn diff_replace_marks_only_the_changed_words() {
    let mut doc = open(&sample());
    let mut r = doc.redliner(options());
    let warnings = r
        .replace_block(id(3), "The customer shall pay within sixty days.", ReplaceMode::Diff)
        .unwrap();
    assert!(warnings.is_empty());
    r.finish().unwrap();

    let bytes = doc.to_bytes().unwrap();
    let xml = main_part(&bytes);
    assert_eq!(count(&xml.root, "w:ins"), 1);
    assert_eq!(count(&xml.root, "w:del"), 1);
    assert_eq!(count(&xml.root, "w:delText"), 1);

    let reopened = DocxDocument::from_bytes(&bytes).unwrap();
    assert_eq!(
        reopened.model().get(id(3)).unwrap().text,
        "The customer shall pay within sixty days."
    );

    let serialized = String::from_utf8(
        Package::from_bytes(&bytes)
            .unwrap()
            .part("word/document.xml")
            .unwrap()
            .to_vec(),
    )
    .unwrap();
    assert!(serialized.contains(r#"w:author="Reviewer""#));
    assert!(serialized.contains(r#"w:date="2026-03-01T12:00:00Z""#));
}

#[test]
fn split_runs_keep_their_formatting() {
    let mut doc = open(&sample());
    let mut r = doc.redliner(options());
    r.replace_block(id(8), "Bold start. Plain tail.", ReplaceMode::Diff)
        .unwrap();
    r.finish().unwrap();

    let xml = main_part(&doc.to_bytes().unwrap());
    let mut ins = Vec::new();
    find_all(&xml.root, "w:ins", &mut ins);
    assert_eq!(ins.len(), 1);
    assert_eq!(count(ins[0], "w:b"), 1, "inserted run inherits bold");
}

#[test]
fn multi_paragraph_cells_fall_back_to_whole_replacement() {
    let mut doc = open(&sample());
    let mut r = doc.redliner(options());
    let warnings = r
        .replace_block(id(7), "Supplier", ReplaceMode::Diff)
        .unwrap();
    assert_eq!(warnings, vec![DIFF_FALLBACK_WARNING.to_string()]);
    r.finish().unwrap();

    let reopened = DocxDocument::from_bytes(&doc.to_bytes().unwrap()).unwrap();
    assert_eq!(reopened.model().get(id(7)).unwrap().text, "Supplier");
}

#[test]
fn tracked_delete_removes_the_block_from_the_current_text() {
    let mut doc = open(&sample());
    let mut r = doc.redliner(options());
    r.delete_block(id(3)).unwrap();
    r.finish().unwrap();

    let bytes = doc.to_bytes().unwrap();
    let xml = main_part(&bytes);
    // Run deletion plus the paragraph mark.
    assert_eq!(count(&xml.root, "w:del"), 2);

    let reopened = DocxDocument::from_bytes(&bytes).unwrap();
    assert!(
        !texts(&reopened)
            .iter()
            .any(|t| t.contains("thirty days"))
    );
    assert_eq!(reopened.model().len(), doc.model().len() - 1);
}

#[test]
fn insert_after_places_paragraphs_in_declared_order() {
    let mut doc = open(&sample());
    let mut r = doc.redliner(options());
    assert_eq!(r.insert_after(id(3), "First addition.").unwrap(), "b00003_ins");
    assert_eq!(r.insert_after(id(3), "Second addition.").unwrap(), "b00003_ins2");
    assert_eq!(r.insert_after(id(5), "Cell note.").unwrap(), "b00005_ins");
    r.finish().unwrap();

    let reopened = DocxDocument::from_bytes(&doc.to_bytes().unwrap()).unwrap();
    let all = texts(&reopened);
    let at = all.iter().position(|t| t.starts_with("The customer")).unwrap();
    assert_eq!(all[at + 1], "First addition.");
    assert_eq!(all[at + 2], "Second addition.");
    assert!(all.contains(&"Role\nCell note.".to_string()));
}

#[test]
fn inserted_heading_siblings_do_not_inherit_heading_style() {
    let mut doc = open(&sample());
    let mut r = doc.redliner(options());
    r.insert_after(id(2), "Body under payment.").unwrap();
    r.finish().unwrap();

    let reopened = DocxDocument::from_bytes(&doc.to_bytes().unwrap()).unwrap();
    let inserted = reopened
        .model()
        .iter()
        .find(|b| b.text == "Body under payment.")
        .unwrap();
    assert_eq!(inserted.kind, BlockKind::Paragraph);
}

#[test]
fn comments_create_the_comments_part() {
    let mut doc = open(&sample());
    let mut r = doc.redliner(options());
    r.comment_block(id(3), "Check the term.\nSecond line.").unwrap();
    r.comment_block(id(6), "Confirm supplier.").unwrap();
    r.finish().unwrap();

    let bytes = doc.to_bytes().unwrap();
    let pkg = Package::from_bytes(&bytes).unwrap();
    let comments = pkg.xml_part("word/comments.xml").unwrap();
    assert_eq!(count(&comments.root, "w:comment"), 2);
    assert_eq!(count(&comments.root, "w:p"), 3);

    let rels = String::from_utf8(pkg.part("word/_rels/document.xml.rels").unwrap().to_vec()).unwrap();
    assert!(rels.contains("relationships/comments"));
    let types = String::from_utf8(pkg.part("[Content_Types].xml").unwrap().to_vec()).unwrap();
    assert!(types.contains("/word/comments.xml"));

    let xml = main_part(&bytes);
    assert_eq!(count(&xml.root, "w:commentRangeStart"), 2);
    assert_eq!(count(&xml.root, "w:commentReference"), 2);

    // Comments do not change the current text.
    let reopened = DocxDocument::from_bytes(&bytes).unwrap();
    assert_eq!(texts(&reopened), texts(&open(&sample())));
}

#[test]
fn revision_ids_are_fresh_and_unique() {
    let mut doc = open(&sample());
    let mut r = doc.redliner(options());
    r.replace_block(id(1), "Services Agreement", ReplaceMode::Whole).unwrap();
    r.delete_block(id(4)).unwrap();
    r.comment_block(id(5), "x").unwrap();
    r.finish().unwrap();

    let bytes = doc.to_bytes().unwrap();
    let xml = main_part(&bytes);
    let mut ids = Vec::new();
    xml.root.walk(&mut |e: &XmlElement| {
        if e.is("w:ins") || e.is("w:del") {
            ids.push(e.attr("w:id").unwrap().parse::<u64>().unwrap());
        }
    });
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), ids.len());
}

#[test]
fn plain_mode_writes_text_directly() {
    let mut doc = open(&sample());
    let mut opts = options();
    opts.track_changes = false;
    let mut r = doc.redliner(opts);
    r.replace_block(id(3), "Pay on receipt.", ReplaceMode::Diff).unwrap();
    r.delete_block(id(8)).unwrap();
    r.delete_block(id(6)).unwrap();
    r.insert_after(id(2), "Inserted plainly.").unwrap();
    r.finish().unwrap();

    let bytes = doc.to_bytes().unwrap();
    let xml = main_part(&bytes);
    assert_eq!(count(&xml.root, "w:ins"), 0);
    assert_eq!(count(&xml.root, "w:del"), 0);

    let reopened = DocxDocument::from_bytes(&bytes).unwrap();
    let all = texts(&reopened);
    assert!(all.contains(&"Pay on receipt.".to_string()));
    assert!(all.contains(&"Inserted plainly.".to_string()));
    assert!(!all.iter().any(|t| t.contains("Plain tail")));
    assert!(all.contains(&String::new()), "emptied cell stays a block");
}

#[test]
fn oversized_rewrites_fall_back_to_whole_replacement() {
    let words = |prefix: &str| {
        (0..1500)
            .map(|i| format!("{prefix}{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    };
    let (old, new) = (words("alpha"), words("omega"));
    let mut doc = open(&DocxBuilder::new().paragraph(&old));
    let mut r = doc.redliner(options());
    let warnings = r.replace_block(id(1), &new, ReplaceMode::Diff).unwrap();
    r.finish().unwrap();

    assert_eq!(warnings, [DIFF_TOO_LARGE_WARNING]);
    let xml = main_part(&doc.to_bytes().unwrap());
    assert_eq!(count(&xml.root, "w:del"), 1);
    assert_eq!(count(&xml.root, "w:ins"), 1);
}

#[test]
fn whole_replace_stays_inside_an_earlier_comment_range() {
    let mut doc = open(&sample());
    let mut r = doc.redliner(options());
    r.comment_block(id(3), "Check the term.").unwrap();
    r.replace_block(id(3), "Pay on receipt.", ReplaceMode::Whole).unwrap();
    r.finish().unwrap();

    let xml = main_part(&doc.to_bytes().unwrap());
    let mut paragraphs = Vec::new();
    find_all(&xml.root, "w:p", &mut paragraphs);
    let p = paragraphs
        .into_iter()
        .find(|p| p.elements().any(|e| e.is("w:ins")))
        .unwrap();
    let order: Vec<&str> = p.elements().map(|e| e.name.as_str()).collect();
    let at = |name: &str| order.iter().position(|n| *n == name).unwrap();

    assert!(at("w:commentRangeStart") < at("w:del"), "{order:?}");
    assert!(at("w:del") < at("w:ins"), "{order:?}");
    assert!(at("w:ins") < at("w:commentRangeEnd"), "{order:?}");
}

#[test]
fn plain_delete_and_comments_on_one_paragraph() {
    let mut doc = open(&sample());
    let mut opts = options();
    opts.track_changes = false;
    let mut r = doc.redliner(opts);

    r.delete_block(id(3)).unwrap();
    assert_eq!(r.comment_block(id(3), "Gone?"), Err(RenderError::TargetRemoved));

    r.comment_block(id(8), "Keep the anchor.").unwrap();
    r.delete_block(id(8)).unwrap();
    r.finish().unwrap();

    assert!(doc.package().has_part("word/comments.xml"));
    let bytes = doc.to_bytes().unwrap();
    let xml = main_part(&bytes);
    assert_eq!(count(&xml.root, "w:commentRangeStart"), 1);
    assert_eq!(count(&xml.root, "w:commentReference"), 1);

    let reopened = DocxDocument::from_bytes(&bytes).unwrap();
    let all = texts(&reopened);
    assert!(!all.iter().any(|t| t.contains("thirty days")));
    assert!(!all.iter().any(|t| t.contains("Plain tail")));
}

#[test]
fn finished_documents_refuse_further_rendering() {
    let mut doc = open(&sample());
    let mut r = doc.redliner(options());
    r.comment_block(id(1), "x").unwrap();
    r.finish().unwrap();

    let mut again = doc.redliner(options());
    assert_eq!(again.delete_block(id(1)), Err(RenderError::StaleAnchor));
    assert_eq!(
        again.delete_block(id(99)),
        Err(RenderError::StaleAnchor),
        "staleness is reported before lookup"
    );
}

#[test]
fn unknown_targets_are_reported() {
    let mut doc = open(&sample());
    let mut r = doc.redliner(options());
    assert_eq!(r.delete_block(id(99)), Err(RenderError::TargetNotFound));
    assert_eq!(
        r.insert_after(id(99), "x").unwrap_err(),
        RenderError::TargetNotFound
    );
}
