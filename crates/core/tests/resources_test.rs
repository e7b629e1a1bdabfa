//! Tests for ResourceStore - moving a page's resources out of a file.

mod common;

use pdfgraft_core::resources::INTERNAL_KEY;
use pdfgraft_core::{
    BufferSource, Dict, FileResources, PdfError, PdfFile, ResourceLookup, ResourceStore, Value,
};

fn load() -> PdfFile {
    PdfFile::load(BufferSource::new(common::classic_table(&common::graph()))).unwrap()
}

#[test]
fn test_collect_page_moves_closure() {
    let mut file = load();
    let mut store = ResourceStore::new();
    store.collect_page(&mut file, 0).unwrap();

    // Font 8 and form 9 moved; 6 was reached through Pages /Resources
    assert!(store.object(8).is_some());
    assert!(store.object(9).is_some());
    assert!(file.object(8).is_none());
    assert!(file.object(9).is_none());
    // Unrelated objects stay
    assert!(file.object(1).is_some());
    assert!(file.object(5).is_some());

    let kinds: Vec<&String> = store.page_resources().keys().collect();
    assert_eq!(kinds, ["Font", "XObject"]);
    assert_eq!(
        store.find_resource("Font", "F1").unwrap().as_dict().unwrap().get_name("BaseFont"),
        Some("Helvetica")
    );
}

#[test]
fn test_embed_sequence_puts_dependencies_first() {
    let mut file = load();
    let mut store = ResourceStore::new();
    store.add_object(9, &mut file);
    // The form references the font through its own resources
    assert_eq!(store.embed_sequence(), [8, 9]);
    assert_eq!(store.len(), 2);
}

#[test]
fn test_transplant_happens_once() {
    let mut file = load();
    let mut store = ResourceStore::new();
    store.add_object(8, &mut file);
    store.add_object(8, &mut file);
    store.add_object(9, &mut file);
    assert_eq!(store.embed_sequence(), [8, 9]);
}

#[test]
fn test_missing_objects_are_skipped() {
    let mut file = load();
    let mut store = ResourceStore::new();
    store.add_object(404, &mut file);
    assert!(store.is_empty());
    assert!(store.embed_sequence().is_empty());
}

#[test]
fn test_reference_cycle_terminates() {
    let mut objects = common::graph();
    objects.push((20, b"<</Next 21 0 R>>".to_vec()));
    objects.push((21, b"<</Next 20 0 R>>".to_vec()));
    let mut file = PdfFile::load(BufferSource::new(common::classic_table(&objects))).unwrap();
    let mut store = ResourceStore::new();
    store.add_object(20, &mut file);
    assert_eq!(store.embed_sequence(), [21, 20]);
}

#[test]
fn test_skipped_keys_and_arrays_of_refs() {
    let mut file = load();
    let mut resources = Dict::new();
    resources.insert("ProcSet", Value::Array(vec![Value::name("PDF")]));
    resources.insert(INTERNAL_KEY, Value::Ref(1));
    let mut props = Dict::new();
    props.insert("Layers", Value::Array(vec![Value::Ref(8), Value::Ref(9)]));
    resources.insert("Properties", Value::Dict(props));

    let mut store = ResourceStore::new();
    store.collect(&resources, &mut file).unwrap();
    assert!(store.page_resources().get("ProcSet").is_none());
    assert!(store.page_resources().get(INTERNAL_KEY).is_none());
    // Object 1 was never pulled
    assert!(file.object(1).is_some());
    assert!(store.object(8).is_some() && store.object(9).is_some());
}

#[test]
fn test_non_dictionary_kind_rejected() {
    let mut file = load();
    let mut resources = Dict::new();
    resources.insert("Font", Value::Ref(7));
    let mut store = ResourceStore::new();
    assert!(matches!(
        store.collect(&resources, &mut file),
        Err(PdfError::TypeError { .. })
    ));
}

#[test]
fn test_host_forms_side_set() {
    let mut file = load();
    let mut store = ResourceStore::new();
    store.add_host_form(9, &mut file);
    assert!(store.is_host_form(9));
    assert!(!store.is_host_form(8));
    store.mark_host_form(8);
    assert!(store.is_host_form(8));
    assert_eq!(store.describe(), "[] 8*:Type1 9*:Form");
}

#[test]
fn test_file_view_and_store_agree() {
    let file = load();
    let view = FileResources::for_page(&file, 1);
    let form = view.find_resource("XObject", "Fm1").unwrap().as_dict().unwrap();
    let font = view.find_resource_in(form, "Font", "F2").unwrap();

    let mut file = load();
    let mut store = ResourceStore::new();
    store.collect_page(&mut file, 1).unwrap();
    let stored_form = store.find_resource("XObject", "Fm1").unwrap().as_dict().unwrap();
    assert_eq!(stored_form, form);
    assert_eq!(store.find_resource_in(stored_form, "Font", "F2"), Some(font));
    assert!(store.resources_of_kind("Shading").is_none());
}
