//! Resource collection and lookup.
//!
//! [`ResourceStore`] moves the transitive closure of a page's resources out of
//! a [`PdfFile`] into a table of its own, so rendering can go on after the
//! file is dropped. [`ResourceLookup`] is the read side used by the
//! interpreter; both the store and a plain view over a file implement it.

use crate::document::PdfFile;
use crate::document::page::inherited;
use crate::error::{PdfError, Result};
use crate::model::objects::{Dict, ObjNum, ObjectTable, Value};
use itertools::Itertools;
use rustc_hash::{FxHashMap, FxHashSet};

/// Bookkeeping key that never names a resource kind.
pub const INTERNAL_KEY: &str = "Graft";

/// Named lookups over a resource dictionary and its object table.
pub trait ResourceLookup: ObjectTable {
    /// The page-level resource dictionary.
    fn base_resources(&self) -> Option<&Dict>;

    /// Follow references.
    fn deep<'a>(&'a self, value: &'a Value) -> Option<&'a Value> {
        value.resolve(self)
    }

    /// Dictionary entry with references followed.
    fn dict_entry<'a>(&'a self, dict: &'a Dict, key: &str) -> Option<&'a Value> {
        self.deep(dict.get(key)?)
    }

    /// One kind (`Font`, `XObject`, ...) of the base resources.
    fn resources_of_kind(&self, kind: &str) -> Option<&Dict> {
        self.dict_entry(self.base_resources()?, kind)?.as_dict().ok()
    }

    /// Resource `name` of `kind` in the base resources.
    fn find_resource(&self, kind: &str, name: &str) -> Option<&Value> {
        self.dict_entry(self.resources_of_kind(kind)?, name)
    }

    /// Resource `name` of `kind` in an arbitrary resource dictionary.
    fn find_in<'a>(&'a self, resources: &'a Dict, kind: &str, name: &str) -> Option<&'a Value> {
        let of_kind = self.dict_entry(resources, kind)?.as_dict().ok()?;
        self.dict_entry(of_kind, name)
    }

    /// Resource `name` of `kind` in the `/Resources` of a form XObject.
    fn find_resource_in<'a>(&'a self, xform: &'a Dict, kind: &str, name: &str) -> Option<&'a Value> {
        let resources = self.dict_entry(xform, "Resources")?.as_dict().ok()?;
        self.find_in(resources, kind, name)
    }
}

/// Self-contained table of transplanted resource objects.
#[derive(Debug, Clone, Default)]
pub struct ResourceStore {
    objects: FxHashMap<ObjNum, Value>,
    /// Objects in dependency order
    embed_sequence: Vec<ObjNum>,
    host_forms: FxHashSet<ObjNum>,
    page_resources: Dict,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy a resource dictionary and pull everything it references out of
    /// `file`.
    ///
    /// `ProcSet` and [`INTERNAL_KEY`] are skipped. Every other entry must
    /// resolve to a dictionary.
    pub fn collect(&mut self, resources: &Dict, file: &mut PdfFile) -> Result<()> {
        for (kind, value) in resources {
            if kind == "ProcSet" || kind == INTERNAL_KEY {
                continue;
            }
            let copied = self.transplant_value(value, file);
            if !matches!(copied.resolve(self), Some(Value::Dict(_))) {
                return Err(PdfError::TypeError {
                    expected: "resource dictionary",
                    got: copied.resolve(self).map_or("missing object", Value::type_name),
                });
            }
            self.page_resources.insert(kind.clone(), copied);
        }
        tracing::debug!(store = %self.describe(), "collected resources");
        Ok(())
    }

    /// Collect the (possibly inherited) resources of page `index`.
    pub fn collect_page(&mut self, file: &mut PdfFile, index: usize) -> Result<()> {
        let page = file
            .page(index)
            .ok_or_else(|| PdfError::PageTree(format!("no page {index}")))?;
        let Some(resources) = inherited(file, page, "Resources") else {
            return Ok(());
        };
        let resources = resources.as_dict()?.clone();
        self.collect(&resources, file)
    }

    /// Copy one value, transplanting whatever it references.
    fn transplant_value(&mut self, value: &Value, file: &mut PdfFile) -> Value {
        match value {
            Value::Ref(num) => {
                self.add_object(*num, file);
                Value::Ref(*num)
            }
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.transplant_value(item, file))
                    .collect(),
            ),
            Value::Dict(dict) => {
                let mut copy: Dict = dict
                    .iter()
                    .map(|(k, v)| (k.clone(), self.transplant_value(v, file)))
                    .collect();
                copy.set_stream(dict.stream_state().clone());
                Value::Dict(copy)
            }
            scalar => scalar.clone(),
        }
    }

    /// Move object `num` and its dependency closure out of `file`.
    ///
    /// Objects already present are left alone; objects missing from the file
    /// are skipped. Each object is appended to the embed sequence after
    /// everything it references.
    pub fn add_object(&mut self, num: ObjNum, file: &mut PdfFile) {
        if self.objects.contains_key(&num) {
            return;
        }
        let Some(value) = file.take(num) else {
            tracing::debug!(num, "referenced object not in file");
            return;
        };
        let mut refs = Vec::new();
        collect_refs(&value, &mut refs);
        self.objects.insert(num, value);
        for r in refs {
            self.add_object(r, file);
        }
        self.embed_sequence.push(num);
    }

    /// Transplant a form XObject of the host document and remember it.
    pub fn add_host_form(&mut self, num: ObjNum, file: &mut PdfFile) {
        self.add_object(num, file);
        self.mark_host_form(num);
    }

    pub fn mark_host_form(&mut self, num: ObjNum) {
        self.host_forms.insert(num);
    }

    pub fn is_host_form(&self, num: ObjNum) -> bool {
        self.host_forms.contains(&num)
    }

    /// Transplanted objects, each after the objects it references.
    pub fn embed_sequence(&self) -> &[ObjNum] {
        &self.embed_sequence
    }

    /// The copied page resource dictionary.
    pub fn page_resources(&self) -> &Dict {
        &self.page_resources
    }

    pub fn object(&self, num: ObjNum) -> Option<&Value> {
        self.objects.get(&num)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// One-line summary for logs.
    pub fn describe(&self) -> String {
        let kinds = self.page_resources.keys().join(",");
        let objects = self
            .embed_sequence
            .iter()
            .map(|num| {
                let kind = self
                    .objects
                    .get(num)
                    .and_then(|v| v.as_dict().ok())
                    .and_then(|d| d.get_name("Subtype").or_else(|| d.get_name("Type")))
                    .unwrap_or("-");
                let host = if self.is_host_form(*num) { "*" } else { "" };
                format!("{num}{host}:{kind}")
            })
            .join(" ");
        format!("[{kinds}] {objects}")
    }
}

impl ObjectTable for ResourceStore {
    fn object(&self, num: ObjNum) -> Option<&Value> {
        self.objects.get(&num)
    }
}

impl ResourceLookup for ResourceStore {
    fn base_resources(&self) -> Option<&Dict> {
        Some(&self.page_resources)
    }
}

/// Read-only lookup straight over a loaded file.
#[derive(Debug, Clone, Copy)]
pub struct FileResources<'a> {
    file: &'a PdfFile,
    resources: Option<&'a Dict>,
}

impl<'a> FileResources<'a> {
    pub fn new(file: &'a PdfFile, resources: Option<&'a Dict>) -> Self {
        Self { file, resources }
    }

    /// View over the (possibly inherited) resources of page `index`.
    pub fn for_page(file: &'a PdfFile, index: usize) -> Self {
        let resources = file
            .page(index)
            .and_then(|page| inherited(file, page, "Resources"))
            .and_then(|v| v.as_dict().ok());
        Self { file, resources }
    }
}

impl ObjectTable for FileResources<'_> {
    fn object(&self, num: ObjNum) -> Option<&Value> {
        self.file.object(num)
    }
}

impl ResourceLookup for FileResources<'_> {
    fn base_resources(&self) -> Option<&Dict> {
        self.resources
    }
}

/// Every object number referenced inside `value`.
fn collect_refs(value: &Value, out: &mut Vec<ObjNum>) {
    match value {
        Value::Ref(num) => out.push(*num),
        Value::Array(items) => items.iter().for_each(|item| collect_refs(item, out)),
        Value::Dict(dict) => dict.iter().for_each(|(_, v)| collect_refs(v, out)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refs_found_at_any_depth() {
        let inner: Dict = [("F".to_string(), Value::Ref(3))].into_iter().collect();
        let v = Value::Array(vec![
            Value::Ref(1),
            Value::Dict(inner),
            Value::Array(vec![Value::Ref(2)]),
        ]);
        let mut refs = Vec::new();
        collect_refs(&v, &mut refs);
        assert_eq!(refs, vec![1, 3, 2]);
    }

    #[test]
    fn store_lookup_through_kind_reference() {
        let mut store = ResourceStore::new();
        let fonts: Dict = [("F1".to_string(), Value::Ref(8))].into_iter().collect();
        store.objects.insert(7, Value::Dict(fonts));
        store.objects.insert(8, Value::name("font"));
        store.page_resources.insert("Font", Value::Ref(7));
        assert_eq!(store.find_resource("Font", "F1"), Some(&Value::name("font")));
        assert_eq!(store.find_resource("Font", "F2"), None);
        assert_eq!(store.find_resource("XObject", "F1"), None);
    }
}
