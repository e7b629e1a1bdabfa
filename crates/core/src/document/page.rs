//! Page-tree resolution.

use crate::error::{PdfError, Result};
use crate::model::objects::{Dict, ObjNum, ObjectTable, Value};
use crate::utils::{Rect, normalize_rect};
use rustc_hash::FxHashSet;

/// Upper bound on `Parent` hops when inheriting page attributes.
const MAX_INHERIT_DEPTH: usize = 64;

/// Walk `trailer.Root.Pages` and return page object numbers in order.
///
/// Every node must be reached through a reference: `/Pages` nodes expand
/// their `/Kids`, `/Page` nodes are collected, anything else fails.
pub fn collect_pages<T: ObjectTable + ?Sized>(table: &T, trailer: &Dict) -> Result<Vec<ObjNum>> {
    let root = trailer
        .get_resolved("Root", table)
        .ok_or_else(|| PdfError::PageTree("trailer has no Root".into()))?
        .as_dict()
        .map_err(|_| PdfError::PageTree("Root is not a dictionary".into()))?;
    let Some(Value::Ref(pages)) = root.get("Pages") else {
        return Err(PdfError::PageTree("catalog Pages is not a reference".into()));
    };

    let mut walker = PageWalker {
        table,
        pages: Vec::new(),
        visited: FxHashSet::default(),
    };
    walker.walk(*pages)?;
    Ok(walker.pages)
}

struct PageWalker<'a, T: ?Sized> {
    table: &'a T,
    pages: Vec<ObjNum>,
    visited: FxHashSet<ObjNum>,
}

impl<T: ObjectTable + ?Sized> PageWalker<'_, T> {
    fn walk(&mut self, num: ObjNum) -> Result<()> {
        if !self.visited.insert(num) {
            return Err(PdfError::PageTree(format!("cycle at object {num}")));
        }
        let node = self
            .table
            .object(num)
            .ok_or(PdfError::ObjectNotFound(num))?
            .as_dict()
            .map_err(|_| PdfError::PageTree(format!("object {num} is not a dictionary")))?;

        match node.get_name("Type") {
            Some("Pages") => {
                let kids = node
                    .get_array("Kids")
                    .ok_or_else(|| PdfError::PageTree(format!("Pages node {num} has no Kids")))?;
                for kid in kids {
                    let Value::Ref(kid) = kid else {
                        return Err(PdfError::PageTree(format!(
                            "Pages node {num} has a non-reference kid"
                        )));
                    };
                    self.walk(*kid)?;
                }
                Ok(())
            }
            Some("Page") => {
                self.pages.push(num);
                Ok(())
            }
            other => Err(PdfError::PageTree(format!(
                "object {num} has unexpected Type {other:?}"
            ))),
        }
    }
}

/// Look up `key` on `page`, then on its `Parent` chain.
pub fn inherited<'a, T: ObjectTable + ?Sized>(
    table: &'a T,
    page: &'a Dict,
    key: &str,
) -> Option<&'a Value> {
    let mut node = page;
    for _ in 0..MAX_INHERIT_DEPTH {
        if let Some(value) = node.get_resolved(key, table) {
            return Some(value);
        }
        node = node.get_resolved("Parent", table)?.as_dict().ok()?;
    }
    None
}

/// `MediaBox` of `page`, inherited through `Parent`, normalized.
pub fn media_box<T: ObjectTable + ?Sized>(table: &T, page: &Dict) -> Option<Rect> {
    let value = inherited(table, page, "MediaBox")?;
    let nums: Option<Vec<f64>> = value
        .as_array()
        .ok()?
        .iter()
        .map(|v| v.resolve(table).and_then(|v| v.as_number().ok()))
        .collect();
    let nums = nums?;
    match nums[..] {
        [x0, y0, x1, y1] => Some(normalize_rect((x0, y0, x1, y1))),
        _ => None,
    }
}
