//! The page surface the updater writes to.
//!
//! [`Dom`] is the narrow set of element operations the live handlers need.
//! The browser build implements it over `web_sys::Document`; [`MemoryDom`]
//! keeps the same state in memory for the headless client and for tests.

use std::collections::BTreeMap;

use tracker_common::protocol::LatLng;

/// Element operations addressed by element id.
///
/// Mutating an id that does not exist is a no-op. Callers check presence
/// with [`Dom::contains`] first when a whole group must exist.
pub trait Dom {
    fn contains(&self, id: &str) -> bool;
    fn set_text(&mut self, id: &str, text: &str);
    /// Replace the whole class attribute.
    fn set_class_name(&mut self, id: &str, class: &str);
    fn add_class(&mut self, id: &str, class: &str);
    fn remove_class(&mut self, id: &str, class: &str);
    fn set_title(&mut self, id: &str, title: &str);
    fn set_inner_html(&mut self, id: &str, html: &str);
    /// Append a new `<div>` under `parent`. Returns `false` if the parent
    /// is missing.
    fn append_element(&mut self, parent: &str, id: &str, class: &str, inner_html: &str) -> bool;
    /// Returns `false` if nothing was removed.
    fn remove_element(&mut self, id: &str) -> bool;
    /// Move the map marker and recentre the map. Returns `false` when the
    /// page has no map.
    fn move_marker(&mut self, pos: LatLng) -> bool;
}

// ─── In-memory page ──────────────────────────────────────────────────────────

/// State of one element in a [`MemoryDom`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub classes: Vec<String>,
    pub text: String,
    pub title: String,
    pub inner_html: String,
    pub parent: Option<String>,
}

impl Element {
    pub fn with_classes(class: &str) -> Self {
        Element {
            classes: split_classes(class),
            ..Default::default()
        }
    }
}

/// A page held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryDom {
    elements: BTreeMap<String, Element>,
    marker: Option<LatLng>,
    center: Option<LatLng>,
}

impl MemoryDom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a map with its marker at `pos`.
    pub fn with_map(mut self, pos: LatLng) -> Self {
        self.marker = Some(pos);
        self.center = Some(pos);
        self
    }

    pub fn insert(&mut self, id: &str, element: Element) {
        self.elements.insert(id.to_string(), element);
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        self.get(id).map(|e| e.text.as_str())
    }

    pub fn class_name(&self, id: &str) -> Option<String> {
        self.get(id).map(|e| e.classes.join(" "))
    }

    pub fn has_class(&self, id: &str, class: &str) -> bool {
        self.get(id)
            .is_some_and(|e| e.classes.iter().any(|c| c == class))
    }

    pub fn title(&self, id: &str) -> Option<&str> {
        self.get(id).map(|e| e.title.as_str())
    }

    pub fn inner_html(&self, id: &str) -> Option<&str> {
        self.get(id).map(|e| e.inner_html.as_str())
    }

    /// Ids of the direct children of `parent`, in id order.
    pub fn children(&self, parent: &str) -> Vec<&str> {
        self.elements
            .iter()
            .filter(|(_, e)| e.parent.as_deref() == Some(parent))
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn marker(&self) -> Option<LatLng> {
        self.marker
    }

    pub fn center(&self) -> Option<LatLng> {
        self.center
    }

    /// All elements, for diagnostics.
    pub fn elements(&self) -> impl Iterator<Item = (&str, &Element)> {
        self.elements.iter().map(|(id, e)| (id.as_str(), e))
    }
}

impl Dom for MemoryDom {
    fn contains(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    fn set_text(&mut self, id: &str, text: &str) {
        if let Some(e) = self.elements.get_mut(id) {
            e.text = text.to_string();
            e.inner_html.clear();
        }
    }

    fn set_class_name(&mut self, id: &str, class: &str) {
        if let Some(e) = self.elements.get_mut(id) {
            e.classes = split_classes(class);
        }
    }

    fn add_class(&mut self, id: &str, class: &str) {
        if let Some(e) = self.elements.get_mut(id) {
            if !e.classes.iter().any(|c| c == class) {
                e.classes.push(class.to_string());
            }
        }
    }

    fn remove_class(&mut self, id: &str, class: &str) {
        if let Some(e) = self.elements.get_mut(id) {
            e.classes.retain(|c| c != class);
        }
    }

    fn set_title(&mut self, id: &str, title: &str) {
        if let Some(e) = self.elements.get_mut(id) {
            e.title = title.to_string();
        }
    }

    fn set_inner_html(&mut self, id: &str, html: &str) {
        if let Some(e) = self.elements.get_mut(id) {
            e.inner_html = html.to_string();
            e.text.clear();
        }
    }

    fn append_element(&mut self, parent: &str, id: &str, class: &str, inner_html: &str) -> bool {
        if !self.elements.contains_key(parent) {
            return false;
        }
        let element = Element {
            classes: split_classes(class),
            inner_html: inner_html.to_string(),
            parent: Some(parent.to_string()),
            ..Default::default()
        };
        self.elements.insert(id.to_string(), element);
        true
    }

    fn remove_element(&mut self, id: &str) -> bool {
        if self.elements.remove(id).is_none() {
            return false;
        }
        // Detach descendants along with the node.
        let mut orphans: Vec<String> = vec![id.to_string()];
        while let Some(gone) = orphans.pop() {
            let children: Vec<String> = self
                .elements
                .iter()
                .filter(|(_, e)| e.parent.as_deref() == Some(gone.as_str()))
                .map(|(cid, _)| cid.clone())
                .collect();
            for cid in children {
                self.elements.remove(&cid);
                orphans.push(cid);
            }
        }
        true
    }

    fn move_marker(&mut self, pos: LatLng) -> bool {
        if self.marker.is_none() {
            return false;
        }
        self.marker = Some(pos);
        self.center = Some(pos);
        true
    }
}

fn split_classes(class: &str) -> Vec<String> {
    class.split_whitespace().map(str::to_string).collect()
}
