// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;
use core::mem;

use hashbrown::{HashMap, HashSet};
use understory_binding::DataContext;

use super::{ItemsHost, Template, check_index, check_insert_index};
use crate::element::{ChildList, ElementCx};
use crate::error::{LayoutError, Result};
use crate::id::ElementId;
use crate::tree::ElementTree;

struct Record {
    key: u64,
    item: DataContext,
    template: Template,
    /// Set while realized.
    element: Option<ElementId>,
}

impl core::fmt::Debug for Record {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Record")
            .field("key", &self.key)
            .field("item", &self.item)
            .field("element", &self.element)
            .finish_non_exhaustive()
    }
}

/// Item records with elements realized only for a visible window.
///
/// Each layout pass walks the window with a [`Cursor`], which realizes the
/// items it reaches. When the cursor finishes, items realized in the
/// previous pass but not reached in this one are virtualized: their
/// elements lose their data context and parent and are freed. Items visible
/// in both passes keep their elements.
///
/// ```rust
/// use understory_binding::DataContext;
/// use understory_layout::{ElementTree, TextBlock, VirtualizingStackPanel, template};
///
/// let mut tree = ElementTree::new();
/// let panel = tree.insert(VirtualizingStackPanel::new());
/// let row = template(|tree, _item| Ok(tree.insert(TextBlock::new())));
/// tree.with_element::<VirtualizingStackPanel, _>(panel, |panel, cx| {
///     for n in 0..100_u32 {
///         panel.items_mut().push(cx, DataContext::from_value(n), Some(row.clone()))?;
///     }
///     Ok::<_, understory_layout::LayoutError>(())
/// })
/// .unwrap()
/// .unwrap();
///
/// let panel_ref = tree.element::<VirtualizingStackPanel>(panel).unwrap();
/// assert_eq!(panel_ref.items().len(), 100);
/// assert_eq!(panel_ref.items().realized().count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct VirtualizingCollection {
    records: Vec<Record>,
    /// Position of each record in `records`, by key.
    positions: HashMap<u64, usize>,
    next_key: u64,
    /// Keys realized by the last finished pass.
    previous: Vec<u64>,
    /// Keys reached by the running pass.
    current: Vec<u64>,
}

impl VirtualizingCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if there are no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The item at `index`.
    #[must_use]
    pub fn item(&self, index: usize) -> Option<&DataContext> {
        self.records.get(index).map(|record| &record.item)
    }

    /// The element realized for the item at `index`.
    #[must_use]
    pub fn element(&self, index: usize) -> Option<ElementId> {
        self.records.get(index).and_then(|record| record.element)
    }

    /// Returns `true` if the item at `index` has an element.
    #[must_use]
    pub fn is_realized(&self, index: usize) -> bool {
        self.element(index).is_some()
    }

    /// Elements realized by the last finished pass, in the order the
    /// cursor reached them.
    pub fn realized(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.previous
            .iter()
            .filter_map(|key| self.record(*key).and_then(|record| record.element))
    }

    fn record(&self, key: u64) -> Option<&Record> {
        self.positions
            .get(&key)
            .and_then(|&pos| self.records.get(pos))
    }

    fn record_mut(&mut self, key: u64) -> Option<&mut Record> {
        let pos = *self.positions.get(&key)?;
        self.records.get_mut(pos)
    }

    /// Refreshes the positions of the records from `start` on.
    fn reindex_from(&mut self, start: usize) {
        for (pos, record) in self.records.iter().enumerate().skip(start) {
            self.positions.insert(record.key, pos);
        }
    }

    /// The realized elements, for [`Element::visual_children`](crate::Element::visual_children).
    #[must_use]
    pub fn ids(&self) -> ChildList {
        self.realized().collect()
    }

    /// Appends an item.
    ///
    /// # Errors
    ///
    /// [`LayoutError::MissingTemplate`] without a template.
    pub fn push(
        &mut self,
        cx: &mut ElementCx<'_>,
        item: DataContext,
        template: Option<Template>,
    ) -> Result<()> {
        self.insert(cx, self.len(), item, template)
    }

    /// Inserts an item at `index`. No element is created until a cursor
    /// reaches it.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::MissingTemplate`] without a template.
    /// - [`LayoutError::IndexOutOfRange`] if `index > len`.
    pub fn insert(
        &mut self,
        cx: &mut ElementCx<'_>,
        index: usize,
        item: DataContext,
        template: Option<Template>,
    ) -> Result<()> {
        let template = template.ok_or(LayoutError::MissingTemplate)?;
        check_insert_index(index, self.len())?;
        let key = self.next_key;
        self.next_key += 1;
        self.records.insert(
            index,
            Record {
                key,
                item,
                template,
                element: None,
            },
        );
        self.reindex_from(index);
        cx.invalidate_measure();
        Ok(())
    }

    /// Removes the item at `index`, virtualizing its element.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::IndexOutOfRange`] if `index >= len`.
    /// - A failure to detach or free the realized element. The item is
    ///   removed either way.
    pub fn remove_at(&mut self, cx: &mut ElementCx<'_>, index: usize) -> Result<DataContext> {
        check_index(index, self.len())?;
        let record = self.records.remove(index);
        self.positions.remove(&record.key);
        self.reindex_from(index);
        self.previous.retain(|key| *key != record.key);
        self.current.retain(|key| *key != record.key);
        cx.invalidate_measure();
        if let Some(element) = record.element {
            virtualize(cx.tree_mut(), element)?;
        }
        Ok(record.item)
    }

    /// Moves an item by removing it and inserting it at `new_index`.
    ///
    /// # Errors
    ///
    /// [`LayoutError::IndexOutOfRange`] if either index is out of range.
    pub fn move_item(
        &mut self,
        cx: &mut ElementCx<'_>,
        old_index: usize,
        new_index: usize,
    ) -> Result<()> {
        check_index(old_index, self.len())?;
        check_index(new_index, self.len())?;
        let template = self.records[old_index].template.clone();
        let item = self.remove_at(cx, old_index)?;
        self.insert(cx, new_index, item, Some(template))
    }

    /// Removes every item, virtualizing all realized elements.
    ///
    /// # Errors
    ///
    /// The first failure to detach or free a realized element. Every item
    /// is removed regardless.
    pub fn clear(&mut self, cx: &mut ElementCx<'_>) -> Result<()> {
        self.positions.clear();
        self.previous.clear();
        self.current.clear();
        cx.invalidate_measure();
        let mut result = Ok(());
        for record in mem::take(&mut self.records) {
            if let Some(element) = record.element {
                let virtualized = virtualize(cx.tree_mut(), element);
                if result.is_ok() {
                    result = virtualized;
                }
            }
        }
        result
    }

    /// Starts a realization pass at `start`.
    ///
    /// `owner` is the element hosting the collection; realized elements are
    /// parented to it.
    pub fn cursor<'a>(
        &'a mut self,
        tree: &'a mut ElementTree,
        owner: ElementId,
        start: usize,
    ) -> Cursor<'a> {
        self.current.clear();
        Cursor {
            collection: self,
            tree,
            owner,
            index: start,
            finished: false,
        }
    }

    fn finish_pass(&mut self, tree: &mut ElementTree) -> Result<()> {
        let reached: HashSet<u64> = self.current.iter().copied().collect();
        let stale: Vec<u64> = self
            .previous
            .iter()
            .copied()
            .filter(|key| !reached.contains(key))
            .collect();
        self.previous.clear();
        mem::swap(&mut self.previous, &mut self.current);

        let mut result = Ok(());
        let mut virtualized = 0_usize;
        for key in stale {
            let Some(element) = self.record_mut(key).and_then(|record| record.element.take())
            else {
                continue;
            };
            virtualized += 1;
            let outcome = virtualize(tree, element);
            if result.is_ok() {
                result = outcome;
            }
        }
        tracing::trace!(
            realized = self.previous.len(),
            virtualized,
            "finished realization pass"
        );
        result
    }
}

fn realize(tree: &mut ElementTree, owner: ElementId, record: &mut Record) -> Result<ElementId> {
    if let Some(element) = record.element
        && tree.contains(element)
    {
        return Ok(element);
    }
    let element = (record.template)(tree, &record.item)?;
    tree.set_data_context(element, Some(record.item.clone()))?;
    tree.set_parent(element, Some(owner))?;
    tree.invalidate_measure(owner);
    record.element = Some(element);
    Ok(element)
}

fn virtualize(tree: &mut ElementTree, element: ElementId) -> Result<()> {
    if !tree.contains(element) {
        return Ok(());
    }
    let data_context = tree.properties().layout.data_context;
    tree.clear_value(element, data_context)?;
    tree.set_parent(element, None)?;
    tree.remove(element)?;
    Ok(())
}

/// Walks a [`VirtualizingCollection`] from a start index, realizing items.
///
/// Yields the element of each item in order. [`finish`](Self::finish) ends
/// the pass and virtualizes whatever the previous pass realized but this one
/// did not reach. A cursor dropped without finishing does the same and logs
/// any failure.
pub struct Cursor<'a> {
    collection: &'a mut VirtualizingCollection,
    tree: &'a mut ElementTree,
    owner: ElementId,
    index: usize,
    finished: bool,
}

impl Cursor<'_> {
    /// The tree, for measuring the yielded elements.
    pub fn tree(&mut self) -> &mut ElementTree {
        self.tree
    }

    /// Index of the next item.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Ends the pass.
    ///
    /// # Errors
    ///
    /// The first failure to detach or free an element that left the window.
    /// The rest are still virtualized.
    pub fn finish(mut self) -> Result<()> {
        self.finished = true;
        self.collection.finish_pass(self.tree)
    }
}

impl Iterator for Cursor<'_> {
    type Item = Result<ElementId>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.collection.records.get_mut(self.index)?;
        self.index += 1;
        let element = realize(self.tree, self.owner, record);
        if element.is_ok() {
            self.collection.current.push(record.key);
        }
        Some(element)
    }
}

impl Drop for Cursor<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(error) = self.collection.finish_pass(self.tree) {
            tracing::warn!(owner = ?self.owner, %error, "virtualizing failed");
        }
    }
}

impl core::fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Cursor")
            .field("owner", &self.owner)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl ItemsHost for VirtualizingCollection {
    fn insert_item(
        &mut self,
        cx: &mut ElementCx<'_>,
        index: usize,
        item: DataContext,
        template: Option<Template>,
    ) -> Result<()> {
        self.insert(cx, index, item, template)
    }

    fn remove_item(&mut self, cx: &mut ElementCx<'_>, index: usize) -> Result<()> {
        self.remove_at(cx, index).map(|_| ())
    }

    fn move_item(
        &mut self,
        cx: &mut ElementCx<'_>,
        old_index: usize,
        new_index: usize,
    ) -> Result<()> {
        Self::move_item(self, cx, old_index, new_index)
    }

    fn clear_items(&mut self, cx: &mut ElementCx<'_>) -> Result<()> {
        self.clear(cx)
    }

    fn item_count(&self) -> usize {
        self.len()
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use core::cell::Cell;

    use understory_binding::{Binding, BindingError, ResolutionMode, Sink};

    use super::*;
    use crate::collection::template;
    use crate::element::Element;

    struct Leaf;

    impl Element for Leaf {}

    #[derive(Default)]
    struct Host {
        items: VirtualizingCollection,
    }

    impl Element for Host {}

    fn host_with(tree: &mut ElementTree, count: u32, built: &Rc<Cell<u32>>) -> ElementId {
        let host = tree.insert(Host::default());
        let built = built.clone();
        let row = template(move |tree, _item| {
            built.set(built.get() + 1);
            Ok(tree.insert(Leaf))
        });
        tree.with_element::<Host, _>(host, |host, cx| {
            for n in 0..count {
                host.items
                    .push(cx, DataContext::from_value(n), Some(row.clone()))
                    .unwrap();
            }
        })
        .unwrap();
        host
    }

    fn pass(
        tree: &mut ElementTree,
        host: ElementId,
        range: core::ops::Range<usize>,
    ) -> Vec<ElementId> {
        tree.with_element::<Host, _>(host, |host, cx| {
            let owner = cx.id();
            host.items
                .cursor(cx.tree_mut(), owner, range.start)
                .take(range.len())
                .collect::<Result<Vec<_>>>()
                .unwrap()
        })
        .unwrap()
    }

    #[test]
    fn sliding_window_keeps_the_overlap() {
        let built = Rc::new(Cell::new(0));
        let mut tree = ElementTree::new();
        let host = host_with(&mut tree, 10, &built);

        let first = pass(&mut tree, host, 0..5);
        assert_eq!(built.get(), 5);
        let second = pass(&mut tree, host, 3..8);
        assert_eq!(built.get(), 8);

        assert_eq!(&first[3..5], &second[0..2]);
        for element in &first[0..3] {
            assert!(!tree.contains(*element));
        }
        let items = &tree.element::<Host>(host).unwrap().items;
        assert!((0..3).all(|index| !items.is_realized(index)));
        assert!((3..8).all(|index| items.is_realized(index)));
        assert!((8..10).all(|index| !items.is_realized(index)));
        assert_eq!(items.realized().collect::<Vec<_>>(), second);
    }

    #[test]
    fn realized_elements_get_context_and_parent() {
        let built = Rc::new(Cell::new(0));
        let mut tree = ElementTree::new();
        let host = host_with(&mut tree, 3, &built);
        let elements = pass(&mut tree, host, 1..3);
        assert_eq!(tree.parent(elements[0]), Some(host));
        let context = tree.data_context(elements[1]).unwrap();
        assert_eq!(context.downcast::<u32>().as_deref(), Some(&2));
    }

    #[test]
    fn same_window_does_not_rebuild() {
        let built = Rc::new(Cell::new(0));
        let mut tree = ElementTree::new();
        let host = host_with(&mut tree, 4, &built);
        let first = pass(&mut tree, host, 0..4);
        let second = pass(&mut tree, host, 0..4);
        assert_eq!(first, second);
        assert_eq!(built.get(), 4);
    }

    #[test]
    fn removing_a_realized_item_frees_its_element() {
        let built = Rc::new(Cell::new(0));
        let mut tree = ElementTree::new();
        let host = host_with(&mut tree, 3, &built);
        let elements = pass(&mut tree, host, 0..3);
        tree.with_element::<Host, _>(host, |host, cx| host.items.remove_at(cx, 1))
            .unwrap()
            .unwrap();
        assert!(!tree.contains(elements[1]));
        let items = &tree.element::<Host>(host).unwrap().items;
        assert_eq!(items.len(), 2);
        assert_eq!(items.realized().collect::<Vec<_>>(), [elements[0], elements[2]]);
    }

    #[test]
    fn moves_reinsert_unrealized() {
        let built = Rc::new(Cell::new(0));
        let mut tree = ElementTree::new();
        let host = host_with(&mut tree, 3, &built);
        pass(&mut tree, host, 0..3);
        tree.with_element::<Host, _>(host, |host, cx| host.items.move_item(cx, 0, 2))
            .unwrap()
            .unwrap();
        let items = &tree.element::<Host>(host).unwrap().items;
        assert!(!items.is_realized(2));
        let moved = items.item(2).unwrap().downcast::<u32>();
        assert_eq!(moved.as_deref(), Some(&0));
    }

    #[test]
    fn lookups_follow_inserts_and_removals() {
        let built = Rc::new(Cell::new(0));
        let mut tree = ElementTree::new();
        let host = host_with(&mut tree, 3, &built);
        let elements = pass(&mut tree, host, 0..3);
        let row = template(|tree, _item| Ok(tree.insert(Leaf)));
        tree.with_element::<Host, _>(host, |host, cx| {
            host.items.insert(cx, 0, DataContext::from_value(9_u32), Some(row))?;
            host.items.remove_at(cx, 2).map(|_| ())
        })
        .unwrap()
        .unwrap();

        let items = &tree.element::<Host>(host).unwrap().items;
        assert_eq!(items.realized().collect::<Vec<_>>(), [elements[0], elements[2]]);
        assert_eq!(items.element(1), Some(elements[0]));
        assert_eq!(items.element(2), Some(elements[2]));

        // The shifted records are found again without rebuilding.
        assert_eq!(pass(&mut tree, host, 1..3), [elements[0], elements[2]]);
        assert_eq!(built.get(), 3);
        assert!(!tree.element::<Host>(host).unwrap().items.is_realized(0));
    }

    /// Refuses to see its data context cleared.
    struct KeepContext;

    impl Binding<Option<DataContext>> for KeepContext {
        fn mode(&self) -> ResolutionMode {
            ResolutionMode::Immediate
        }

        fn resolve(
            &mut self,
            _context: Option<&DataContext>,
            _current: &Option<DataContext>,
            _sink: &Sink<Option<DataContext>>,
        ) -> core::result::Result<(), BindingError> {
            Ok(())
        }

        fn target_changed(
            &mut self,
            value: &Option<DataContext>,
        ) -> core::result::Result<(), BindingError> {
            match value {
                Some(_) => Ok(()),
                None => Err(BindingError::ReadOnly {
                    property: "DataContext",
                }),
            }
        }

        fn dispose(&mut self) {}

        fn is_disposed(&self) -> bool {
            false
        }
    }

    #[test]
    fn detach_failures_are_reported() {
        let mut tree = ElementTree::new();
        let host = tree.insert(Host::default());
        let row = template(|tree, _item| {
            let leaf = tree.insert(Leaf);
            let data_context = tree.properties().layout.data_context;
            tree.bind(leaf, data_context, KeepContext)?;
            Ok(leaf)
        });
        tree.with_element::<Host, _>(host, |host, cx| {
            host.items.push(cx, DataContext::from_value(1_u8), Some(row))
        })
        .unwrap()
        .unwrap();
        let elements = pass(&mut tree, host, 0..1);

        let removed = tree
            .with_element::<Host, _>(host, |host, cx| host.items.remove_at(cx, 0).map(|_| ()))
            .unwrap();
        assert_eq!(
            removed,
            Err(LayoutError::Binding(BindingError::ReadOnly {
                property: "DataContext"
            }))
        );
        // The item is gone even though its element could not be detached.
        assert!(tree.element::<Host>(host).unwrap().items.is_empty());
        assert!(tree.contains(elements[0]));
    }

    #[test]
    fn items_need_a_template() {
        let mut tree = ElementTree::new();
        let host = tree.insert(Host::default());
        let result = tree
            .with_element::<Host, _>(host, |host, cx| {
                host.items.push(cx, DataContext::from_value(1_u8), None)
            })
            .unwrap();
        assert_eq!(result, Err(LayoutError::MissingTemplate));
    }
}
