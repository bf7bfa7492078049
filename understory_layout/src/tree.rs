// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The element arena.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use core::any::type_name;
use core::fmt;

use kurbo::{Point, Rect, Vec2};
use smallvec::SmallVec;
use understory_binding::DataContext;
use understory_property::{
    Invalidation, Property, PropertyChanged, PropertyRegistry, PropertyStore, walk_inherited,
};

use crate::binding::{BindingSlot, PendingWrites};
use crate::element::{ChildList, Element, ElementCx, as_any, as_any_mut};
use crate::error::{LayoutError, Result};
use crate::id::ElementId;
use crate::layout::LayoutState;
use crate::properties::Properties;
use crate::render::DrawingContext;
use crate::text::{MonospaceMeasurer, TextMeasurer};

pub(crate) struct ElementData {
    pub(crate) store: PropertyStore<ElementId>,
    pub(crate) parent: Option<ElementId>,
    pub(crate) layout: LayoutState,
    pub(crate) bindings: SmallVec<[BindingSlot; 2]>,
    pub(crate) drawing: DrawingContext,
}

struct Node {
    data: ElementData,
    /// `None` while a callback on the element is running.
    element: Option<Box<dyn Element>>,
    type_name: &'static str,
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Owns every element together with its properties, layout state and
/// bindings.
///
/// Elements are addressed by [`ElementId`]. Freed slots are reused with a
/// bumped generation, so ids of removed elements go stale instead of aliasing
/// new ones. Every operation taking an id reports stale ids with
/// [`LayoutError::StaleElement`] or treats them as absent.
///
/// ```rust
/// use kurbo::{Rect, Size};
/// use understory_layout::{ElementTree, TextBlock};
///
/// let mut tree = ElementTree::new();
/// let text = tree.properties().text_block.text;
/// let label = tree.insert(TextBlock::new());
/// tree.set_value(label, text, "hello".to_string()).unwrap();
///
/// let desired = tree.measure(label, Size::new(f64::INFINITY, f64::INFINITY)).unwrap();
/// tree.arrange(label, Rect::from_origin_size((0.0, 0.0), desired)).unwrap();
/// assert_eq!(tree.layout(label).unwrap().render_size(), desired);
/// ```
pub struct ElementTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
    pub(crate) registry: PropertyRegistry,
    properties: Properties,
    pub(crate) pending: PendingWrites,
    text_measurer: Rc<dyn TextMeasurer>,
    arranged: bool,
    empty_layout: LayoutState,
}

impl ElementTree {
    /// Creates an empty tree measuring text with [`MonospaceMeasurer`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_text_measurer(Rc::new(MonospaceMeasurer::default()))
    }

    /// Creates an empty tree with a host text measurer.
    #[must_use]
    pub fn with_text_measurer(text_measurer: Rc<dyn TextMeasurer>) -> Self {
        let mut registry = PropertyRegistry::new();
        let properties = Properties::register(&mut registry);
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
            registry,
            properties,
            pending: PendingWrites::default(),
            text_measurer,
            arranged: false,
            empty_layout: LayoutState::default(),
        }
    }

    /// The built-in property handles.
    #[must_use]
    #[inline]
    pub fn properties(&self) -> Properties {
        self.properties
    }

    /// The property registry, for reading metadata.
    #[must_use]
    pub fn registry(&self) -> &PropertyRegistry {
        &self.registry
    }

    /// The property registry, for registering application properties.
    pub fn registry_mut(&mut self) -> &mut PropertyRegistry {
        &mut self.registry
    }

    /// The text measurer handed to text-bearing elements.
    #[must_use]
    pub fn text_measurer(&self) -> &Rc<dyn TextMeasurer> {
        &self.text_measurer
    }

    /// Returns the number of live elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the tree holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Adds a detached element and returns its id.
    pub fn insert<E: Element>(&mut self, element: E) -> ElementId {
        let (idx, generation) = match self.free.pop() {
            Some(idx) => {
                let slot = &mut self.slots[idx as usize];
                slot.generation = slot.generation.wrapping_add(1);
                (idx, slot.generation)
            }
            None => {
                let idx = u32::try_from(self.slots.len())
                    .unwrap_or_else(|_| panic!("element tree exceeded u32::MAX slots"));
                self.slots.push(Slot {
                    generation: 1,
                    node: None,
                });
                (idx, 1)
            }
        };
        let id = ElementId::new(idx, generation);
        self.slots[idx as usize].node = Some(Node {
            data: ElementData {
                store: PropertyStore::new(id),
                parent: None,
                layout: LayoutState::default(),
                bindings: SmallVec::new(),
                drawing: DrawingContext::new(),
            },
            element: Some(Box::new(element)),
            type_name: type_name::<E>(),
        });
        self.len += 1;
        tracing::trace!(element = ?id, kind = type_name::<E>(), "inserted element");
        id
    }

    /// Returns `true` if `id` refers to a live element.
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.node(id).is_some()
    }

    /// Removes `id` and its visual subtree, disposing their bindings.
    ///
    /// The former parent's measure is invalidated. The caller is responsible
    /// for dropping `id` from the parent's own child list.
    ///
    /// # Errors
    ///
    /// [`LayoutError::StaleElement`] if `id` is not live.
    pub fn remove(&mut self, id: ElementId) -> Result<()> {
        let parent = self.data(id)?.parent;
        let mut stack = vec![id];
        let mut removed = 0_usize;
        while let Some(next) = stack.pop() {
            stack.extend(self.attached_children(next));
            if let Some(mut node) = self.take_node(next) {
                for (_, binding) in &mut node.data.bindings {
                    binding.dispose();
                }
                removed += 1;
            }
        }
        tracing::debug!(element = ?id, removed, "removed subtree");
        if let Some(parent) = parent {
            self.invalidate_measure(parent);
        }
        Ok(())
    }

    /// Children whose parent link points at `id`.
    ///
    /// An element detached for a callback cannot list its children, so the
    /// arena is searched for parent links instead.
    fn attached_children(&self, id: ElementId) -> ChildList {
        match self.node(id) {
            Some(node) if node.element.is_some() => self
                .children(id)
                .into_iter()
                .filter(|child| self.parent(*child) == Some(id))
                .collect(),
            Some(_) => self
                .slots
                .iter()
                .enumerate()
                .filter_map(|(idx, slot)| {
                    let node = slot.node.as_ref()?;
                    let idx = u32::try_from(idx).ok()?;
                    (node.data.parent == Some(id)).then(|| ElementId::new(idx, slot.generation))
                })
                .collect(),
            None => ChildList::new(),
        }
    }

    fn take_node(&mut self, id: ElementId) -> Option<Node> {
        let slot = self.slots.get_mut(id.idx())?;
        if slot.generation != id.generation() {
            return None;
        }
        let node = slot.node.take()?;
        self.free.push(id.slot());
        self.len -= 1;
        Some(node)
    }

    /// Returns the parent of `id`, if it is attached.
    #[must_use]
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.node(id).and_then(|node| node.data.parent)
    }

    /// Attaches `child` under `parent`, or detaches it with `None`.
    ///
    /// Only the parent link is changed; the parent element's own child list
    /// is not. If `child` has no local data context, it and every descendant
    /// that inherits its context get their measure invalidated.
    ///
    /// # Errors
    ///
    /// [`LayoutError::StaleElement`] if either id is not live.
    pub fn set_parent(&mut self, child: ElementId, parent: Option<ElementId>) -> Result<()> {
        if let Some(parent) = parent
            && !self.contains(parent)
        {
            return Err(LayoutError::StaleElement(parent));
        }
        let data_context = self.properties.layout.data_context;
        let data = self.data_mut(child)?;
        if data.parent == parent {
            return Ok(());
        }
        let inherits = !data.store.has_local(data_context);
        data.parent = parent;
        if inherits {
            self.invalidate_context_inheritors(child);
        } else {
            self.invalidate_measure(child);
        }
        Ok(())
    }

    /// Returns the visual children of `id`, or nothing if it is stale or
    /// currently detached for a callback.
    #[must_use]
    pub fn children(&self, id: ElementId) -> ChildList {
        self.node(id)
            .and_then(|node| node.element.as_deref())
            .map(Element::visual_children)
            .unwrap_or_default()
    }

    /// Returns the Rust type name of the element at `id`.
    #[must_use]
    pub fn type_name(&self, id: ElementId) -> Option<&'static str> {
        self.node(id).map(|node| node.type_name)
    }

    /// Borrows the element at `id` as a `T`.
    #[must_use]
    pub fn element<T: Element>(&self, id: ElementId) -> Option<&T> {
        let element = self.node(id)?.element.as_deref()?;
        as_any(element).downcast_ref()
    }

    /// Runs `f` with the element at `id` as a `T` and a context for the rest
    /// of the tree.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::StaleElement`] if `id` is not live.
    /// - [`LayoutError::ElementBusy`] if a callback on `id` is running.
    /// - [`LayoutError::ElementType`] if the element is not a `T`.
    pub fn with_element<T: Element, R>(
        &mut self,
        id: ElementId,
        f: impl FnOnce(&mut T, &mut ElementCx<'_>) -> R,
    ) -> Result<R> {
        self.with_detached(id, |element, mut cx| {
            as_any_mut(element)
                .downcast_mut::<T>()
                .map(|element| f(element, &mut cx))
                .ok_or(LayoutError::ElementType {
                    element: id,
                    expected: type_name::<T>(),
                })
        })?
    }

    /// Takes the element out of its slot for the duration of `f`.
    ///
    /// If `f` removes the element, it is dropped afterwards.
    pub(crate) fn with_detached<R>(
        &mut self,
        id: ElementId,
        f: impl FnOnce(&mut dyn Element, ElementCx<'_>) -> R,
    ) -> Result<R> {
        let node = self.node_mut(id).ok_or(LayoutError::StaleElement(id))?;
        let mut element = node.element.take().ok_or(LayoutError::ElementBusy(id))?;
        let result = f(element.as_mut(), ElementCx::new(self, id));
        if let Some(node) = self.node_mut(id) {
            node.element = Some(element);
        }
        Ok(result)
    }

    /// Reads the effective value of `property` on `id`.
    ///
    /// # Errors
    ///
    /// [`LayoutError::StaleElement`] if `id` is not live.
    ///
    /// # Panics
    ///
    /// Panics if `property` is not registered in this tree.
    pub fn get<T: Clone + 'static>(&self, id: ElementId, property: Property<T>) -> Result<&T> {
        Ok(self.data(id)?.store.get(property, &self.registry))
    }

    /// Returns `true` if `property` is set explicitly on `id`.
    #[must_use]
    pub fn has_local<T: Clone + 'static>(&self, id: ElementId, property: Property<T>) -> bool {
        self.data(id)
            .is_ok_and(|data| data.store.has_local(property))
    }

    /// Writes `property` on `id`.
    ///
    /// An actual change invalidates measure or arrange according to the
    /// property's metadata, and is reported to a binding on the property so
    /// two-way bindings can write back. Returns the change, or `None` if the
    /// value was equal to the current one.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::StaleElement`] if `id` is not live.
    /// - [`LayoutError::Binding`] if the write back to a source failed. The
    ///   property keeps the new value.
    ///
    /// # Panics
    ///
    /// Panics if `property` is not registered in this tree.
    pub fn set_value<T: Clone + 'static>(
        &mut self,
        id: ElementId,
        property: Property<T>,
        value: T,
    ) -> Result<Option<PropertyChanged>> {
        self.write_value(id, property, value, true)
    }

    pub(crate) fn write_value<T: Clone + 'static>(
        &mut self,
        id: ElementId,
        property: Property<T>,
        value: T,
        notify_binding: bool,
    ) -> Result<Option<PropertyChanged>> {
        let registry = &self.registry;
        let node = Self::node_in(&mut self.slots, id).ok_or(LayoutError::StaleElement(id))?;
        let Some(change) = node.data.store.store_value(property, value, registry) else {
            return Ok(None);
        };
        self.after_change(id, property, &change, notify_binding)?;
        Ok(Some(change))
    }

    /// Removes the local value of `property` on `id`.
    ///
    /// # Errors
    ///
    /// [`LayoutError::StaleElement`] if `id` is not live.
    pub fn clear_value<T: Clone + 'static>(
        &mut self,
        id: ElementId,
        property: Property<T>,
    ) -> Result<Option<PropertyChanged>> {
        let registry = &self.registry;
        let node = Self::node_in(&mut self.slots, id).ok_or(LayoutError::StaleElement(id))?;
        let Some(change) = node.data.store.remove_value(property, registry) else {
            return Ok(None);
        };
        self.after_change(id, property, &change, true)?;
        Ok(Some(change))
    }

    /// Invalidates layout, then runs the changed callback, then tells the
    /// binding on the property.
    fn after_change<T: Clone + 'static>(
        &mut self,
        id: ElementId,
        property: Property<T>,
        change: &PropertyChanged,
        notify_binding: bool,
    ) -> Result<()> {
        let invalidation = change.invalidation();
        if invalidation.contains(Invalidation::MEASURE) {
            self.invalidate_measure(id);
        } else if invalidation.contains(Invalidation::ARRANGE) {
            self.invalidate_arrange(id);
        }
        if change.is(self.properties.layout.data_context) {
            self.invalidate_context_inheritors(id);
        }
        self.registry.run_changed_callback(property, change);
        if notify_binding {
            self.notify_binding_target(id, change)?;
        }
        Ok(())
    }

    /// Sets or clears the data context of `id`.
    ///
    /// `None` removes the local context so the element inherits again.
    ///
    /// # Errors
    ///
    /// [`LayoutError::StaleElement`] if `id` is not live.
    pub fn set_data_context(&mut self, id: ElementId, context: Option<DataContext>) -> Result<()> {
        let property = self.properties.layout.data_context;
        match context {
            Some(context) => self.set_value(id, property, Some(context)),
            None => self.clear_value(id, property),
        }
        .map(|_| ())
    }

    /// The nearest data context set on `id` or an ancestor.
    #[must_use]
    pub fn data_context(&self, id: ElementId) -> Option<DataContext> {
        let lookup = |key: ElementId| {
            self.node(key)
                .map(|node| (&node.data.store, node.data.parent))
        };
        walk_inherited(Some(id), self.properties.layout.data_context, &lookup)
            .and_then(Clone::clone)
    }

    fn invalidate_context_inheritors(&mut self, id: ElementId) {
        self.invalidate_measure(id);
        let property = self.properties.layout.data_context;
        for child in self.children(id) {
            if self.parent(child) == Some(id) && !self.has_local(child, property) {
                self.invalidate_context_inheritors(child);
            }
        }
    }

    /// Marks `id` and its ancestors as needing measure and arrange.
    ///
    /// Stale ids are ignored.
    pub fn invalidate_measure(&mut self, id: ElementId) {
        let mut next = Some(id);
        while let Some(id) = next {
            let Some(node) = self.node_mut(id) else {
                break;
            };
            node.data.layout.invalidate_measure();
            next = node.data.parent;
        }
    }

    /// Marks `id` and its ancestors as needing arrange.
    ///
    /// Stale ids are ignored.
    pub fn invalidate_arrange(&mut self, id: ElementId) {
        let mut next = Some(id);
        while let Some(id) = next {
            let Some(node) = self.node_mut(id) else {
                break;
            };
            node.data.layout.invalidate_arrange();
            next = node.data.parent;
        }
    }

    /// Layout results of `id`.
    #[must_use]
    pub fn layout(&self, id: ElementId) -> Option<&LayoutState> {
        self.node(id).map(|node| &node.data.layout)
    }

    /// Offset of `id` from the root of its tree.
    #[must_use]
    pub fn absolute_offset(&self, id: ElementId) -> Vec2 {
        let mut offset = Vec2::ZERO;
        let mut next = Some(id);
        while let Some(node) = next.and_then(|id| self.node(id)) {
            offset += node.data.layout.visual_offset();
            next = node.data.parent;
        }
        offset
    }

    /// Tests a root-space point against the arranged bounds of `id`.
    #[must_use]
    pub fn hit_test(&self, id: ElementId, point: Point) -> bool {
        let Some(layout) = self.layout(id) else {
            return false;
        };
        let origin = self.absolute_offset(id).to_point();
        Rect::from_origin_size(origin, layout.render_size()).contains(point)
    }

    /// Returns `true` if the element at `id` takes routed input.
    #[must_use]
    pub fn accepts_input(&self, id: ElementId) -> bool {
        self.node(id)
            .and_then(|node| node.element.as_deref())
            .is_some_and(Element::accepts_input)
    }

    /// Drawing commands recorded by the last arrange of `id`.
    #[must_use]
    pub fn drawing(&self, id: ElementId) -> Option<&DrawingContext> {
        self.node(id).map(|node| &node.data.drawing)
    }

    /// Returns whether any element was arranged since the last call.
    pub(crate) fn take_arranged(&mut self) -> bool {
        core::mem::take(&mut self.arranged)
    }

    pub(crate) fn mark_arranged(&mut self) {
        self.arranged = true;
    }

    pub(crate) fn value_or_default<T: Clone + 'static>(
        &self,
        id: ElementId,
        property: Property<T>,
    ) -> &T {
        match self.node(id) {
            Some(node) => node.data.store.get(property, &self.registry),
            None => match self.registry.get_metadata(property) {
                Some(metadata) => metadata.default_value(),
                None => panic!("Property {:?} not found in registry", property.id()),
            },
        }
    }

    pub(crate) fn layout_or_default(&self, id: ElementId) -> &LayoutState {
        self.layout(id).unwrap_or(&self.empty_layout)
    }

    pub(crate) fn layout_mut(&mut self, id: ElementId) -> Option<&mut LayoutState> {
        self.node_mut(id).map(|node| &mut node.data.layout)
    }

    pub(crate) fn set_drawing(&mut self, id: ElementId, drawing: DrawingContext) {
        if let Some(node) = self.node_mut(id) {
            node.data.drawing = drawing;
        }
    }

    pub(crate) fn data(&self, id: ElementId) -> Result<&ElementData> {
        self.node(id)
            .map(|node| &node.data)
            .ok_or(LayoutError::StaleElement(id))
    }

    pub(crate) fn data_mut(&mut self, id: ElementId) -> Result<&mut ElementData> {
        self.node_mut(id)
            .map(|node| &mut node.data)
            .ok_or(LayoutError::StaleElement(id))
    }

    fn node(&self, id: ElementId) -> Option<&Node> {
        let slot = self.slots.get(id.idx())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_ref()
    }

    fn node_mut(&mut self, id: ElementId) -> Option<&mut Node> {
        Self::node_in(&mut self.slots, id)
    }

    fn node_in(slots: &mut [Slot], id: ElementId) -> Option<&mut Node> {
        let slot = slots.get_mut(id.idx())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_mut()
    }
}

impl Default for ElementTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ElementTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementTree")
            .field("len", &self.len)
            .field("slots", &self.slots.len())
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Element;

    struct Leaf;

    impl Element for Leaf {}

    struct Pair {
        children: ChildList,
    }

    impl Element for Pair {
        fn visual_children(&self) -> ChildList {
            self.children.clone()
        }
    }

    fn pair(tree: &mut ElementTree) -> (ElementId, ElementId, ElementId) {
        let a = tree.insert(Leaf);
        let b = tree.insert(Leaf);
        let parent = tree.insert(Pair {
            children: ChildList::from_slice(&[a, b]),
        });
        tree.set_parent(a, Some(parent)).unwrap();
        tree.set_parent(b, Some(parent)).unwrap();
        (parent, a, b)
    }

    #[test]
    fn removed_ids_go_stale() {
        let mut tree = ElementTree::new();
        let first = tree.insert(Leaf);
        tree.remove(first).unwrap();
        let second = tree.insert(Leaf);
        assert_eq!(first.idx(), second.idx());
        assert_ne!(first, second);
        assert!(!tree.contains(first));
        assert_eq!(tree.remove(first), Err(LayoutError::StaleElement(first)));
        let width = tree.properties().layout.width;
        assert!(matches!(
            tree.set_value(first, width, 1.0),
            Err(LayoutError::StaleElement(id)) if id == first
        ));
    }

    #[test]
    fn remove_takes_the_subtree() {
        let mut tree = ElementTree::new();
        let (parent, a, b) = pair(&mut tree);
        assert_eq!(tree.len(), 3);
        tree.remove(parent).unwrap();
        assert!(tree.is_empty());
        assert!(!tree.contains(a) && !tree.contains(b));
    }

    #[test]
    fn data_context_is_inherited() {
        let mut tree = ElementTree::new();
        let (parent, a, b) = pair(&mut tree);
        let context = DataContext::from_value(5_u32);
        tree.set_data_context(parent, Some(context.clone())).unwrap();
        assert_eq!(tree.data_context(a), Some(context.clone()));

        let own = DataContext::from_value(6_u32);
        tree.set_data_context(b, Some(own.clone())).unwrap();
        assert_eq!(tree.data_context(b), Some(own));

        tree.set_data_context(b, None).unwrap();
        assert_eq!(tree.data_context(b), Some(context));
        tree.set_parent(b, None).unwrap();
        assert_eq!(tree.data_context(b), None);
    }

    #[test]
    fn element_downcasts() {
        let mut tree = ElementTree::new();
        let leaf = tree.insert(Leaf);
        assert!(tree.element::<Leaf>(leaf).is_some());
        assert!(tree.element::<Pair>(leaf).is_none());
        let err = tree.with_element::<Pair, _>(leaf, |_, _| ()).unwrap_err();
        assert!(matches!(err, LayoutError::ElementType { .. }));
    }

    #[test]
    fn reentry_is_reported() {
        let mut tree = ElementTree::new();
        let leaf = tree.insert(Leaf);
        let inner = tree
            .with_element::<Leaf, _>(leaf, |_, cx| {
                cx.tree_mut().with_element::<Leaf, _>(leaf, |_, _| ())
            })
            .unwrap();
        assert_eq!(inner, Err(LayoutError::ElementBusy(leaf)));
    }

    #[test]
    fn callbacks_may_remove_their_element() {
        let mut tree = ElementTree::new();
        let leaf = tree.insert(Leaf);
        tree.with_element::<Leaf, _>(leaf, |_, cx| cx.tree_mut().remove(leaf))
            .unwrap()
            .unwrap();
        assert!(!tree.contains(leaf));
        assert!(tree.is_empty());
    }

    #[test]
    fn self_removal_takes_the_subtree() {
        let mut tree = ElementTree::new();
        let (parent, a, b) = pair(&mut tree);
        tree.with_element::<Pair, _>(parent, |_, cx| cx.tree_mut().remove(parent))
            .unwrap()
            .unwrap();
        assert!(!tree.contains(a) && !tree.contains(b));
        assert!(tree.is_empty());
    }

    #[test]
    fn changed_callbacks_run_once_per_tree_write() {
        use core::cell::Cell;

        use understory_property::PropertyMetadataBuilder;

        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let mut tree = ElementTree::new();
        let score = tree.registry_mut().register(
            "Score",
            PropertyMetadataBuilder::new(0_i32)
                .invalidates(Invalidation::MEASURE)
                .on_changed(move |_, _| counter.set(counter.get() + 1))
                .build(),
        );
        let leaf = tree.insert(Leaf);
        tree.measure(leaf, kurbo::Size::ZERO).unwrap();
        tree.set_value(leaf, score, 3).unwrap();
        tree.set_value(leaf, score, 3).unwrap();
        assert_eq!(calls.get(), 1);
        assert!(!tree.layout(leaf).unwrap().is_measure_valid());
        tree.clear_value(leaf, score).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn the_binding_hears_of_a_write_after_the_callback() {
        use alloc::vec::Vec;
        use core::cell::RefCell;

        use understory_binding::{Binding, BindingError, DataContext, ResolutionMode, Sink};
        use understory_property::PropertyMetadataBuilder;

        type Log = Rc<RefCell<Vec<&'static str>>>;

        struct Logging(Log);

        impl Binding<i32> for Logging {
            fn mode(&self) -> ResolutionMode {
                ResolutionMode::Immediate
            }

            fn resolve(
                &mut self,
                _context: Option<&DataContext>,
                _current: &i32,
                _sink: &Sink<i32>,
            ) -> core::result::Result<(), BindingError> {
                Ok(())
            }

            fn target_changed(&mut self, _value: &i32) -> core::result::Result<(), BindingError> {
                self.0.borrow_mut().push("binding");
                Ok(())
            }

            fn dispose(&mut self) {}

            fn is_disposed(&self) -> bool {
                false
            }
        }

        let log: Log = Rc::default();
        let callback_log = log.clone();
        let mut tree = ElementTree::new();
        let score = tree.registry_mut().register(
            "Score",
            PropertyMetadataBuilder::new(0_i32)
                .on_changed(move |_, _| callback_log.borrow_mut().push("callback"))
                .build(),
        );
        let leaf = tree.insert(Leaf);
        tree.bind(leaf, score, Logging(log.clone())).unwrap();
        tree.set_value(leaf, score, 5).unwrap();
        assert_eq!(*log.borrow(), ["callback", "binding"]);
    }
}
