// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frames driven end to end: gestures in, draw calls out.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use kurbo::{Point, Rect, Size, Vec2};
use peniko::{Brush, Color};
use understory_layout::{
    Border, Button, DrawCommand, DrawingSurface, Element, ElementCx, ElementId, Font, Gesture,
    GestureKind, HorizontalAlignment, ImageSource, Result, RootElement, RootOptions,
    ScrollContentPresenter, ScrollViewer, TextBlock, Thickness, VerticalAlignment,
};

/// Records every call instead of drawing.
#[derive(Debug, Default)]
struct RecordingSurface {
    clips: Vec<Option<Rect>>,
    commands: Vec<DrawCommand>,
}

impl DrawingSurface for RecordingSurface {
    fn set_clip(&mut self, clip: Option<Rect>) {
        self.clips.push(clip);
    }

    fn draw_rectangle(&mut self, rect: Rect, brush: &Brush) {
        self.commands.push(DrawCommand::Rectangle {
            rect,
            brush: brush.clone(),
        });
    }

    fn draw_image(&mut self, source: &ImageSource, rect: Rect) {
        self.commands.push(DrawCommand::Image {
            source: *source,
            rect,
        });
    }

    fn draw_text(&mut self, font: &Font, text: &str, origin: Point, brush: &Brush) {
        self.commands.push(DrawCommand::Text {
            font: font.clone(),
            text: text.to_owned(),
            origin,
            brush: brush.clone(),
        });
    }
}

/// Counts how often it is measured.
struct Counting {
    measures: Rc<Cell<u32>>,
}

impl Element for Counting {
    fn measure_override(&mut self, _cx: &mut ElementCx<'_>, _available: Size) -> Result<Size> {
        self.measures.set(self.measures.get() + 1);
        Ok(Size::new(10.0, 10.0))
    }
}

fn root(width: f64, height: f64) -> RootElement {
    RootElement::new(RootOptions::new(Rect::new(0.0, 0.0, width, height)))
}

/// An 80x30 button in the top-left corner of a 200x100 root.
fn button(clicks: &Rc<Cell<u32>>) -> (RootElement, ElementId) {
    let mut root = root(200.0, 100.0);
    let counter = clicks.clone();
    let tree = root.tree_mut();
    let button = tree.insert(Button::new().with_on_click(move |_cx| {
        counter.set(counter.get() + 1);
        Ok(())
    }));
    let layout = tree.properties().layout;
    tree.set_value(button, layout.width, 80.0).unwrap();
    tree.set_value(button, layout.height, 30.0).unwrap();
    tree.set_value(button, layout.horizontal_alignment, HorizontalAlignment::Left)
        .unwrap();
    tree.set_value(button, layout.vertical_alignment, VerticalAlignment::Top)
        .unwrap();
    let label = tree.insert(TextBlock::new());
    tree.with_element::<Button, _>(button, |button, cx| button.set_content(cx, Some(label)))
        .unwrap()
        .unwrap();
    root.set_content(Some(button)).unwrap();
    root.update().unwrap();
    (root, button)
}

fn is_pressed(root: &RootElement, button: ElementId) -> bool {
    let pressed = root.tree().properties().button.is_pressed;
    *root.tree().get(button, pressed).unwrap()
}

fn at(kind: GestureKind, x: f64, y: f64) -> Gesture {
    Gesture::new(kind, Point::new(x, y))
}

#[test]
fn press_drag_out_and_back_then_release_clicks() {
    let clicks = Rc::new(Cell::new(0));
    let (mut root, button) = button(&clicks);

    assert_eq!(
        root.route_gesture(&at(GestureKind::ButtonDown, 10.0, 10.0))
            .unwrap(),
        Some(button)
    );
    assert_eq!(root.captured(), Some(button));
    assert!(is_pressed(&root, button));

    // Outside the button, but the capture still routes to it.
    assert_eq!(
        root.route_gesture(&at(GestureKind::Move, 150.0, 80.0)).unwrap(),
        Some(button)
    );
    assert!(!is_pressed(&root, button));

    root.route_gesture(&at(GestureKind::Move, 20.0, 20.0)).unwrap();
    assert!(is_pressed(&root, button));

    root.route_gesture(&at(GestureKind::ButtonUp, 20.0, 20.0))
        .unwrap();
    assert_eq!(clicks.get(), 1);
    assert_eq!(root.captured(), None);
    assert!(!is_pressed(&root, button));
}

#[test]
fn releasing_outside_does_not_click() {
    let clicks = Rc::new(Cell::new(0));
    let (mut root, _button) = button(&clicks);
    let mut input = VecDeque::from([
        at(GestureKind::ButtonDown, 10.0, 10.0),
        at(GestureKind::Move, 150.0, 80.0),
        at(GestureKind::ButtonUp, 150.0, 80.0),
        at(GestureKind::Tap, 10.0, 10.0),
        at(GestureKind::Tap, 150.0, 80.0),
    ]);
    root.update_with_input(&mut input).unwrap();
    assert!(input.is_empty());
    // Only the tap on the button clicked.
    assert_eq!(clicks.get(), 1);
    assert_eq!(root.captured(), None);
}

#[test]
fn dragging_scrolls_the_presenter() {
    let mut root = root(100.0, 100.0);
    let measures = Rc::new(Cell::new(0));
    let tree = root.tree_mut();
    let presenter = tree.insert(ScrollContentPresenter::new());
    let content = tree.insert(Counting {
        measures: measures.clone(),
    });
    let layout = tree.properties().layout;
    tree.set_value(content, layout.height, 300.0).unwrap();
    tree.with_element::<ScrollContentPresenter, _>(presenter, |p, cx| {
        p.set_content(cx, Some(content))
    })
    .unwrap()
    .unwrap();
    root.set_content(Some(presenter)).unwrap();

    let mut input = VecDeque::from([
        at(GestureKind::ButtonDown, 50.0, 50.0),
        Gesture::drag(Point::new(50.0, 20.0), Vec2::new(0.0, -30.0)),
        at(GestureKind::ButtonUp, 50.0, 20.0),
    ]);
    root.update_with_input(&mut input).unwrap();
    assert_eq!(root.captured(), None);
    root.update().unwrap();

    let p = root.tree().element::<ScrollContentPresenter>(presenter).unwrap();
    assert_eq!(p.offset(), Vec2::new(0.0, 30.0));
    assert_eq!(
        root.tree().layout(content).unwrap().visual_offset(),
        Vec2::new(0.0, -30.0)
    );
    // Scrolling re-arranges without measuring again.
    assert_eq!(measures.get(), 1);
}

#[test]
fn the_viewer_owns_the_drag() {
    let mut root = root(100.0, 100.0);
    let measures = Rc::new(Cell::new(0));
    let tree = root.tree_mut();
    let viewer = tree.insert(ScrollViewer::new());
    let content = tree.insert(Counting {
        measures: measures.clone(),
    });
    let layout = tree.properties().layout;
    tree.set_value(content, layout.height, 300.0).unwrap();
    tree.with_element::<ScrollViewer, _>(viewer, |v, cx| v.set_content(cx, Some(content)))
        .unwrap()
        .unwrap();
    root.set_content(Some(viewer)).unwrap();

    let mut input = VecDeque::from([
        at(GestureKind::ButtonDown, 50.0, 50.0),
        Gesture::drag(Point::new(50.0, 20.0), Vec2::new(0.0, -30.0)),
    ]);
    root.update_with_input(&mut input).unwrap();
    assert_eq!(root.captured(), Some(viewer));

    let mut input = VecDeque::from([at(GestureKind::ButtonUp, 50.0, 20.0)]);
    root.update_with_input(&mut input).unwrap();
    assert_eq!(root.captured(), None);
    root.update().unwrap();

    let v = root.tree().element::<ScrollViewer>(viewer).unwrap();
    assert_eq!(v.offset(root.tree()), Vec2::new(0.0, 30.0));
    assert_eq!(v.extent(root.tree()), Size::new(10.0, 300.0));
    assert_eq!(
        root.tree().layout(content).unwrap().visual_offset(),
        Vec2::new(0.0, -30.0)
    );
    assert_eq!(measures.get(), 1);
}

#[test]
fn settled_frames_measure_once() {
    let mut root = root(50.0, 50.0);
    let measures = Rc::new(Cell::new(0));
    let counting = root.tree_mut().insert(Counting {
        measures: measures.clone(),
    });
    root.set_content(Some(counting)).unwrap();
    root.update().unwrap();
    root.update().unwrap();
    assert_eq!(measures.get(), 1);

    let margin = root.tree().properties().layout.margin;
    root.tree_mut()
        .set_value(counting, margin, Thickness::uniform(2.0))
        .unwrap();
    root.update().unwrap();
    assert_eq!(measures.get(), 2);
}

#[test]
fn draw_replays_in_paint_order_at_absolute_offsets() {
    let mut root = root(100.0, 50.0);
    let tree = root.tree_mut();
    let border = tree.insert(Border::new());
    let props = tree.properties();
    tree.set_value(border, props.border.border_thickness, Thickness::uniform(2.0))
        .unwrap();
    tree.set_value(
        border,
        props.border.border_brush,
        Some(Brush::Solid(Color::from_rgb8(0, 0, 255))),
    )
    .unwrap();
    tree.set_value(
        border,
        props.border.background,
        Some(Brush::Solid(Color::from_rgb8(255, 0, 0))),
    )
    .unwrap();
    let label = tree.insert(TextBlock::new());
    tree.set_value(label, props.text_block.text, "hi".to_owned())
        .unwrap();
    tree.with_element::<Border, _>(border, |border, cx| border.set_child(cx, Some(label)))
        .unwrap()
        .unwrap();
    root.set_content(Some(border)).unwrap();
    root.update().unwrap();

    let painted: Vec<ElementId> = root
        .renderer()
        .entries()
        .iter()
        .map(|entry| entry.element)
        .collect();
    assert_eq!(painted, [root.root(), border, label]);

    let mut surface = RecordingSurface::default();
    root.draw(&mut surface);
    let rectangles = surface
        .commands
        .iter()
        .filter(|command| matches!(command, DrawCommand::Rectangle { .. }))
        .count();
    assert_eq!(rectangles, 5);
    match surface.commands.last() {
        Some(DrawCommand::Text { text, origin, .. }) => {
            assert_eq!(text, "hi");
            assert_eq!(*origin, Point::new(2.0, 2.0));
        }
        other => panic!("expected text last, got {other:?}"),
    }
    assert!(surface.clips.iter().all(Option::is_none));
}
