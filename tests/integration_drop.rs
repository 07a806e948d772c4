use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::event::KeyModifiers;
use drag_drop::constants::{
    ATTR_COPIED_NODE, ATTR_EFFECT_ALLOWED, CLASS_DROP_ACTIVE, CLASS_HIDDEN_SOURCE, CLASS_OPACITY,
    STYLE_POSITION,
};
use drag_drop::geometry::{Point, Rect, Size};
use drag_drop::{
    DragEngine, DragEvent, DraggableConfig, DropzoneAccept, DropzoneConfig, EffectAllowed,
    EffectMode, ElementId, MemoryDocument, Phase, PointerEvent, Stage, VisualTree,
};

type Log = Rc<RefCell<Vec<DragEvent>>>;

fn doc() -> MemoryDocument {
    MemoryDocument::new(Size::new(800, 600))
}

fn engine() -> DragEngine {
    let mut engine = DragEngine::default();
    engine.init();
    engine
}

/// Creates a `div` under `parent`, or under the document root.
fn create(doc: &mut MemoryDocument, parent: Option<ElementId>, rect: Rect) -> ElementId {
    let parent = parent.unwrap_or_else(|| doc.root());
    doc.create(parent, "div", rect).unwrap()
}

fn zone(doc: &mut MemoryDocument, rect: Rect, config: DropzoneConfig) -> ElementId {
    let el = create(doc, None, rect);
    config.apply(doc, el);
    el
}

fn record(engine: &mut DragEngine, phases: &[Phase]) -> Log {
    let log: Log = Rc::default();
    for phase in phases {
        let log = Rc::clone(&log);
        engine.after(*phase, move |event, _| log.borrow_mut().push(event.clone()));
    }
    log
}

fn phases(log: &Log) -> Vec<(Phase, ElementId)> {
    log.borrow().iter().map(|e| (e.phase, e.target)).collect()
}

#[test]
fn move_lands_clamped_inside_the_dropzone() {
    let mut doc = doc();
    let target = zone(&mut doc, Rect::new(0, 0, 300, 300), DropzoneConfig::new());
    let card = create(&mut doc, None, Rect::new(400, 400, 50, 40));
    DraggableConfig::new().dropzone(true).apply(&mut doc, card);
    let mut engine = engine();
    let log = record(&mut engine, &[Phase::Over, Phase::Drop, Phase::Dropzone]);

    engine.pointer_down(&mut doc, card, PointerEvent::primary(410, 410));
    let proxy = engine.session().unwrap().drag_element;
    assert!(doc.has_class(card, CLASS_HIDDEN_SOURCE));
    engine.pointer_move(&mut doc, PointerEvent::primary(290, 290));
    assert_eq!(engine.session().unwrap().target_element(), Some(target));
    assert!(doc.has_class(target, CLASS_DROP_ACTIVE));

    engine.pointer_up(&mut doc, PointerEvent::released(290, 290));

    assert_eq!(doc.parent(card), Some(target));
    assert!(!doc.children(doc.root()).contains(&card));
    assert_eq!(doc.position(card), Point::new(250, 260));
    assert_eq!(doc.inline_style(card, STYLE_POSITION).as_deref(), Some("absolute"));
    assert!(!doc.has_class(card, CLASS_HIDDEN_SOURCE));
    assert!(!doc.is_attached(proxy));
    assert!(!doc.has_class(target, CLASS_DROP_ACTIVE));
    assert_eq!(engine.pending_settles(), 0);

    assert_eq!(
        phases(&log),
        vec![
            (Phase::Over, target),
            (Phase::Drop, proxy),
            (Phase::Dropzone, target)
        ]
    );
    let log = log.borrow();
    assert_eq!(log[1].drop_target, Some(target));
    assert!(!log[1].is_copied);
    assert_eq!(log[2].drag_element, card);
}

#[test]
fn copy_with_modifier_leaves_the_source_in_place() {
    let mut doc = doc();
    let target = zone(&mut doc, Rect::new(0, 0, 300, 300), DropzoneConfig::new());
    let list = create(&mut doc, None, Rect::new(500, 0, 200, 200));
    let card = create(&mut doc, Some(list), Rect::new(510, 10, 50, 20));
    DraggableConfig::new()
        .dropzone(true)
        .effect_allowed(EffectAllowed::All)
        .apply(&mut doc, card);
    let mut engine = engine();
    let log = record(&mut engine, &[Phase::Dropzone]);

    engine.modifiers_changed(&mut doc, KeyModifiers::CONTROL);
    engine.pointer_down(&mut doc, card, PointerEvent::primary(520, 15));
    let proxy = engine.session().unwrap().drag_element;
    assert_eq!(engine.session().unwrap().effect, EffectMode::Copy);
    assert!(!doc.has_class(card, CLASS_HIDDEN_SOURCE));
    assert!(doc.has_class(proxy, CLASS_OPACITY));

    engine.pointer_move(&mut doc, PointerEvent::primary(100, 100));
    engine.pointer_up(&mut doc, PointerEvent::released(100, 100));

    assert_eq!(doc.parent(card), Some(list));
    assert_eq!(doc.position(card), Point::new(510, 10));
    assert_eq!(doc.children(target), &[proxy]);
    assert_eq!(doc.position(proxy), Point::new(90, 95));
    assert!(!doc.has_class(proxy, CLASS_OPACITY));
    assert_eq!(doc.attr(proxy, ATTR_COPIED_NODE).as_deref(), Some("true"));
    assert_eq!(doc.attr(proxy, ATTR_EFFECT_ALLOWED).as_deref(), Some("move"));

    let log = log.borrow();
    assert_eq!(log.len(), 1);
    assert!(log[0].is_copied);
    assert_eq!(log[0].drag_element, proxy);
}

#[test]
fn copied_element_only_moves_afterwards() {
    let mut doc = doc();
    let first = zone(&mut doc, Rect::new(0, 0, 300, 300), DropzoneConfig::new());
    let second = zone(&mut doc, Rect::new(0, 400, 300, 150), DropzoneConfig::new());
    let card = create(&mut doc, None, Rect::new(510, 10, 50, 20));
    DraggableConfig::new()
        .dropzone(true)
        .effect_allowed(EffectAllowed::All)
        .apply(&mut doc, card);
    let mut engine = engine();

    engine.modifiers_changed(&mut doc, KeyModifiers::CONTROL);
    engine.pointer_down(&mut doc, card, PointerEvent::primary(520, 15));
    let copy = engine.session().unwrap().drag_element;
    engine.pointer_move(&mut doc, PointerEvent::primary(100, 100));
    engine.pointer_up(&mut doc, PointerEvent::released(100, 100));
    engine.modifiers_changed(&mut doc, KeyModifiers::NONE);
    assert_eq!(doc.parent(copy), Some(first));

    assert!(engine.pointer_down(&mut doc, copy, PointerEvent::primary(100, 100)));
    engine.modifiers_changed(&mut doc, KeyModifiers::CONTROL);
    assert_eq!(engine.session().unwrap().effect, EffectMode::Move);
    engine.pointer_move(&mut doc, PointerEvent::primary(100, 450));
    assert_eq!(engine.session().unwrap().target_element(), Some(second));
    engine.pointer_up(&mut doc, PointerEvent::released(100, 450));

    assert_eq!(doc.parent(copy), Some(second));
    assert_eq!(doc.position(copy), Point::new(90, 445));
    assert!(doc.children(first).is_empty());
    assert_eq!(doc.children(second), &[copy]);
    assert_eq!(doc.parent(card), Some(doc.root()));
}

#[test]
fn modifier_toggle_reevaluates_target_without_motion() {
    let mut doc = doc();
    let copy_only = zone(
        &mut doc,
        Rect::new(0, 0, 300, 300),
        DropzoneConfig::new().accept(DropzoneAccept::Copy),
    );
    let card = create(&mut doc, None, Rect::new(400, 400, 50, 20));
    DraggableConfig::new()
        .dropzone(true)
        .effect_allowed(EffectAllowed::All)
        .apply(&mut doc, card);
    let mut engine = engine();
    let log = record(&mut engine, &[Phase::Over, Phase::Out]);

    engine.pointer_down(&mut doc, card, PointerEvent::primary(410, 405));
    engine.pointer_move(&mut doc, PointerEvent::primary(100, 100));
    assert!(engine.session().unwrap().target.is_none());
    assert!(log.borrow().is_empty());

    engine.modifiers_changed(&mut doc, KeyModifiers::CONTROL);
    assert_eq!(engine.session().unwrap().effect, EffectMode::Copy);
    assert_eq!(engine.session().unwrap().target_element(), Some(copy_only));
    assert!(doc.has_class(copy_only, CLASS_DROP_ACTIVE));
    assert!(!doc.has_class(card, CLASS_HIDDEN_SOURCE));

    engine.modifiers_changed(&mut doc, KeyModifiers::NONE);
    assert!(engine.session().unwrap().target.is_none());
    assert!(!doc.has_class(copy_only, CLASS_DROP_ACTIVE));
    assert!(doc.has_class(card, CLASS_HIDDEN_SOURCE));

    let seen: Vec<(Phase, bool)> = log.borrow().iter().map(|e| (e.phase, e.synthetic)).collect();
    assert_eq!(seen, vec![(Phase::Over, true), (Phase::Out, true)]);
}

#[test]
fn hover_moves_between_adjacent_dropzones() {
    let mut doc = doc();
    let left = zone(&mut doc, Rect::new(0, 0, 100, 100), DropzoneConfig::new());
    let right = zone(&mut doc, Rect::new(100, 0, 100, 100), DropzoneConfig::new());
    let card = create(&mut doc, None, Rect::new(300, 300, 20, 20));
    DraggableConfig::new().dropzone(true).apply(&mut doc, card);
    let mut engine = engine();
    let log = record(&mut engine, &[Phase::Over, Phase::Out]);

    engine.pointer_down(&mut doc, card, PointerEvent::primary(305, 305));
    engine.pointer_move(&mut doc, PointerEvent::primary(50, 50));
    engine.pointer_move(&mut doc, PointerEvent::primary(150, 50));

    assert_eq!(
        phases(&log),
        vec![(Phase::Over, left), (Phase::Out, left), (Phase::Over, right)]
    );
    let session = engine.session().unwrap();
    assert_eq!(session.hover.len(), 1);
    assert_eq!(session.hover[0].dropzone, right);
    assert!(doc.has_class(right, CLASS_DROP_ACTIVE));
    assert!(!doc.has_class(left, CLASS_DROP_ACTIVE));
}

#[test]
fn release_outside_the_target_reports_out_then_reverts() {
    let mut doc = doc();
    let target = zone(&mut doc, Rect::new(0, 0, 100, 100), DropzoneConfig::new());
    let card = create(&mut doc, None, Rect::new(300, 300, 20, 20));
    DraggableConfig::new().dropzone(true).apply(&mut doc, card);
    let mut engine = engine();
    let log = record(&mut engine, &[Phase::Over, Phase::Out, Phase::Drop]);

    engine.pointer_down(&mut doc, card, PointerEvent::primary(305, 305));
    let proxy = engine.session().unwrap().drag_element;
    engine.pointer_move(&mut doc, PointerEvent::primary(50, 50));
    engine.pointer_up(&mut doc, PointerEvent::released(150, 50));

    assert_eq!(
        phases(&log),
        vec![(Phase::Over, target), (Phase::Out, target), (Phase::Drop, proxy)]
    );
    assert_eq!(log.borrow()[2].drop_target, None);
    assert_eq!(doc.parent(card), Some(doc.root()));
    assert_eq!(doc.position(proxy), Point::new(300, 300));
    assert_eq!(engine.pending_settles(), 1);
}

#[test]
fn emitter_names_filter_dropzones_and_subscribers() {
    let mut doc = doc();
    let other = zone(
        &mut doc,
        Rect::new(0, 0, 200, 200),
        DropzoneConfig::new().emitter_name("other"),
    );
    let files = zone(
        &mut doc,
        Rect::new(0, 300, 200, 200),
        DropzoneConfig::new()
            .accept(DropzoneAccept::Move)
            .emitter_name("files"),
    );
    let card = create(&mut doc, None, Rect::new(400, 100, 40, 20));
    DraggableConfig::new().emitter_name("files").apply(&mut doc, card);
    let mut engine = engine();

    let scoped_files = Rc::new(RefCell::new(0));
    let scoped_ui = Rc::new(RefCell::new(0));
    {
        let count = Rc::clone(&scoped_files);
        engine.scoped(Phase::Drop, Stage::After, "files", move |_, _| *count.borrow_mut() += 1);
        let count = Rc::clone(&scoped_ui);
        engine.scoped(Phase::Drop, Stage::After, "UI", move |_, _| *count.borrow_mut() += 1);
    }
    let log = record(&mut engine, &[Phase::Over]);

    engine.pointer_down(&mut doc, card, PointerEvent::primary(405, 105));
    assert!(engine.session().unwrap().proxied());
    engine.pointer_move(&mut doc, PointerEvent::primary(100, 100));
    assert!(!doc.has_class(other, CLASS_DROP_ACTIVE));
    engine.pointer_move(&mut doc, PointerEvent::primary(100, 400));
    engine.pointer_up(&mut doc, PointerEvent::released(100, 400));

    assert_eq!(phases(&log), vec![(Phase::Over, files)]);
    assert_eq!(log.borrow()[0].emitter_name.as_deref(), Some("files"));
    assert_eq!(log.borrow()[0].qualified_name(), "dd-over.files");
    assert_eq!(doc.parent(card), Some(files));
    assert_eq!(*scoped_files.borrow(), 1);
    assert_eq!(*scoped_ui.borrow(), 0);
}

#[test]
fn reverted_element_rehovers_the_zone_it_rests_in() {
    let mut doc = doc();
    let home = zone(&mut doc, Rect::new(0, 0, 300, 300), DropzoneConfig::new());
    let card = create(&mut doc, None, Rect::new(50, 50, 40, 20));
    DraggableConfig::new().dropzone(true).apply(&mut doc, card);
    let mut engine = engine();
    let log = record(&mut engine, &[Phase::Over, Phase::Out]);

    engine.pointer_down(&mut doc, card, PointerEvent::primary(60, 55));
    engine.pointer_move(&mut doc, PointerEvent::primary(500, 400));
    engine.pointer_up(&mut doc, PointerEvent::released(500, 400));

    assert_eq!(phases(&log), vec![(Phase::Over, home)]);
    assert!(log.borrow()[0].synthetic);
    assert!(doc.has_class(home, CLASS_DROP_ACTIVE));

    let settled = engine.poll_settles(&mut doc, Instant::now() + Duration::from_secs(5));
    assert_eq!(settled, 1);
    assert!(!doc.has_class(home, CLASS_DROP_ACTIVE));
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn relatives_land_alongside_the_primary() {
    let mut doc = doc();
    let target = zone(&mut doc, Rect::new(0, 0, 300, 300), DropzoneConfig::new());
    let primary = create(&mut doc, None, Rect::new(400, 400, 40, 20));
    DraggableConfig::new().dropzone(true).apply(&mut doc, primary);
    let other = create(&mut doc, None, Rect::new(460, 400, 40, 20));
    let mut engine = engine();
    engine.before(Phase::Start, move |event, _| event.relatives.push(other));
    let log = record(&mut engine, &[Phase::Dropzone]);

    engine.pointer_down(&mut doc, primary, PointerEvent::primary(405, 405));
    engine.pointer_move(&mut doc, PointerEvent::primary(105, 105));
    engine.pointer_up(&mut doc, PointerEvent::released(105, 105));

    assert_eq!(doc.parent(primary), Some(target));
    assert_eq!(doc.parent(other), Some(target));
    assert_eq!(doc.position(primary), Point::new(100, 100));
    assert_eq!(doc.position(other), Point::new(160, 100));
    let landed: Vec<ElementId> = log.borrow().iter().map(|e| e.drag_element).collect();
    assert_eq!(landed, vec![primary, other]);
}

#[test]
fn cancel_over_a_dropzone_reverts_everything() {
    let mut doc = doc();
    let target = zone(&mut doc, Rect::new(0, 0, 300, 300), DropzoneConfig::new());
    let card = create(&mut doc, None, Rect::new(400, 400, 40, 20));
    DraggableConfig::new().dropzone(true).apply(&mut doc, card);
    let mut engine = engine();
    let log = record(&mut engine, &[Phase::Out, Phase::Drop]);

    engine.pointer_down(&mut doc, card, PointerEvent::primary(405, 405));
    let proxy = engine.session().unwrap().drag_element;
    engine.pointer_move(&mut doc, PointerEvent::primary(105, 105));
    assert!(engine.cancel(&mut doc));

    assert_eq!(phases(&log), vec![(Phase::Out, target), (Phase::Drop, proxy)]);
    assert!(log.borrow()[1].cancelled);
    assert!(!log.borrow()[1].is_copied);
    assert_eq!(doc.parent(card), Some(doc.root()));
    assert_eq!(doc.position(proxy), Point::new(400, 400));

    assert!(engine.transition_end(&mut doc, proxy));
    assert!(!doc.is_attached(proxy));
    assert!(!doc.has_class(card, CLASS_HIDDEN_SOURCE));
}

#[test]
fn prevented_drop_holds_until_restored() {
    let mut doc = doc();
    let card = create(&mut doc, None, Rect::new(400, 400, 40, 20));
    DraggableConfig::new().dropzone(true).apply(&mut doc, card);
    let mut engine = engine();
    engine.before(Phase::Drop, |event, _| event.prevent_default());

    engine.pointer_down(&mut doc, card, PointerEvent::primary(405, 405));
    let proxy = engine.session().unwrap().drag_element;
    engine.pointer_move(&mut doc, PointerEvent::primary(605, 505));
    engine.pointer_up(&mut doc, PointerEvent::released(605, 505));

    assert!(!engine.is_dragging());
    assert_eq!(engine.held().map(|s| s.drag_element), Some(proxy));
    assert!(doc.is_attached(proxy));
    assert_eq!(doc.position(proxy), Point::new(600, 500));
    assert!(doc.has_class(card, CLASS_HIDDEN_SOURCE));
    assert_eq!(engine.pending_settles(), 0);

    assert!(engine.restore_draggables(&mut doc));
    assert!(engine.held().is_none());
    assert_eq!(doc.position(proxy), Point::new(400, 400));
    assert_eq!(engine.pending_settles(), 1);
    assert!(!engine.restore_draggables(&mut doc));

    engine.poll_settles(&mut doc, Instant::now() + Duration::from_secs(5));
    assert!(!doc.is_attached(proxy));
    assert!(!doc.has_class(card, CLASS_HIDDEN_SOURCE));
    assert_eq!(doc.children(doc.root()), &[card]);
}

#[test]
fn next_press_restores_a_held_drop() {
    let mut doc = doc();
    let card = create(&mut doc, None, Rect::new(400, 400, 40, 20));
    DraggableConfig::new().dropzone(true).apply(&mut doc, card);
    let mut engine = engine();
    engine.once(Phase::Drop, Stage::Before, |event, _| event.prevent_default());

    engine.pointer_down(&mut doc, card, PointerEvent::primary(405, 405));
    let first_proxy = engine.session().unwrap().drag_element;
    engine.pointer_move(&mut doc, PointerEvent::primary(505, 405));
    engine.pointer_up(&mut doc, PointerEvent::released(505, 405));
    assert!(engine.held().is_some());

    assert!(engine.pointer_down(&mut doc, card, PointerEvent::primary(405, 405)));
    assert!(engine.held().is_none());
    assert!(!doc.is_attached(first_proxy));
    assert_eq!(engine.pending_settles(), 0);
    let second_proxy = engine.session().unwrap().drag_element;
    assert_ne!(second_proxy, first_proxy);

    engine.pointer_up(&mut doc, PointerEvent::released(405, 405));
    assert!(engine.held().is_none());
    assert_eq!(engine.pending_settles(), 1);
}
