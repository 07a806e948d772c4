use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Clear, Paragraph};

use super::Demo;
use crate::constants::{
    ATTR_COPIED_NODE, ATTR_DRAGGABLE, ATTR_DROPZONE, CLASS_DRAGGING, CLASS_DROP_ACTIVE,
    CLASS_HIDDEN_SOURCE, CLASS_OPACITY, CLASS_TRANSITION,
};
use crate::document::{ElementId, VisualTree};
use crate::geometry::{Point, Size};
use crate::log_buffer::LogHandle;

pub const STATUS_HEIGHT: u16 = 1;
pub const LOG_HEIGHT: u16 = 8;

/// Size of the document area for a terminal of the given size.
pub fn viewport_for(width: u16, height: u16) -> Size {
    let rows = height.saturating_sub(STATUS_HEIGHT + LOG_HEIGHT);
    Size::new(i32::from(width), i32::from(rows))
}

pub fn render(frame: &mut Frame<'_>, demo: &Demo, log: Option<&LogHandle>) {
    let [doc_area, status_area, log_area] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(STATUS_HEIGHT),
            Constraint::Length(LOG_HEIGHT),
        ])
        .areas(frame.area());

    let scroll = demo.doc.window_scroll();
    for element in demo.doc.attached_elements() {
        if element == demo.doc.root() {
            continue;
        }
        let Some(area) = screen_rect(&demo.doc, element, scroll, doc_area) else {
            continue;
        };
        let block = Block::bordered()
            .title(demo.label(element))
            .border_style(element_style(&demo.doc, element));
        frame.render_widget(Clear, area);
        frame.render_widget(block, area);
    }

    frame.render_widget(Paragraph::new(status_line(demo)), status_area);

    let lines: Vec<Line<'_>> = match log {
        Some(handle) => handle
            .tail(usize::from(LOG_HEIGHT.saturating_sub(2)))
            .into_iter()
            .map(Line::from)
            .collect(),
        None => vec![Line::from("logging to stderr")],
    };
    frame.render_widget(
        Paragraph::new(lines).block(Block::bordered().title("log")),
        log_area,
    );
}

fn screen_rect<D: VisualTree + ?Sized>(
    doc: &D,
    element: ElementId,
    scroll: Point,
    area: Rect,
) -> Option<Rect> {
    let bounds = doc.bounding_box(element);
    let left = (bounds.x - scroll.x).max(0);
    let top = (bounds.y - scroll.y).max(0);
    let right = (bounds.right() - scroll.x).min(i32::from(area.width));
    let bottom = (bounds.bottom() - scroll.y).min(i32::from(area.height));
    if right <= left || bottom <= top {
        return None;
    }
    Some(Rect::new(
        area.x + u16::try_from(left).ok()?,
        area.y + u16::try_from(top).ok()?,
        u16::try_from(right - left).ok()?,
        u16::try_from(bottom - top).ok()?,
    ))
}

fn element_style<D: VisualTree + ?Sized>(doc: &D, element: ElementId) -> Style {
    let has = |class: &str| doc.has_class(element, class);
    if doc.has_attr(element, ATTR_DROPZONE) {
        return if has(CLASS_DROP_ACTIVE) {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Blue)
        };
    }
    let mut style = if has(CLASS_HIDDEN_SOURCE) {
        Style::default().fg(Color::DarkGray)
    } else if has(CLASS_TRANSITION) {
        Style::default().fg(Color::Magenta)
    } else if has(CLASS_DRAGGING) {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else if doc.has_attr(element, ATTR_COPIED_NODE) {
        Style::default().fg(Color::LightGreen)
    } else if doc.attr(element, ATTR_DRAGGABLE).as_deref() == Some("true") {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };
    if has(CLASS_OPACITY) {
        style = style.add_modifier(Modifier::DIM);
    }
    style
}

fn status_line(demo: &Demo) -> String {
    let stats = demo.stats();
    let drag = match demo.engine.session() {
        Some(session) => format!(
            "dragging {} ({}) over {}",
            demo.label(session.source),
            session.effect,
            session
                .target_element()
                .map_or_else(|| "nothing".to_string(), |zone| demo.label(zone)),
        ),
        None => "idle".to_string(),
    };
    format!(
        " {drag} | copy modifier {} | settling {} | started {} dropped {} copied {} | q quit, r reset, Esc cancel",
        if demo.engine.modifier_pressed() { "on" } else { "off" },
        demo.engine.pending_settles(),
        stats.started,
        stats.dropped,
        stats.copied,
    )
}
