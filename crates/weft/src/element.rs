//! The element tree.
//!
//! An [`Element`] is a cheap handle to a shared node. The tree owns its
//! children; parents are held weakly so the forward-owning chain has no
//! cycles. All tree access happens on the loop thread.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use unicode_width::UnicodeWidthStr;
use weft_core::{Buffer, Event, Gradient, Key, KeyEvent, MouseAction, MouseButton, Rect, Style};

use crate::app::AppHandle;
use crate::component::SharedComponent;
use crate::style::{
    Align, BorderStyle, Direction, Justify, LayoutStyle, ScrollMode, TextAlign, Value,
};
use crate::watcher::Watcher;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Computed layout output for one element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayoutResult {
    /// Border box: the element's full rectangle.
    pub rect: Rect,
    /// Content box: inside padding and border; where text and children
    /// live.
    pub content_rect: Rect,
}

type KeyHandler = Box<dyn FnMut(&Element, &KeyEvent) -> bool>;
type EventHandler = Box<dyn FnMut(&Element, &Event) -> bool>;
type ElementHandler = Box<dyn FnMut(&Element)>;
type ChildHandler = Box<dyn FnMut(&Element, &Element)>;
type RenderOverride = Box<dyn FnMut(&Element, &mut Buffer)>;

#[derive(Default)]
struct Handlers {
    on_key_press: Option<KeyHandler>,
    on_click: Option<ElementHandler>,
    on_event: Option<EventHandler>,
    on_focus: Option<ElementHandler>,
    on_blur: Option<ElementHandler>,
    on_update: Option<ElementHandler>,
    on_child_added: Option<ChildHandler>,
    on_focusable_added: Option<ChildHandler>,
    on_render: Option<RenderOverride>,
}

struct ElementInner {
    id: u64,
    parent: Option<WeakElement>,
    children: Vec<Element>,
    app: Option<AppHandle>,
    style: LayoutStyle,
    text: String,
    text_style: Style,
    text_style_set: bool,
    text_align: TextAlign,
    border: BorderStyle,
    border_style: Style,
    background: Option<Style>,
    bg_gradient: Option<Gradient>,
    border_gradient: Option<Gradient>,
    text_gradient: Option<Gradient>,
    hr: bool,
    scroll_mode: ScrollMode,
    scroll_x: i32,
    scroll_y: i32,
    content_size: (i32, i32),
    layout: LayoutResult,
    dirty: bool,
    focusable: bool,
    focused: bool,
    handlers: Handlers,
    watchers: Vec<Box<dyn Watcher>>,
    component: Option<SharedComponent>,
}

impl ElementInner {
    fn new() -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            parent: None,
            children: Vec::new(),
            app: None,
            style: LayoutStyle::default(),
            text: String::new(),
            text_style: Style::default(),
            text_style_set: false,
            text_align: TextAlign::default(),
            border: BorderStyle::default(),
            border_style: Style::default(),
            background: None,
            bg_gradient: None,
            border_gradient: None,
            text_gradient: None,
            hr: false,
            scroll_mode: ScrollMode::default(),
            scroll_x: 0,
            scroll_y: 0,
            content_size: (0, 0),
            layout: LayoutResult::default(),
            dirty: true,
            focusable: false,
            focused: false,
            handlers: Handlers::default(),
            watchers: Vec::new(),
            component: None,
        }
    }
}

/// A node in the render tree. Cloning produces another handle to the
/// same node; equality is by identity.
#[derive(Clone)]
pub struct Element {
    inner: Rc<RefCell<ElementInner>>,
}

/// A weak handle to an element (parent back-references).
#[derive(Clone)]
pub struct WeakElement(Weak<RefCell<ElementInner>>);

impl WeakElement {
    /// Upgrade to a strong handle if the element is still alive.
    pub fn upgrade(&self) -> Option<Element> {
        self.0.upgrade().map(|inner| Element { inner })
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Element {}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Element")
            .field("id", &inner.id)
            .field("text", &inner.text)
            .field("children", &inner.children.len())
            .finish()
    }
}

/// Create an empty container element.
pub fn el() -> Element {
    Element {
        inner: Rc::new(RefCell::new(ElementInner::new())),
    }
}

/// Create a text element.
pub fn text(s: impl Into<String>) -> Element {
    let e = el();
    e.inner.borrow_mut().text = s.into();
    e
}

/// Create a horizontal rule. It stretches across its container and
/// draws the border style's horizontal rune.
pub fn hr() -> Element {
    let e = el();
    {
        let mut inner = e.inner.borrow_mut();
        inner.hr = true;
        inner.border = BorderStyle::Single;
    }
    e
}

// Invokes a handler slot without holding the node borrow across the
// call, so the handler may freely use the element.
macro_rules! with_handler {
    ($self:ident, $slot:ident, |$f:ident| $call:expr) => {{
        let taken = $self.inner.borrow_mut().handlers.$slot.take();
        match taken {
            Some(mut $f) => {
                let result = $call;
                let mut inner = $self.inner.borrow_mut();
                if inner.handlers.$slot.is_none() {
                    inner.handlers.$slot = Some($f);
                }
                Some(result)
            }
            None => None,
        }
    }};
}

impl Element {
    /// Unique identity of this node.
    pub fn id(&self) -> u64 {
        self.inner.borrow().id
    }

    // ----- tree -----

    /// Append a child. The child's parent pointer and app handle are
    /// updated, `on_child_added` fires, and the tree is marked dirty.
    #[must_use]
    pub fn child(self, child: Element) -> Self {
        self.add_child(child);
        self
    }

    /// Append several children.
    #[must_use]
    pub fn children_from(self, children: impl IntoIterator<Item = Element>) -> Self {
        for c in children {
            self.add_child(c);
        }
        self
    }

    /// Append a child.
    pub fn add_child(&self, child: Element) {
        {
            let mut c = child.inner.borrow_mut();
            c.parent = Some(self.downgrade());
        }
        let app = self.inner.borrow().app.clone();
        if let Some(app) = app {
            child.attach_app(&app);
        }
        self.inner.borrow_mut().children.push(child.clone());
        with_handler!(self, on_child_added, |f| f(self, &child));
        if child.is_focusable() {
            with_handler!(self, on_focusable_added, |f| f(self, &child));
        }
        self.mark_dirty();
    }

    /// Remove a child. No-op if it is not a child of this element.
    pub fn remove_child(&self, child: &Element) {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            let before = inner.children.len();
            inner.children.retain(|c| c != child);
            before != inner.children.len()
        };
        if removed {
            child.inner.borrow_mut().parent = None;
            self.mark_dirty();
        }
    }

    /// Remove all children.
    pub fn clear_children(&self) {
        let children = std::mem::take(&mut self.inner.borrow_mut().children);
        for c in &children {
            c.inner.borrow_mut().parent = None;
        }
        self.mark_dirty();
    }

    /// Snapshot of the current children.
    pub fn children(&self) -> Vec<Element> {
        self.inner.borrow().children.clone()
    }

    /// The parent element, if attached.
    pub fn parent(&self) -> Option<Element> {
        self.inner.borrow().parent.as_ref().and_then(WeakElement::upgrade)
    }

    /// A weak handle to this element.
    pub fn downgrade(&self) -> WeakElement {
        WeakElement(Rc::downgrade(&self.inner))
    }

    /// Attach the owning app handle to this subtree.
    pub(crate) fn attach_app(&self, app: &AppHandle) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.app = Some(app.clone());
        }
        for c in self.children() {
            c.attach_app(app);
        }
    }

    // ----- layout style -----

    /// Replace the whole layout style.
    #[must_use]
    pub fn layout_style(self, style: LayoutStyle) -> Self {
        self.inner.borrow_mut().style = style;
        self.mark_dirty();
        self
    }

    /// Copy of the current layout style.
    pub fn style(&self) -> LayoutStyle {
        self.inner.borrow().style.clone()
    }

    /// Mutate the layout style in place.
    pub fn update_style(&self, f: impl FnOnce(&mut LayoutStyle)) {
        f(&mut self.inner.borrow_mut().style);
        self.mark_dirty();
    }

    /// Set the preferred width.
    #[must_use]
    pub fn width(self, v: impl Into<Value>) -> Self {
        self.update_style(|s| s.width = v.into());
        self
    }

    /// Set the preferred height.
    #[must_use]
    pub fn height(self, v: impl Into<Value>) -> Self {
        self.update_style(|s| s.height = v.into());
        self
    }

    /// Set the minimum width.
    #[must_use]
    pub fn min_width(self, v: impl Into<Value>) -> Self {
        self.update_style(|s| s.min_width = v.into());
        self
    }

    /// Set the minimum height.
    #[must_use]
    pub fn min_height(self, v: impl Into<Value>) -> Self {
        self.update_style(|s| s.min_height = v.into());
        self
    }

    /// Set the maximum width.
    #[must_use]
    pub fn max_width(self, v: impl Into<Value>) -> Self {
        self.update_style(|s| s.max_width = v.into());
        self
    }

    /// Set the maximum height.
    #[must_use]
    pub fn max_height(self, v: impl Into<Value>) -> Self {
        self.update_style(|s| s.max_height = v.into());
        self
    }

    /// Set the main-axis direction for children.
    #[must_use]
    pub fn direction(self, d: Direction) -> Self {
        self.update_style(|s| s.direction = d);
        self
    }

    /// Lay children out left to right.
    #[must_use]
    pub fn row(self) -> Self {
        self.direction(Direction::Row)
    }

    /// Set main-axis distribution.
    #[must_use]
    pub fn justify(self, j: Justify) -> Self {
        self.update_style(|s| s.justify = j);
        self
    }

    /// Set cross-axis placement.
    #[must_use]
    pub fn align(self, a: Align) -> Self {
        self.update_style(|s| s.align = a);
        self
    }

    /// Override the parent's alignment for this element.
    #[must_use]
    pub fn align_self(self, a: Align) -> Self {
        self.update_style(|s| s.align_self = Some(a));
        self
    }

    /// Set the grow factor.
    #[must_use]
    pub fn grow(self, g: f32) -> Self {
        self.update_style(|s| s.flex_grow = g);
        self
    }

    /// Set the shrink factor.
    #[must_use]
    pub fn shrink(self, v: f32) -> Self {
        self.update_style(|s| s.flex_shrink = v);
        self
    }

    /// Set padding.
    #[must_use]
    pub fn padding(self, e: weft_core::Edges) -> Self {
        self.update_style(|s| s.padding = e);
        self
    }

    /// Set margin.
    #[must_use]
    pub fn margin(self, e: weft_core::Edges) -> Self {
        self.update_style(|s| s.margin = e);
        self
    }

    /// Set the gap between children.
    #[must_use]
    pub fn gap(self, g: i32) -> Self {
        self.update_style(|s| s.gap = g);
        self
    }

    // ----- visual properties -----

    /// Replace the text content.
    pub fn set_text(&self, s: impl Into<String>) {
        let s = s.into();
        let mut inner = self.inner.borrow_mut();
        if inner.text != s {
            inner.text = s;
            drop(inner);
            self.mark_dirty();
        }
    }

    /// The text content.
    pub fn text_content(&self) -> String {
        self.inner.borrow().text.clone()
    }

    /// Display width of the text content.
    pub fn text_width(&self) -> i32 {
        UnicodeWidthStr::width(self.inner.borrow().text.as_str()) as i32
    }

    /// Set the text style. Marks it explicitly set so the cascade stops
    /// here.
    #[must_use]
    pub fn text_style(self, style: Style) -> Self {
        {
            let mut inner = self.inner.borrow_mut();
            inner.text_style = style;
            inner.text_style_set = true;
        }
        self.mark_dirty();
        self
    }

    /// The text style plus whether it was explicitly set.
    pub(crate) fn text_style_raw(&self) -> (Style, bool) {
        let inner = self.inner.borrow();
        (inner.text_style, inner.text_style_set)
    }

    /// Set text alignment.
    #[must_use]
    pub fn text_align(self, a: TextAlign) -> Self {
        self.inner.borrow_mut().text_align = a;
        self.mark_dirty();
        self
    }

    /// The text alignment.
    pub fn text_alignment(&self) -> TextAlign {
        self.inner.borrow().text_align
    }

    /// Set the border style.
    #[must_use]
    pub fn border(self, b: BorderStyle) -> Self {
        self.inner.borrow_mut().border = b;
        self.mark_dirty();
        self
    }

    /// The border style.
    pub fn border_kind(&self) -> BorderStyle {
        self.inner.borrow().border
    }

    /// Set the border color/attributes.
    #[must_use]
    pub fn border_color(self, style: Style) -> Self {
        self.inner.borrow_mut().border_style = style;
        self.mark_dirty();
        self
    }

    /// The border color/attributes.
    pub fn border_color_style(&self) -> Style {
        self.inner.borrow().border_style
    }

    /// Set the background style.
    #[must_use]
    pub fn background(self, style: Style) -> Self {
        self.inner.borrow_mut().background = Some(style);
        self.mark_dirty();
        self
    }

    /// The background style, if set.
    pub fn background_style(&self) -> Option<Style> {
        self.inner.borrow().background
    }

    /// Set a background gradient (sampled per column).
    #[must_use]
    pub fn bg_gradient(self, g: Gradient) -> Self {
        self.inner.borrow_mut().bg_gradient = Some(g);
        self.mark_dirty();
        self
    }

    /// The background gradient, if set.
    pub fn bg_gradient_value(&self) -> Option<Gradient> {
        self.inner.borrow().bg_gradient.clone()
    }

    /// Set a border gradient.
    #[must_use]
    pub fn border_gradient(self, g: Gradient) -> Self {
        self.inner.borrow_mut().border_gradient = Some(g);
        self.mark_dirty();
        self
    }

    /// The border gradient, if set.
    pub fn border_gradient_value(&self) -> Option<Gradient> {
        self.inner.borrow().border_gradient.clone()
    }

    /// Set a text gradient (sampled per rune).
    #[must_use]
    pub fn text_gradient(self, g: Gradient) -> Self {
        self.inner.borrow_mut().text_gradient = Some(g);
        self.mark_dirty();
        self
    }

    /// The text gradient, if set.
    pub fn text_gradient_value(&self) -> Option<Gradient> {
        self.inner.borrow().text_gradient.clone()
    }

    /// Whether this element is a horizontal rule.
    pub fn is_hr(&self) -> bool {
        self.inner.borrow().hr
    }

    // ----- scrolling -----

    /// Set the scroll mode.
    #[must_use]
    pub fn scroll(self, mode: ScrollMode) -> Self {
        self.inner.borrow_mut().scroll_mode = mode;
        self.mark_dirty();
        self
    }

    /// The scroll mode.
    pub fn scroll_mode(&self) -> ScrollMode {
        self.inner.borrow().scroll_mode
    }

    /// Current scroll offsets (x, y).
    pub fn scroll_offset(&self) -> (i32, i32) {
        let inner = self.inner.borrow();
        (inner.scroll_x, inner.scroll_y)
    }

    /// Set scroll offsets, clamped into `[0, content − viewport]`.
    pub fn scroll_to(&self, x: i32, y: i32) {
        let (max_x, max_y) = self.max_scroll();
        let mut inner = self.inner.borrow_mut();
        let nx = x.clamp(0, max_x);
        let ny = y.clamp(0, max_y);
        if (nx, ny) != (inner.scroll_x, inner.scroll_y) {
            inner.scroll_x = nx;
            inner.scroll_y = ny;
            drop(inner);
            self.mark_dirty();
        }
    }

    /// Adjust scroll offsets by a delta.
    pub fn scroll_by(&self, dx: i32, dy: i32) {
        let (x, y) = self.scroll_offset();
        self.scroll_to(x + dx, y + dy);
    }

    /// Maximum scroll offsets given the cached content size.
    pub fn max_scroll(&self) -> (i32, i32) {
        let inner = self.inner.borrow();
        let viewport = inner.layout.content_rect;
        let (cw, ch) = inner.content_size;
        (
            (cw - viewport.width).max(0),
            (ch - viewport.height).max(0),
        )
    }

    /// Cached content size from the last scroll layout.
    pub fn content_size(&self) -> (i32, i32) {
        self.inner.borrow().content_size
    }

    pub(crate) fn set_content_size(&self, w: i32, h: i32) {
        self.inner.borrow_mut().content_size = (w, h);
    }

    // ----- focus -----

    /// Make this element focusable.
    #[must_use]
    pub fn focusable(self, val: bool) -> Self {
        self.inner.borrow_mut().focusable = val;
        self
    }

    /// Whether this element can take focus.
    pub fn is_focusable(&self) -> bool {
        self.inner.borrow().focusable
    }

    /// Whether this element has focus.
    pub fn is_focused(&self) -> bool {
        self.inner.borrow().focused
    }

    pub(crate) fn set_focused(&self, val: bool) {
        let changed = {
            let mut inner = self.inner.borrow_mut();
            let changed = inner.focused != val;
            inner.focused = val;
            changed
        };
        if changed {
            if val {
                with_handler!(self, on_focus, |f| f(self));
            } else {
                with_handler!(self, on_blur, |f| f(self));
            }
            self.mark_dirty();
        }
    }

    /// Set `focused` without firing focus/blur handlers. Used when a
    /// rebuilt tree re-adopts the previous focus position.
    pub(crate) fn set_focused_silent(&self, val: bool) {
        self.inner.borrow_mut().focused = val;
    }

    // ----- handlers -----

    /// Set the key press handler. Return true to consume the event.
    #[must_use]
    pub fn on_key_press(self, f: impl FnMut(&Element, &KeyEvent) -> bool + 'static) -> Self {
        self.inner.borrow_mut().handlers.on_key_press = Some(Box::new(f));
        self
    }

    /// Set the click handler (mouse left-press, or Enter/Space).
    #[must_use]
    pub fn on_click(self, f: impl FnMut(&Element) + 'static) -> Self {
        self.inner.borrow_mut().handlers.on_click = Some(Box::new(f));
        self
    }

    /// Set the raw event handler, tried before the specific ones.
    #[must_use]
    pub fn on_event(self, f: impl FnMut(&Element, &Event) -> bool + 'static) -> Self {
        self.inner.borrow_mut().handlers.on_event = Some(Box::new(f));
        self
    }

    /// Set the focus-gained handler.
    #[must_use]
    pub fn on_focus(self, f: impl FnMut(&Element) + 'static) -> Self {
        self.inner.borrow_mut().handlers.on_focus = Some(Box::new(f));
        self
    }

    /// Set the focus-lost handler.
    #[must_use]
    pub fn on_blur(self, f: impl FnMut(&Element) + 'static) -> Self {
        self.inner.borrow_mut().handlers.on_blur = Some(Box::new(f));
        self
    }

    /// Set the per-frame update hook, called before the element renders.
    #[must_use]
    pub fn on_update(self, f: impl FnMut(&Element) + 'static) -> Self {
        self.inner.borrow_mut().handlers.on_update = Some(Box::new(f));
        self
    }

    /// Set the child-added hook.
    #[must_use]
    pub fn on_child_added(self, f: impl FnMut(&Element, &Element) + 'static) -> Self {
        self.inner.borrow_mut().handlers.on_child_added = Some(Box::new(f));
        self
    }

    /// Set the focusable-child-added hook.
    #[must_use]
    pub fn on_focusable_added(self, f: impl FnMut(&Element, &Element) + 'static) -> Self {
        self.inner.borrow_mut().handlers.on_focusable_added = Some(Box::new(f));
        self
    }

    /// Override the default painting of this element. Children still
    /// render afterwards.
    #[must_use]
    pub fn on_render(self, f: impl FnMut(&Element, &mut Buffer) + 'static) -> Self {
        self.inner.borrow_mut().handlers.on_render = Some(Box::new(f));
        self
    }

    pub(crate) fn invoke_update(&self) {
        with_handler!(self, on_update, |f| f(self));
    }

    /// Run the render override if present; returns true if it ran.
    pub(crate) fn invoke_render_override(&self, buf: &mut Buffer) -> bool {
        with_handler!(self, on_render, |f| f(self, buf)).is_some()
    }

    // ----- watchers -----

    /// Attach a watcher. Watchers are started once by the app loop.
    #[must_use]
    pub fn watch(self, w: impl Watcher + 'static) -> Self {
        self.inner.borrow_mut().watchers.push(Box::new(w));
        self
    }

    /// Drain unstarted watchers from this subtree.
    pub(crate) fn drain_watchers(&self, out: &mut Vec<Box<dyn Watcher>>) {
        out.append(&mut self.inner.borrow_mut().watchers);
        for c in self.children() {
            c.drain_watchers(out);
        }
    }

    // ----- component tag -----

    pub(crate) fn set_component(&self, c: SharedComponent) {
        self.inner.borrow_mut().component = Some(c);
    }

    pub(crate) fn component(&self) -> Option<SharedComponent> {
        self.inner.borrow().component.clone()
    }

    // ----- dirty -----

    /// Mark this node and every ancestor dirty, and flag the owning app.
    pub fn mark_dirty(&self) {
        let app = {
            let mut inner = self.inner.borrow_mut();
            inner.dirty = true;
            inner.app.clone()
        };
        let mut cur = self.parent();
        while let Some(p) = cur {
            p.inner.borrow_mut().dirty = true;
            cur = p.parent();
        }
        if let Some(app) = app {
            app.mark_dirty();
        }
    }

    /// Whether this node is dirty.
    pub fn is_dirty(&self) -> bool {
        self.inner.borrow().dirty
    }

    pub(crate) fn clear_dirty(&self) {
        self.inner.borrow_mut().dirty = false;
        for c in self.children() {
            c.clear_dirty();
        }
    }

    // ----- layout results -----

    /// The computed layout from the last pass.
    pub fn layout(&self) -> LayoutResult {
        self.inner.borrow().layout
    }

    pub(crate) fn set_layout(&self, layout: LayoutResult) {
        self.inner.borrow_mut().layout = layout;
    }

    /// Content-driven natural size of this node, before external sizing
    /// constraints.
    pub fn intrinsic_size(&self) -> (i32, i32) {
        let (border, padding, hr, scroll_mode, direction, gap, has_children, text_empty) = {
            let inner = self.inner.borrow();
            (
                inner.border.thickness() * 2,
                inner.style.padding,
                inner.hr,
                inner.scroll_mode,
                inner.style.direction,
                inner.style.gap,
                !inner.children.is_empty(),
                inner.text.is_empty(),
            )
        };

        if hr {
            return (0, 1);
        }

        let (mut w, mut h) = if has_children {
            let children = self.children();
            let n = children.len() as i32;
            let mut main = gap * (n - 1).max(0);
            let mut cross = 0;
            for c in children {
                let (cw, ch) = c.intrinsic_size();
                let margin = c.style().margin;
                let (c_main, c_cross) = match direction {
                    Direction::Row => (cw + margin.horizontal(), ch + margin.vertical()),
                    Direction::Column => (ch + margin.vertical(), cw + margin.horizontal()),
                };
                main += c_main;
                cross = cross.max(c_cross);
            }
            match direction {
                Direction::Row => (
                    main + padding.horizontal() + border,
                    cross + padding.vertical() + border,
                ),
                Direction::Column => (
                    cross + padding.horizontal() + border,
                    main + padding.vertical() + border,
                ),
            }
        } else if !text_empty {
            (
                self.text_width() + padding.horizontal() + border,
                1 + padding.vertical() + border,
            )
        } else {
            (padding.horizontal() + border, padding.vertical() + border)
        };

        if scroll_mode.horizontal() {
            w = 0;
        }
        if scroll_mode.vertical() {
            h = 0;
        }
        (w, h)
    }

    // ----- hit testing -----

    /// The deepest element whose rect contains (x, y). Later siblings
    /// paint on top, so children are tried in reverse order.
    pub fn element_at(&self, x: i32, y: i32) -> Option<Element> {
        if !self.layout().rect.contains(x, y) {
            return None;
        }
        for c in self.children().into_iter().rev() {
            if let Some(hit) = c.element_at(x, y) {
                return Some(hit);
            }
        }
        Some(self.clone())
    }

    // ----- events -----

    /// Handle an event on this element only (no bubbling). Returns
    /// whether it was consumed.
    pub fn handle_event(&self, ev: &Event) -> bool {
        if let Some(true) = with_handler!(self, on_event, |f| f(self, ev)) {
            return true;
        }

        match ev {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(me) => {
                if me.is_wheel() {
                    return self.handle_wheel(me.button);
                }
                if me.button == MouseButton::Left && me.action == MouseAction::Press {
                    return with_handler!(self, on_click, |f| f(self)).is_some();
                }
                false
            }
            Event::Resize(..) => false,
        }
    }

    /// Handle an event, bubbling to ancestors while unconsumed.
    pub fn dispatch(&self, ev: &Event) -> bool {
        let mut cur = Some(self.clone());
        while let Some(e) = cur {
            if e.handle_event(ev) {
                return true;
            }
            cur = e.parent();
        }
        false
    }

    fn handle_key(&self, key: &KeyEvent) -> bool {
        if let Some(true) = with_handler!(self, on_key_press, |f| f(self, key)) {
            return true;
        }

        // Enter/Space activate the click handler.
        let activates = key.key == Key::Enter || (key.key == Key::Rune && key.rune == ' ');
        if activates && with_handler!(self, on_click, |f| f(self)).is_some() {
            return true;
        }

        let mode = self.scroll_mode();
        if mode.any() {
            let viewport = self.layout().content_rect;
            let (_, max_y) = self.max_scroll();
            match key.key {
                Key::Up if mode.vertical() => {
                    self.scroll_by(0, -1);
                    return true;
                }
                Key::Down if mode.vertical() => {
                    self.scroll_by(0, 1);
                    return true;
                }
                Key::Left if mode.horizontal() => {
                    self.scroll_by(-1, 0);
                    return true;
                }
                Key::Right if mode.horizontal() => {
                    self.scroll_by(1, 0);
                    return true;
                }
                Key::PageUp if mode.vertical() => {
                    self.scroll_by(0, -viewport.height.max(1));
                    return true;
                }
                Key::PageDown if mode.vertical() => {
                    self.scroll_by(0, viewport.height.max(1));
                    return true;
                }
                Key::Home if mode.vertical() => {
                    self.scroll_to(self.scroll_offset().0, 0);
                    return true;
                }
                Key::End if mode.vertical() => {
                    self.scroll_to(self.scroll_offset().0, max_y);
                    return true;
                }
                _ => {}
            }
        }
        false
    }

    fn handle_wheel(&self, button: MouseButton) -> bool {
        let mode = self.scroll_mode();
        if !mode.vertical() {
            return false;
        }
        match button {
            MouseButton::WheelUp => {
                self.scroll_by(0, -1);
                true
            }
            MouseButton::WheelDown => {
                self.scroll_by(0, 1);
                true
            }
            _ => false,
        }
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Fixed(n)
    }
}

/// Percent helper: `width(pct(50.0))`.
pub fn pct(p: f32) -> Value {
    Value::Percent(p)
}
