//! The application loop.
//!
//! A single-threaded cooperative scheduler: one select loop drains
//! queued closures, input events, and frame ticks; every element-tree
//! read and write happens on this thread. Watchers and other threads
//! reach the loop only through the handle's queues.

mod handle;
mod inline;

pub use handle::{AppHandle, current, mark_dirty, queue_update, stop};

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, bounded, select, tick};
use weft_core::{
    AnsiTerminal, Buffer, CellChange, Event, InputReader, Key, KeyEvent, Mods, MouseAction,
    MouseButton, Terminal,
};

use crate::component::{Cleanup, Component, Mounter, SharedComponent};
use crate::element::Element;
use crate::error::{Error, Result};
use crate::focus::FocusManager;
use crate::layout;
use crate::render::render_tree;
use crate::state::State;
use crate::watcher::{Job, Watcher, WatcherCtx};

use inline::InlineState;

/// Default frame rate when none is configured.
const DEFAULT_FRAME_RATE: u32 = 60;
/// Queue capacity for the FIFO event queue.
const EVENT_QUEUE_CAP: usize = 256;

/// The root of an app: a raw element tree reused across frames, or a
/// component whose `render` rebuilds the tree each frame.
enum Root {
    Element(Element),
    Component(SharedComponent),
}

/// A terminal UI application.
pub struct App {
    terminal: Box<dyn Terminal>,
    buffer: Buffer,
    focus: FocusManager,
    root: Root,
    root_cleanup: Option<Cleanup>,
    root_bound: bool,
    root_watchers_started: bool,
    mounter: RefCell<Mounter>,
    render_stack: RefCell<Vec<u64>>,

    handle: AppHandle,
    jobs_rx: Receiver<Job>,
    updates_rx: Receiver<Job>,
    stop_rx: Receiver<()>,
    watcher_ctx: WatcherCtx,

    frame_interval: Duration,
    mouse: bool,
    cursor_hidden: bool,
    inline_height: Option<u16>,
    inline: Option<InlineState>,
    in_alt_screen: bool,
    global_key: Option<Box<dyn FnMut(&KeyEvent) -> bool>>,

    current_tree: Option<Element>,
    last_render: Option<Instant>,
}

impl App {
    /// Create an app with a raw element root.
    pub fn new(root: Element) -> Self {
        Self::build(Root::Element(root))
    }

    /// Create an app with a component root; it re-renders per frame.
    pub fn component(root: impl Component + 'static) -> Self {
        let boxed: Box<dyn Component> = Box::new(root);
        Self::build(Root::Component(Rc::new(RefCell::new(boxed))))
    }

    fn build(root: Root) -> Self {
        let (jobs_tx, jobs_rx) = bounded::<Job>(EVENT_QUEUE_CAP);
        let (updates_tx, updates_rx) = bounded::<Job>(1);
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let dirty = Arc::new(AtomicBool::new(true));
        let stop_slot = Arc::new(Mutex::new(Some(stop_tx)));
        let handle = AppHandle::new(
            jobs_tx.clone(),
            updates_tx,
            updates_rx.clone(),
            dirty,
            stop_slot,
        );
        let watcher_ctx = WatcherCtx::new(jobs_tx, stop_rx.clone());

        Self {
            terminal: Box::new(AnsiTerminal::new()),
            buffer: Buffer::new(0, 0),
            focus: FocusManager::new(),
            root,
            root_cleanup: None,
            root_bound: false,
            root_watchers_started: false,
            mounter: RefCell::new(Mounter::new()),
            render_stack: RefCell::new(Vec::new()),
            handle,
            jobs_rx,
            updates_rx,
            stop_rx,
            watcher_ctx,
            frame_interval: Duration::from_secs(1) / DEFAULT_FRAME_RATE,
            mouse: false,
            cursor_hidden: true,
            inline_height: None,
            inline: None,
            in_alt_screen: false,
            global_key: None,
            current_tree: None,
            last_render: None,
        }
    }

    /// Replace the terminal backend (testing, embedding).
    #[must_use]
    pub fn with_terminal(mut self, terminal: Box<dyn Terminal>) -> Self {
        self.terminal = terminal;
        self
    }

    /// Set the maximum frame rate.
    #[must_use]
    pub fn frame_rate(mut self, fps: u32) -> Self {
        self.frame_interval = Duration::from_secs(1) / fps.max(1);
        self
    }

    /// Run as an inline widget of the given height at the bottom of the
    /// terminal instead of taking over the whole screen.
    #[must_use]
    pub fn inline(mut self, height: u16) -> Self {
        self.inline_height = Some(height);
        self
    }

    /// Enable mouse reporting.
    #[must_use]
    pub fn mouse(mut self, enabled: bool) -> Self {
        self.mouse = enabled;
        self
    }

    /// Control cursor visibility while running (hidden by default).
    #[must_use]
    pub fn hide_cursor(mut self, hidden: bool) -> Self {
        self.cursor_hidden = hidden;
        self
    }

    /// Install a global key handler consulted before focus dispatch.
    /// Return true to consume the event.
    #[must_use]
    pub fn on_key(mut self, f: impl FnMut(&KeyEvent) -> bool + 'static) -> Self {
        self.global_key = Some(Box::new(f));
        self
    }

    /// A cloneable handle for watchers and background threads.
    pub fn handle(&self) -> AppHandle {
        self.handle.clone()
    }

    /// Create a state cell owned by this app: changes mark it dirty.
    pub fn state<T: Clone + PartialEq + Send + 'static>(&self, value: T) -> State<T> {
        let s = State::new(value);
        s.attach(&self.handle);
        s
    }

    /// Mount a keyed child component at `index` within the component
    /// currently rendering. The same slot returns the same component
    /// across frames; `init` runs once, its cleanup when the slot
    /// disappears.
    pub fn mount(
        &self,
        index: usize,
        factory: impl FnOnce() -> Box<dyn Component>,
    ) -> Element {
        let parent = self.render_stack.borrow().last().copied().unwrap_or(0);
        let key = (parent, index);

        let cached = self.mounter.borrow().get(key);
        let (comp, id) = match cached {
            Some(found) => found,
            None => {
                let mut boxed = factory();
                boxed.bind_app(&self.handle);
                let cleanup = boxed.init();
                let comp: SharedComponent = Rc::new(RefCell::new(boxed));
                let id = self
                    .mounter
                    .borrow_mut()
                    .insert(key, Rc::clone(&comp), cleanup);
                (comp, id)
            }
        };
        self.mounter.borrow_mut().mark_active(key);

        self.render_stack.borrow_mut().push(id);
        let element = comp.borrow_mut().render(self);
        self.render_stack.borrow_mut().pop();

        element.set_component(Rc::clone(&comp));
        element
    }

    /// Run the app until [`AppHandle::stop`] is called or the terminal
    /// fails. The terminal is restored on every exit path.
    pub fn run(&mut self) -> Result<()> {
        if !handle::set_current(self.handle.clone()) {
            return Err(Error::AlreadyRunning);
        }
        let result = self.run_inner();
        let restore = self.restore_terminal();
        handle::clear_current();
        result.and(restore)
    }

    fn run_inner(&mut self) -> Result<()> {
        self.acquire_terminal()?;

        let poll = self.frame_interval.min(Duration::from_millis(16));
        let reader = InputReader::spawn(self.stop_rx.clone(), poll)?;

        self.render_frame()?;
        self.start_watchers();

        let jobs_rx = self.jobs_rx.clone();
        let updates_rx = self.updates_rx.clone();
        let stop_rx = self.stop_rx.clone();
        let input_rx = reader.events().clone();
        let frames = tick(self.frame_interval);

        let run_result = loop {
            select! {
                recv(stop_rx) -> _ => break Ok(()),
                recv(jobs_rx) -> job => {
                    match job {
                        Ok(job) => {
                            job(self);
                            // Coalesce: drain whatever else is pending.
                            while let Ok(job) = jobs_rx.try_recv() {
                                job(self);
                            }
                        }
                        Err(_) => break Ok(()),
                    }
                }
                recv(updates_rx) -> job => {
                    if let Ok(job) = job {
                        job(self);
                    }
                }
                recv(input_rx) -> ev => {
                    match ev {
                        Ok(ev) => self.dispatch_event(ev),
                        // The reader also exits when the stop channel
                        // closes; only an unexpected death is fatal.
                        Err(_) if self.handle.is_stopped() => break Ok(()),
                        Err(_) => break Err(Error::Terminal("input reader closed".into())),
                    }
                }
                recv(frames) -> _ => {
                    let due = self
                        .last_render
                        .is_none_or(|t| t.elapsed() >= self.frame_interval);
                    if due && self.handle.check_and_clear_dirty() {
                        self.render_frame()?;
                    }
                }
            }
            if self.handle.is_stopped() {
                break Ok(());
            }
        };

        // Shutdown: close the stop channel (idempotent), let every
        // producer observe it, then join them. The reader goes last.
        self.handle.stop();
        self.watcher_ctx.join_all();
        reader.join();
        if let Some(cleanup) = self.root_cleanup.take() {
            cleanup();
        }
        for cleanup in self.mounter.borrow_mut().drain_cleanups() {
            cleanup();
        }

        run_result
    }

    fn acquire_terminal(&mut self) -> Result<()> {
        self.terminal.enter_raw_mode()?;
        let (w, h) = self.terminal.size()?;

        if let Some(height) = self.inline_height {
            let inline = InlineState::new(h, height);
            self.buffer = Buffer::new(i32::from(w), i32::from(inline.height));
            self.inline = Some(inline);
        } else {
            self.terminal.enter_alt_screen()?;
            self.terminal.clear()?;
            self.buffer = Buffer::new(i32::from(w), i32::from(h));
        }

        if self.cursor_hidden {
            self.terminal.hide_cursor()?;
        }
        if self.mouse {
            self.terminal.enable_mouse()?;
        }
        Ok(())
    }

    fn restore_terminal(&mut self) -> Result<()> {
        if let Some(inline) = &self.inline
            && !self.in_alt_screen
        {
            // Park the cursor at the widget top and clear it away.
            let seq = inline.clear_widget_seq();
            self.terminal.write_direct(seq.as_bytes())?;
        }
        self.terminal.disable_mouse()?;
        self.terminal.show_cursor()?;
        self.terminal.exit_alt_screen()?;
        self.terminal.flush()?;
        self.terminal.exit_raw_mode()?;
        Ok(())
    }

    /// Dispatch one input event through the global handler, focus
    /// routing, hit testing, and the component chain.
    pub fn dispatch_event(&mut self, ev: Event) {
        match ev {
            Event::Resize(w, h) => self.handle_resize(w, h),
            Event::Key(key) => {
                if let Some(f) = self.global_key.as_mut()
                    && f(&key)
                {
                    self.handle.mark_dirty();
                    return;
                }
                if key.key == Key::Tab {
                    if key.mods.contains(Mods::SHIFT) {
                        self.focus.prev();
                    } else {
                        self.focus.next();
                    }
                    self.handle.mark_dirty();
                    return;
                }
                if self.focus.dispatch(&ev) {
                    self.handle.mark_dirty();
                    return;
                }
                self.dispatch_to_components_key(&key);
            }
            Event::Mouse(me) => {
                let hit = self
                    .current_tree
                    .as_ref()
                    .and_then(|root| root.element_at(me.x, me.y));

                if me.button == MouseButton::Left && me.action == MouseAction::Press {
                    // Click-to-focus: the nearest focusable ancestor of
                    // the hit element takes focus.
                    let mut cur = hit.clone();
                    while let Some(e) = cur {
                        if e.is_focusable() {
                            self.focus.set_focus(&e);
                            self.handle.mark_dirty();
                            break;
                        }
                        cur = e.parent();
                    }
                }

                if let Some(hit) = hit
                    && hit.dispatch(&ev)
                {
                    self.handle.mark_dirty();
                    return;
                }
                self.dispatch_to_components_mouse(&me);
            }
        }
    }

    fn dispatch_to_components_key(&mut self, key: &KeyEvent) {
        for comp in self.tree_components() {
            let map = comp.borrow_mut().key_map();
            if let Some(mut map) = map
                && map.dispatch(key)
            {
                self.handle.mark_dirty();
                return;
            }
        }
    }

    fn dispatch_to_components_mouse(&mut self, me: &weft_core::MouseEvent) {
        for comp in self.tree_components() {
            if comp.borrow_mut().handle_mouse(me) {
                self.handle.mark_dirty();
                return;
            }
        }
    }

    /// Components tagged in the current tree, pre-order, deduplicated.
    fn tree_components(&self) -> Vec<SharedComponent> {
        let mut out: Vec<SharedComponent> = Vec::new();
        if let Root::Component(c) = &self.root
            && !out.iter().any(|x| Rc::ptr_eq(x, c))
        {
            out.push(Rc::clone(c));
        }
        if let Some(root) = &self.current_tree {
            collect_components(root, &mut out);
        }
        out
    }

    fn handle_resize(&mut self, w: u16, h: u16) {
        if let Some(inline) = &mut self.inline {
            inline.terminal_resized(h);
            let seq = inline.clear_widget_seq();
            let height = inline.height;
            if self.terminal.write_direct(seq.as_bytes()).is_err() {
                tracing::warn!("failed to clear inline area on resize");
            }
            self.buffer.resize(i32::from(w), i32::from(height));
        } else {
            if self.terminal.clear().is_err() {
                tracing::warn!("failed to clear terminal on resize");
            }
            self.buffer.resize(i32::from(w), i32::from(h));
        }
        self.buffer.invalidate();
        if let Some(tree) = &self.current_tree {
            tree.mark_dirty();
        }
        self.handle.mark_dirty();
    }

    /// Build, lay out, paint, and flush one frame. Public so tests and
    /// embedders can drive frames without the select loop.
    pub fn render_once(&mut self) -> Result<()> {
        self.ensure_surface()?;
        self.render_frame()
    }

    fn ensure_surface(&mut self) -> Result<()> {
        let (w, h) = self.terminal.size()?;
        if let Some(height) = self.inline_height {
            if self.inline.is_none() {
                self.inline = Some(InlineState::new(h, height));
            }
            let bh = self.inline.as_ref().map_or(height, |s| s.height);
            if self.buffer.width() != i32::from(w) || self.buffer.height() != i32::from(bh) {
                self.buffer.resize(i32::from(w), i32::from(bh));
            }
        } else if self.buffer.width() != i32::from(w) || self.buffer.height() != i32::from(h) {
            self.buffer.resize(i32::from(w), i32::from(h));
        }
        Ok(())
    }

    fn render_frame(&mut self) -> Result<()> {
        // Clear the flag up front: changes made during render leave it
        // set and the next frame picks them up.
        let _ = self.handle.check_and_clear_dirty();
        let tree = self.build_tree();
        tree.attach_app(&self.handle);
        self.current_tree = Some(tree.clone());

        let mut focusables = Vec::new();
        FocusManager::collect_focusables(&tree, &mut focusables);
        self.focus.rebuild(focusables);

        layout::calculate(&tree, self.buffer.width(), self.buffer.height());

        self.buffer.clear();
        render_tree(&mut self.buffer, &tree);

        let changes = self.buffer.diff();
        if let Some(inline) = &self.inline
            && !self.in_alt_screen
        {
            let translated: Vec<CellChange> = changes
                .into_iter()
                .map(|mut c| {
                    c.y += inline.start_row;
                    c
                })
                .collect();
            self.terminal.flush_changes(&translated)?;
        } else {
            self.terminal.flush_changes(&changes)?;
        }
        self.buffer.swap();
        tree.clear_dirty();

        for cleanup in self.mounter.borrow_mut().sweep() {
            cleanup();
        }
        self.start_watchers();

        self.last_render = Some(Instant::now());
        Ok(())
    }

    fn build_tree(&mut self) -> Element {
        match &self.root {
            Root::Element(e) => e.clone(),
            Root::Component(c) => {
                let c = Rc::clone(c);
                if !self.root_bound {
                    self.root_bound = true;
                    let mut inner = c.borrow_mut();
                    inner.bind_app(&self.handle);
                    self.root_cleanup = inner.init();
                }
                self.render_stack.borrow_mut().push(0);
                let el = c.borrow_mut().render(self);
                self.render_stack.borrow_mut().pop();
                el.set_component(Rc::clone(&c));
                el
            }
        }
    }

    /// Start watchers attached to the current tree and any components
    /// mounted since the last pass. Each starts exactly once.
    fn start_watchers(&mut self) {
        let mut watchers: Vec<Box<dyn Watcher>> = Vec::new();
        if let Some(tree) = &self.current_tree {
            tree.drain_watchers(&mut watchers);
        }

        let unstarted = self.mounter.borrow_mut().take_unstarted();
        for comp in unstarted {
            watchers.append(&mut comp.borrow_mut().watchers());
        }
        if let Root::Component(c) = &self.root
            && self.root_bound
            && !self.root_watchers_started
        {
            self.root_watchers_started = true;
            watchers.append(&mut c.borrow_mut().watchers());
        }

        for mut w in watchers {
            w.start(&self.watcher_ctx);
        }
    }

    // ----- inline mode operations -----

    /// Print a line above the inline widget. Must run on the loop
    /// thread; use [`AppHandle::print_above`] from elsewhere.
    pub fn print_above_now(&mut self, text: &str) -> Result<()> {
        let Some(inline) = &mut self.inline else {
            return Ok(());
        };
        if self.in_alt_screen {
            return Ok(());
        }
        let seq = inline.print_above_seq(text);
        if !seq.is_empty() {
            self.terminal.write_direct(seq.as_bytes())?;
            self.terminal.flush()?;
        }
        Ok(())
    }

    /// Change the inline widget height. Growth consumes blank rows
    /// above the widget before anything scrolls into history; shrinking
    /// clears the vacated rows.
    pub fn set_inline_height(&mut self, height: u16) -> Result<()> {
        let Some(inline) = &mut self.inline else {
            return Ok(());
        };
        let Some(seq) = inline.resize_seq(height) else {
            return Ok(());
        };
        let new_height = inline.height;
        // Full inline redraw: clear from the (new) widget top so stale
        // rows never survive under cells the next diff leaves blank.
        let clear = inline.clear_widget_seq();
        if !seq.is_empty() {
            self.terminal.write_direct(seq.as_bytes())?;
        }
        self.terminal.write_direct(clear.as_bytes())?;
        self.buffer
            .resize(self.buffer.width(), i32::from(new_height));
        self.buffer.invalidate();
        if let Some(tree) = &self.current_tree {
            tree.mark_dirty();
        }
        self.handle.mark_dirty();
        Ok(())
    }

    /// Enter a full-screen alternate-screen overlay on top of inline
    /// mode.
    pub fn enter_overlay(&mut self) -> Result<()> {
        if self.inline.is_none() || self.in_alt_screen {
            return Ok(());
        }
        self.terminal.enter_alt_screen()?;
        self.terminal.clear()?;
        let (w, h) = self.terminal.size()?;
        self.buffer.resize(i32::from(w), i32::from(h));
        self.buffer.invalidate();
        self.in_alt_screen = true;
        self.handle.mark_dirty();
        Ok(())
    }

    /// Leave the alternate-screen overlay, re-clearing and repositioning
    /// the inline area.
    pub fn exit_overlay(&mut self) -> Result<()> {
        if !self.in_alt_screen {
            return Ok(());
        }
        self.terminal.exit_alt_screen()?;
        self.in_alt_screen = false;
        if let Some(inline) = &self.inline {
            let seq = inline.clear_widget_seq();
            self.terminal.write_direct(seq.as_bytes())?;
            let height = inline.height;
            self.buffer.resize(self.buffer.width(), i32::from(height));
        }
        self.buffer.invalidate();
        if let Some(tree) = &self.current_tree {
            tree.mark_dirty();
        }
        self.handle.mark_dirty();
        Ok(())
    }

    /// Run every pending closure from the event and update queues
    /// without blocking. The select loop does this itself; embedders
    /// driving frames manually call it between renders.
    pub fn drain_queues(&mut self) {
        let jobs = self.jobs_rx.clone();
        while let Ok(job) = jobs.try_recv() {
            job(self);
        }
        let updates = self.updates_rx.clone();
        while let Ok(job) = updates.try_recv() {
            job(self);
        }
    }

    /// The buffer, for inspection in tests.
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// The element most recently built for rendering.
    pub fn current_tree(&self) -> Option<Element> {
        self.current_tree.clone()
    }
}

fn collect_components(el: &Element, out: &mut Vec<SharedComponent>) {
    if let Some(c) = el.component()
        && !out.iter().any(|x| Rc::ptr_eq(x, &c))
    {
        out.push(c);
    }
    for child in el.children() {
        collect_components(&child, out);
    }
}
