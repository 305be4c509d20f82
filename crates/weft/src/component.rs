//! Components and the mount cache.
//!
//! A component produces an element subtree per frame. Mount-keyed
//! caching preserves component identity across rebuilds: the same
//! `(parent, index)` key returns the same component instance, `init`
//! runs once per lifetime, and `cleanup` runs once when the key
//! disappears from a render pass.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use weft_core::{Key, KeyEvent, Mods, MouseEvent};

use crate::app::{App, AppHandle};
use crate::element::Element;
use crate::watcher::Watcher;

/// Teardown callback stored by the mount cache.
pub type Cleanup = Box<dyn FnOnce()>;

/// Shared handle to a mounted component.
pub type SharedComponent = Rc<RefCell<Box<dyn Component>>>;

/// A UI component. `render` is required; the other capabilities have
/// default no-op implementations.
pub trait Component {
    /// Build this component's element subtree.
    fn render(&mut self, app: &App) -> Element;

    /// One-time setup when first mounted. The returned cleanup runs
    /// when the component is unmounted.
    fn init(&mut self) -> Option<Cleanup> {
        None
    }

    /// Key bindings consulted when no focused element consumed a key.
    fn key_map(&mut self) -> Option<KeyMap> {
        None
    }

    /// Mouse events not consumed by the element tree.
    fn handle_mouse(&mut self, _ev: &MouseEvent) -> bool {
        false
    }

    /// Background event sources, started once per component lifetime.
    fn watchers(&mut self) -> Vec<Box<dyn Watcher>> {
        Vec::new()
    }

    /// Receives the app handle before `init`.
    fn bind_app(&mut self, _app: &AppHandle) {}
}

/// What a key binding matches against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyPattern {
    /// Match a named key.
    pub key: Option<Key>,
    /// Match a specific rune.
    pub rune: Option<char>,
    /// Match any non-zero rune.
    pub any_rune: bool,
    /// Modifiers that must match exactly.
    pub mods: Mods,
    /// Require that no modifiers are held, regardless of `mods`.
    pub require_no_mods: bool,
}

impl KeyPattern {
    /// Pattern matching a named key.
    pub fn key(k: Key) -> Self {
        Self {
            key: Some(k),
            ..Self::default()
        }
    }

    /// Pattern matching a specific rune.
    pub fn rune(c: char) -> Self {
        Self {
            rune: Some(c),
            ..Self::default()
        }
    }

    /// Pattern matching any non-zero rune.
    pub fn any_rune() -> Self {
        Self {
            any_rune: true,
            ..Self::default()
        }
    }

    /// Require these modifiers exactly.
    #[must_use]
    pub fn with_mods(mut self, mods: Mods) -> Self {
        self.mods = mods;
        self
    }

    /// Require that no modifiers are held.
    #[must_use]
    pub fn no_mods(mut self) -> Self {
        self.require_no_mods = true;
        self
    }

    /// Check the pattern against a key event.
    pub fn matches(&self, ev: &KeyEvent) -> bool {
        let key_matched = if let Some(k) = self.key {
            ev.key == k
        } else if let Some(r) = self.rune {
            ev.key == Key::Rune && ev.rune == r
        } else if self.any_rune {
            ev.key == Key::Rune && ev.rune != '\0'
        } else {
            false
        };
        if !key_matched {
            return false;
        }
        if self.require_no_mods {
            ev.mods.is_none()
        } else {
            ev.mods == self.mods
        }
    }
}

/// One binding in a key map.
pub struct KeyBinding {
    /// What to match.
    pub pattern: KeyPattern,
    /// Handler to run on match.
    pub handler: Box<dyn FnMut(&KeyEvent)>,
    /// Whether a match consumes the event.
    pub stop: bool,
}

/// An ordered set of key bindings. The first matching binding wins.
#[derive(Default)]
pub struct KeyMap {
    bindings: Vec<KeyBinding>,
}

impl KeyMap {
    /// Create an empty key map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a consuming binding.
    #[must_use]
    pub fn bind(mut self, pattern: KeyPattern, handler: impl FnMut(&KeyEvent) + 'static) -> Self {
        self.bindings.push(KeyBinding {
            pattern,
            handler: Box::new(handler),
            stop: true,
        });
        self
    }

    /// Append a non-consuming binding (the event keeps propagating).
    #[must_use]
    pub fn bind_passthrough(
        mut self,
        pattern: KeyPattern,
        handler: impl FnMut(&KeyEvent) + 'static,
    ) -> Self {
        self.bindings.push(KeyBinding {
            pattern,
            handler: Box::new(handler),
            stop: false,
        });
        self
    }

    /// Run the first matching binding. Returns whether the event was
    /// consumed.
    pub fn dispatch(&mut self, ev: &KeyEvent) -> bool {
        for binding in &mut self.bindings {
            if binding.pattern.matches(ev) {
                (binding.handler)(ev);
                return binding.stop;
            }
        }
        false
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the map has no bindings.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Mount-cache key: identity of the mounting component plus the child
/// slot index.
pub(crate) type MountKey = (u64, usize);

pub(crate) struct MountEntry {
    pub(crate) component: SharedComponent,
    pub(crate) cleanup: Option<Cleanup>,
    pub(crate) watchers_started: bool,
    pub(crate) id: u64,
}

/// Keyed component cache with per-render sweep.
#[derive(Default)]
pub(crate) struct Mounter {
    entries: HashMap<MountKey, MountEntry>,
    active: HashSet<MountKey>,
    next_id: u64,
}

impl Mounter {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
            active: HashSet::new(),
            next_id: 1,
        }
    }

    /// Cache lookup.
    pub(crate) fn get(&self, key: MountKey) -> Option<(SharedComponent, u64)> {
        self.entries
            .get(&key)
            .map(|e| (Rc::clone(&e.component), e.id))
    }

    /// Insert a freshly created component; returns its stable id.
    pub(crate) fn insert(
        &mut self,
        key: MountKey,
        component: SharedComponent,
        cleanup: Option<Cleanup>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(key, MountEntry {
            component,
            cleanup,
            watchers_started: false,
            id,
        });
        id
    }

    /// Mark a key as touched in the current render pass.
    pub(crate) fn mark_active(&mut self, key: MountKey) {
        self.active.insert(key);
    }

    /// Evict entries not touched this pass. Returns their cleanups and
    /// resets the active set.
    pub(crate) fn sweep(&mut self) -> Vec<Cleanup> {
        let active = std::mem::take(&mut self.active);
        let mut cleanups = Vec::new();
        self.entries.retain(|key, entry| {
            if active.contains(key) {
                true
            } else {
                if let Some(c) = entry.cleanup.take() {
                    cleanups.push(c);
                }
                false
            }
        });
        cleanups
    }

    /// Components whose watchers have not been started yet; marks them
    /// started.
    pub(crate) fn take_unstarted(&mut self) -> Vec<SharedComponent> {
        let mut out = Vec::new();
        for entry in self.entries.values_mut() {
            if !entry.watchers_started {
                entry.watchers_started = true;
                out.push(Rc::clone(&entry.component));
            }
        }
        out
    }

    /// Take every remaining cleanup (app shutdown).
    pub(crate) fn drain_cleanups(&mut self) -> Vec<Cleanup> {
        self.entries
            .values_mut()
            .filter_map(|e| e.cleanup.take())
            .collect()
    }

    /// Number of live entries.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::el;
    use std::cell::Cell;

    #[test]
    fn pattern_matches_named_key() {
        let p = KeyPattern::key(Key::Enter);
        assert!(p.matches(&KeyEvent::key(Key::Enter)));
        assert!(!p.matches(&KeyEvent::key(Key::Tab)));
    }

    #[test]
    fn pattern_matches_rune() {
        let p = KeyPattern::rune('q');
        assert!(p.matches(&KeyEvent::rune('q')));
        assert!(!p.matches(&KeyEvent::rune('w')));
        assert!(!p.matches(&KeyEvent::key(Key::Enter)));
    }

    #[test]
    fn pattern_any_rune() {
        let p = KeyPattern::any_rune();
        assert!(p.matches(&KeyEvent::rune('x')));
        assert!(p.matches(&KeyEvent::rune('9')));
        assert!(!p.matches(&KeyEvent::key(Key::Up)));
    }

    #[test]
    fn pattern_mods_match_exactly() {
        let p = KeyPattern::rune('c').with_mods(Mods::CTRL);
        assert!(p.matches(&KeyEvent::rune('c').with_mods(Mods::CTRL)));
        assert!(!p.matches(&KeyEvent::rune('c')));
        assert!(!p.matches(&KeyEvent::rune('c').with_mods(Mods::CTRL | Mods::SHIFT)));
    }

    #[test]
    fn pattern_require_no_mods() {
        let p = KeyPattern::any_rune().no_mods();
        assert!(p.matches(&KeyEvent::rune('a')));
        assert!(!p.matches(&KeyEvent::rune('a').with_mods(Mods::ALT)));
    }

    #[test]
    fn keymap_first_match_wins() {
        let order = std::rc::Rc::new(Cell::new(0));
        let o1 = std::rc::Rc::clone(&order);
        let o2 = std::rc::Rc::clone(&order);
        let mut map = KeyMap::new()
            .bind(KeyPattern::any_rune(), move |_| o1.set(1))
            .bind(KeyPattern::rune('x'), move |_| o2.set(2));

        assert!(map.dispatch(&KeyEvent::rune('x')));
        // The earlier any-rune binding wins even though 'x' also matches
        // the second.
        assert_eq!(order.get(), 1);
    }

    #[test]
    fn keymap_passthrough_does_not_consume() {
        let hit = std::rc::Rc::new(Cell::new(false));
        let h = std::rc::Rc::clone(&hit);
        let mut map = KeyMap::new().bind_passthrough(KeyPattern::rune('x'), move |_| h.set(true));
        assert!(!map.dispatch(&KeyEvent::rune('x')));
        assert!(hit.get());
    }

    #[test]
    fn keymap_no_match() {
        let mut map = KeyMap::new().bind(KeyPattern::rune('x'), |_| {});
        assert!(!map.dispatch(&KeyEvent::rune('y')));
    }

    struct Dummy;
    impl Component for Dummy {
        fn render(&mut self, _app: &App) -> Element {
            el()
        }
    }

    fn shared(c: impl Component + 'static) -> SharedComponent {
        Rc::new(RefCell::new(Box::new(c)))
    }

    #[test]
    fn mounter_cache_hit_returns_same_component() {
        let mut m = Mounter::new();
        let comp = shared(Dummy);
        let id = m.insert((0, 0), Rc::clone(&comp), None);

        let (hit, hit_id) = match m.get((0, 0)) {
            Some(v) => v,
            None => unreachable!(),
        };
        assert!(Rc::ptr_eq(&hit, &comp));
        assert_eq!(hit_id, id);
        assert!(m.get((0, 1)).is_none());
    }

    #[test]
    fn mounter_sweep_evicts_untouched() {
        let mut m = Mounter::new();
        let cleaned = std::rc::Rc::new(Cell::new(false));
        let c = std::rc::Rc::clone(&cleaned);
        m.insert((0, 0), shared(Dummy), Some(Box::new(move || c.set(true))));
        m.insert((0, 1), shared(Dummy), None);

        m.mark_active((0, 1));
        let cleanups = m.sweep();
        assert_eq!(cleanups.len(), 1);
        for c in cleanups {
            c();
        }
        assert!(cleaned.get());
        assert_eq!(m.len(), 1);
        assert!(m.get((0, 0)).is_none());
        assert!(m.get((0, 1)).is_some());
    }

    #[test]
    fn mounter_sweep_resets_active_set() {
        let mut m = Mounter::new();
        m.insert((0, 0), shared(Dummy), None);
        m.mark_active((0, 0));
        assert!(m.sweep().is_empty());
        assert_eq!(m.len(), 1);
        // Second pass without touching: evicted (no cleanup registered).
        assert!(m.sweep().is_empty());
        assert_eq!(m.len(), 0);
    }

    #[test]
    fn mounter_take_unstarted_once() {
        let mut m = Mounter::new();
        m.insert((0, 0), shared(Dummy), None);
        assert_eq!(m.take_unstarted().len(), 1);
        assert!(m.take_unstarted().is_empty());
    }
}
