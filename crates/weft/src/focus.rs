//! Focus management: an ordered set of focusable elements with
//! Tab / Shift-Tab navigation and event dispatch.

use weft_core::Event;

use crate::element::Element;

/// Manages which element receives keyboard events.
///
/// Registration order determines tab order. `current` is `None` exactly
/// when nothing focusable is registered.
#[derive(Default)]
pub struct FocusManager {
    order: Vec<Element>,
    current: Option<usize>,
}

impl FocusManager {
    /// Create an empty focus manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element. If nothing is focused yet and the element is
    /// focusable, it receives focus.
    pub fn register(&mut self, el: &Element) {
        if self.order.contains(el) {
            return;
        }
        self.order.push(el.clone());
        if self.current.is_none() && el.is_focusable() {
            let idx = self.order.len() - 1;
            self.focus_index(idx);
        }
    }

    /// Unregister an element. If it was focused, focus advances to the
    /// next focusable, wrapping around.
    pub fn unregister(&mut self, el: &Element) {
        let Some(pos) = self.order.iter().position(|e| e == el) else {
            return;
        };
        let was_focused = self.current == Some(pos);
        if was_focused {
            el.set_focused(false);
        }
        self.order.remove(pos);

        match self.current {
            Some(cur) if cur > pos => self.current = Some(cur - 1),
            Some(cur) if cur == pos => {
                self.current = None;
                if !self.order.is_empty() {
                    // Advance to the next focusable from the removal
                    // point, wrapping.
                    let start = pos % self.order.len();
                    self.focus_scan(start);
                }
            }
            _ => {}
        }
    }

    /// The currently focused element.
    pub fn focused(&self) -> Option<Element> {
        self.current.and_then(|i| self.order.get(i).cloned())
    }

    /// Number of registered elements.
    pub fn count(&self) -> usize {
        self.order.len()
    }

    /// Move focus to the next focusable element (Tab), wrapping.
    pub fn next(&mut self) {
        if self.order.is_empty() {
            return;
        }
        let start = match self.current {
            Some(i) => (i + 1) % self.order.len(),
            None => 0,
        };
        self.blur_current();
        self.focus_scan(start);
    }

    /// Move focus to the previous focusable element (Shift-Tab),
    /// wrapping.
    pub fn prev(&mut self) {
        if self.order.is_empty() {
            return;
        }
        let n = self.order.len();
        let start = match self.current {
            Some(i) => (i + n - 1) % n,
            None => n - 1,
        };
        self.blur_current();
        self.focus_scan_rev(start);
    }

    /// Focus a specific element if it is registered and focusable.
    pub fn set_focus(&mut self, el: &Element) {
        if !el.is_focusable() {
            return;
        }
        let Some(pos) = self.order.iter().position(|e| e == el) else {
            return;
        };
        if self.current == Some(pos) {
            return;
        }
        self.blur_current();
        self.focus_index(pos);
    }

    /// Route an event to the focused element (with bubbling). Returns
    /// whether it was consumed.
    pub fn dispatch(&mut self, ev: &Event) -> bool {
        match self.focused() {
            Some(el) => el.dispatch(ev),
            None => false,
        }
    }

    /// Replace the registered set with a freshly built tree's focusables,
    /// preserving the focus position by index. Used by the app loop when
    /// a component root rebuilds the tree each frame.
    pub fn rebuild(&mut self, focusables: Vec<Element>) {
        let prev = self.current;
        self.order = focusables;
        self.current = None;
        if self.order.is_empty() {
            return;
        }
        let idx = prev.unwrap_or(0).min(self.order.len() - 1);
        // Adopt silently: the logical focus did not change, the handles
        // did.
        if self.order[idx].is_focusable() {
            self.order[idx].set_focused_silent(true);
            self.current = Some(idx);
        } else {
            self.focus_scan(idx);
        }
    }

    fn blur_current(&mut self) {
        if let Some(el) = self.focused() {
            el.set_focused(false);
        }
        self.current = None;
    }

    fn focus_index(&mut self, idx: usize) {
        self.current = Some(idx);
        self.order[idx].set_focused(true);
    }

    /// Scan forward from `start` (cyclically) for a focusable element.
    fn focus_scan(&mut self, start: usize) {
        let n = self.order.len();
        for off in 0..n {
            let idx = (start + off) % n;
            if self.order[idx].is_focusable() {
                self.focus_index(idx);
                return;
            }
        }
        self.current = None;
    }

    /// Scan backward from `start` (cyclically) for a focusable element.
    fn focus_scan_rev(&mut self, start: usize) {
        let n = self.order.len();
        for off in 0..n {
            let idx = (start + n - off) % n;
            if self.order[idx].is_focusable() {
                self.focus_index(idx);
                return;
            }
        }
        self.current = None;
    }

    /// Collect the focusable elements of a tree in pre-order.
    pub fn collect_focusables(root: &Element, out: &mut Vec<Element>) {
        if root.is_focusable() {
            out.push(root.clone());
        }
        for c in root.children() {
            Self::collect_focusables(&c, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::el;
    use weft_core::KeyEvent;

    fn focusable() -> Element {
        el().focusable(true)
    }

    #[test]
    fn empty_manager() {
        let mut fm = FocusManager::new();
        assert!(fm.focused().is_none());
        assert_eq!(fm.count(), 0);
        fm.next(); // no-op
        assert!(fm.focused().is_none());
    }

    #[test]
    fn register_auto_focuses_first_focusable() {
        let mut fm = FocusManager::new();
        let a = focusable();
        fm.register(&a);
        assert_eq!(fm.focused(), Some(a.clone()));
        assert!(a.is_focused());
    }

    #[test]
    fn register_non_focusable_does_not_focus() {
        let mut fm = FocusManager::new();
        let a = el();
        fm.register(&a);
        assert!(fm.focused().is_none());
    }

    #[test]
    fn duplicate_register_ignored() {
        let mut fm = FocusManager::new();
        let a = focusable();
        fm.register(&a);
        fm.register(&a);
        assert_eq!(fm.count(), 1);
    }

    #[test]
    fn next_cycles_with_wrap() {
        let mut fm = FocusManager::new();
        let (a, b, c) = (focusable(), focusable(), focusable());
        fm.register(&a);
        fm.register(&b);
        fm.register(&c);

        assert_eq!(fm.focused(), Some(a.clone()));
        fm.next();
        assert_eq!(fm.focused(), Some(b.clone()));
        assert!(!a.is_focused());
        assert!(b.is_focused());
        fm.next();
        assert_eq!(fm.focused(), Some(c.clone()));
        fm.next();
        assert_eq!(fm.focused(), Some(a));
    }

    #[test]
    fn prev_cycles_with_wrap() {
        let mut fm = FocusManager::new();
        let (a, b, c) = (focusable(), focusable(), focusable());
        fm.register(&a);
        fm.register(&b);
        fm.register(&c);

        fm.prev();
        assert_eq!(fm.focused(), Some(c.clone()));
        fm.prev();
        assert_eq!(fm.focused(), Some(b));
    }

    #[test]
    fn navigation_skips_non_focusable() {
        let mut fm = FocusManager::new();
        let a = focusable();
        let skip = el();
        let b = focusable();
        fm.register(&a);
        fm.register(&skip);
        fm.register(&b);

        fm.next();
        assert_eq!(fm.focused(), Some(b));
    }

    #[test]
    fn set_focus_directly() {
        let mut fm = FocusManager::new();
        let (a, b) = (focusable(), focusable());
        fm.register(&a);
        fm.register(&b);
        fm.set_focus(&b);
        assert_eq!(fm.focused(), Some(b.clone()));
        assert!(!a.is_focused());
        assert!(b.is_focused());
    }

    #[test]
    fn set_focus_rejects_unregistered() {
        let mut fm = FocusManager::new();
        let a = focusable();
        fm.register(&a);
        fm.set_focus(&focusable());
        assert_eq!(fm.focused(), Some(a));
    }

    #[test]
    fn unregister_focused_advances() {
        let mut fm = FocusManager::new();
        let (a, b) = (focusable(), focusable());
        fm.register(&a);
        fm.register(&b);

        fm.unregister(&a);
        assert_eq!(fm.focused(), Some(b.clone()));
        assert!(!a.is_focused());
        assert!(b.is_focused());
    }

    #[test]
    fn unregister_last_clears_focus() {
        let mut fm = FocusManager::new();
        let a = focusable();
        fm.register(&a);
        fm.unregister(&a);
        assert!(fm.focused().is_none());
        assert!(!a.is_focused());
    }

    #[test]
    fn unregister_before_focused_keeps_focus() {
        let mut fm = FocusManager::new();
        let (a, b, c) = (focusable(), focusable(), focusable());
        fm.register(&a);
        fm.register(&b);
        fm.register(&c);
        fm.set_focus(&c);
        fm.unregister(&a);
        assert_eq!(fm.focused(), Some(c));
    }

    #[test]
    fn focused_invariant_holds() {
        // After arbitrary operations, either nothing is focused and no
        // element is focusable, or the focused element is focusable.
        let mut fm = FocusManager::new();
        let a = el();
        let b = focusable();
        fm.register(&a);
        fm.register(&b);
        fm.next();
        match fm.focused() {
            Some(e) => assert!(e.is_focusable()),
            None => assert!(![&a, &b].iter().any(|e| e.is_focusable())),
        }
        fm.unregister(&b);
        assert!(fm.focused().is_none());
    }

    #[test]
    fn dispatch_routes_to_focused() {
        use std::cell::Cell;
        use std::rc::Rc;
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let a = el().focusable(true).on_key_press(move |_, _| {
            h.set(h.get() + 1);
            true
        });
        let mut fm = FocusManager::new();
        fm.register(&a);
        assert!(fm.dispatch(&Event::Key(KeyEvent::rune('x'))));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn rebuild_preserves_position() {
        let mut fm = FocusManager::new();
        let (a, b) = (focusable(), focusable());
        fm.register(&a);
        fm.register(&b);
        fm.next(); // focus b (index 1)

        let (a2, b2) = (focusable(), focusable());
        fm.rebuild(vec![a2.clone(), b2.clone()]);
        assert_eq!(fm.focused(), Some(b2.clone()));
        assert!(b2.is_focused());
        assert!(!a2.is_focused());
    }

    #[test]
    fn rebuild_clamps_index() {
        let mut fm = FocusManager::new();
        let (a, b, c) = (focusable(), focusable(), focusable());
        fm.register(&a);
        fm.register(&b);
        fm.register(&c);
        fm.set_focus(&c);

        let only = focusable();
        fm.rebuild(vec![only.clone()]);
        assert_eq!(fm.focused(), Some(only));
    }

    #[test]
    fn rebuild_to_empty() {
        let mut fm = FocusManager::new();
        let a = focusable();
        fm.register(&a);
        fm.rebuild(Vec::new());
        assert!(fm.focused().is_none());
    }
}
