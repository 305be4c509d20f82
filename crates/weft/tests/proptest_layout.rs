//! Property tests for the flex layout engine.

use proptest::prelude::*;
use weft::{Element, calculate, el};

fn row_of(container: i32, gap: i32, kids: &[Element]) -> Element {
    let root = el().row().width(container).height(3).gap(gap);
    for k in kids {
        root.add_child(k.clone());
    }
    root
}

proptest! {
    /// With default shrink, children never exceed the container by more
    /// than the per-child rounding slack; with shrink disabled they may
    /// overflow arbitrarily (the renderer clips).
    #[test]
    fn accounting_stays_within_budget(
        widths in proptest::collection::vec(0i32..40, 1..6),
        container in 10i32..80,
        gap in 0i32..4,
    ) {
        let kids: Vec<Element> = widths
            .iter()
            .map(|w| el().width(*w).height(1))
            .collect();
        let root = row_of(container, gap, &kids);
        calculate(&root, container, 3);

        let n = kids.len() as i32;
        let total: i32 = kids.iter().map(|k| k.layout().rect.width).sum::<i32>()
            + gap * (n - 1).max(0);
        // Each child's float size rounds independently, so the total can
        // exceed the budget by at most one cell per child.
        prop_assert!(
            total <= container.max(gap * (n - 1)) + n,
            "total {total} exceeds container {container}"
        );
    }

    /// Growth distributes all free space: the children exactly fill the
    /// container (up to rounding slack) whenever any child can grow.
    #[test]
    fn grow_fills_container(
        grows in proptest::collection::vec(1u8..4, 1..5),
        container in 20i32..100,
    ) {
        let kids: Vec<Element> = grows
            .iter()
            .map(|g| el().grow(f32::from(*g)).height(1))
            .collect();
        let root = row_of(container, 0, &kids);
        calculate(&root, container, 3);

        let n = kids.len() as i32;
        let total: i32 = kids.iter().map(|k| k.layout().rect.width).sum();
        prop_assert!((total - container).abs() <= n, "total {total} vs {container}");
    }

    /// Children never get negative sizes, whatever the inputs.
    #[test]
    fn sizes_are_never_negative(
        widths in proptest::collection::vec(0i32..30, 1..6),
        container in 0i32..20,
    ) {
        let kids: Vec<Element> = widths
            .iter()
            .map(|w| el().width(*w).height(1))
            .collect();
        let root = row_of(container, 0, &kids);
        calculate(&root, container, 3);

        for k in &kids {
            let r = k.layout().rect;
            prop_assert!(r.width >= 0);
            prop_assert!(r.height >= 0);
        }
    }
}
