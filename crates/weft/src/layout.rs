//! Flexbox layout engine.
//!
//! Computes absolute rectangles for a styled element tree: intrinsic
//! sizing, grow/shrink distribution with min/max clamping, justify and
//! align placement, padding/margin/gap, and scroll viewports. Sizes and
//! positions accumulate as floats and are rounded to cells only at the
//! final assignment so animated fractions do not drift.

use weft_core::{Edges, Rect};

use crate::element::{Element, LayoutResult};
use crate::style::{Align, Direction, Justify, LayoutStyle, Value};

/// Lay out the tree rooted at `root` into `available_w` × `available_h`.
pub fn calculate(root: &Element, available_w: i32, available_h: i32) {
    let style = root.style();
    let (iw, ih) = root.intrinsic_size();
    let w = resolve_dim(
        style.width,
        style.min_width,
        style.max_width,
        Some(available_w),
        iw,
    );
    let h = resolve_dim(
        style.height,
        style.min_height,
        style.max_height,
        Some(available_h),
        ih,
    );
    place(
        root,
        0.0,
        0.0,
        w,
        h,
        !style.width.is_auto(),
        !style.height.is_auto(),
    );
}

fn resolve_dim(v: Value, min: Value, max: Value, avail: Option<i32>, intrinsic: i32) -> i32 {
    clamp_dim(v.resolve(avail, intrinsic), min, max, avail)
}

/// Clamp a resolved dimension by its min/max values. Min wins over max.
fn clamp_dim(mut v: i32, min: Value, max: Value, avail: Option<i32>) -> i32 {
    if !max.is_auto() {
        v = v.min(max.resolve(avail, v));
    }
    if !min.is_auto() {
        v = v.max(min.resolve(avail, 0));
    }
    v.max(0)
}

/// Assign an element its rect and lay out its children inside.
fn place(el: &Element, x: f32, y: f32, w: i32, h: i32, def_w: bool, def_h: bool) {
    let style = el.style();
    let rect = Rect::new(x.round() as i32, y.round() as i32, w, h);
    // An hr draws its rune in the content area; its border style only
    // picks the rune and adds no box inset.
    let border = if el.is_hr() {
        0
    } else {
        el.border_kind().thickness()
    };
    let content_rect = rect.inset(style.padding).inset(Edges::all(border));
    el.set_layout(LayoutResult { rect, content_rect });

    if el.scroll_mode().any() {
        layout_scroll_children(el, content_rect);
    } else {
        layout_children(el, content_rect, def_w, def_h);
    }
}

struct Item {
    style: LayoutStyle,
    intrinsic_cross: i32,
    base: f32,
    size: f32,
    frozen: bool,
    flexed: bool,
    margin_main: i32,
    margin_main_start: i32,
    margin_cross: i32,
    margin_cross_start: i32,
    margin_cross_end: i32,
}

/// Six-phase flex layout of `el`'s children into `content`.
///
/// `def_w`/`def_h` say whether the container's size in each axis is
/// definite; children's percentages resolve to 0 against an indefinite
/// axis.
pub(crate) fn layout_children(el: &Element, content: Rect, def_w: bool, def_h: bool) {
    let children = el.children();
    if children.is_empty() {
        return;
    }
    let style = el.style();
    let dir = style.direction;

    let (main_size, cross_size) = main_cross(dir, content.width, content.height);
    let (def_main, def_cross) = match dir {
        Direction::Row => (def_w, def_h),
        Direction::Column => (def_h, def_w),
    };
    let avail_main = def_main.then_some(main_size);
    let avail_cross = def_cross.then_some(cross_size);

    let n = children.len();
    let mut items: Vec<Item> = Vec::with_capacity(n);
    for child in &children {
        let cs = child.style();
        let (iw, ih) = child.intrinsic_size();
        let (intrinsic_main, intrinsic_cross) = main_cross(dir, iw, ih);
        let hyp = cs.main_value(dir).resolve(avail_main, intrinsic_main).max(0);
        let margin = cs.margin;
        let (margin_main, margin_cross, margin_main_start, margin_cross_start, margin_cross_end) =
            match dir {
                Direction::Row => (
                    margin.horizontal(),
                    margin.vertical(),
                    margin.left,
                    margin.top,
                    margin.bottom,
                ),
                Direction::Column => (
                    margin.vertical(),
                    margin.horizontal(),
                    margin.top,
                    margin.left,
                    margin.right,
                ),
            };
        items.push(Item {
            style: cs,
            intrinsic_cross,
            base: hyp as f32,
            size: hyp as f32,
            frozen: false,
            flexed: false,
            margin_main,
            margin_main_start,
            margin_cross,
            margin_cross_start,
            margin_cross_end,
        });
    }

    let gaps = style.gap * (n as i32 - 1);
    let margins_total: i32 = items.iter().map(|it| it.margin_main).sum();
    let budget = (main_size - gaps - margins_total) as f32;

    // Grow/shrink distribution with min/max clamping. A clamped child is
    // frozen and the released or consumed space is redistributed among
    // the rest.
    for _ in 0..=n {
        let used: f32 = items.iter().map(|it| it.size).sum();
        let free = budget - used;
        let grow_total: f32 = items
            .iter()
            .filter(|it| !it.frozen)
            .map(|it| it.style.flex_grow)
            .sum();
        let shrink_total: f32 = items
            .iter()
            .filter(|it| !it.frozen)
            .map(|it| it.style.flex_shrink * it.base)
            .sum();

        if free > f32::EPSILON && grow_total > 0.0 {
            for it in items.iter_mut().filter(|it| !it.frozen) {
                if it.style.flex_grow > 0.0 {
                    it.size += free * it.style.flex_grow / grow_total;
                    it.flexed = true;
                }
            }
        } else if free < -f32::EPSILON && shrink_total > 0.0 {
            for it in items.iter_mut().filter(|it| !it.frozen) {
                let weight = it.style.flex_shrink * it.base;
                if weight > 0.0 {
                    it.size += free * weight / shrink_total;
                    it.flexed = true;
                }
            }
        } else {
            break;
        }

        let mut any_clamped = false;
        for it in items.iter_mut().filter(|it| !it.frozen) {
            let clamped = clamp_main(it, dir, avail_main);
            if (clamped - it.size).abs() > f32::EPSILON {
                it.size = clamped;
                it.frozen = true;
                any_clamped = true;
            }
        }
        if !any_clamped {
            break;
        }
    }

    for it in &mut items {
        it.size = clamp_main(it, dir, avail_main);
    }

    // Cross-axis sizes.
    let mut cross_sizes = Vec::with_capacity(n);
    for (child, it) in children.iter().zip(&items) {
        let align_eff = it.style.align_self.unwrap_or(style.align);
        let cross_value = it.style.cross_value(dir);
        let stretched =
            child.is_hr() || (align_eff == Align::Stretch && cross_value.is_auto());
        let cross = if stretched {
            (cross_size - it.margin_cross).max(0)
        } else {
            let (min, max) = cross_bounds(&it.style, dir);
            clamp_dim(
                cross_value.resolve(avail_cross, it.intrinsic_cross),
                min,
                max,
                avail_cross,
            )
        };
        cross_sizes.push((cross, align_eff, stretched));
    }

    // Main-axis distribution from justify.
    let used_final: i32 = items.iter().map(|it| it.size.round().max(0.0) as i32).sum();
    let free = (main_size - used_final - margins_total - gaps).max(0) as f32;
    let gap = style.gap as f32;
    let nf = n as f32;
    let (lead, between) = match style.justify {
        Justify::Start => (0.0, gap),
        Justify::End => (free, gap),
        Justify::Center => (free / 2.0, gap),
        Justify::SpaceBetween => {
            if n > 1 {
                (0.0, gap + free / (nf - 1.0))
            } else {
                (0.0, gap)
            }
        }
        Justify::SpaceAround => {
            let unit = free / nf;
            (unit / 2.0, gap + unit)
        }
        Justify::SpaceEvenly => {
            let unit = free / (nf + 1.0);
            (unit, gap + unit)
        }
    };

    let (main_start, cross_start) = main_cross(dir, content.x, content.y);
    let mut pos = main_start as f32 + lead;
    for ((child, it), (cross, align_eff, stretched)) in
        children.iter().zip(&items).zip(&cross_sizes)
    {
        let child_main = it.size.round().max(0.0) as i32;
        let cross_offset = match align_eff {
            Align::Start | Align::Stretch => it.margin_cross_start,
            Align::End => cross_size - cross - it.margin_cross_end,
            Align::Center => {
                it.margin_cross_start + (cross_size - cross - it.margin_cross).max(0) / 2
            }
        };

        let main_pos = pos + it.margin_main_start as f32;
        let cross_pos = (cross_start + cross_offset) as f32;
        let (x, y) = match dir {
            Direction::Row => (main_pos, cross_pos),
            Direction::Column => (cross_pos, main_pos),
        };
        let (w, h) = match dir {
            Direction::Row => (child_main, *cross),
            Direction::Column => (*cross, child_main),
        };

        let main_def = !it.style.main_value(dir).is_auto() || it.flexed;
        let cross_def = !it.style.cross_value(dir).is_auto() || *stretched;
        let (child_def_w, child_def_h) = match dir {
            Direction::Row => (main_def, cross_def),
            Direction::Column => (cross_def, main_def),
        };

        place(child, x, y, w, h, child_def_w, child_def_h);
        pos += it.margin_main as f32 + child_main as f32 + between;
    }
}

fn clamp_main(it: &Item, dir: Direction, avail: Option<i32>) -> f32 {
    let (min_v, max_v) = main_bounds(&it.style, dir);
    let mut min = 0.0f32;
    let mut max = f32::INFINITY;
    if !min_v.is_auto() {
        min = min_v.resolve(avail, 0) as f32;
    }
    if !max_v.is_auto() {
        max = max_v.resolve(avail, it.size.round() as i32) as f32;
    }
    if max < min {
        max = min;
    }
    it.size.clamp(min, max).max(0.0)
}

fn main_bounds(style: &LayoutStyle, dir: Direction) -> (Value, Value) {
    match dir {
        Direction::Row => (style.min_width, style.max_width),
        Direction::Column => (style.min_height, style.max_height),
    }
}

fn cross_bounds(style: &LayoutStyle, dir: Direction) -> (Value, Value) {
    match dir {
        Direction::Row => (style.min_height, style.max_height),
        Direction::Column => (style.min_width, style.max_width),
    }
}

const fn main_cross(dir: Direction, w: i32, h: i32) -> (i32, i32) {
    match dir {
        Direction::Row => (w, h),
        Direction::Column => (h, w),
    }
}

/// Lay out a scrollable container's children inside a virtual content
/// area sized by their intrinsic content along the scroll axes, with
/// coordinates translated by the scroll offsets.
fn layout_scroll_children(el: &Element, viewport: Rect) {
    let mode = el.scroll_mode();
    let (int_w, int_h) = children_intrinsic(el);

    let mut vw = viewport.width;
    let vh = viewport.height;
    let content_h = if mode.vertical() { int_h.max(vh) } else { vh };
    // Reserve one column for the vertical scrollbar when overflowing.
    if mode.vertical() && content_h > vh {
        vw = (vw - 1).max(0);
    }
    let content_w = if mode.horizontal() { int_w.max(vw) } else { vw };

    el.set_content_size(content_w, content_h);
    let (sx, sy) = el.scroll_offset();
    el.scroll_to(sx, sy); // re-clamp against the new content size
    let (sx, sy) = el.scroll_offset();

    layout_children(
        el,
        Rect::new(viewport.x - sx, viewport.y - sy, content_w, content_h),
        true,
        true,
    );
}

/// Intrinsic size of the children box alone (margins and gaps included,
/// the container's own padding/border excluded).
fn children_intrinsic(el: &Element) -> (i32, i32) {
    let children = el.children();
    let style = el.style();
    let n = children.len() as i32;
    let mut main = style.gap * (n - 1).max(0);
    let mut cross = 0;
    for c in &children {
        let (cw, ch) = c.intrinsic_size();
        let margin = c.style().margin;
        let (c_main, c_cross) = match style.direction {
            Direction::Row => (cw + margin.horizontal(), ch + margin.vertical()),
            Direction::Column => (ch + margin.vertical(), cw + margin.horizontal()),
        };
        main += c_main;
        cross = cross.max(c_cross);
    }
    match style.direction {
        Direction::Row => (main, cross),
        Direction::Column => (cross, main),
    }
}
