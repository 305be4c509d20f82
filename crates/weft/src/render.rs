//! Tree renderer.
//!
//! Pre-order walk of the element tree writing cells into the back
//! buffer: style cascade with auto-contrast, backgrounds and borders
//! (solid or gradient), aligned text, and clipped scroll viewports with
//! a scrollbar.

use unicode_width::UnicodeWidthChar;
use weft_core::{Buffer, Color, Gradient, NamedColor, Rect, Style};

use crate::element::Element;

/// Inherited style flowing down the cascade. Border style does not
/// cascade.
#[derive(Clone, Copy)]
struct Inherited {
    text_style: Style,
    background: Option<Style>,
}

/// Render the tree rooted at `root` into the buffer's back grid.
pub fn render_tree(buf: &mut Buffer, root: &Element) {
    let inherited = Inherited {
        text_style: Style::default(),
        background: None,
    };
    render_element(buf, root, inherited, buf.rect());
}

fn render_element(buf: &mut Buffer, el: &Element, inherited: Inherited, clip: Rect) {
    el.invoke_update();

    let layout = el.layout();
    let rect = layout.rect;
    if !rect.intersects(clip) {
        return;
    }

    // Cascade: text style and background flow from the parent unless
    // set here.
    let (own_text, text_set) = el.text_style_raw();
    let mut text_style = if text_set { own_text } else { inherited.text_style };
    let background = el.background_style().or(inherited.background);

    // Auto-contrast: default foreground on a light background becomes
    // black.
    let bg_color = background.map_or(Color::Default, |b| b.bg);
    if !bg_color.is_default() && bg_color.is_light() && text_style.fg.is_default() {
        text_style.fg = Color::Named(NamedColor::Black);
    }

    let overridden = el.invoke_render_override(buf);

    if !overridden {
        if el.is_hr() {
            draw_hr(buf, el, text_style, clip);
            return;
        }

        if let Some(g) = el.bg_gradient_value() {
            fill_gradient_clipped(buf, rect, &g, background.unwrap_or_default(), clip);
        } else if let Some(bg) = el.background_style() {
            let paint = rect.intersection(clip);
            buf.fill(paint, ' ', bg);
        }

        draw_border(buf, el, clip);

        let content = el.text_content();
        if !content.is_empty() {
            draw_text(buf, el, &content, text_style, clip);
        }
    }

    let child_inherited = Inherited {
        text_style,
        background,
    };

    let mode = el.scroll_mode();
    if mode.any() {
        let viewport = layout.content_rect;
        let (_, ch) = el.content_size();
        let scrollbar = mode.vertical() && ch > viewport.height;
        let inner_w = if scrollbar {
            (viewport.width - 1).max(0)
        } else {
            viewport.width
        };
        let child_clip = Rect::new(viewport.x, viewport.y, inner_w, viewport.height)
            .intersection(clip);
        for c in el.children() {
            render_element(buf, &c, child_inherited, child_clip);
        }
        if scrollbar {
            draw_scrollbar(buf, el, viewport, clip);
        }
    } else {
        for c in el.children() {
            render_element(buf, &c, child_inherited, clip);
        }
    }
}

/// Write a rune if it falls inside the clip rect.
fn put(buf: &mut Buffer, clip: Rect, x: i32, y: i32, rune: char, style: Style) {
    if clip.contains(x, y) {
        buf.set_rune(x, y, rune, style);
    }
}

fn draw_hr(buf: &mut Buffer, el: &Element, text_style: Style, clip: Rect) {
    let Some(runes) = el.border_kind().runes() else {
        return;
    };
    let content = el.layout().content_rect;
    if content.is_empty() {
        return;
    }
    let style = text_style.merge(&el.border_color_style());
    let gradient = el.border_gradient_value();
    let span = (content.width - 1).max(1) as f32;
    let y = content.y;
    for x in content.x..content.right() {
        let mut st = style;
        if let Some(g) = &gradient {
            st.fg = g.at((x - content.x) as f32 / span);
        }
        put(buf, clip, x, y, runes.horizontal, st);
    }
}

fn draw_border(buf: &mut Buffer, el: &Element, clip: Rect) {
    let Some(runes) = el.border_kind().runes() else {
        return;
    };
    let rect = el.layout().rect;
    if rect.width < 1 || rect.height < 1 {
        return;
    }
    let base = el.border_color_style();
    let gradient = el.border_gradient_value();
    let span = (rect.width - 1).max(1) as f32;
    let styled = |x: i32| -> Style {
        let mut st = base;
        if let Some(g) = &gradient {
            st.fg = g.at((x - rect.x) as f32 / span);
        }
        st
    };

    let top = rect.y;
    let bottom = rect.bottom() - 1;
    let left = rect.x;
    let right = rect.right() - 1;

    put(buf, clip, left, top, runes.top_left, styled(left));
    if rect.width > 1 {
        put(buf, clip, right, top, runes.top_right, styled(right));
    }
    if rect.height > 1 {
        put(buf, clip, left, bottom, runes.bottom_left, styled(left));
        if rect.width > 1 {
            put(buf, clip, right, bottom, runes.bottom_right, styled(right));
        }
    }
    for x in left + 1..right {
        put(buf, clip, x, top, runes.horizontal, styled(x));
        if rect.height > 1 {
            put(buf, clip, x, bottom, runes.horizontal, styled(x));
        }
    }
    for y in top + 1..bottom {
        put(buf, clip, left, y, runes.vertical, styled(left));
        if rect.width > 1 {
            put(buf, clip, right, y, runes.vertical, styled(right));
        }
    }
}

fn draw_text(buf: &mut Buffer, el: &Element, content: &str, text_style: Style, clip: Rect) {
    let area = el.layout().content_rect;
    if area.is_empty() {
        return;
    }
    let text_clip = area.intersection(clip);
    let y = area.y;

    let text_width = el.text_width();
    let mut x = area.x;
    if area.width > text_width {
        match el.text_alignment() {
            crate::style::TextAlign::Left => {}
            crate::style::TextAlign::Center => x += (area.width - text_width) / 2,
            crate::style::TextAlign::Right => x += area.width - text_width,
        }
    }

    let gradient = el.text_gradient_value();

    // Cell-by-cell when a gradient is active or the effective text
    // background is default, preserving any background painted by
    // ancestors.
    if gradient.is_some() || text_style.bg.is_default() {
        let count = content.chars().count();
        let span = (count.saturating_sub(1)).max(1) as f32;
        let mut cx = x;
        for (i, rune) in content.chars().enumerate() {
            let w = UnicodeWidthChar::width(rune).unwrap_or(0) as i32;
            if w == 0 {
                continue;
            }
            if cx >= text_clip.right() {
                break;
            }
            if cx >= text_clip.x && cx + w <= text_clip.right() && !text_clip.is_empty() {
                let mut st = text_style;
                if let Some(g) = &gradient {
                    st.fg = g.at(i as f32 / span);
                }
                if st.bg.is_default()
                    && let Some(under) = buf.get(cx, y)
                {
                    st.bg = under.style.bg;
                }
                put(buf, text_clip, cx, y, rune, st);
            }
            cx += w;
        }
    } else {
        buf.set_string_clipped(x, y, content, text_style, text_clip);
    }
}

fn fill_gradient_clipped(buf: &mut Buffer, rect: Rect, g: &Gradient, base: Style, clip: Rect) {
    let paint = rect.intersection(clip);
    if paint.is_empty() {
        return;
    }
    let span = (rect.width - 1).max(1) as f32;
    for y in paint.y..paint.bottom() {
        for x in paint.x..paint.right() {
            let t = ((x - rect.x) as f32 / span).clamp(0.0, 1.0);
            buf.set_rune(x, y, ' ', base.bg(g.at(t)));
        }
    }
}

fn draw_scrollbar(buf: &mut Buffer, el: &Element, viewport: Rect, clip: Rect) {
    let (_, content_h) = el.content_size();
    let track_h = viewport.height;
    if track_h <= 0 || content_h <= track_h {
        return;
    }
    let x = viewport.right() - 1;
    let thumb_h = ((track_h * track_h) / content_h).max(1);
    let max_scroll = content_h - track_h;
    let (_, sy) = el.scroll_offset();
    let thumb_top = if max_scroll > 0 {
        sy * (track_h - thumb_h) / max_scroll
    } else {
        0
    };
    let style = el.border_color_style();
    for i in 0..track_h {
        let rune = if i >= thumb_top && i < thumb_top + thumb_h {
            '█'
        } else {
            '│'
        };
        put(buf, clip, x, viewport.y + i, rune, style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{el, hr, text};
    use crate::layout::calculate;
    use crate::style::{BorderStyle, ScrollMode, TextAlign};
    use weft_core::Edges;

    fn render(root: &Element, w: i32, h: i32) -> Buffer {
        let mut buf = Buffer::new(w, h);
        calculate(root, w, h);
        render_tree(&mut buf, root);
        buf
    }

    #[test]
    fn border_box() {
        let root = el().width(10).height(5).border(BorderStyle::Single);
        let buf = render(&root, 10, 5);
        assert_eq!(buf.row_string(0), "┌────────┐");
        for y in 1..4 {
            assert_eq!(buf.row_string(y), "│        │");
        }
        assert_eq!(buf.row_string(4), "└────────┘");
    }

    #[test]
    fn double_border_runes() {
        let root = el().width(4).height(3).border(BorderStyle::Double);
        let buf = render(&root, 4, 3);
        assert_eq!(buf.row_string(0), "╔══╗");
        assert_eq!(buf.row_string(1), "║  ║");
        assert_eq!(buf.row_string(2), "╚══╝");
    }

    #[test]
    fn text_basic() {
        let root = text("hello").width(10).height(1);
        let buf = render(&root, 10, 1);
        assert_eq!(buf.row_string(0), "hello     ");
    }

    #[test]
    fn text_align_center() {
        let root = text("Hi").width(20).height(1).text_align(TextAlign::Center);
        let buf = render(&root, 20, 1);
        assert_eq!(buf.get(9, 0).map(|c| c.rune), Some('H'));
        assert_eq!(buf.get(10, 0).map(|c| c.rune), Some('i'));
    }

    #[test]
    fn text_align_right() {
        let root = text("ab").width(10).height(1).text_align(TextAlign::Right);
        let buf = render(&root, 10, 1);
        assert_eq!(buf.get(8, 0).map(|c| c.rune), Some('a'));
        assert_eq!(buf.get(9, 0).map(|c| c.rune), Some('b'));
    }

    #[test]
    fn text_inside_border() {
        let root = text("hi").width(6).height(3).border(BorderStyle::Single);
        let buf = render(&root, 6, 3);
        assert_eq!(buf.row_string(1), "│hi  │");
    }

    #[test]
    fn background_fill() {
        let bg = Style::new().bg(Color::Named(NamedColor::Blue));
        let root = el().width(4).height(2).background(bg);
        let buf = render(&root, 4, 2);
        for y in 0..2 {
            for x in 0..4 {
                assert_eq!(
                    buf.get(x, y).map(|c| c.style.bg),
                    Some(Color::Named(NamedColor::Blue))
                );
            }
        }
    }

    #[test]
    fn text_preserves_ancestor_background() {
        let bg = Style::new().bg(Color::Named(NamedColor::Blue));
        let root = el()
            .width(6)
            .height(1)
            .background(bg)
            .child(text("ok").width(6).height(1));
        let buf = render(&root, 6, 1);
        // The text cells keep the painted background.
        assert_eq!(buf.get(0, 0).map(|c| c.rune), Some('o'));
        assert_eq!(
            buf.get(0, 0).map(|c| c.style.bg),
            Some(Color::Named(NamedColor::Blue))
        );
    }

    #[test]
    fn auto_contrast_on_light_background() {
        let bg = Style::new().bg(Color::Named(NamedColor::BrightWhite));
        let root = el()
            .width(4)
            .height(1)
            .background(bg)
            .child(text("x").width(4).height(1));
        let buf = render(&root, 4, 1);
        assert_eq!(
            buf.get(0, 0).map(|c| c.style.fg),
            Some(Color::Named(NamedColor::Black))
        );
    }

    #[test]
    fn no_auto_contrast_with_explicit_fg() {
        let bg = Style::new().bg(Color::Named(NamedColor::BrightWhite));
        let fg = Style::new().fg(Color::Named(NamedColor::Red));
        let root = el()
            .width(4)
            .height(1)
            .background(bg)
            .child(text("x").text_style(fg).width(4).height(1));
        let buf = render(&root, 4, 1);
        assert_eq!(
            buf.get(0, 0).map(|c| c.style.fg),
            Some(Color::Named(NamedColor::Red))
        );
    }

    #[test]
    fn text_style_cascades_until_set() {
        let styled = Style::new().fg(Color::Named(NamedColor::Green));
        let root = el()
            .width(6)
            .height(2)
            .text_style(styled)
            .child(text("a").width(6).height(1))
            .child(
                text("b")
                    .text_style(Style::new().fg(Color::Named(NamedColor::Red)))
                    .width(6)
                    .height(1),
            );
        let buf = render(&root, 6, 2);
        assert_eq!(
            buf.get(0, 0).map(|c| c.style.fg),
            Some(Color::Named(NamedColor::Green))
        );
        assert_eq!(
            buf.get(0, 1).map(|c| c.style.fg),
            Some(Color::Named(NamedColor::Red))
        );
    }

    #[test]
    fn hr_draws_horizontal_rune() {
        let root = el().width(8).height(3).child(text("a")).child(hr());
        let buf = render(&root, 8, 3);
        assert_eq!(buf.row_string(1), "────────");
    }

    #[test]
    fn text_gradient_per_rune() {
        let g = Gradient::linear(Color::Rgb { r: 0, g: 0, b: 0 }, Color::Rgb {
            r: 200,
            g: 0,
            b: 0,
        });
        let root = text("abc").width(3).height(1).text_gradient(g);
        let buf = render(&root, 3, 1);
        assert_eq!(
            buf.get(0, 0).map(|c| c.style.fg),
            Some(Color::Rgb { r: 0, g: 0, b: 0 })
        );
        assert_eq!(
            buf.get(1, 0).map(|c| c.style.fg),
            Some(Color::Rgb { r: 100, g: 0, b: 0 })
        );
        assert_eq!(
            buf.get(2, 0).map(|c| c.style.fg),
            Some(Color::Rgb { r: 200, g: 0, b: 0 })
        );
    }

    #[test]
    fn bg_gradient_fills_columns() {
        let g = Gradient::linear(Color::Rgb { r: 0, g: 0, b: 0 }, Color::Rgb {
            r: 100,
            g: 0,
            b: 0,
        });
        let root = el().width(2).height(1).bg_gradient(g);
        let buf = render(&root, 2, 1);
        assert_eq!(
            buf.get(0, 0).map(|c| c.style.bg),
            Some(Color::Rgb { r: 0, g: 0, b: 0 })
        );
        assert_eq!(
            buf.get(1, 0).map(|c| c.style.bg),
            Some(Color::Rgb { r: 100, g: 0, b: 0 })
        );
    }

    #[test]
    fn offscreen_subtree_skipped() {
        let child = text("far").width(3).height(1).margin(Edges::trbl(99, 0, 0, 0));
        let root = el().width(10).height(5).child(child);
        let buf = render(&root, 10, 5);
        for y in 0..5 {
            assert_eq!(buf.row_string(y), "          ");
        }
    }

    #[test]
    fn scroll_viewport_clips_children() {
        let scroller = el().scroll(ScrollMode::Vertical).width(10).height(3);
        for i in 0..8 {
            scroller.add_child(text(format!("line{i}")).height(1));
        }
        let buf = render(&scroller, 10, 3);
        assert!(buf.row_string(0).starts_with("line0"));
        assert!(buf.row_string(2).starts_with("line2"));
        // Nothing painted below the viewport.
        assert_eq!(buf.row_string(3), "");
    }

    #[test]
    fn scroll_offset_changes_visible_rows() {
        let scroller = el().scroll(ScrollMode::Vertical).width(10).height(3);
        for i in 0..8 {
            scroller.add_child(text(format!("line{i}")).height(1));
        }
        calculate(&scroller, 10, 3);
        scroller.scroll_to(0, 4);
        let buf = render(&scroller, 10, 3);
        assert!(buf.row_string(0).starts_with("line4"));
        assert!(buf.row_string(2).starts_with("line6"));
    }

    #[test]
    fn scrollbar_drawn_when_overflowing() {
        let scroller = el().scroll(ScrollMode::Vertical).width(10).height(4);
        for i in 0..12 {
            scroller.add_child(text(format!("{i}")).height(1));
        }
        let buf = render(&scroller, 10, 4);
        // Track column is the last one; thumb height = max(1, 4*4/12) = 1.
        let col: Vec<char> = (0..4)
            .filter_map(|y| buf.get(9, y).map(|c| c.rune))
            .collect();
        assert_eq!(col.iter().filter(|&&c| c == '█').count(), 1);
        assert_eq!(col.iter().filter(|&&c| c == '│').count(), 3);
        // At scroll 0 the thumb is at the top.
        assert_eq!(col[0], '█');
    }

    #[test]
    fn scrollbar_thumb_tracks_offset() {
        let scroller = el().scroll(ScrollMode::Vertical).width(10).height(4);
        for i in 0..12 {
            scroller.add_child(text(format!("{i}")).height(1));
        }
        calculate(&scroller, 10, 4);
        scroller.scroll_to(0, 8); // max scroll
        let buf = render(&scroller, 10, 4);
        let col: Vec<char> = (0..4)
            .filter_map(|y| buf.get(9, y).map(|c| c.rune))
            .collect();
        assert_eq!(col[3], '█');
    }

    #[test]
    fn render_override_replaces_painting() {
        let root = el()
            .width(5)
            .height(1)
            .border(BorderStyle::Single)
            .on_render(|e, buf| {
                let r = e.layout().rect;
                buf.set_string(r.x, r.y, "12345", Style::default());
            });
        let buf = render(&root, 5, 1);
        assert_eq!(buf.row_string(0), "12345");
    }

    #[test]
    fn on_update_called_during_render() {
        use std::cell::Cell as StdCell;
        use std::rc::Rc;
        let count = Rc::new(StdCell::new(0));
        let c = Rc::clone(&count);
        let root = el().width(2).height(1).on_update(move |_| c.set(c.get() + 1));
        let _ = render(&root, 2, 1);
        assert_eq!(count.get(), 1);
    }
}
