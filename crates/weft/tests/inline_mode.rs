//! Inline-mode protocol tests: scroll-region sequences, height changes
//! without scrollback pollution, and translated rendering.

use std::sync::{Arc, Mutex};

use weft::{App, el, pct, text};
use weft_core::TestTerminal;

fn output_string(shared: &Arc<Mutex<Vec<u8>>>) -> String {
    String::from_utf8_lossy(&shared.lock().map(|g| g.clone()).unwrap_or_default()).into_owned()
}

fn clear_output(shared: &Arc<Mutex<Vec<u8>>>) {
    if let Ok(mut g) = shared.lock() {
        g.clear();
    }
}

fn inline_app(height: u16, term_h: u16) -> (App, Arc<Mutex<Vec<u8>>>) {
    let terminal = TestTerminal::new(80, term_h);
    let output = terminal.shared_output();
    let root = text("widget").width(pct(100.0)).height(pct(100.0));
    let app = App::new(root)
        .inline(height)
        .with_terminal(Box::new(terminal));
    (app, output)
}

#[test]
fn inline_render_translates_rows() {
    let (mut app, output) = inline_app(3, 24);
    app.render_once().ok();

    let written = output_string(&output);
    // Widget row 0 lands on terminal row 22 (1-indexed): 24 - 3 + 1.
    assert!(written.contains("\x1b[22;1H"), "output: {written:?}");
    assert!(written.contains("widget"));
    // Nothing above the widget area is touched.
    assert!(!written.contains("\x1b[1;1H"));
}

#[test]
fn buffer_is_widget_sized() {
    let (mut app, _) = inline_app(3, 24);
    app.render_once().ok();
    assert_eq!(app.buffer().width(), 80);
    assert_eq!(app.buffer().height(), 3);
}

#[test]
fn grow_without_history_never_scrolls() {
    // 24-row terminal, widget grows 3 → 12 step by step with nothing
    // printed above. Scrollback must gain zero lines.
    let (mut app, output) = inline_app(3, 24);
    app.render_once().ok();
    clear_output(&output);

    for h in 4..=12 {
        app.set_inline_height(h).ok();
        app.render_once().ok();
    }

    let written = output_string(&output);
    // No newline ever reaches the terminal, so nothing can scroll.
    assert!(
        !written.contains('\n'),
        "growth emitted a scrolling newline: {written:?}"
    );
    assert_eq!(app.buffer().height(), 12);
}

#[test]
fn print_above_uses_scroll_region() {
    let (mut app, output) = inline_app(3, 24);
    app.render_once().ok();
    clear_output(&output);

    app.print_above_now("build ok").ok();

    let written = output_string(&output);
    // Region restricted to rows 1..21, cursor at its bottom, text,
    // newline, region reset.
    assert!(written.starts_with("\x1b[1;21r\x1b[21;1Hbuild ok\r\n\x1b[r"));
    // Widget cells are not repainted by the print.
    assert!(!written.contains("widget"));
}

#[test]
fn grow_after_history_scrolls_content_not_blanks() {
    let (mut app, output) = inline_app(20, 24);
    app.render_once().ok();
    // Fill the four rows above the widget.
    for i in 0..4 {
        app.print_above_now(&format!("line {i}")).ok();
    }
    clear_output(&output);

    // Growing by 2 with zero blank rows must scroll exactly 2 lines.
    app.set_inline_height(22).ok();
    let written = output_string(&output);
    assert_eq!(written.matches('\n').count(), 2);
    // The scroll happens inside the region above the old widget.
    assert!(written.starts_with("\x1b[1;4r"));
}

#[test]
fn shrink_clears_vacated_rows() {
    let (mut app, output) = inline_app(10, 24);
    app.render_once().ok();
    clear_output(&output);

    app.set_inline_height(4).ok();
    let written = output_string(&output);
    // Cursor to the old widget top (row 15, 1-indexed), clear to end.
    assert!(written.starts_with("\x1b[15;1H\x1b[0J"));
    assert_eq!(app.buffer().height(), 4);
}

#[test]
fn same_height_is_a_noop() {
    let (mut app, output) = inline_app(5, 24);
    app.render_once().ok();
    clear_output(&output);

    app.set_inline_height(5).ok();
    assert!(output_string(&output).is_empty());
}

#[test]
fn print_above_is_noop_in_fullscreen() {
    let terminal = TestTerminal::new(40, 10);
    let output = terminal.shared_output();
    let root = el().width(10).height(2);
    let mut app = App::new(root).with_terminal(Box::new(terminal));
    app.render_once().ok();
    clear_output(&output);

    app.print_above_now("ignored").ok();
    assert!(output_string(&output).is_empty());
}

#[test]
fn handle_print_above_runs_via_update_queue() {
    let (mut app, output) = inline_app(3, 24);
    app.render_once().ok();
    clear_output(&output);

    let handle = app.handle();
    handle.print_above("queued line");
    // Nothing happens until the loop drains the update queue.
    assert!(output_string(&output).is_empty());
    app.drain_queues();
    assert!(output_string(&output).contains("queued line"));
}

#[test]
fn overlay_enters_fullscreen_and_restores_inline() {
    let (mut app, output) = inline_app(3, 24);
    app.render_once().ok();

    app.enter_overlay().ok();
    assert_eq!(app.buffer().height(), 24);
    let written = output_string(&output);
    assert!(written.contains("\x1b[?1049h"));

    clear_output(&output);
    app.exit_overlay().ok();
    let written = output_string(&output);
    assert!(written.contains("\x1b[?1049l"));
    // Inline area re-cleared and repositioned.
    assert!(written.contains("\x1b[22;1H\x1b[0J"));
    assert_eq!(app.buffer().height(), 3);
}

#[test]
fn resize_recomputes_inline_geometry() {
    let (mut app, _) = inline_app(6, 24);
    app.render_once().ok();

    app.dispatch_event(weft::Event::Resize(60, 12));
    assert_eq!(app.buffer().width(), 60);
    assert_eq!(app.buffer().height(), 6);

    // Shrinking the terminal below the widget height caps the widget.
    app.dispatch_event(weft::Event::Resize(60, 4));
    assert_eq!(app.buffer().height(), 4);
}
