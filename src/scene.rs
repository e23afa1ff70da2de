//! Rendering surface.
//!
//! The viewer draws through [`Scene`] only: rectangles, outlines, text, grouped nodes and
//! named widgets that can be shown or hidden. [`TextScene`] rasterises that onto a
//! character grid and writes ANSI frames to any writer.

use std::collections::HashMap;
use std::io::Write;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("failed to write frame: {0}")]
    Io(#[from] std::io::Error),
    #[error("scene lock poisoned")]
    Poisoned,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn centered(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }
}

/// 0xRRGGBB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    pub const BACKGROUND: Self = Self(0x333333);
    pub const SPRITE: Self = Self(0x0000ff);
    pub const BAR_BACK: Self = Self(0xff0000);
    pub const BAR_FILL: Self = Self(0x00ff00);
    pub const TEXT: Self = Self(0xffffff);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// Fixed regions of the screen whose text and visibility the viewer toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Widget {
    Status,
    Metrics,
    Loading,
    Error,
    Stats,
    Log,
    LogModal,
    ReplayButton,
    ViewLogButton,
}

impl Widget {
    const PANEL_ORDER: [Widget; 7] = [
        Widget::Status,
        Widget::Metrics,
        Widget::Loading,
        Widget::Error,
        Widget::Stats,
        Widget::Log,
        Widget::LogModal,
    ];
}

pub trait Scene {
    /// Drop everything drawn on the dynamic layer (sprites, bars, labels).
    fn clear(&mut self);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn stroke_rect(&mut self, rect: Rect, color: Color, alpha: f32);
    fn text(&mut self, x: f64, y: f64, text: &str, align: Align);
    /// Following draw calls are relative to `(x, y)` until the matching `pop_group`.
    fn push_group(&mut self, x: f64, y: f64);
    fn pop_group(&mut self);
    fn set_widget_text(&mut self, widget: Widget, text: &str);
    fn set_visible(&mut self, widget: Widget, visible: bool);
    fn present(&mut self) -> Result<(), SceneError>;
}

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const CLEAR: &str = "\x1b[2J\x1b[H";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const BLUE: &str = "\x1b[34m";
    pub const WHITE: &str = "\x1b[37m";
    pub const GRAY: &str = "\x1b[90m";
}

fn ansi_for(color: Color) -> &'static str {
    match color {
        Color::BAR_BACK => ansi::RED,
        Color::BAR_FILL => ansi::GREEN,
        Color::SPRITE => ansi::BLUE,
        Color::BACKGROUND => ansi::GRAY,
        _ => ansi::WHITE,
    }
}

fn glyph_for(color: Color) -> char {
    match color {
        Color::SPRITE => '#',
        Color::BAR_FILL => '=',
        Color::BAR_BACK => '-',
        _ => '+',
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    glyph: char,
    color: Color,
}

const BLANK: Cell = Cell {
    glyph: ' ',
    color: Color::BACKGROUND,
};

#[derive(Debug, Clone, Default)]
struct WidgetState {
    text: String,
    visible: bool,
}

#[derive(Debug, Clone)]
pub struct TextSceneConfig {
    pub canvas_width: f64,
    pub canvas_height: f64,
    /// Canvas units per grid column.
    pub cell_width: f64,
    /// Canvas units per grid row.
    pub cell_height: f64,
    pub use_color: bool,
    pub clear_screen: bool,
}

impl Default for TextSceneConfig {
    fn default() -> Self {
        Self {
            canvas_width: 800.0,
            canvas_height: 600.0,
            cell_width: 10.0,
            cell_height: 25.0,
            use_color: true,
            clear_screen: true,
        }
    }
}

/// Character-grid renderer for terminals.
pub struct TextScene<W: Write> {
    out: W,
    config: TextSceneConfig,
    cols: usize,
    rows: usize,
    cells: Vec<Cell>,
    origins: Vec<(f64, f64)>,
    widgets: HashMap<Widget, WidgetState>,
}

impl<W: Write> TextScene<W> {
    pub fn new(out: W, config: TextSceneConfig) -> Self {
        let cols = (config.canvas_width / config.cell_width).round().max(1.0) as usize;
        let rows = (config.canvas_height / config.cell_height).round().max(1.0) as usize;
        Self {
            out,
            config,
            cols,
            rows,
            cells: vec![BLANK; cols * rows],
            origins: Vec::new(),
            widgets: HashMap::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn origin(&self) -> (f64, f64) {
        self.origins.last().copied().unwrap_or((0.0, 0.0))
    }

    fn to_cell(&self, x: f64, y: f64) -> (i64, i64) {
        let (ox, oy) = self.origin();
        (
            ((x + ox) / self.config.cell_width).floor() as i64,
            ((y + oy) / self.config.cell_height).floor() as i64,
        )
    }

    fn put(&mut self, col: i64, row: i64, cell: Cell) {
        if col < 0 || row < 0 || col as usize >= self.cols || row as usize >= self.rows {
            return;
        }
        let index = row as usize * self.cols + col as usize;
        self.cells[index] = cell;
    }

    fn cell_span(&self, rect: Rect) -> Option<((i64, i64), (i64, i64))> {
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return None;
        }
        let (ox, oy) = self.origin();
        let start = (
            ((rect.x + ox) / self.config.cell_width).round() as i64,
            ((rect.y + oy) / self.config.cell_height).round() as i64,
        );
        let end_x = ((rect.x + rect.width + ox) / self.config.cell_width).round() as i64;
        let end_y = ((rect.y + rect.height + oy) / self.config.cell_height).round() as i64;
        Some((start, (end_x.max(start.0 + 1), end_y.max(start.1 + 1))))
    }

    /// The frame `present` would write, without writing it.
    pub fn frame_text(&self) -> String {
        let mut output = String::new();
        let border = format!("+{}+\n", "-".repeat(self.cols));
        output.push_str(&border);
        for row in 0..self.rows {
            output.push('|');
            let mut current: Option<Color> = None;
            for col in 0..self.cols {
                let cell = self.cells[row * self.cols + col];
                if self.config.use_color && cell.glyph != ' ' && current != Some(cell.color) {
                    output.push_str(ansi_for(cell.color));
                    current = Some(cell.color);
                }
                output.push(cell.glyph);
            }
            if self.config.use_color && current.is_some() {
                output.push_str(ansi::RESET);
            }
            output.push_str("|\n");
        }
        output.push_str(&border);

        let mut buttons = Vec::new();
        for (widget, label) in [
            (Widget::ReplayButton, "[Replay]"),
            (Widget::ViewLogButton, "[View Log]"),
        ] {
            if self.widgets.get(&widget).is_some_and(|w| w.visible) {
                buttons.push(label);
            }
        }
        if !buttons.is_empty() {
            output.push_str(&buttons.join(" "));
            output.push('\n');
        }

        for widget in Widget::PANEL_ORDER {
            let Some(state) = self.widgets.get(&widget) else {
                continue;
            };
            if !state.visible || state.text.is_empty() {
                continue;
            }
            if self.config.use_color && widget == Widget::Error {
                output.push_str(ansi::RED);
                output.push_str(&state.text);
                output.push_str(ansi::RESET);
            } else {
                output.push_str(&state.text);
            }
            output.push('\n');
        }
        output
    }
}

impl<W: Write> Scene for TextScene<W> {
    fn clear(&mut self) {
        self.cells.fill(BLANK);
        self.origins.clear();
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Some(((x0, y0), (x1, y1))) = self.cell_span(rect) else {
            return;
        };
        let cell = Cell {
            glyph: glyph_for(color),
            color,
        };
        for row in y0..y1 {
            for col in x0..x1 {
                self.put(col, row, cell);
            }
        }
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, alpha: f32) {
        let Some(((x0, y0), (x1, _))) = self.cell_span(rect) else {
            return;
        };
        // Bright phase of a pulse gets the heavier marker.
        let glyph = if alpha >= 0.7 { '!' } else { ':' };
        let cell = Cell { glyph, color };
        self.put(x0 - 1, y0, cell);
        self.put(x1, y0, cell);
    }

    fn text(&mut self, x: f64, y: f64, text: &str, align: Align) {
        let (col, row) = self.to_cell(x, y);
        let len = text.chars().count() as i64;
        let start = match align {
            Align::Left => col,
            Align::Center => col - len / 2,
        };
        for (offset, glyph) in text.chars().enumerate() {
            self.put(
                start + offset as i64,
                row,
                Cell {
                    glyph,
                    color: Color::TEXT,
                },
            );
        }
    }

    fn push_group(&mut self, x: f64, y: f64) {
        let (ox, oy) = self.origin();
        self.origins.push((ox + x, oy + y));
    }

    fn pop_group(&mut self) {
        self.origins.pop();
    }

    fn set_widget_text(&mut self, widget: Widget, text: &str) {
        self.widgets.entry(widget).or_default().text = text.to_string();
    }

    fn set_visible(&mut self, widget: Widget, visible: bool) {
        self.widgets.entry(widget).or_default().visible = visible;
    }

    fn present(&mut self) -> Result<(), SceneError> {
        let frame = self.frame_text();
        if self.config.clear_screen {
            self.out.write_all(ansi::CLEAR.as_bytes())?;
        }
        self.out.write_all(frame.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}
