//! Character-grid renderer for terminals and logs.

use crate::error::HwError;
use bench_traits::{Display, SeamError};
use std::io::Write;

pub const DEFAULT_COLS: usize = 21;
pub const DEFAULT_ROWS: usize = 4;

/// Fixed-size text grid. Draw calls outside the grid are clipped; numbers
/// too wide for their field are shown as `*` fill.
pub struct TerminalDisplay {
    cols: usize,
    cells: Vec<Vec<char>>,
    sink: Option<Box<dyn Write>>,
    last_frame: String,
    frames: u64,
}

impl Default for TerminalDisplay {
    fn default() -> Self {
        Self::new(DEFAULT_COLS, DEFAULT_ROWS)
    }
}

impl std::fmt::Debug for TerminalDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalDisplay")
            .field("cols", &self.cols)
            .field("rows", &self.cells.len())
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

impl TerminalDisplay {
    /// Headless grid; `present` only snapshots the frame.
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            cells: vec![vec![' '; cols]; rows],
            sink: None,
            last_frame: String::new(),
            frames: 0,
        }
    }

    /// Print each changed frame to `sink`.
    pub fn with_sink(mut self, sink: Box<dyn Write>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn render(&self) -> String {
        self.cells
            .iter()
            .map(|row| row.iter().collect::<String>().trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn row(&self, row: usize) -> Option<String> {
        self.cells.get(row).map(|r| r.iter().collect())
    }

    /// Frames that differed from their predecessor.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn put(&mut self, text: &str, col: u8, row: u8) {
        let cols = self.cols;
        let Some(line) = self.cells.get_mut(usize::from(row)) else {
            return;
        };
        for (i, ch) in text.chars().enumerate() {
            let c = usize::from(col) + i;
            if c >= cols {
                break;
            }
            line[c] = ch;
        }
    }

    fn put_field(&mut self, mut text: String, col: u8, row: u8, width: u8) {
        let width = usize::from(width);
        if text.chars().count() > width {
            text = "*".repeat(width);
        }
        let padded = format!("{text:>width$}");
        self.put(&padded, col, row);
    }
}

impl Display for TerminalDisplay {
    fn draw_label(&mut self, text: &str, col: u8, row: u8) {
        self.put(text, col, row);
    }

    fn draw_int(&mut self, value: i32, col: u8, row: u8, width: u8) {
        self.put_field(value.to_string(), col, row, width);
    }

    fn draw_float(&mut self, value: f32, col: u8, row: u8, width: u8) {
        self.put_field(format!("{value:.1}"), col, row, width);
    }

    fn clear_region(&mut self, row: u8) {
        if let Some(line) = self.cells.get_mut(usize::from(row)) {
            line.fill(' ');
        }
    }

    fn present(&mut self) -> Result<(), SeamError> {
        let frame = self.render();
        if frame == self.last_frame {
            return Ok(());
        }
        self.frames += 1;
        if let Some(sink) = self.sink.as_mut() {
            writeln!(sink, "{frame}\n{}", "-".repeat(self.cols)).map_err(HwError::from)?;
            sink.flush().map_err(HwError::from)?;
        }
        self.last_frame = frame;
        Ok(())
    }
}
