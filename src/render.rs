//! Terminal bar-chart rendering
//!
//! Produces pre-formatted text only; the caller decides where it goes. The
//! monitor hands it locked stdout, tests hand it a byte buffer.

use std::io::{self, Write};

/// Glyph ramp from blank to full block, one step per eighth of a cell
const BARS: [&str; 9] = [" ", "▏", "▎", "▍", "▌", "▋", "▊", "▉", "█"];

/// Total bar width in glyph cells
pub const BAR_WIDTH: usize = 32;

/// Width of the name column
const NAME_WIDTH: usize = 10;

/// ANSI sequence clearing the screen and homing the cursor
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[1;1H";

/// Format one counter line: right-aligned name and percentage, then the bar
///
/// The bar doubles the percentage to get half-block resolution: 200 eighths
/// spread over 25 cells, so every percentage point moves the bar by a
/// quarter-cell step the glyph ramp can express.
pub fn format_counter(name: &str, percentage: u32) -> String {
    let eighths = (percentage as usize) * 2;
    let full = eighths / 8;

    let mut line = format!("{:>NAME_WIDTH$} {:>3}% ", name, percentage);
    for _ in 0..full {
        line.push_str(BARS[8]);
    }
    line.push_str(BARS[eighths % 8]);
    for _ in full + 1..BAR_WIDTH {
        line.push(' ');
    }
    line
}

/// Write one full frame: clear the display, then one line per counter
///
/// `order` is the display permutation; `percentages` stays positional against
/// the counter table.
pub fn render_frame<W: Write>(
    out: &mut W,
    names: &[&str],
    percentages: &[u32],
    order: &[usize],
) -> io::Result<()> {
    out.write_all(CLEAR_SCREEN.as_bytes())?;
    for &i in order {
        writeln!(out, "{}", format_counter(names[i], percentages[i]))?;
    }
    out.flush()
}
