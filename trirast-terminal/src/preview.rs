/// Framebuffer to colored terminal characters
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use std::io::Write;
use trirast_core::{Framebuffer, Rgb};

/// Character luminosity ramp (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Relative luminance of an 8-bit color in `[0, 1]`.
fn luminance([r, g, b]: Rgb) -> f32 {
    (0.2126 * r as f32 + 0.7152 * g as f32 + 0.0722 * b as f32) / 255.0
}

/// Ramp character for a color. Black is always blank.
pub fn glyph(color: Rgb) -> char {
    if color == [0, 0, 0] {
        return LUMINOSITY_RAMP[0];
    }
    let last = LUMINOSITY_RAMP.len() - 1;
    // Any lit pixel gets at least the first visible character
    let index = ((luminance(color) * last as f32).round() as usize).clamp(1, last);
    LUMINOSITY_RAMP[index]
}

fn average(top: Rgb, bottom: Rgb) -> Rgb {
    [0, 1, 2].map(|i| ((top[i] as u16 + bottom[i] as u16) / 2) as u8)
}

/// Writes a frame to a terminal, two pixel rows per character row.
///
/// Terminal cells are roughly twice as tall as they are wide, so frames
/// should be composed at twice the terminal height.
pub struct TerminalCanvas {
    columns: usize,
    rows: usize,
}

impl TerminalCanvas {
    pub fn new(columns: usize, rows: usize) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Pixel size of the frame this canvas expects.
    pub fn frame_size(&self) -> (usize, usize) {
        (self.columns, self.rows * 2)
    }

    /// Color and character of one cell.
    pub fn cell(&self, frame: &Framebuffer, column: usize, row: usize) -> (Rgb, char) {
        let top = frame.pixel(column, row * 2).unwrap_or([0, 0, 0]);
        let bottom = frame.pixel(column, row * 2 + 1).unwrap_or(top);
        let color = average(top, bottom);
        (color, glyph(color))
    }

    pub fn draw<W: Write>(&self, frame: &Framebuffer, writer: &mut W) -> std::io::Result<()> {
        let mut current: Option<Rgb> = None;
        for row in 0..self.rows {
            for column in 0..self.columns {
                let (color, c) = self.cell(frame, column, row);
                // Skip redundant color changes on runs of the same shade
                if c != ' ' && current != Some(color) {
                    let [r, g, b] = color;
                    writer.queue(SetForegroundColor(Color::Rgb { r, g, b }))?;
                    current = Some(color);
                }
                writer.queue(Print(c))?;
            }
            if row + 1 < self.rows {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_ramp_ends() {
        assert_eq!(glyph([0, 0, 0]), ' ');
        assert_eq!(glyph([255, 255, 255]), '@');
        // Very dark but lit pixels stay visible
        assert_eq!(glyph([1, 0, 0]), '.');
    }

    #[test]
    fn test_glyph_is_monotonic_in_brightness() {
        let index = |c: char| LUMINOSITY_RAMP.iter().position(|&r| r == c).unwrap();
        let mut last = 0;
        for level in (0..=255).step_by(15) {
            let i = index(glyph([level, level, level]));
            assert!(i >= last);
            last = i;
        }
    }

    #[test]
    fn test_cell_averages_row_pairs() {
        let mut frame = Framebuffer::new(2, 4).unwrap();
        frame.set_pixel(1, 2, [200, 100, 0]);
        frame.set_pixel(1, 3, [100, 50, 0]);
        let canvas = TerminalCanvas::new(2, 2);
        assert_eq!(canvas.frame_size(), (2, 4));
        assert_eq!(canvas.cell(&frame, 1, 1).0, [150, 75, 0]);
        assert_eq!(canvas.cell(&frame, 0, 0), ([0, 0, 0], ' '));
    }

    #[test]
    fn test_draw_emits_every_cell() {
        let mut frame = Framebuffer::new(3, 4).unwrap();
        frame.set_pixel(0, 0, [255, 255, 255]);
        frame.set_pixel(0, 1, [255, 255, 255]);
        let canvas = TerminalCanvas::new(3, 2);

        let mut out = Vec::new();
        canvas.draw(&frame, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains('@'));
        assert!(text.contains("\r\n"));
        assert!(text.contains("38;2;255;255;255"));
    }
}
