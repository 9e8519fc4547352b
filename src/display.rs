use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::Canvas;
use tui::widgets::{Block, Borders};
use tui::Terminal;

/// Display is what the interpreter pokes when a program asks for the
/// screen to be cleared. The core doesn't draw anything itself, so this is
/// the only hook it needs; a real frontend can do whatever it likes here.
pub trait Display {
    /// CLS
    fn clear(&mut self) -> Result<(), io::Error>;
}

// store useful metadata about the terminal
struct Resolution(usize, usize);

impl Resolution {
    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }

    /// canvas plus its border
    fn frame(&self) -> Rect {
        Rect::new(0, 0, 2 + self.0 as u16, 2 + self.1 as u16)
    }
}

/// blank monochrome frame in a terminal, rendered using TUI and crossterm
pub struct TermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    resolution: Resolution,
    clears: u64,
}

impl TermDisplay {
    pub fn new(x: usize, y: usize) -> Result<TermDisplay, io::Error> {
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        let mut d = TermDisplay {
            terminal,
            resolution: Resolution(x, y),
            clears: 0,
        };
        d.render()?;
        Ok(d)
    }

    fn render(&mut self) -> Result<(), io::Error> {
        let title = format!("CHIP-8 (cls x{})", self.clears);
        let x_bounds = self.resolution.x_bounds();
        let y_bounds = self.resolution.y_bounds();
        let size = self.resolution.frame();
        self.terminal.draw(|f| {
            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title(title)
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(x_bounds)
                .y_bounds(y_bounds)
                .marker(Marker::Block)
                .paint(|_ctx| {});
            f.render_widget(canvas, size);
        })?;
        Ok(())
    }
}

impl Display for TermDisplay {
    fn clear(&mut self) -> Result<(), io::Error> {
        self.clears += 1;
        self.render()
    }
}

/// useful for testing, and for running headless
#[derive(Debug, Default)]
pub struct DummyDisplay {
    pub clears: u64,
}

impl DummyDisplay {
    pub fn new() -> DummyDisplay {
        DummyDisplay { clears: 0 }
    }
}

impl Display for DummyDisplay {
    fn clear(&mut self) -> Result<(), io::Error> {
        self.clears += 1;
        Ok(())
    }
}
