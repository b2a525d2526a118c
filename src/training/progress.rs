use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;

pub const TEXT_BAR_WIDTH: usize = 100;

/// Renders loop progress. Has no effect on control flow.
pub trait ProgressReporter {
    fn begin(&mut self, label: &str, total: usize);
    fn advance(&mut self, completed: usize);
    fn finish(&mut self);
}

/// Fixed-width `[====    ] 42%` line.
pub fn render_bar(total: usize, completed: usize, width: usize) -> String {
    let completed = completed.min(total);
    let (filled, percent) = if total == 0 {
        (width, 100)
    } else {
        (width * completed / total, completed * 100 / total)
    };
    format!(
        "[{}{}] {}%",
        "=".repeat(filled),
        " ".repeat(width - filled),
        percent
    )
}

pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn begin(&mut self, _label: &str, _total: usize) {}
    fn advance(&mut self, _completed: usize) {}
    fn finish(&mut self) {}
}

/// Redraws a plain text bar in place with carriage returns.
pub struct TextProgress<W: Write> {
    out: W,
    total: usize,
}

impl TextProgress<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> TextProgress<W> {
    pub fn new(out: W) -> Self {
        Self { out, total: 0 }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, completed: usize) {
        let line = render_bar(self.total, completed, TEXT_BAR_WIDTH);
        // Progress output is best effort.
        let _ = write!(self.out, "\r{}", line);
        let _ = self.out.flush();
    }
}

impl<W: Write> ProgressReporter for TextProgress<W> {
    fn begin(&mut self, label: &str, total: usize) {
        self.total = total;
        let _ = writeln!(self.out, "{}", label);
        self.draw(0);
    }

    fn advance(&mut self, completed: usize) {
        self.draw(completed);
    }

    fn finish(&mut self) {
        self.draw(self.total);
        let _ = writeln!(self.out);
    }
}

/// indicatif progress bar, recreated for every phase.
#[derive(Default)]
pub struct BarProgress {
    bar: Option<ProgressBar>,
}

impl BarProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressReporter for BarProgress {
    fn begin(&mut self, label: &str, total: usize) {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.set_message(label.to_string());
        self.bar = Some(pb);
    }

    fn advance(&mut self, completed: usize) {
        if let Some(pb) = &self.bar {
            pb.set_position(completed as u64);
        }
    }

    fn finish(&mut self) {
        if let Some(pb) = self.bar.take() {
            pb.finish();
        }
    }
}
