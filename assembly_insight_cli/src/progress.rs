use indicatif::{ProgressBar, ProgressStyle};

use assembly_insight_lib::pipeline::Progress;

/// Per-member progress bar on stderr.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new(message: &'static str) -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) =
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>4}/{len:4} {msg}")
        {
            bar.set_style(style);
        }
        bar.set_message(message);
        Self { bar }
    }
}

impl Progress for BarProgress {
    fn begin(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
    }

    fn step(&self, label: &str) {
        self.bar.set_message(label.to_string());
        self.bar.inc(1);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
