//! Terminal progress bar.

use indicatif::{ProgressBar, ProgressStyle};

use super::generator::{GenerationProgress, Update};

/// Terminal progress bar for a running generator.
///
/// The bar tracks collapsed cells of the generated half and counts resets in
/// its message.
pub struct GenerationProgressBar {
    progress_bar: ProgressBar,
    reset_count: usize,
}

impl GenerationProgressBar {
    /// Creates a bar for a grid with `cells_to_collapse` generated cells.
    pub fn new(cells_to_collapse: usize) -> Self {
        let pb = ProgressBar::new(cells_to_collapse as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} cells (Resets: {msg})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
        );
        pb.set_message("0");

        Self {
            progress_bar: pb,
            reset_count: 0,
        }
    }

    /// Reflects one progress event; `collapsed` is the number of generated
    /// cells currently holding a tile.
    pub fn observe(&mut self, progress: &GenerationProgress, collapsed: usize) {
        if progress.update == Update::Reset {
            self.record_reset();
        }
        self.progress_bar.set_position(collapsed as u64);
    }

    /// Counts one more reset.
    pub fn record_reset(&mut self) {
        self.reset_count += 1;
        self.progress_bar.set_message(self.reset_count.to_string());
    }

    /// Resets recorded so far.
    pub fn reset_count(&self) -> usize {
        self.reset_count
    }

    /// Print a message through the progress bar
    pub fn println(&self, message: impl AsRef<str>) {
        self.progress_bar.println(message);
    }

    /// Clears the bar and reports how many resets it took.
    pub fn finish(self) {
        self.progress_bar.finish_and_clear();

        if self.reset_count > 0 {
            println!("Completed with {} resets", self.reset_count);
        }
    }
}
