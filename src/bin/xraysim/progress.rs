/// Progress bar over the angles of a rotation sequence
pub (super) struct AngleBar(ProgressBar);

impl AngleBar {
    pub (super) fn new(what: &str, n_angles: usize) -> Self {
        let bar = ProgressBar::new(n_angles as u64).with_message(what.to_string());
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{msg}\n[{elapsed_precise}] {wide_bar} {pos}/{len} ({eta_precise})") {
            bar.set_style(style);
        }
        bar.tick();
        Self(bar)
    }

    /// Callback for the engine, called after each angle
    pub (super) fn angle_done(&self, index: usize, count: usize) {
        self.0.set_position(index as u64 + 1);
        if index + 1 == count { self.0.finish_with_message("<all angles done>") }
    }
}

// ----- Imports -----------------------------------------------------------------------------------------
use indicatif::{ProgressBar, ProgressStyle};
