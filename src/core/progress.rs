/// Progress calculation for projects
///
/// Turns a project's accumulated time into a percentage and a fixed-width
/// text bar.

use crate::store::Project;

/// Number of cells between the bar's pipes
pub const BAR_WIDTH: usize = 30;

/// Progress helpers
pub struct Progress;

impl Progress {
    /// Percentage of the target reached
    ///
    /// `time_done / duration * 100`, or 0 for a project without a target.
    /// Not capped: overshooting a target gives more than 100.
    pub fn percentage(project: &Project) -> f64 {
        if project.duration == 0 {
            return 0.0;
        }

        project.time_done as f64 / project.duration as f64 * 100.0
    }

    /// Render a bar like `|#############                 | 43% `
    ///
    /// The fill is rounded to the nearest cell; the percentage suffix is
    /// floored, so 7.5 shows as `7%`.
    pub fn bar(percentage: f64) -> String {
        let percentage = if percentage.is_finite() {
            percentage.max(0.0)
        } else {
            0.0
        };

        let filled = ((percentage / 100.0) * BAR_WIDTH as f64).round() as usize;
        let filled = filled.min(BAR_WIDTH);

        format!(
            "|{}{}| {}% ",
            "#".repeat(filled),
            " ".repeat(BAR_WIDTH - filled),
            percentage.floor() as u64
        )
    }

    /// Percentage and bar for a project in one go
    pub fn render(project: &Project) -> String {
        Self::bar(Self::percentage(project))
    }
}
