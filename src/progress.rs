//! Sweep progress statistics: counts, totals, and a linear remaining-time
//! estimate based on the average variant so far.

use std::time::Duration;

#[derive(Debug)]
pub struct SweepProgress {
    total: usize,
    completed: usize,
    elapsed_total: Duration,
}

impl SweepProgress {
    pub fn new(total: usize) -> SweepProgress {
        SweepProgress {
            total,
            completed: 0,
            elapsed_total: Duration::ZERO,
        }
    }

    /// Records one processed variant. Failed variants count too; they spent
    /// wall time like any other.
    pub fn record(&mut self, elapsed: Duration) {
        self.completed += 1;
        self.elapsed_total += elapsed;
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn total_secs(&self) -> f64 {
        self.elapsed_total.as_secs_f64()
    }

    pub fn average_secs(&self) -> f64 {
        if self.completed == 0 {
            0.0
        } else {
            self.total_secs() / self.completed as f64
        }
    }

    pub fn remaining_estimate_secs(&self) -> f64 {
        self.average_secs() * self.total.saturating_sub(self.completed) as f64
    }

    /// One-line status, used when a variant fails partway.
    pub fn status_line(&self, tag: &str, elapsed: Duration) -> String {
        format!(
            "[{}] Elapsed {:.1}s • Done {}/{} • Avg ~{:.1}s • Remaining ~{:.1}s",
            tag,
            elapsed.as_secs_f64(),
            self.completed,
            self.total,
            self.average_secs(),
            self.remaining_estimate_secs()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let progress = SweepProgress::new(4);
        assert_eq!(progress.completed(), 0);
        assert_eq!(progress.average_secs(), 0.0);
        assert_eq!(progress.remaining_estimate_secs(), 0.0);
    }

    #[test]
    fn averages_over_recorded_variants() {
        let mut progress = SweepProgress::new(4);
        progress.record(Duration::from_secs(10));
        progress.record(Duration::from_secs(20));

        assert_eq!(progress.completed(), 2);
        assert_eq!(progress.total_secs(), 30.0);
        assert_eq!(progress.average_secs(), 15.0);
        assert_eq!(progress.remaining_estimate_secs(), 30.0);
    }

    #[test]
    fn status_line_reports_all_numbers() {
        let mut progress = SweepProgress::new(3);
        progress.record(Duration::from_secs(10));
        assert_eq!(
            progress.status_line("dp-0p01__t-neg1__f-0p5__a-8deg", Duration::from_secs(10)),
            "[dp-0p01__t-neg1__f-0p5__a-8deg] Elapsed 10.0s • Done 1/3 • Avg ~10.0s • Remaining ~20.0s"
        );
    }

    #[test]
    fn estimate_never_goes_negative() {
        let mut progress = SweepProgress::new(1);
        progress.record(Duration::from_secs(5));
        progress.record(Duration::from_secs(5));
        assert_eq!(progress.remaining_estimate_secs(), 0.0);
    }
}
