/// Per-pass accounting for a processing run, printed as each pass lands.
pub struct PassTracker {
    metrics: Vec<PassMetric>,
}

struct PassMetric {
    pass_name: String,
    input: usize,
    kept: usize,
}

impl PassTracker {
    pub fn new() -> Self {
        PassTracker {
            metrics: Vec::new(),
        }
    }

    pub fn record(&mut self, pass_name: &str, input: usize, kept: usize) {
        println!(
            "  {}: {} in, {} kept ({} removed)",
            pass_name,
            input,
            kept,
            input.saturating_sub(kept)
        );
        self.metrics.push(PassMetric {
            pass_name: pass_name.to_string(),
            input,
            kept,
        });
    }

    pub fn total_removed(&self) -> usize {
        self.metrics
            .iter()
            .map(|m| m.input.saturating_sub(m.kept))
            .sum()
    }
}

impl Default for PassTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_counts_accumulate() {
        let mut tracker = PassTracker::new();
        tracker.record("dedup_places", 10, 8);
        tracker.record("coerce", 8, 7);
        assert_eq!(tracker.total_removed(), 3);
    }
}
