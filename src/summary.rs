use crate::xes::Log;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;

#[derive(Debug, Default)]
pub struct Summary {
    pub traces: usize,
    pub events: usize,
    /// Activity frequencies, most frequent first, ties by name.
    pub activities: Vec<(String, usize)>,
    pub roles: usize,
}

impl Summary {
    pub fn of(log: &Log) -> Summary {
        let mut activities: FxHashMap<&str, usize> = FxHashMap::default();
        let mut roles: FxHashSet<&str> = FxHashSet::default();
        for event in log.traces.iter().flat_map(|t| &t.events) {
            *activities.entry(event.activity().unwrap_or_default()).or_default() += 1;
            if let Some(role) = event.role() {
                roles.insert(role);
            }
        }

        let mut activities: Vec<(String, usize)> = activities
            .into_iter()
            .map(|(name, count)| (name.to_owned(), count))
            .collect();
        activities.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Summary {
            traces: log.traces.len(),
            events: log.event_count(),
            activities,
            roles: roles.len(),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn mean_trace_length(&self) -> f64 {
        if self.traces == 0 {
            0.0
        } else {
            self.events as f64 / self.traces as f64
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "traces: {}, events: {}, mean trace length: {:.2}, roles: {}",
            self.traces,
            self.events,
            self.mean_trace_length(),
            self.roles
        )?;
        for (activity, count) in &self.activities {
            writeln!(f, "{:>8}  {}", count, activity)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Summary;
    use crate::convert::tests::rounds;
    use crate::convert::{Converter, Options};
    use crate::demo::Team;
    use crate::mapping::Style;
    use crate::xes::Log;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_summary() {
        let log = Converter::new(Options::new(Style::Round, Team::Ct)).log(&rounds());
        let summary = Summary::of(&log);

        assert_eq!(summary.traces, 3);
        assert_eq!(summary.events, 9);
        assert_approx_eq!(summary.mean_trace_length(), 3.0);
        assert_eq!(
            summary.activities[..3],
            [
                ("Inventory Check".to_owned(), 2),
                ("Kill  [T]".to_owned(), 2),
                ("Kill [CT]".to_owned(), 2),
            ][..]
        );
        // ZywOo, b1t and apEX; the plant is attributed through `player`
        assert_eq!(summary.roles, 3);
        assert!(summary.to_string().starts_with("traces: 3, events: 9, mean trace length: 3.00"));
    }

    #[test]
    fn test_empty() {
        let summary = Summary::of(&Log::default());
        assert_approx_eq!(summary.mean_trace_length(), 0.0);
        assert!(summary.activities.is_empty());
    }
}
