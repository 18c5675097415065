use crate::demo::Team;
use crate::util::last_token;
use crate::xes::{Event, Log, Trace, Value, ROLE};
use tracing::debug;

/// Slices a converted log down to the part of each round an analysis cares about.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Drop events whose activity contains any of these.
    pub drop_activities: Vec<String>,
    /// Keep only events performed by this team.
    pub team: Option<Team>,
    /// Start each trace at its first event with this activity; traces without it are dropped.
    pub since: Option<String>,
    /// Replace player roles with their team tag.
    pub role_as_team: bool,
}

impl Filter {
    pub fn is_noop(&self) -> bool {
        *self == Filter::default()
    }

    pub fn apply(&self, log: &mut Log) {
        if self.is_noop() {
            return;
        }
        let before = log.traces.len();
        log.traces.retain_mut(|trace| self.apply_trace(trace));
        debug!(
            traces = log.traces.len(),
            dropped = before - log.traces.len(),
            "filtered log"
        );
    }

    /// Returns whether anything of the trace is left.
    fn apply_trace(&self, trace: &mut Trace) -> bool {
        if let Some(anchor) = &self.since {
            match trace
                .events
                .iter()
                .position(|e| e.activity() == Some(anchor.as_str()))
            {
                Some(i) => {
                    trace.events.drain(..i);
                }
                None => return false,
            }
        }

        trace.events.retain(|event| self.keeps(event));

        if self.role_as_team {
            for event in &mut trace.events {
                let tag = event.role().map(|role| last_token(role).to_owned());
                if let Some(tag) = tag {
                    event.attributes.set(ROLE, Value::String(tag));
                }
            }
        }

        !trace.events.is_empty()
    }

    fn keeps(&self, event: &Event) -> bool {
        let activity = event.activity().unwrap_or_default();
        if self
            .drop_activities
            .iter()
            .any(|pattern| activity.contains(pattern.as_str()))
        {
            return false;
        }
        match self.team {
            Some(team) => event.role().and_then(Team::of) == Some(team),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Filter;
    use crate::convert::tests::rounds;
    use crate::convert::{Converter, Options};
    use crate::demo::Team;
    use crate::mapping::Style;
    use crate::xes::{Event, Log};

    fn round_log() -> Log {
        Converter::new(Options::new(Style::Round, Team::Ct)).log(&rounds())
    }

    fn activities(log: &Log, trace: usize) -> Vec<&str> {
        log.traces[trace].events.iter().filter_map(Event::activity).collect()
    }

    #[test]
    fn test_noop() {
        let mut log = round_log();
        let untouched = log.clone();
        Filter::default().apply(&mut log);
        assert_eq!(log, untouched);
    }

    #[test]
    fn test_drop_and_team() {
        let mut log = round_log();
        Filter {
            drop_activities: vec!["Inventory".to_owned(), "Throw-".to_owned()],
            team: Some(Team::Ct),
            ..Filter::default()
        }
        .apply(&mut log);

        // round 2 only had a T plant, round 3 only a T kill
        assert_eq!(log.traces.len(), 1);
        assert_eq!(activities(&log, 0), vec!["Kill  [T]", "Kill  [T]"]);
    }

    #[test]
    fn test_since_anchor() {
        let mut log = round_log();
        Filter {
            since: Some("Kill [CT]".to_owned()),
            role_as_team: true,
            ..Filter::default()
        }
        .apply(&mut log);

        // the plant-only round has no anchor
        assert_eq!(log.traces.len(), 2);
        assert_eq!(activities(&log, 1), vec!["Kill [CT]"]);
        assert_eq!(
            activities(&log, 0),
            vec!["Kill [CT]", "Throw-Flashbang", "Kill  [T]", "Kill  [T]"]
        );
        let roles: Vec<_> = log.traces[0].events.iter().filter_map(Event::role).collect();
        assert_eq!(roles, vec!["[T]", "[CT]", "[CT]", "[CT]"]);
    }
}
