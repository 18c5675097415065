use crate::convert::{Converter, Options};
use crate::demo::load_rounds;
use crate::filter::Filter;
use crate::read_dir::read_dir;
use crate::xes::{Log, Value, CONCEPT_NAME};
use anyhow::{ensure, Result};
use rayon::prelude::*;
use std::path::Path;
use tracing::{info, instrument};

/// Converts and filters every round export below `dir` into one log with unique case ids.
#[instrument(name = "collect", skip(options, filter))]
pub fn collect(dir: &Path, options: Options, filter: &Filter) -> Result<Log> {
    let entries: Vec<_> = read_dir(dir)?.into_iter().collect();
    ensure!(!entries.is_empty(), "no round exports found in {}", dir.display());
    info!(
        files = entries.len(),
        bytes = entries.iter().map(|e| e.len).sum::<u64>(),
        "collecting round exports"
    );

    let converter = Converter::new(options);
    let logs = entries
        .par_iter()
        .map(|entry| {
            let rounds = load_rounds(&entry.path)?;
            let source = entry
                .path
                .strip_prefix(dir)
                .unwrap_or(&entry.path)
                .display()
                .to_string();
            let mut log = converter.log(&rounds);
            filter.apply(&mut log);
            Ok((source, log))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut collected = Log {
        attributes: converter.log_attributes(),
        traces: Vec::new(),
    };
    append_renumbered(&mut collected, logs);
    Ok(collected)
}

/// Moves the traces of `logs` into `into`, numbering cases from 1 in order. The former case id
/// and the file it came from are kept as `round` and `source`.
pub fn append_renumbered(into: &mut Log, logs: Vec<(String, Log)>) {
    let mut case_id = into.traces.len();
    for (source, log) in logs {
        for mut trace in log.traces {
            case_id += 1;
            if let Some(name) = trace.name().map(str::to_owned) {
                trace.attributes.set("round", Value::String(name));
            }
            trace.attributes.set("source", Value::String(source.clone()));
            trace
                .attributes
                .set(CONCEPT_NAME, Value::String(case_id.to_string()));
            into.traces.push(trace);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{append_renumbered, collect};
    use crate::convert::tests::MATCH;
    use crate::convert::Options;
    use crate::demo::Team;
    use crate::filter::Filter;
    use crate::mapping::Style;
    use crate::xes::{Attributes, Log, Trace, CONCEPT_NAME};

    fn trace(name: &str) -> Trace {
        Trace {
            attributes: Attributes::default().string(CONCEPT_NAME, name),
            events: Vec::new(),
        }
    }

    #[test]
    fn test_renumber() {
        let game1 = Log {
            traces: vec![trace("round-1-1"), trace("round-2-1")],
            ..Log::default()
        };
        let game2 = Log {
            traces: vec![trace("round-1-1")],
            ..Log::default()
        };
        let mut collected = Log::default();
        append_renumbered(
            &mut collected,
            vec![("game1.json".to_owned(), game1), ("game2.json".to_owned(), game2)],
        );

        let names: Vec<_> = collected.traces.iter().filter_map(Trace::name).collect();
        assert_eq!(names, vec!["1", "2", "3"]);
        let last = &collected.traces[2].attributes;
        assert_eq!(last.get_str("round"), Some("round-1-1"));
        assert_eq!(last.get_str("source"), Some("game2.json"));
        // the case id keeps its position
        assert_eq!(last.iter().next().unwrap().key, CONCEPT_NAME);
    }

    #[test]
    fn test_collect_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("game1.json"), MATCH).unwrap();
        std::fs::write(dir.path().join("game2.json"), MATCH).unwrap();

        let options = Options::new(Style::OneSide, Team::Ct);
        let log = collect(dir.path(), options, &Filter::default()).unwrap();
        assert_eq!(log.traces.len(), 4);
        assert_eq!(log.traces[3].name(), Some("4"));
        assert_eq!(log.traces[3].attributes.get_str("source"), Some("game2.json"));
        assert_eq!(log.traces[3].attributes.get_str("round"), Some("round-1-2"));
    }

    #[test]
    fn test_collect_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let options = Options::new(Style::Round, Team::Ct);
        assert!(collect(dir.path(), options, &Filter::default()).is_err());
    }

    #[test]
    fn test_collect_reports_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("game1.json"), MATCH).unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();
        let options = Options::new(Style::Round, Team::Ct);
        assert!(collect(dir.path(), options, &Filter::default()).is_err());
    }

    #[test]
    fn test_collect_numbers_after_filtering() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("game1.json"), MATCH).unwrap();
        std::fs::write(dir.path().join("game2.json"), MATCH).unwrap();

        let filter = Filter {
            team: Some(Team::T),
            ..Filter::default()
        };
        let log = collect(dir.path(), Options::new(Style::Round, Team::Ct), &filter).unwrap();
        let names: Vec<_> = log.traces.iter().filter_map(Trace::name).collect();
        assert_eq!(names, vec!["1", "2", "3", "4"]);
        assert_eq!(log.traces[1].attributes.get_str("source"), Some("game1.json"));
        assert_eq!(log.traces[2].attributes.get_str("source"), Some("game2.json"));
    }
}
