use crate::convert::Conversion;
use crate::xes::{Attributes, Log};
use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Ways a round can end that get their own log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WinCondition {
    BombDefused,
    CtEliminated,
    BombExploded,
    TEliminated,
    TimeExpired,
}

impl WinCondition {
    pub const ALL: [WinCondition; 5] = [
        WinCondition::BombDefused,
        WinCondition::CtEliminated,
        WinCondition::BombExploded,
        WinCondition::TEliminated,
        WinCondition::TimeExpired,
    ];

    pub fn from_reason(reason: &str) -> Option<WinCondition> {
        Some(match reason {
            "BombDefused" => WinCondition::BombDefused,
            "CTEliminated" => WinCondition::CtEliminated,
            "BombExploded" => WinCondition::BombExploded,
            "TEliminated" => WinCondition::TEliminated,
            "TimeExpired" => WinCondition::TimeExpired,
            _ => return None,
        })
    }

    /// Stem of the file the bucket is written to.
    pub fn file_stem(self) -> &'static str {
        match self {
            WinCondition::BombDefused => "def",
            WinCondition::CtEliminated => "ct_elim",
            WinCondition::BombExploded => "expl",
            WinCondition::TEliminated => "t_elim",
            WinCondition::TimeExpired => "time_out",
        }
    }
}

/// Partitions converted rounds by how they ended. Every condition gets a log, even an empty one.
pub fn split(conversion: Conversion<'_>, attributes: &Attributes) -> FxHashMap<WinCondition, Log> {
    let mut logs: FxHashMap<WinCondition, Log> = WinCondition::ALL
        .iter()
        .map(|&condition| {
            let log = Log {
                attributes: attributes.clone(),
                traces: Vec::new(),
            };
            (condition, log)
        })
        .collect();

    for (round, trace) in conversion.traces {
        let reason = round.end_reason.as_deref().unwrap_or_default();
        match WinCondition::from_reason(reason).and_then(|c| logs.get_mut(&c)) {
            Some(log) => log.traces.push(trace),
            None => debug!(round = round.round_number, reason, "no win-condition log for round"),
        }
    }
    logs
}

pub fn write_split(dir: &Path, logs: &FxHashMap<WinCondition, Log>) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let mut written = Vec::new();
    for condition in &WinCondition::ALL {
        if let Some(log) = logs.get(condition) {
            let path = dir.join(format!("{}.xes", condition.file_stem()));
            crate::xes::write_log(&path, log)?;
            info!(path = %path.display(), traces = log.traces.len(), "wrote win-condition log");
            written.push(path);
        }
    }
    Ok(written)
}
