use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// One round of a match as exported by the demo parser.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Round {
    pub round_number: u32,
    pub t_score: i64,
    pub ct_score: i64,
    pub winner: Option<String>,
    pub end_reason: Option<String>,
    pub timestamp: Option<String>,
    pub end_timestamp: Option<String>,
    pub kill_events: Option<Vec<KillEvent>>,
    pub bomb_events: Option<Vec<BombEvent>>,
    pub grenade_events: Option<Vec<GrenadeEvent>>,
    pub weapon_events: Option<Vec<WeaponEvent>>,
    pub change_location_events: Option<Vec<LocationEvent>>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct KillEvent {
    pub time: Option<String>,
    pub timestamp: Option<String>,
    pub killer: Option<String>,
    pub killer_place: Option<String>,
    pub victim: Option<String>,
    pub victim_place: Option<String>,
    pub weapon: Option<String>,
    pub headshot: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct BombEvent {
    pub time: Option<String>,
    pub timestamp: Option<String>,
    pub player: Option<String>,
    pub bomb_place: Option<String>,
    pub action: Option<String>,
    pub success: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GrenadeEvent {
    pub timestamp: Option<String>,
    pub player: Option<String>,
    pub place: Option<String>,
    pub grenade: Option<String>,
}

/// Loadout of a player when freezetime ends.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct WeaponEvent {
    pub player: Option<String>,
    pub weapons: Vec<String>,
    pub primary: Option<String>,
    pub secondary: Option<String>,
    pub other_equip: Vec<String>,
    pub money_left: Option<i64>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LocationEvent {
    pub timestamp: Option<String>,
    pub player: Option<String>,
    pub old_place: Option<String>,
    pub new_place: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Team {
    #[value(name = "T")]
    T,
    #[value(name = "CT")]
    Ct,
}

impl Team {
    /// Reads the team suffix the exporter appends to player names ("name [CT]").
    pub fn of(player: &str) -> Option<Team> {
        let player = player.trim_end();
        if player.ends_with("[CT]") {
            Some(Team::Ct)
        } else if player.ends_with("[T]") {
            Some(Team::T)
        } else {
            None
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Team::T => "T",
            Team::Ct => "CT",
        }
    }

    pub fn opponent(self) -> Team {
        match self {
            Team::T => Team::Ct,
            Team::Ct => Team::T,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

pub fn load_rounds(path: &Path) -> Result<Vec<Round>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let reader: Box<dyn Read> = if is_gzip(path) {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    serde_json::from_reader(BufReader::new(reader))
        .with_context(|| format!("failed to parse rounds from {}", path.display()))
}

pub fn is_gzip(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "gz")
}

#[cfg(test)]
mod tests {
    use super::{load_rounds, Round, Team};
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;

    const ROUNDS: &str = r#"[
        {
            "round_number": 1,
            "t_score": 0,
            "ct_score": 0,
            "winner": "CT",
            "end_reason": "TEliminated",
            "timestamp": "2024-03-01T12:00:00",
            "end_timestamp": "2024-03-01T12:01:30",
            "kill_events": [
                {
                    "time": "1:40",
                    "timestamp": "2024-03-01T12:00:15",
                    "killer": "ZywOo [CT]",
                    "killer_place": "Jungle",
                    "victim": "s1mple [T]",
                    "victim_place": "Connector",
                    "weapon": "AWP",
                    "headshot": false
                }
            ],
            "bomb_events": null,
            "weapon_events": [
                {"player": "ZywOo [CT]", "weapons": ["AWP", "USP-S"], "secondary": "USP-S", "other_equip": [], "money_left": 350}
            ]
        },
        {"round_number": 2, "kill_events": null}
    ]"#;

    #[test]
    fn test_parse_rounds() {
        let rounds: Vec<Round> = serde_json::from_str(ROUNDS).unwrap();
        assert_eq!(rounds.len(), 2);

        let first = &rounds[0];
        assert_eq!(first.winner.as_deref(), Some("CT"));
        let kills = first.kill_events.as_ref().unwrap();
        assert_eq!(kills[0].killer.as_deref(), Some("ZywOo [CT]"));
        assert_eq!(kills[0].headshot, Some(false));
        assert!(first.bomb_events.is_none());
        assert!(first.grenade_events.is_none());
        let weapons = first.weapon_events.as_ref().unwrap();
        assert_eq!(weapons[0].primary, None);
        assert_eq!(weapons[0].money_left, Some(350));

        let second = &rounds[1];
        assert_eq!(second.round_number, 2);
        assert!(second.kill_events.is_none());
        assert!(second.winner.is_none());
    }

    #[test]
    fn test_team_of() {
        assert_eq!(Team::of("ZywOo [CT]"), Some(Team::Ct));
        assert_eq!(Team::of("s1mple [T] "), Some(Team::T));
        assert_eq!(Team::of("Unknown"), None);
        assert_eq!(Team::Ct.opponent(), Team::T);
        assert_eq!(Team::T.to_string(), "T");
    }

    #[test]
    fn test_load_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("match.json");
        std::fs::write(&plain, ROUNDS).unwrap();
        let gzipped = dir.path().join("match.json.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(ROUNDS.as_bytes()).unwrap();
        std::fs::write(&gzipped, encoder.finish().unwrap()).unwrap();

        assert_eq!(load_rounds(&plain).unwrap().len(), 2);
        assert_eq!(load_rounds(&gzipped).unwrap().len(), 2);
        assert!(load_rounds(&dir.path().join("missing.json")).is_err());
    }
}
