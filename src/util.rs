use std::fmt;

/// Last whitespace-separated token of a player name, which is the team tag ("[CT]") for
/// exported names.
pub fn last_token(name: &str) -> &str {
    name.trim_end().rsplit(' ').next().unwrap_or(name)
}

pub fn last_chars(text: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    let start = text.char_indices().rev().nth(n - 1).map_or(0, |(i, _)| i);
    &text[start..]
}

#[cfg(test)]
#[test]
fn test_name_helpers() {
    assert_eq!(last_token("ZywOo [CT]"), "[CT]");
    assert_eq!(last_token("Unknown"), "Unknown");
    assert_eq!(last_chars("ZywOo [CT]", 4), "[CT]");
    assert_eq!(last_chars("s1mple [T]", 4), " [T]");
    assert_eq!(last_chars("ab", 4), "ab");
    assert_eq!(last_chars("héé", 2), "éé");
}

// =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=

/// Input that could not be converted, by stream. Rounds are only counted when a style needs
/// a round start it cannot find.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Skipped {
    pub kill: u32,
    pub bomb: u32,
    pub grenade: u32,
    pub weapon: u32,
    pub location: u32,
    pub round_end: u32,
    pub rounds: u32,
}

impl Skipped {
    pub fn events(&self) -> u32 {
        self.kill + self.bomb + self.grenade + self.weapon + self.location + self.round_end
    }
}

impl fmt::Display for Skipped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rounds: {}, kill: {}, bomb: {}, grenade: {}, weapon: {}, location: {}, round end: {}",
            self.rounds,
            self.kill,
            self.bomb,
            self.grenade,
            self.weapon,
            self.location,
            self.round_end
        )
    }
}
