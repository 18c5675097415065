//! How demo records become XES events. Each style reproduces one family of event logs the
//! mining notebooks were built around; they differ in naming, in which streams they read, and
//! in whether they see the round from one team's side.

use crate::demo::{BombEvent, GrenadeEvent, KillEvent, LocationEvent, Round, Team, WeaponEvent};
use crate::time::{epoch, parse_bomb_clock, parse_round_clock, parse_timestamp, rebase, Timestamp};
use chrono::Duration;
use crate::util::{last_chars, last_token};
use crate::weapon::class_label;
use crate::xes::{Attributes, Event, CONCEPT_NAME, END_TIMESTAMP, RESOURCE, ROLE, TIMESTAMP};
use std::fmt;

const UNKNOWN_PLAYER: &str = "Unknown";
const PLANT: &str = "plant";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Style {
    /// `kill` / `bomb_<action>` events keyed by the round number
    Basic,
    /// Every stream of both teams, absolute timestamps
    Round,
    /// One team's view of each round, rebased on the round start
    OneSide,
    /// One team's view with players as activities, for social network mining
    Social,
    /// Team-tag actors and win conditions, for DCR discovery
    Dcr,
}

impl Style {
    pub fn rebases_by_default(self) -> bool {
        matches!(self, Style::OneSide | Style::Social)
    }

    pub(crate) fn mapping(self) -> &'static dyn Mapping {
        match self {
            Style::Basic => &Basic,
            Style::Round => &RoundBased,
            Style::OneSide => &OneSide,
            Style::Social => &Social,
            Style::Dcr => &Dcr,
        }
    }
}

/// Why an input record produced no event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    Missing(&'static str),
    Timestamp(String),
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Skip::Missing(field) => write!(f, "missing field `{}`", field),
            Skip::Timestamp(raw) => write!(f, "unparsable timestamp {:?}", raw),
        }
    }
}

/// `Ok(None)` means the style deliberately leaves the record out.
pub type Mapped = Result<Option<Event>, Skip>;

pub struct RoundContext<'a> {
    pub round: &'a Round,
    pub match_no: u32,
    pub team: Team,
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    pub rebase: bool,
    /// Time from the round start to the bomb plant, if the bomb went down.
    pub plant: Option<Duration>,
}

impl<'a> RoundContext<'a> {
    /// Resolves an event timestamp, moved onto the epoch when rebasing.
    pub fn at(&self, raw: &Option<String>, field: &'static str) -> Result<Timestamp, Skip> {
        let raw = present(raw).ok_or(Skip::Missing(field))?;
        let time = parse_timestamp(raw).map_err(|_| Skip::Timestamp(raw.to_owned()))?;
        Ok(self.place(time))
    }

    /// Like `at`, but falls back to the round clock when the record has no timestamp.
    fn at_or_clock(
        &self,
        timestamp: &Option<String>,
        clock: &Option<String>,
    ) -> Result<Timestamp, Skip> {
        self.at_or(timestamp, clock, parse_round_clock)
    }

    /// Like `at_or_clock` for a reading taken after the plant, when the clock shows the bomb timer.
    fn at_or_bomb_clock(
        &self,
        timestamp: &Option<String>,
        clock: &Option<String>,
    ) -> Result<Timestamp, Skip> {
        match self.plant {
            Some(plant) => self.at_or(timestamp, clock, |text| parse_bomb_clock(text, plant)),
            None => self.at_or_clock(timestamp, clock),
        }
    }

    fn at_or(
        &self,
        timestamp: &Option<String>,
        clock: &Option<String>,
        read_clock: impl Fn(&str) -> anyhow::Result<Duration>,
    ) -> Result<Timestamp, Skip> {
        if present(timestamp).is_some() {
            return self.at(timestamp, "timestamp");
        }
        let clock = present(clock).ok_or(Skip::Missing("timestamp"))?;
        let elapsed = read_clock(clock).map_err(|_| Skip::Timestamp(clock.to_owned()))?;
        Ok(self.start_instant() + elapsed)
    }

    /// Round start on the output time axis.
    pub fn start_instant(&self) -> Timestamp {
        match self.start {
            Some(start) => self.place(start),
            None => epoch(),
        }
    }

    fn end_instant(&self) -> Result<Timestamp, Skip> {
        self.end
            .map(|end| self.place(end))
            .ok_or(Skip::Missing("end_timestamp"))
    }

    fn place(&self, time: Timestamp) -> Timestamp {
        match (self.rebase, self.start) {
            (true, Some(start)) => rebase(time, start),
            _ => time,
        }
    }

    fn is_opponent(&self, player: &str) -> bool {
        Team::of(player) == Some(self.team.opponent())
    }

    fn won(&self) -> bool {
        self.round.winner.as_deref() == Some(self.team.tag())
    }

    /// Outcome, scores and start/end instants of the round, as recorded.
    fn round_attributes(&self, name: String) -> Attributes {
        let round = self.round;
        let mut attributes = Attributes::default()
            .string(CONCEPT_NAME, name)
            .opt_string("winner", round.winner.as_deref())
            .opt_string("end_reason", round.end_reason.as_deref())
            .int("t_score", round.t_score)
            .int("ct_score", round.ct_score);
        if let Some(start) = self.start {
            attributes = attributes.date(TIMESTAMP, start);
        }
        if let Some(end) = self.end {
            attributes = attributes.date(END_TIMESTAMP, end);
        }
        attributes
    }
}

/// Time from the round start to the first plant, read from the plant's clock or its timestamp.
pub fn plant_elapsed(round: &Round, start: Option<Timestamp>) -> Option<Duration> {
    let plant = round
        .bomb_events
        .iter()
        .flatten()
        .find(|bomb| bomb.action.as_deref() == Some(PLANT))?;
    if let Some(elapsed) = present(&plant.time).and_then(|clock| parse_round_clock(clock).ok()) {
        return Some(elapsed);
    }
    let time = parse_timestamp(present(&plant.timestamp)?).ok()?;
    Some(time - start?)
}

/// The exporter writes empty strings for fields it never filled.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|text| !text.trim().is_empty())
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, Skip> {
    value.as_deref().ok_or(Skip::Missing(field))
}

fn or_empty(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

pub(crate) trait Mapping: Sync {
    /// Rounds the style ignores entirely.
    fn keeps(&self, _round: &Round) -> bool {
        true
    }

    fn trace_attributes(&self, ctx: &RoundContext<'_>) -> Attributes;

    fn kill(&self, ctx: &RoundContext<'_>, kill: &KillEvent) -> Mapped;

    fn bomb(&self, ctx: &RoundContext<'_>, bomb: &BombEvent) -> Mapped;

    fn grenade(&self, _ctx: &RoundContext<'_>, _grenade: &GrenadeEvent) -> Mapped {
        Ok(None)
    }

    fn weapon(&self, _ctx: &RoundContext<'_>, _weapon: &WeaponEvent) -> Mapped {
        Ok(None)
    }

    fn location(&self, _ctx: &RoundContext<'_>, _location: &LocationEvent) -> Mapped {
        Ok(None)
    }

    fn round_end(&self, _ctx: &RoundContext<'_>) -> Mapped {
        Ok(None)
    }
}

// =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=

struct Basic;

impl Mapping for Basic {
    fn trace_attributes(&self, ctx: &RoundContext<'_>) -> Attributes {
        Attributes::default().string(CONCEPT_NAME, ctx.round.round_number.to_string())
    }

    fn kill(&self, ctx: &RoundContext<'_>, kill: &KillEvent) -> Mapped {
        let killer = required(&kill.killer, "killer")?;
        let victim = required(&kill.victim, "victim")?;
        let time = ctx.at_or_clock(&kill.timestamp, &kill.time)?;
        Ok(Some(Event::new("kill", time).with(|a| {
            a.string(ROLE, killer)
                .string("victim", victim)
                .opt_string("weapon", kill.weapon.as_deref())
                .opt_boolean("headshot", kill.headshot)
        })))
    }

    fn bomb(&self, ctx: &RoundContext<'_>, bomb: &BombEvent) -> Mapped {
        let player = required(&bomb.player, "player")?;
        let action = required(&bomb.action, "action")?;
        let time = if action == PLANT {
            ctx.at_or_clock(&bomb.timestamp, &bomb.time)?
        } else {
            ctx.at_or_bomb_clock(&bomb.timestamp, &bomb.time)?
        };
        Ok(Some(
            Event::new(format!("bomb_{}", action), time).with(|a| a.string(ROLE, player)),
        ))
    }
}

// =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=

struct RoundBased;

fn bomb_details(attributes: Attributes, bomb: &BombEvent, action: &str) -> Attributes {
    attributes
        .string("bomb_place", or_empty(&bomb.bomb_place))
        .string("action", action)
        .opt_boolean("success", bomb.success)
}

fn kill_details(attributes: Attributes, kill: &KillEvent) -> Attributes {
    attributes
        .string("killer_place", or_empty(&kill.killer_place))
        .opt_string("victim", kill.victim.as_deref())
        .string("victim_place", or_empty(&kill.victim_place))
        .string("weapon", or_empty(&kill.weapon))
        .opt_boolean("headshot", kill.headshot)
}

fn inventory_check(ctx: &RoundContext<'_>, player: &str, weapon: &WeaponEvent) -> Event {
    Event::new("Inventory Check", ctx.start_instant()).with(|a| {
        let a = a
            .string(ROLE, player)
            .string("primary_weapon", or_empty(&weapon.primary))
            .string("secondary_weapon", or_empty(&weapon.secondary))
            .string("other_equip", weapon.other_equip.join(", "));
        match weapon.money_left {
            Some(money) => a.int(RESOURCE, money),
            None => a,
        }
    })
}

impl Mapping for RoundBased {
    fn trace_attributes(&self, ctx: &RoundContext<'_>) -> Attributes {
        ctx.round_attributes(format!("round-{}", ctx.round.round_number))
    }

    fn kill(&self, ctx: &RoundContext<'_>, kill: &KillEvent) -> Mapped {
        let killer = required(&kill.killer, "killer")?;
        let victim = required(&kill.victim, "victim")?;
        let time = ctx.at(&kill.timestamp, "timestamp")?;
        Ok(Some(
            Event::new(format!("Kill {}", last_chars(victim, 4)), time)
                .with(|a| kill_details(a.string(ROLE, killer), kill)),
        ))
    }

    fn bomb(&self, ctx: &RoundContext<'_>, bomb: &BombEvent) -> Mapped {
        let player = required(&bomb.player, "player")?;
        let action = required(&bomb.action, "action")?;
        let time = ctx.at(&bomb.timestamp, "timestamp")?;
        Ok(Some(
            Event::new(format!("Bomb-{}", action), time)
                .with(|a| bomb_details(a.string("player", player), bomb, action)),
        ))
    }

    fn grenade(&self, ctx: &RoundContext<'_>, grenade: &GrenadeEvent) -> Mapped {
        let player = required(&grenade.player, "player")?;
        let kind = required(&grenade.grenade, "grenade")?;
        let time = ctx.at(&grenade.timestamp, "timestamp")?;
        Ok(Some(Event::new(format!("Throw-{}", kind), time).with(|a| {
            a.string(ROLE, player)
                .string("player_place", or_empty(&grenade.place))
                .string("grenade_type", kind)
        })))
    }

    fn weapon(&self, ctx: &RoundContext<'_>, weapon: &WeaponEvent) -> Mapped {
        let player = required(&weapon.player, "player")?;
        Ok(Some(inventory_check(ctx, player, weapon)))
    }
}

// =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=

struct OneSide;

fn round_end_name(ctx: &RoundContext<'_>) -> &'static str {
    if ctx.won() {
        "Round End -(Win)"
    } else {
        "Round End -(Lose)"
    }
}

impl Mapping for OneSide {
    fn keeps(&self, round: &Round) -> bool {
        round.kill_events.is_some()
    }

    fn trace_attributes(&self, ctx: &RoundContext<'_>) -> Attributes {
        ctx.round_attributes(format!("round-{}-{}", ctx.round.round_number, ctx.match_no))
    }

    fn kill(&self, ctx: &RoundContext<'_>, kill: &KillEvent) -> Mapped {
        let killer = required(&kill.killer, "killer")?;
        let victim = required(&kill.victim, "victim")?;
        let time = ctx.at(&kill.timestamp, "timestamp")?;
        let event = if ctx.is_opponent(killer) {
            Event::new(format!("Death-{}", victim), time).with(|a| {
                a.string(ROLE, victim)
                    .string("killer_place", or_empty(&kill.killer_place))
                    .string("killer", killer)
                    .string("victim_place", or_empty(&kill.victim_place))
                    .string("weapon", or_empty(&kill.weapon))
                    .opt_boolean("headshot", kill.headshot)
            })
        } else {
            Event::new(format!("Kill-in-{}", or_empty(&kill.victim_place)), time)
                .with(|a| kill_details(a.string(ROLE, killer), kill))
        };
        Ok(Some(event))
    }

    fn bomb(&self, ctx: &RoundContext<'_>, bomb: &BombEvent) -> Mapped {
        let player = required(&bomb.player, "player")?;
        if ctx.is_opponent(player) {
            return Ok(None);
        }
        RoundBased.bomb(ctx, bomb)
    }

    fn grenade(&self, ctx: &RoundContext<'_>, grenade: &GrenadeEvent) -> Mapped {
        let player = required(&grenade.player, "player")?;
        if ctx.is_opponent(player) {
            return Ok(None);
        }
        let kind = required(&grenade.grenade, "grenade")?;
        let place = or_empty(&grenade.place);
        let time = ctx.at(&grenade.timestamp, "timestamp")?;
        Ok(Some(
            Event::new(format!("Throw-{}-{}", kind, place), time).with(|a| {
                a.string(ROLE, player)
                    .string("player_place", place)
                    .string("grenade_type", kind)
            }),
        ))
    }

    fn weapon(&self, ctx: &RoundContext<'_>, weapon: &WeaponEvent) -> Mapped {
        let player = required(&weapon.player, "player")?;
        if ctx.is_opponent(player) {
            return Ok(None);
        }
        Ok(Some(inventory_check(ctx, player, weapon)))
    }

    fn location(&self, ctx: &RoundContext<'_>, location: &LocationEvent) -> Mapped {
        let player = required(&location.player, "player")?;
        if ctx.is_opponent(player) {
            return Ok(None);
        }
        let place = required(&location.new_place, "new_place")?;
        let time = ctx.at(&location.timestamp, "timestamp")?;
        Ok(Some(
            Event::new(format!("{} in {}", player, place), time).with(|a| {
                a.string(ROLE, player)
                    .string("old_location", or_empty(&location.old_place))
            }),
        ))
    }

    fn round_end(&self, ctx: &RoundContext<'_>) -> Mapped {
        let time = ctx.end_instant()?;
        Ok(Some(Event::new(round_end_name(ctx), time).with(|a| {
            a.opt_string("winner", ctx.round.winner.as_deref())
                .opt_string("reason", ctx.round.end_reason.as_deref())
        })))
    }
}

// =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=

/// Players are the activities here and what they did is the resource.
struct Social;

impl Mapping for Social {
    fn keeps(&self, round: &Round) -> bool {
        OneSide.keeps(round)
    }

    fn trace_attributes(&self, ctx: &RoundContext<'_>) -> Attributes {
        OneSide.trace_attributes(ctx)
    }

    fn kill(&self, ctx: &RoundContext<'_>, kill: &KillEvent) -> Mapped {
        let killer = required(&kill.killer, "killer")?;
        let victim = required(&kill.victim, "victim")?;
        let time = ctx.at(&kill.timestamp, "timestamp")?;
        let event = if ctx.is_opponent(killer) {
            Event::new(victim, time).with(|a| {
                a.string(RESOURCE, "Death")
                    .string("killer_place", or_empty(&kill.killer_place))
                    .string("killer", killer)
                    .string("victim_place", or_empty(&kill.victim_place))
                    .string("weapon", or_empty(&kill.weapon))
                    .opt_boolean("headshot", kill.headshot)
            })
        } else {
            Event::new(format!("Kill {}", last_chars(victim, 4)), time)
                .with(|a| kill_details(a.string(ROLE, killer), kill))
        };
        Ok(Some(event))
    }

    fn bomb(&self, ctx: &RoundContext<'_>, bomb: &BombEvent) -> Mapped {
        let player = required(&bomb.player, "player")?;
        if ctx.is_opponent(player) {
            return Ok(None);
        }
        let action = required(&bomb.action, "action")?;
        let time = ctx.at(&bomb.timestamp, "timestamp")?;
        Ok(Some(Event::new(player, time).with(|a| {
            bomb_details(a.string(RESOURCE, format!("Bomb-{}", action)), bomb, action)
        })))
    }

    fn grenade(&self, ctx: &RoundContext<'_>, grenade: &GrenadeEvent) -> Mapped {
        let player = required(&grenade.player, "player")?;
        if ctx.is_opponent(player) {
            return Ok(None);
        }
        let kind = required(&grenade.grenade, "grenade")?;
        let place = or_empty(&grenade.place);
        let time = ctx.at(&grenade.timestamp, "timestamp")?;
        Ok(Some(Event::new(player, time).with(|a| {
            a.string(RESOURCE, format!("Throw-{}-{}", kind, place))
                .string("player_place", place)
                .string("grenade_type", kind)
        })))
    }

    fn round_end(&self, ctx: &RoundContext<'_>) -> Mapped {
        let time = ctx.end_instant()?;
        Ok(Some(Event::new(round_end_name(ctx), time).with(|a| {
            a.string(RESOURCE, "game")
                .opt_string("winner", ctx.round.winner.as_deref())
                .opt_string("reason", ctx.round.end_reason.as_deref())
        })))
    }
}

// =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=

/// Actors are reduced to their team tag so roles line up across rounds.
struct Dcr;

impl Mapping for Dcr {
    fn trace_attributes(&self, ctx: &RoundContext<'_>) -> Attributes {
        Basic.trace_attributes(ctx)
    }

    fn kill(&self, ctx: &RoundContext<'_>, kill: &KillEvent) -> Mapped {
        let killer = required(&kill.killer, "killer")?;
        let victim = last_token(required(&kill.victim, "victim")?);
        let time = ctx.at(&kill.timestamp, "timestamp")?;
        let weapon = or_empty(&kill.weapon);
        let (activity, role) = if killer == UNKNOWN_PLAYER {
            (
                format!("Bomb explosion kills {}", victim),
                last_token(killer).to_owned(),
            )
        } else {
            (
                format!("{} kills {}", last_token(killer), victim),
                class_label(weapon),
            )
        };
        Ok(Some(Event::new(activity, time).with(|a| {
            a.string(ROLE, role)
                .string("victim", victim)
                .string("weapon", weapon)
                .opt_boolean("headshot", kill.headshot)
        })))
    }

    fn bomb(&self, ctx: &RoundContext<'_>, bomb: &BombEvent) -> Mapped {
        let player = required(&bomb.player, "player")?;
        let action = required(&bomb.action, "action")?;
        let time = ctx.at(&bomb.timestamp, "timestamp")?;
        Ok(Some(
            Event::new(format!("bomb_{}", action), time)
                .with(|a| a.string(ROLE, last_token(player))),
        ))
    }

    fn grenade(&self, ctx: &RoundContext<'_>, grenade: &GrenadeEvent) -> Mapped {
        let player = required(&grenade.player, "player")?;
        let time = ctx.at(&grenade.timestamp, "timestamp")?;
        Ok(Some(
            Event::new("grenade", time).with(|a| a.string(ROLE, last_token(player))),
        ))
    }

    fn weapon(&self, ctx: &RoundContext<'_>, weapon: &WeaponEvent) -> Mapped {
        let player = required(&weapon.player, "player")?;
        Ok(Some(Event::new("buy", ctx.start_instant()).with(|a| {
            a.string(ROLE, last_token(player))
                .string("weapon", weapon.weapons.join(", "))
        })))
    }

    fn location(&self, ctx: &RoundContext<'_>, location: &LocationEvent) -> Mapped {
        let player = required(&location.player, "player")?;
        let place = required(&location.new_place, "new_place")?;
        let time = ctx.at(&location.timestamp, "timestamp")?;
        Ok(Some(
            Event::new(format!("to {}", place), time).with(|a| a.string(ROLE, last_token(player))),
        ))
    }

    fn round_end(&self, ctx: &RoundContext<'_>) -> Mapped {
        let reason = required(&ctx.round.end_reason, "end_reason")?;
        let time = ctx.end_instant()?;
        Ok(Some(
            Event::new(format!("Win condition {}", reason), time)
                .with(|a| a.string(ROLE, or_empty(&ctx.round.winner))),
        ))
    }
}
