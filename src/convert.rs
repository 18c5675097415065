use crate::demo::{Round, Team};
use crate::mapping::{plant_elapsed, Mapped, RoundContext, Style};
use crate::time::{parse_timestamp, Timestamp};
use crate::util::Skipped;
use crate::xes::{Attributes, Log, Trace, CONCEPT_NAME};
use tracing::{debug, info, instrument, warn};

const LOG_NAME: &str = "round-based-cs-game";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub style: Style,
    /// Side the one-sided styles take.
    pub team: Team,
    /// Put every event on a per-round time axis starting at the Unix epoch.
    pub rebase: bool,
}

impl Options {
    pub fn new(style: Style, team: Team) -> Options {
        Options {
            style,
            team,
            rebase: style.rebases_by_default(),
        }
    }
}

#[derive(Debug)]
pub struct Conversion<'a> {
    pub traces: Vec<(&'a Round, Trace)>,
    pub skipped: Skipped,
}

impl<'a> Conversion<'a> {
    pub fn event_count(&self) -> usize {
        self.traces.iter().map(|(_, t)| t.events.len()).sum()
    }
}

#[derive(Debug)]
pub struct Converter {
    options: Options,
}

impl Converter {
    pub fn new(options: Options) -> Converter {
        Converter { options }
    }

    pub fn log_attributes(&self) -> Attributes {
        match self.options.style {
            Style::Basic | Style::Dcr => Attributes::default(),
            Style::Round | Style::OneSide | Style::Social => {
                Attributes::default().string(CONCEPT_NAME, LOG_NAME)
            }
        }
    }

    pub fn log(&self, rounds: &[Round]) -> Log {
        let conversion = self.convert(rounds);
        Log {
            attributes: self.log_attributes(),
            traces: conversion.traces.into_iter().map(|(_, t)| t).collect(),
        }
    }

    /// Converts every round into a trace, keeping the round each trace came from.
    #[instrument(name = "Converter::convert", skip(self, rounds), fields(style = ?self.options.style, rounds = rounds.len()))]
    pub fn convert<'a>(&self, rounds: &'a [Round]) -> Conversion<'a> {
        let mut skipped = Skipped::default();
        let mut traces = Vec::with_capacity(rounds.len());
        let mut match_no = 0;
        for round in rounds {
            if round.round_number == 1 {
                match_no += 1;
            }
            if let Some(trace) = self.trace(round, match_no, &mut skipped) {
                traces.push((round, trace));
            }
        }

        let conversion = Conversion { traces, skipped };
        if skipped.rounds > 0 || skipped.events() > 0 {
            warn!(%skipped, "incomplete input records were left out");
        }
        info!(
            traces = conversion.traces.len(),
            events = conversion.event_count(),
            "converted rounds"
        );
        conversion
    }

    fn trace(&self, round: &Round, match_no: u32, skipped: &mut Skipped) -> Option<Trace> {
        let mapping = self.options.style.mapping();
        if !mapping.keeps(round) {
            debug!(round = round.round_number, match_no, "round has no kill events, dropped");
            return None;
        }

        let start = round_instant(round, round.timestamp.as_deref(), "timestamp");
        let end = round_instant(round, round.end_timestamp.as_deref(), "end_timestamp");
        if self.options.rebase && start.is_none() {
            warn!(round = round.round_number, match_no, "no round start to rebase on, dropped");
            skipped.rounds += 1;
            return None;
        }

        let ctx = RoundContext {
            round,
            match_no,
            team: self.options.team,
            start,
            end,
            rebase: self.options.rebase,
            plant: plant_elapsed(round, start),
        };
        let mut trace = Trace {
            attributes: mapping.trace_attributes(&ctx),
            events: Vec::new(),
        };

        // stream order decides ties after sorting
        for kill in round.kill_events.iter().flatten() {
            push(&mut trace, mapping.kill(&ctx, kill), &mut skipped.kill, &ctx, "kill");
        }
        for bomb in round.bomb_events.iter().flatten() {
            push(&mut trace, mapping.bomb(&ctx, bomb), &mut skipped.bomb, &ctx, "bomb");
        }
        for grenade in round.grenade_events.iter().flatten() {
            let mapped = mapping.grenade(&ctx, grenade);
            push(&mut trace, mapped, &mut skipped.grenade, &ctx, "grenade");
        }
        for weapon in round.weapon_events.iter().flatten() {
            let mapped = mapping.weapon(&ctx, weapon);
            push(&mut trace, mapped, &mut skipped.weapon, &ctx, "weapon");
        }
        for location in round.change_location_events.iter().flatten() {
            let mapped = mapping.location(&ctx, location);
            push(&mut trace, mapped, &mut skipped.location, &ctx, "location");
        }
        let mapped = mapping.round_end(&ctx);
        push(&mut trace, mapped, &mut skipped.round_end, &ctx, "round end");

        trace.sort_events();
        debug!(
            round = round.round_number,
            match_no,
            events = trace.events.len(),
            "built trace"
        );
        Some(trace)
    }
}

fn push(trace: &mut Trace, mapped: Mapped, skipped: &mut u32, ctx: &RoundContext<'_>, stream: &str) {
    match mapped {
        Ok(Some(event)) => trace.events.push(event),
        Ok(None) => {}
        Err(skip) => {
            *skipped += 1;
            warn!(round = ctx.round.round_number, match_no = ctx.match_no, stream, %skip, "skipping event");
        }
    }
}

fn round_instant(round: &Round, raw: Option<&str>, field: &str) -> Option<Timestamp> {
    let raw = raw?;
    match parse_timestamp(raw) {
        Ok(time) => Some(time),
        Err(err) => {
            warn!(round = round.round_number, field, raw, %err, "ignoring round timestamp");
            None
        }
    }
}
