// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of HassProbe.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Output formatters for CLI reports.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, presets::UTF8_FULL};
use hass_probe_core::{
    DailyBucket, DailyEnergyReport, EnergyUnit, GapPolicy, HistoryEntry, StateRecord,
};
use serde::Serialize;
use std::fmt::Write;

/// Everything the `daily` command reports
#[derive(Debug, Clone, Serialize)]
pub struct DailySummary {
    pub entity_id: String,
    pub unit: EnergyUnit,
    pub gap_policy: GapPolicy,
    pub day_boundary: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub entries: usize,
    #[serde(flatten)]
    pub report: DailyEnergyReport,
}

/// Head and tail of a raw history plus the first entry of every day
#[derive(Debug, Clone)]
pub struct HistorySample {
    pub entity_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub total: usize,
    pub head: Vec<HistoryEntry>,
    pub tail: Vec<HistoryEntry>,
    pub first_of_day: Vec<(NaiveDate, HistoryEntry)>,
}

/// One day of the `intraday` command
#[derive(Debug, Clone)]
pub struct IntradayRow {
    pub day: NaiveDate,
    pub entries: usize,
    pub bucket: Option<DailyBucket>,
    pub error: Option<String>,
}

/// Formatter for pretty tables
#[derive(Debug)]
pub struct TableFormatter;

/// Formatter for machine-readable output
#[derive(Debug)]
pub struct JsonFormatter;

fn header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(label).add_attribute(Attribute::Bold))
        .collect()
}

fn table(labels: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(header(labels));
    table
}

fn kwh(value: f64) -> String {
    format!("{value:.2}")
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

impl TableFormatter {
    /// Matching entities, one row each
    pub fn entities(states: &[StateRecord]) -> String {
        let mut output = String::new();

        let mut table = table(&[
            "Entity ID",
            "State",
            "Unit",
            "Friendly Name",
            "Device Class",
            "State Class",
        ]);
        for state in states {
            table.add_row(vec![
                Cell::new(&state.entity_id),
                Cell::new(&state.state),
                Cell::new(state.unit_of_measurement().unwrap_or("-")),
                Cell::new(state.friendly_name().unwrap_or("-")),
                Cell::new(state.device_class().unwrap_or("-")),
                Cell::new(state.state_class().unwrap_or("-")),
            ]);
        }

        output.push_str(&table.to_string());
        output.push('\n');
        let _ = writeln!(output, "{} entities", states.len());
        output
    }

    pub fn domains(counts: &[(String, usize)]) -> String {
        let mut output = String::new();

        let mut table = table(&["Domain", "Entities"]);
        for (domain, count) in counts {
            table.add_row(vec![
                Cell::new(domain),
                Cell::new(count).set_alignment(CellAlignment::Right),
            ]);
        }

        let total: usize = counts.iter().map(|(_, count)| count).sum();
        output.push_str(&table.to_string());
        output.push('\n');
        let _ = writeln!(
            output,
            "{} entities in {} domains",
            total,
            counts.len()
        );
        output
    }

    /// Per-day readings, daily consumption and today so far
    pub fn daily(summary: &DailySummary) -> String {
        let mut output = String::new();
        let unit = summary.unit;

        let _ = writeln!(
            output,
            "{} ({}) | {} -> {} | {} entries | days in {} | gaps: {}",
            summary.entity_id,
            unit,
            timestamp(summary.start),
            timestamp(summary.end),
            summary.entries,
            summary.day_boundary,
            summary.gap_policy
        );

        if summary.report.buckets.is_empty() {
            output.push_str("No valid readings in the requested window\n");
            return output;
        }

        let first = format!("First ({unit})");
        let last = format!("Last ({unit})");
        let mut readings = table(&[
            "Day",
            first.as_str(),
            last.as_str(),
            "Readings",
            "Intraday (kWh)",
        ]);
        for bucket in &summary.report.buckets {
            readings.add_row(vec![
                Cell::new(bucket.day),
                Cell::new(bucket.opening).set_alignment(CellAlignment::Right),
                Cell::new(bucket.closing).set_alignment(CellAlignment::Right),
                Cell::new(bucket.count).set_alignment(CellAlignment::Right),
                Cell::new(kwh(bucket.intraday_consumption(unit)))
                    .set_alignment(CellAlignment::Right),
            ]);
        }
        output.push_str(&readings.to_string());
        output.push('\n');

        if summary.report.deltas.is_empty() {
            output.push_str("No day-over-day deltas (need two consecutive days with readings)\n");
        } else {
            let mut deltas = table(&["Day", "Since", "Consumption (kWh)"]);
            for delta in &summary.report.deltas {
                let consumption = Cell::new(kwh(delta.consumption))
                    .set_alignment(CellAlignment::Right);
                let consumption = if delta.consumption < 0.0 {
                    // Counter went backwards
                    consumption.fg(Color::Red)
                } else {
                    consumption
                };

                let since = if delta.span_days() > 1 {
                    format!("{} ({} days)", delta.since, delta.span_days())
                } else {
                    delta.since.to_string()
                };

                deltas.add_row(vec![Cell::new(delta.day), Cell::new(since), consumption]);
            }
            output.push_str(&deltas.to_string());
            output.push('\n');

            let total: f64 = summary.report.deltas.iter().map(|d| d.consumption).sum();
            let _ = writeln!(
                output,
                "Total: {} kWh over {} days",
                kwh(total),
                summary.report.deltas.len()
            );
        }

        match summary.report.today_kwh {
            Some(today) => {
                let _ = writeln!(output, "Today so far: {} kWh", kwh(today));
            }
            None => output.push_str("Today so far: no readings yet\n"),
        }

        output
    }

    /// Raw history exploration
    pub fn history(sample: &HistorySample) -> String {
        let mut output = String::new();

        let _ = writeln!(
            output,
            "{} | {} -> {} | {} entries",
            sample.entity_id,
            timestamp(sample.start),
            timestamp(sample.end),
            sample.total
        );

        if sample.total == 0 {
            output.push_str("No history in the requested window\n");
            return output;
        }

        let mut entries = table(&["", "Changed (UTC)", "State"]);
        for (label, list) in [("first", &sample.head), ("last", &sample.tail)] {
            for entry in list {
                entries.add_row(vec![
                    Cell::new(label),
                    Cell::new(timestamp(entry.last_changed)),
                    Cell::new(&entry.state),
                ]);
            }
        }
        output.push_str(&entries.to_string());
        output.push('\n');

        let mut days = table(&["Day", "First Changed (UTC)", "State"]);
        for (day, entry) in &sample.first_of_day {
            days.add_row(vec![
                Cell::new(day),
                Cell::new(timestamp(entry.last_changed)),
                Cell::new(&entry.state),
            ]);
        }
        output.push_str(&days.to_string());
        output.push('\n');

        output
    }

    /// One row per day window, "NO DATA" for days without readings
    pub fn intraday(entity_id: &str, unit: EnergyUnit, rows: &[IntradayRow]) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "{entity_id} ({unit})");

        let mut table = table(&["Day", "Entries", "First -> Last", "Diff (kWh)"]);
        for row in rows {
            let cells = match (&row.error, &row.bucket) {
                (Some(error), _) => vec![
                    Cell::new(row.day),
                    Cell::new("-"),
                    Cell::new(error).fg(Color::Red),
                    Cell::new("-"),
                ],
                (None, Some(bucket)) => vec![
                    Cell::new(row.day),
                    Cell::new(row.entries).set_alignment(CellAlignment::Right),
                    Cell::new(format!("{} -> {}", bucket.opening, bucket.closing)),
                    Cell::new(kwh(bucket.intraday_consumption(unit)))
                        .set_alignment(CellAlignment::Right),
                ],
                (None, None) => vec![
                    Cell::new(row.day),
                    Cell::new(row.entries).set_alignment(CellAlignment::Right),
                    Cell::new("NO DATA"),
                    Cell::new("-"),
                ],
            };
            table.add_row(cells);
        }

        output.push_str(&table.to_string());
        output.push('\n');
        output
    }
}

#[derive(Serialize)]
struct DomainCount<'a> {
    domain: &'a str,
    count: usize,
}

impl JsonFormatter {
    pub fn entities(states: &[StateRecord]) -> Result<String> {
        Ok(serde_json::to_string_pretty(states)?)
    }

    pub fn domains(counts: &[(String, usize)]) -> Result<String> {
        let counts: Vec<DomainCount<'_>> = counts
            .iter()
            .map(|(domain, count)| DomainCount {
                domain,
                count: *count,
            })
            .collect();
        Ok(serde_json::to_string_pretty(&counts)?)
    }

    pub fn daily(summary: &DailySummary) -> Result<String> {
        Ok(serde_json::to_string_pretty(summary)?)
    }
}
