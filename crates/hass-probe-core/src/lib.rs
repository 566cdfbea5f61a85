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

//! Pure building blocks for exploring a Home Assistant instance:
//! snapshot filtering and day-over-day energy deltas.

pub mod daily_delta;
pub mod filter;
pub mod presets;
pub mod traits;

pub use daily_delta::{
    DailyDeltaExtractor, DailyEnergyReport, DayBoundary, extract_daily_deltas, today_so_far,
};
pub use filter::{EntityMatcher, domain_counts, filter_states};
pub use presets::Preset;
pub use traits::StateProvider;

pub use hass_probe_types::{
    DailyBucket, DailyDelta, EnergyUnit, GapPolicy, HistoryEntry, StateRecord,
};
