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

use hass_probe_types::StateRecord;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Boolean predicate over a state snapshot record
///
/// Keyword checks are case-insensitive substring matches; unit, device class,
/// domain and entity checks are exact. A record without attributes is treated
/// as having an empty attribute map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityMatcher {
    /// Any keyword appears in the entity id or the friendly name
    Keywords(Vec<String>),
    /// Any fragment appears in the entity id (friendly name ignored)
    EntityIdContains(Vec<String>),
    /// `unit_of_measurement` is one of the given units
    Units(BTreeSet<String>),
    /// `device_class` is one of the given classes
    DeviceClasses(BTreeSet<String>),
    /// Entity id domain is one of the given domains
    Domains(BTreeSet<String>),
    /// Entity id is one of the given ids
    Entities(BTreeSet<String>),
    AnyOf(Vec<EntityMatcher>),
    AllOf(Vec<EntityMatcher>),
    Not(Box<EntityMatcher>),
}

impl EntityMatcher {
    pub fn keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Keywords(lowercased(keywords))
    }

    pub fn entity_id_contains<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::EntityIdContains(lowercased(fragments))
    }

    pub fn units<I, S>(units: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Units(units.into_iter().map(Into::into).collect())
    }

    pub fn device_classes<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::DeviceClasses(classes.into_iter().map(Into::into).collect())
    }

    pub fn domains<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Domains(domains.into_iter().map(Into::into).collect())
    }

    pub fn entities<I, S>(entity_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Entities(entity_ids.into_iter().map(Into::into).collect())
    }

    /// Invert this matcher
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Evaluate the predicate against one record
    pub fn matches(&self, state: &StateRecord) -> bool {
        match self {
            Self::Keywords(keywords) => {
                let entity_id = state.entity_id.to_lowercase();
                let friendly = state
                    .friendly_name()
                    .map(str::to_lowercase)
                    .unwrap_or_default();
                keywords
                    .iter()
                    .any(|k| entity_id.contains(k.as_str()) || friendly.contains(k.as_str()))
            }
            Self::EntityIdContains(fragments) => {
                let entity_id = state.entity_id.to_lowercase();
                fragments.iter().any(|f| entity_id.contains(f.as_str()))
            }
            Self::Units(units) => state
                .unit_of_measurement()
                .is_some_and(|unit| units.contains(unit)),
            Self::DeviceClasses(classes) => state
                .device_class()
                .is_some_and(|class| classes.contains(class)),
            Self::Domains(domains) => domains.contains(state.domain()),
            Self::Entities(ids) => ids.contains(&state.entity_id),
            Self::AnyOf(matchers) => matchers.iter().any(|m| m.matches(state)),
            Self::AllOf(matchers) => matchers.iter().all(|m| m.matches(state)),
            Self::Not(inner) => !inner.matches(state),
        }
    }

    /// Shorthand for [`filter_states`] with this matcher
    pub fn filter(&self, states: &[StateRecord]) -> Vec<StateRecord> {
        filter_states(states, |state| self.matches(state))
    }
}

/// Records matching `predicate`, ordered by entity id ascending
///
/// The sort is stable, so duplicate ids keep their input order.
pub fn filter_states<P>(states: &[StateRecord], predicate: P) -> Vec<StateRecord>
where
    P: Fn(&StateRecord) -> bool,
{
    let mut matched: Vec<StateRecord> = states.iter().filter(|s| predicate(s)).cloned().collect();
    matched.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));

    debug!("Filter matched {}/{} entities", matched.len(), states.len());
    matched
}

/// Number of entities per domain, largest first (ties by domain name)
pub fn domain_counts(states: &[StateRecord]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for state in states {
        *counts.entry(state.domain()).or_insert(0) += 1;
    }

    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(domain, count)| (domain.to_owned(), count))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

fn lowercased<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| item.as_ref().to_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}
