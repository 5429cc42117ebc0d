//! Dashboard views and the render plan for each of them
//!
//! The selector value arrives with the request; nothing here keeps state
//! between renders.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::db::{QueryId, Table, Warehouse};

/// The sidebar table, rendered for every selection
pub const SIDEBAR_SOURCE: QueryId = QueryId::RiskCountry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    RiskyDestination,
    SmsSpamming,
    HandsetFraud,
    Wangiri,
    SimSwap,
}

impl View {
    /// Selector options, in display order. Index 0 is the default.
    pub const ALL: [View; 5] = [
        View::RiskyDestination,
        View::SmsSpamming,
        View::HandsetFraud,
        View::Wangiri,
        View::SimSwap,
    ];

    pub fn label(self) -> &'static str {
        match self {
            View::RiskyDestination => "Risky Destination Analysis",
            View::SmsSpamming => "SMS Spamming",
            View::HandsetFraud => "Handset Fraud (Empty)",
            View::Wangiri => "Wangiri (Empty)",
            View::SimSwap => "SIM Swap (Empty)",
        }
    }

    pub fn from_label(label: &str) -> Option<View> {
        View::ALL.into_iter().find(|v| v.label() == label)
    }

    pub fn plan(self) -> Vec<Section> {
        match self {
            View::RiskyDestination => vec![
                Section::Subheader("Risky Destination Analysis"),
                Section::Caption("Top 5 Risky Countries with highest number of outgoing calls"),
                Section::BarChart {
                    source: QueryId::Top5Country,
                    x: "COUNTRYNAME",
                    y: &["TOTALCOUNT", "TOTALRATE", "TOTALDURATION"],
                },
                Section::Caption("Top International Called Numbers (Risky Countries)"),
                Section::Table {
                    source: QueryId::TopCalledNumbers,
                },
            ],
            View::SmsSpamming => vec![
                Section::Subheader("SMS Spamming"),
                Section::Caption("Top Countries with highest number of SMS sent to subscribers"),
                Section::AreaChart {
                    source: QueryId::SmsByCountry,
                    x: "COUNTRYNAME",
                    y: "TOTALCOUNT",
                },
                Section::Caption("Top International Numbers sending SMS to Subscribers"),
                Section::Table {
                    source: QueryId::SmsSpamming,
                },
            ],
            View::HandsetFraud | View::Wangiri | View::SimSwap => Vec::new(),
        }
    }
}

/// What the request asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    View(View),
    /// A value outside the selector options; renders an empty main panel
    Unknown(String),
}

impl Selection {
    /// No parameter selects the first option
    pub fn resolve(param: Option<&str>) -> Self {
        match param {
            None => Selection::View(View::ALL[0]),
            Some(label) => match View::from_label(label) {
                Some(view) => Selection::View(view),
                None => Selection::Unknown(label.to_string()),
            },
        }
    }

    pub fn view(&self) -> Option<View> {
        match self {
            Selection::View(view) => Some(*view),
            Selection::Unknown(_) => None,
        }
    }

    pub fn plan(&self) -> Vec<Section> {
        self.view().map(View::plan).unwrap_or_default()
    }
}

/// One rendering instruction of the main panel
#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    Subheader(&'static str),
    Caption(&'static str),
    BarChart {
        source: QueryId,
        x: &'static str,
        y: &'static [&'static str],
    },
    AreaChart {
        source: QueryId,
        x: &'static str,
        y: &'static str,
    },
    /// Ranked table, first column used as the row index
    Table { source: QueryId },
}

impl Section {
    pub fn source(&self) -> Option<QueryId> {
        match self {
            Section::BarChart { source, .. }
            | Section::AreaChart { source, .. }
            | Section::Table { source } => Some(*source),
            Section::Subheader(_) | Section::Caption(_) => None,
        }
    }
}

/// Tables the main panel of a plan reads
pub fn main_sources(plan: &[Section]) -> BTreeSet<QueryId> {
    plan.iter().filter_map(Section::source).collect()
}

/// Which catalog queries run on a render
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchPolicy {
    /// Every query, regardless of the selection
    #[default]
    All,
    /// Only the sidebar table and the selected view's tables
    Selected,
}

impl FetchPolicy {
    /// Queries to run, in catalog order
    pub fn queries(self, selection: &Selection) -> Vec<QueryId> {
        match self {
            FetchPolicy::All => QueryId::ALL.to_vec(),
            FetchPolicy::Selected => {
                let mut needed = main_sources(&selection.plan());
                needed.insert(SIDEBAR_SOURCE);
                QueryId::ALL
                    .into_iter()
                    .filter(|id| needed.contains(id))
                    .collect()
            }
        }
    }
}

/// Tables fetched for one render
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    tables: BTreeMap<QueryId, Table>,
}

impl Snapshot {
    pub fn insert(&mut self, id: QueryId, table: Table) {
        self.tables.insert(id, table);
    }

    pub fn get(&self, id: QueryId) -> Result<&Table> {
        self.tables
            .get(&id)
            .ok_or_else(|| anyhow!("table {} was not fetched", id.name()))
    }
}

/// Fetch the tables of one render, one query after the other. The first
/// failing query aborts the whole load.
pub async fn load(
    warehouse: &Warehouse,
    selection: &Selection,
    policy: FetchPolicy,
) -> Result<Snapshot> {
    let mut snapshot = Snapshot::default();
    for id in policy.queries(selection) {
        let table = warehouse.fetch_query(id).await?;
        snapshot.insert(id, table);
    }
    Ok(snapshot)
}
