use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Column layout of the source spreadsheet
// ---------------------------------------------------------------------------

/// The six favorability rate columns, in display order.
pub const RATE_COLUMNS: [&str; 6] = [
    "Very favorable",
    "Somewhat favorable",
    "Somewhat unfavorable",
    "Very unfavorable",
    "Heard Of, No Opinion",
    "Never Heard Of",
];

/// Every column the loader requires, in source order.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "Filters",
    "Institutions",
    "Very favorable",
    "Somewhat favorable",
    "Somewhat unfavorable",
    "Very unfavorable",
    "Heard Of, No Opinion",
    "Never Heard Of",
];

// ---------------------------------------------------------------------------
// FilterDimension – the three demographic facets encoded in `Filters`
// ---------------------------------------------------------------------------

/// A demographic facet encoded in the `Filters` column by a label prefix.
///
/// A label either starts with exactly one of the recognized prefixes
/// (`"Educ: "`, `"Age: "`, `"Income: "`) and belongs to that dimension, or it
/// starts with none of them and names an institution partition row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterDimension {
    Education,
    Age,
    Income,
}

impl FilterDimension {
    pub const ALL: [FilterDimension; 3] = [
        FilterDimension::Education,
        FilterDimension::Age,
        FilterDimension::Income,
    ];

    /// The label prefix marking a row as belonging to this dimension.
    pub fn prefix(self) -> &'static str {
        match self {
            FilterDimension::Education => "Educ: ",
            FilterDimension::Age => "Age: ",
            FilterDimension::Income => "Income: ",
        }
    }

    /// Human-readable facet name for the UI.
    pub fn label(self) -> &'static str {
        match self {
            FilterDimension::Education => "Education",
            FilterDimension::Age => "Age",
            FilterDimension::Income => "Income",
        }
    }

    /// Split a `Filters` label into its dimension and bracket value.
    ///
    /// Returns `None` for labels that match no recognized prefix
    /// (institution rows). Prefixes are mutually exclusive, so at most one
    /// dimension can claim a label.
    pub fn split(label: &str) -> Option<(FilterDimension, &str)> {
        FilterDimension::ALL
            .iter()
            .find_map(|&dim| label.strip_prefix(dim.prefix()).map(|rest| (dim, rest)))
    }
}

// ---------------------------------------------------------------------------
// SurveyRecord – one row of the source dataset
// ---------------------------------------------------------------------------

/// One row of the survey spreadsheet.
///
/// The serde renames bind fields to the literal column headers, so the same
/// struct decodes CSV rows and records-oriented JSON and serializes back
/// under the source column names. Rates are fractions in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyRecord {
    #[serde(rename = "Filters")]
    pub filters: String,
    #[serde(rename = "Institutions")]
    pub institution: String,
    #[serde(rename = "Very favorable")]
    pub very_favorable: f64,
    #[serde(rename = "Somewhat favorable")]
    pub somewhat_favorable: f64,
    #[serde(rename = "Somewhat unfavorable")]
    pub somewhat_unfavorable: f64,
    #[serde(rename = "Very unfavorable")]
    pub very_unfavorable: f64,
    #[serde(rename = "Heard Of, No Opinion")]
    pub heard_of_no_opinion: f64,
    #[serde(rename = "Never Heard Of")]
    pub never_heard_of: f64,
}

impl SurveyRecord {
    /// Assemble a record from its labels and the six rates in
    /// [`RATE_COLUMNS`] order (used by the columnar loaders, which read
    /// cell by cell).
    pub fn from_parts(filters: String, institution: String, rates: [f64; 6]) -> Self {
        SurveyRecord {
            filters,
            institution,
            very_favorable: rates[0],
            somewhat_favorable: rates[1],
            somewhat_unfavorable: rates[2],
            very_unfavorable: rates[3],
            heard_of_no_opinion: rates[4],
            never_heard_of: rates[5],
        }
    }

    /// The six rates in [`RATE_COLUMNS`] order.
    pub fn rates(&self) -> [f64; 6] {
        [
            self.very_favorable,
            self.somewhat_favorable,
            self.somewhat_unfavorable,
            self.very_unfavorable,
            self.heard_of_no_opinion,
            self.never_heard_of,
        ]
    }

    /// Dimension and bracket value of this row's label, if it has one.
    pub fn dimension(&self) -> Option<(FilterDimension, &str)> {
        FilterDimension::split(&self.filters)
    }
}

// ---------------------------------------------------------------------------
// FilterOptions – the per-facet choices offered by the UI
// ---------------------------------------------------------------------------

/// The selectable values for each facet, derived once from the dataset.
///
/// Bracket values keep first-seen dataset order with their prefix stripped;
/// institution names are the sorted distinct non-empty `Institutions` values
/// across the full dataset (including rows outside the baseline).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    pub institutions: Vec<String>,
    pub education: Vec<String>,
    pub age: Vec<String>,
    pub income: Vec<String>,
}

impl FilterOptions {
    /// The bracket values for one demographic dimension.
    pub fn brackets(&self, dim: FilterDimension) -> &[String] {
        match dim {
            FilterDimension::Education => &self.education,
            FilterDimension::Age => &self.age,
            FilterDimension::Income => &self.income,
        }
    }

    fn brackets_mut(&mut self, dim: FilterDimension) -> &mut Vec<String> {
        match dim {
            FilterDimension::Education => &mut self.education,
            FilterDimension::Age => &mut self.age,
            FilterDimension::Income => &mut self.income,
        }
    }
}

// ---------------------------------------------------------------------------
// SurveyDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset with its derived indices.
///
/// Immutable after construction: user interactions only compute transient
/// views (row index subsets), never touch the records.
#[derive(Debug, Clone)]
pub struct SurveyDataset {
    /// All rows, in file order.
    pub records: Vec<SurveyRecord>,
    /// Indices of rows whose label matches a recognized dimension prefix,
    /// the working set for demographic filtering.
    pub baseline: Vec<usize>,
    /// Per-facet option sets.
    pub options: FilterOptions,
}

impl SurveyDataset {
    /// Build the baseline index and filter options from the loaded rows.
    ///
    /// A row contributes its institution name even when its label carries a
    /// recognized prefix; the two partitions are not required to be disjoint.
    pub fn from_records(records: Vec<SurveyRecord>) -> Self {
        let mut baseline = Vec::new();
        let mut options = FilterOptions::default();
        let mut institutions: BTreeSet<String> = BTreeSet::new();

        for (idx, rec) in records.iter().enumerate() {
            if let Some((dim, bracket)) = rec.dimension() {
                baseline.push(idx);
                let seen = options.brackets_mut(dim);
                if !seen.iter().any(|v| v == bracket) {
                    seen.push(bracket.to_string());
                }
            }
            if !rec.institution.is_empty() {
                institutions.insert(rec.institution.clone());
            }
        }
        options.institutions = institutions.into_iter().collect();

        SurveyDataset {
            records,
            baseline,
            options,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
