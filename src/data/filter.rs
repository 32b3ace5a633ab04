use super::model::{FilterDimension, SurveyDataset};

// ---------------------------------------------------------------------------
// Filter selection: at most one value per facet
// ---------------------------------------------------------------------------

/// The current selector state: zero or one value per facet.
/// `None` means "no filter" on that facet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSelection {
    pub institution: Option<String>,
    pub education: Option<String>,
    pub age: Option<String>,
    pub income: Option<String>,
}

impl FilterSelection {
    /// The selected bracket value for one demographic dimension.
    pub fn bracket(&self, dim: FilterDimension) -> Option<&str> {
        match dim {
            FilterDimension::Education => self.education.as_deref(),
            FilterDimension::Age => self.age.as_deref(),
            FilterDimension::Income => self.income.as_deref(),
        }
    }

    /// Replace the selected bracket for one demographic dimension.
    pub fn set_bracket(&mut self, dim: FilterDimension, value: Option<String>) {
        match dim {
            FilterDimension::Education => self.education = value,
            FilterDimension::Age => self.age = value,
            FilterDimension::Income => self.income = value,
        }
    }

    /// Whether any of education/age/income is selected.
    pub fn has_bracket_filter(&self) -> bool {
        FilterDimension::ALL
            .iter()
            .any(|&dim| self.bracket(dim).is_some())
    }
}

// ---------------------------------------------------------------------------
// Filter evaluation
// ---------------------------------------------------------------------------

/// Return indices of rows matching the current selection.
///
/// * No institution selected → the pool is the baseline (rows with a
///   recognized label prefix). An institution selected → the pool is the
///   FULL dataset restricted to rows whose `Institutions` equals the value,
///   regardless of label prefix.
/// * If no demographic bracket is selected the pool passes through
///   unfiltered.
/// * Otherwise a row survives when its label starts with prefix + value for
///   ANY selected dimension: a union across dimensions, not an
///   intersection, and a prefix match rather than equality. Selecting both
///   an education and an age bracket returns rows matching either.
/// * A value that never occurs in the data matches nothing; that is an empty
///   result, not an error.
pub fn filtered_indices(dataset: &SurveyDataset, selection: &FilterSelection) -> Vec<usize> {
    let pool: Vec<usize> = match &selection.institution {
        Some(name) => (0..dataset.records.len())
            .filter(|&idx| dataset.records[idx].institution == *name)
            .collect(),
        None => dataset.baseline.clone(),
    };

    if !selection.has_bracket_filter() {
        return pool;
    }

    pool.into_iter()
        .filter(|&idx| {
            let label = &dataset.records[idx].filters;
            FilterDimension::ALL.iter().any(|&dim| {
                selection.bracket(dim).is_some_and(|value| {
                    label
                        .strip_prefix(dim.prefix())
                        .is_some_and(|rest| rest.starts_with(value))
                })
            })
        })
        .collect()
}

/// Compute the table view for the current selection: the matching row
/// indices plus the page size, which is the requested row count unchanged.
///
/// Pure function over its inputs; invoking it twice with identical arguments
/// yields identical results.
pub fn filter_view(
    dataset: &SurveyDataset,
    selection: &FilterSelection,
    row_count: usize,
) -> (Vec<usize>, usize) {
    (filtered_indices(dataset, selection), row_count)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
