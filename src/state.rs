use std::path::PathBuf;

use crate::data::filter::{FilterSelection, filter_view};
use crate::data::model::{FilterDimension, SurveyDataset};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The page sizes offered by the "Show number of rows" selector.
pub const PAGE_SIZES: [usize; 4] = [10, 25, 50, 100];

/// The full UI state, independent of rendering.
///
/// The dataset is loaded before the window opens and is replaced wholesale by
/// File → Open; nothing mutates it in place.
pub struct AppState {
    /// Loaded dataset (read-only reference data).
    pub dataset: SurveyDataset,

    /// Where `dataset` came from, for the top bar.
    pub source_path: PathBuf,

    /// Current selector values, one per facet.
    pub selection: FilterSelection,

    /// Indices of rows passing the current selection (cached).
    pub visible_rows: Vec<usize>,

    /// Rows per table page; always one of [`PAGE_SIZES`].
    pub page_size: usize,

    /// Current zero-based page into `visible_rows`.
    pub page: usize,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// State for a freshly loaded dataset: nothing selected, every baseline
    /// row visible, smallest page size.
    pub fn new(dataset: SurveyDataset, source_path: PathBuf) -> Self {
        let visible_rows = dataset.baseline.clone();
        Self {
            dataset,
            source_path,
            selection: FilterSelection::default(),
            visible_rows,
            page_size: PAGE_SIZES[0],
            page: 0,
            status_message: None,
        }
    }

    /// Swap in a dataset opened from the File menu; selections reset.
    pub fn set_dataset(&mut self, dataset: SurveyDataset, source_path: PathBuf) {
        self.dataset = dataset;
        self.source_path = source_path;
        self.selection = FilterSelection::default();
        self.status_message = None;
        self.refilter();
    }

    /// Recompute `visible_rows` after a selection change and jump back to
    /// the first page.
    pub fn refilter(&mut self) {
        let (rows, page_size) = filter_view(&self.dataset, &self.selection, self.page_size);
        self.visible_rows = rows;
        self.page_size = page_size;
        self.page = 0;
    }

    /// Select an institution (`None` clears the facet).
    pub fn set_institution(&mut self, institution: Option<String>) {
        self.selection.institution = institution;
        self.refilter();
    }

    /// Select a bracket value for one demographic dimension.
    pub fn set_bracket(&mut self, dim: FilterDimension, value: Option<String>) {
        self.selection.set_bracket(dim, value);
        self.refilter();
    }

    /// Change the page size.  Values outside the offered set are ignored;
    /// the selector is not clearable.
    pub fn set_page_size(&mut self, size: usize) {
        if !PAGE_SIZES.contains(&size) {
            log::debug!("Ignoring page size {size} outside the offered set");
            return;
        }
        self.page_size = size;
        self.page = 0;
    }

    /// Number of pages for the current view, at least 1.
    pub fn page_count(&self) -> usize {
        self.visible_rows.len().div_ceil(self.page_size).max(1)
    }

    /// The slice of `visible_rows` shown on the current page.
    pub fn page_rows(&self) -> &[usize] {
        let start = self.page * self.page_size;
        let end = (start + self.page_size).min(self.visible_rows.len());
        if start >= end {
            &[]
        } else {
            &self.visible_rows[start..end]
        }
    }

    pub fn next_page(&mut self) {
        if self.page + 1 < self.page_count() {
            self.page += 1;
        }
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
