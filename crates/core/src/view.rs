//! Explicit UI state for the dashboard.
//!
//! Every piece of state a screen depends on lives in [`ViewState`], which is changed only by
//! [`ViewState::apply`]. Front ends rebuild a `ViewState` from the request (query string or
//! CLI flags), apply events, and render from the result.

use serde::{Deserialize, Serialize};

use crate::patient::{PatientId, PatientRecord};
use crate::query::{filter_and_sort, SortKey, StatusFilter};

/// Tabs of the patient detail screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailTab {
    #[default]
    Overview,
    Diagnosis,
    Missing,
    Hedis,
    Interventions,
    Visits,
    Notes,
}

impl DetailTab {
    pub const ALL: [DetailTab; 7] = [
        DetailTab::Overview,
        DetailTab::Diagnosis,
        DetailTab::Missing,
        DetailTab::Hedis,
        DetailTab::Interventions,
        DetailTab::Visits,
        DetailTab::Notes,
    ];

    /// Parse a tab parameter. Unknown values fall back to the overview tab.
    pub fn from_param(value: &str) -> DetailTab {
        DetailTab::ALL
            .into_iter()
            .find(|t| t.as_param().eq_ignore_ascii_case(value.trim()))
            .unwrap_or_default()
    }

    pub fn as_param(self) -> &'static str {
        match self {
            DetailTab::Overview => "overview",
            DetailTab::Diagnosis => "diagnosis",
            DetailTab::Missing => "missing",
            DetailTab::Hedis => "hedis",
            DetailTab::Interventions => "interventions",
            DetailTab::Visits => "visits",
            DetailTab::Notes => "notes",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DetailTab::Overview => "Overview",
            DetailTab::Diagnosis => "Diagnosis History",
            DetailTab::Missing => "Missing Codes",
            DetailTab::Hedis => "HEDIS Measures",
            DetailTab::Interventions => "Interventions",
            DetailTab::Visits => "Recent Visits",
            DetailTab::Notes => "Notes",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "lowercase")]
pub enum Screen {
    #[default]
    List,
    Detail {
        patient: PatientId,
        #[serde(default)]
        tab: DetailTab,
    },
    Analytics,
}

/// Modal overlay shown on top of the current screen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "dialog", content = "code", rename_all = "camelCase")]
pub enum Dialog {
    CodeEducation(String),
    MeasureEducation(String),
    NoteEntry,
    HipaaNotice,
    AccessibilityNotice,
}

impl Dialog {
    /// Build a dialog from request parameters.
    ///
    /// `dialog` selects the kind; `code` and `measure` carry the looked-up code. A bare `code`
    /// or `measure` without `dialog` opens the matching education dialog.
    pub fn from_params(
        dialog: Option<&str>,
        code: Option<&str>,
        measure: Option<&str>,
    ) -> Option<Dialog> {
        let code = code.map(str::trim).filter(|c| !c.is_empty());
        let measure = measure.map(str::trim).filter(|m| !m.is_empty());

        match dialog.map(str::trim) {
            Some("code") => code.map(|c| Dialog::CodeEducation(c.to_string())),
            Some("measure") => measure.map(|m| Dialog::MeasureEducation(m.to_string())),
            Some("note") => Some(Dialog::NoteEntry),
            Some("hipaa") => Some(Dialog::HipaaNotice),
            Some("accessibility") => Some(Dialog::AccessibilityNotice),
            Some(_) => None,
            None => code
                .map(|c| Dialog::CodeEducation(c.to_string()))
                .or_else(|| measure.map(|m| Dialog::MeasureEducation(m.to_string()))),
        }
    }

    /// Query-string parameters that reopen this dialog.
    pub fn params(&self) -> Vec<(&'static str, &str)> {
        match self {
            Dialog::CodeEducation(code) => vec![("dialog", "code"), ("code", code.as_str())],
            Dialog::MeasureEducation(code) => {
                vec![("dialog", "measure"), ("measure", code.as_str())]
            }
            Dialog::NoteEntry => vec![("dialog", "note")],
            Dialog::HipaaNotice => vec![("dialog", "hipaa")],
            Dialog::AccessibilityNotice => vec![("dialog", "accessibility")],
        }
    }
}

fn default_sort() -> Option<SortKey> {
    Some(SortKey::Name)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    #[serde(flatten)]
    pub screen: Screen,
    #[serde(default)]
    pub search: String,
    #[serde(default = "default_sort")]
    pub sort: Option<SortKey>,
    #[serde(default)]
    pub filter: StatusFilter,
    #[serde(default)]
    pub dialog: Option<Dialog>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            screen: Screen::List,
            search: String::new(),
            sort: default_sort(),
            filter: StatusFilter::All,
            dialog: None,
        }
    }
}

/// A user interaction that changes the view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewEvent {
    ShowList,
    OpenPatient(PatientId),
    ShowAnalytics,
    SelectTab(DetailTab),
    Search(String),
    Sort(Option<SortKey>),
    Filter(StatusFilter),
    OpenDialog(Dialog),
    CloseDialog,
}

impl ViewState {
    /// State for the list screen as described by its query parameters.
    ///
    /// A missing sort parameter means the default name sort; an unrecognised one means input
    /// order.
    pub fn list(search: Option<&str>, sort: Option<&str>, filter: Option<&str>) -> Self {
        let mut state = ViewState::default();
        if let Some(search) = search {
            state = state.apply(ViewEvent::Search(search.to_string()));
        }
        if let Some(sort) = sort {
            state = state.apply(ViewEvent::Sort(SortKey::from_param(sort)));
        }
        if let Some(filter) = filter {
            state = state.apply(ViewEvent::Filter(StatusFilter::from_param(filter)));
        }
        state
    }

    pub fn detail(patient: PatientId, tab: DetailTab) -> Self {
        ViewState::default()
            .apply(ViewEvent::OpenPatient(patient))
            .apply(ViewEvent::SelectTab(tab))
    }

    /// Apply one event, returning the next state.
    ///
    /// Moving between screens resets search, sort, filter and any open dialog to their
    /// defaults. Switching tabs closes the dialog but keeps the patient.
    pub fn apply(self, event: ViewEvent) -> ViewState {
        match event {
            ViewEvent::ShowList => ViewState::default(),
            ViewEvent::OpenPatient(patient) => ViewState {
                screen: Screen::Detail {
                    patient,
                    tab: DetailTab::default(),
                },
                ..ViewState::default()
            },
            ViewEvent::ShowAnalytics => ViewState {
                screen: Screen::Analytics,
                ..ViewState::default()
            },
            ViewEvent::SelectTab(tab) => match self.screen {
                Screen::Detail { patient, .. } => ViewState {
                    screen: Screen::Detail { patient, tab },
                    dialog: None,
                    ..self
                },
                _ => self,
            },
            ViewEvent::Search(search) => ViewState {
                search: search.trim().to_string(),
                ..self
            },
            ViewEvent::Sort(sort) => ViewState { sort, ..self },
            ViewEvent::Filter(filter) => ViewState { filter, ..self },
            ViewEvent::OpenDialog(dialog) => ViewState {
                dialog: Some(dialog),
                ..self
            },
            ViewEvent::CloseDialog => ViewState {
                dialog: None,
                ..self
            },
        }
    }

    /// Records visible on the list screen for this state.
    pub fn visible<'a>(&self, records: &'a [PatientRecord]) -> Vec<&'a PatientRecord> {
        filter_and_sort(records, &self.search, &self.filter, self.sort)
    }

    /// Query-string parameters describing the list controls. Defaults are omitted.
    pub fn list_params(&self) -> Vec<(&'static str, &str)> {
        let mut params = Vec::new();
        if !self.search.is_empty() {
            params.push(("q", self.search.as_str()));
        }
        if self.sort != default_sort() {
            params.push(("sort", self.sort.map_or("none", SortKey::as_param)));
        }
        if self.filter != StatusFilter::All {
            params.push(("filter", self.filter.as_param()));
        }
        params
    }

    pub fn patient(&self) -> Option<PatientId> {
        match self.screen {
            Screen::Detail { patient, .. } => Some(patient),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{EmbeddedRecords, RecordStore};

    #[test]
    fn default_state_is_list_sorted_by_name() {
        let state = ViewState::default();
        assert_eq!(state.screen, Screen::List);
        assert_eq!(state.sort, Some(SortKey::Name));
        assert_eq!(state.filter, StatusFilter::All);
        assert!(state.dialog.is_none());
        assert!(state.list_params().is_empty());
    }

    #[test]
    fn navigation_resets_list_controls_and_dialog() {
        let state = ViewState::default()
            .apply(ViewEvent::Search("wilson".into()))
            .apply(ViewEvent::Sort(Some(SortKey::Age)))
            .apply(ViewEvent::Filter(StatusFilter::from_param("high")))
            .apply(ViewEvent::OpenDialog(Dialog::HipaaNotice));

        let detail = state.clone().apply(ViewEvent::OpenPatient(PatientId::new(3)));
        assert_eq!(
            detail,
            ViewState {
                screen: Screen::Detail {
                    patient: PatientId::new(3),
                    tab: DetailTab::Overview,
                },
                ..ViewState::default()
            }
        );

        let back = detail.apply(ViewEvent::ShowList);
        assert_eq!(back, ViewState::default());

        let analytics = state.apply(ViewEvent::ShowAnalytics);
        assert_eq!(analytics.screen, Screen::Analytics);
        assert!(analytics.search.is_empty());
    }

    #[test]
    fn select_tab_keeps_patient_and_closes_dialog() {
        let state = ViewState::detail(PatientId::new(1), DetailTab::Missing)
            .apply(ViewEvent::OpenDialog(Dialog::CodeEducation("E11.9".into())))
            .apply(ViewEvent::SelectTab(DetailTab::Notes));
        assert_eq!(
            state.screen,
            Screen::Detail {
                patient: PatientId::new(1),
                tab: DetailTab::Notes,
            }
        );
        assert!(state.dialog.is_none());
        assert_eq!(state.patient(), Some(PatientId::new(1)));
    }

    #[test]
    fn select_tab_outside_detail_is_ignored() {
        let state = ViewState::default().apply(ViewEvent::SelectTab(DetailTab::Hedis));
        assert_eq!(state, ViewState::default());
    }

    #[test]
    fn list_state_drives_query_engine() {
        let store = RecordStore::load(&EmbeddedRecords).unwrap();
        let state = ViewState::list(Some(" MED-789456123 "), None, Some("all"));
        let visible = state.visible(store.records());
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name.as_str(), "Sarah Johnson");
        assert_eq!(state.list_params(), vec![("q", "MED-789456123")]);
    }

    #[test]
    fn unknown_sort_param_means_input_order() {
        let state = ViewState::list(None, Some("shoeSize"), None);
        assert_eq!(state.sort, None);
        assert_eq!(state.list_params(), vec![("sort", "none")]);
    }

    #[test]
    fn dialog_params_parse() {
        assert_eq!(
            Dialog::from_params(Some("code"), Some("E11.9"), None),
            Some(Dialog::CodeEducation("E11.9".into()))
        );
        assert_eq!(
            Dialog::from_params(None, None, Some("CBP")),
            Some(Dialog::MeasureEducation("CBP".into()))
        );
        assert_eq!(Dialog::from_params(Some("code"), None, None), None);
        assert_eq!(Dialog::from_params(Some("bogus"), None, None), None);
        assert_eq!(
            Dialog::from_params(Some("note"), None, None),
            Some(Dialog::NoteEntry)
        );
    }

    #[test]
    fn tab_param_falls_back_to_overview() {
        assert_eq!(DetailTab::from_param("HEDIS"), DetailTab::Hedis);
        assert_eq!(DetailTab::from_param("billing"), DetailTab::Overview);
    }

    #[test]
    fn view_state_serializes_to_json() {
        let state = ViewState::detail(PatientId::new(4), DetailTab::Hedis)
            .apply(ViewEvent::OpenDialog(Dialog::MeasureEducation("CBP".into())));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["screen"], "detail");
        assert_eq!(json["patient"], 4);
        assert_eq!(json["tab"], "hedis");
        assert_eq!(json["dialog"]["dialog"], "measureEducation");

        let restored: ViewState = serde_json::from_value(json).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn minimal_json_uses_defaults() {
        let state: ViewState = serde_json::from_str(r#"{"screen":"list"}"#).unwrap();
        assert_eq!(state, ViewState::default());
    }
}
