// Authoring form state
//
// Text-backed fields the form window edits in place. Parsing and validation
// happen on submit, so a half-typed time never reaches the working set.

use chrono::NaiveDate;
use egui::Pos2;
use thiserror::Error;

use super::selection::CreateRequest;
use crate::models::event::{CalendarEvent, EventDraft, ValidationError};
use crate::utils::date::{format_hhmm, parse_hhmm};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error, PartialEq)]
pub enum FormError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("Invalid {field}: '{value}'")]
    Unparseable { field: &'static str, value: String },
    #[error("No form is open")]
    NotOpen,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(String),
}

/// State for the create/edit form
#[derive(Clone, Debug)]
pub struct AuthoringForm {
    pub mode: FormMode,
    pub title: String,
    pub description: String,
    pub date: String,
    /// Empty for single-day events
    pub end_date: String,
    pub start_time: String,
    pub end_time: String,
    pub all_day: bool,
    /// Empty picks a palette colour on save
    pub color: String,
    /// Screen position the form window is placed near
    pub anchor: Pos2,
    pub error_message: Option<String>,
}

impl AuthoringForm {
    pub fn for_create(request: &CreateRequest, anchor: Pos2) -> Self {
        let mut form = Self {
            mode: FormMode::Create,
            title: String::new(),
            description: String::new(),
            date: String::new(),
            end_date: String::new(),
            start_time: String::new(),
            end_time: String::new(),
            all_day: false,
            color: String::new(),
            anchor,
            error_message: None,
        };
        form.prefill(request);
        form
    }

    pub fn for_edit(event: &CalendarEvent, anchor: Pos2) -> Self {
        Self {
            mode: FormMode::Edit(event.id.clone()),
            title: event.title.clone(),
            description: event.description.clone().unwrap_or_default(),
            date: format_date(event.date),
            end_date: event.end_date.map(format_date).unwrap_or_default(),
            start_time: event.start_time.map(format_hhmm).unwrap_or_default(),
            end_time: event.end_time.map(format_hhmm).unwrap_or_default(),
            all_day: event.is_all_day,
            color: event.color.clone(),
            anchor,
            error_message: None,
        }
    }

    /// Moves an open create form to a new selection, keeping what was typed.
    pub fn relocate(&mut self, request: &CreateRequest, anchor: Pos2) {
        self.anchor = anchor;
        self.error_message = None;
        if self.mode == FormMode::Create {
            self.prefill(request);
        }
    }

    fn prefill(&mut self, request: &CreateRequest) {
        match *request {
            CreateRequest::SingleDay { date, start, end } => {
                self.date = format_date(date);
                self.end_date.clear();
                self.start_time = format_hhmm(start);
                self.end_time = format_hhmm(end);
            }
            CreateRequest::MultiDay {
                start_date,
                end_date,
                start,
                end,
            } => {
                self.date = format_date(start_date);
                self.end_date = format_date(end_date);
                self.start_time = format_hhmm(start);
                self.end_time = format_hhmm(end);
            }
        }
    }

    pub fn editing_id(&self) -> Option<&str> {
        match &self.mode {
            FormMode::Edit(id) => Some(id),
            FormMode::Create => None,
        }
    }

    /// Parses the text fields. Validation of the resulting values happens
    /// when the draft is applied.
    pub fn to_draft(&self) -> Result<EventDraft, FormError> {
        let date = parse_date("date", &self.date)?;
        let end_date = parse_date("end date", &self.end_date)?;
        let (start_time, end_time) = if self.all_day {
            (None, None)
        } else {
            (
                parse_time("start time", &self.start_time)?,
                parse_time("end time", &self.end_time)?,
            )
        };

        Ok(EventDraft {
            id: self.editing_id().map(str::to_string),
            title: self.title.clone(),
            description: self.description.clone(),
            date,
            end_date,
            start_time,
            end_time,
            is_all_day: self.all_day,
            color: Some(self.color.trim().to_string()).filter(|c| !c.is_empty()),
        })
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(field: &'static str, value: &str) -> Result<Option<NaiveDate>, FormError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(Some)
        .map_err(|_| FormError::Unparseable {
            field,
            value: value.to_string(),
        })
}

fn parse_time(field: &'static str, value: &str) -> Result<Option<chrono::NaiveTime>, FormError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    parse_hhmm(value).map(Some).ok_or_else(|| FormError::Unparseable {
        field,
        value: value.to_string(),
    })
}
