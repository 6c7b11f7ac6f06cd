use crate::model::MemMetric;
use crate::view::{parse_threshold, DateChoice, FormState, RenderResult};
use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};

/// Fields of the filter form, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Date,
    Metric,
    NistLevel,
    Family,
    KeygenMin,
    EncapMin,
    DecapMin,
}

impl FormField {
    const ORDER: [FormField; 7] = [
        FormField::Date,
        FormField::Metric,
        FormField::NistLevel,
        FormField::Family,
        FormField::KeygenMin,
        FormField::EncapMin,
        FormField::DecapMin,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            FormField::Date => "Date",
            FormField::Metric => "Memory",
            FormField::NistLevel => "NIST level",
            FormField::Family => "Family",
            FormField::KeygenMin => "keygen min",
            FormField::EncapMin => "encaps min",
            FormField::DecapMin => "decaps min",
        }
    }

    fn threshold_slot(self) -> Option<usize> {
        match self {
            FormField::KeygenMin => Some(0),
            FormField::EncapMin => Some(1),
            FormField::DecapMin => Some(2),
            _ => None,
        }
    }
}

pub struct UiState {
    pub tab: usize,
    pub info: String,
    pub form: FormState,
    pub focus: FormField,
    /// Raw text of the keygen/encaps/decaps threshold inputs.
    pub threshold_inputs: [String; 3],
    /// Dates offered by the date selector, in dataset order.
    pub dates: Vec<String>,
    pub result: RenderResult,
    pub last_saved_path: Option<String>,
    /// Set when the form was edited but not submitted yet.
    pub dirty: bool,
}

impl UiState {
    pub fn new(form: FormState, threshold_inputs: [String; 3]) -> Self {
        Self {
            tab: 0,
            info: "Loading dataset…".into(),
            form,
            focus: FormField::Date,
            threshold_inputs,
            dates: Vec::new(),
            result: RenderResult::default(),
            last_saved_path: None,
            dirty: false,
        }
    }

    /// Take over a fresh render result; the resolved date becomes the form's date.
    pub fn apply_result(&mut self, result: RenderResult) {
        if result.rendered {
            if let Some(date) = result.date.clone() {
                self.form.date = Some(date);
            }
        }
        self.result = result;
        self.dirty = false;
    }

    /// Step the focused enum field forwards or backwards.
    pub fn adjust(&mut self, forward: bool) {
        match self.focus {
            FormField::Date => self.cycle_date(forward),
            FormField::Metric => self.form.metric = self.form.metric.toggled(),
            FormField::NistLevel => {
                self.form.nist_level = if forward {
                    self.form.nist_level.next()
                } else {
                    self.form.nist_level.prev()
                }
            }
            FormField::Family => self.form.families = self.form.families.cycle(forward),
            _ => return,
        }
        self.dirty = true;
    }

    /// Choices are "All" followed by every date.
    fn cycle_date(&mut self, forward: bool) {
        let n = self.dates.len() + 1;
        let current = match &self.form.date {
            None | Some(DateChoice::All) => 0,
            Some(DateChoice::Date(d)) => self
                .dates
                .iter()
                .position(|x| x == d)
                .map_or(0, |i| i + 1),
        };
        let next = if forward {
            (current + 1) % n
        } else {
            (current + n - 1) % n
        };
        self.form.date = Some(if next == 0 {
            DateChoice::All
        } else {
            DateChoice::Date(self.dates[next - 1].clone())
        });
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(slot) = self.focus.threshold_slot() {
            if c.is_ascii_digit() || (c == '-' && self.threshold_inputs[slot].is_empty()) {
                self.threshold_inputs[slot].push(c);
                self.dirty = true;
            }
        }
    }

    pub fn backspace(&mut self) {
        if let Some(slot) = self.focus.threshold_slot() {
            if self.threshold_inputs[slot].pop().is_some() {
                self.dirty = true;
            }
        }
    }

    /// Copy the threshold inputs into the form, as done right before a submission.
    pub fn sync_thresholds(&mut self) {
        self.form.keygen_min = parse_threshold(&self.threshold_inputs[0]);
        self.form.encap_min = parse_threshold(&self.threshold_inputs[1]);
        self.form.decap_min = parse_threshold(&self.threshold_inputs[2]);
    }

    fn field_value(&self, field: FormField) -> String {
        match field {
            FormField::Date => self
                .form
                .date
                .as_ref()
                .map_or_else(|| "(latest)".to_string(), |d| d.to_string()),
            FormField::Metric => match self.form.metric {
                MemMetric::MaxHeap => "heap".into(),
                MemMetric::MaxStack => "stack".into(),
            },
            FormField::NistLevel => self.form.nist_level.to_string(),
            FormField::Family => self.form.families.label(),
            other => {
                let slot = other.threshold_slot().unwrap_or(0);
                if self.threshold_inputs[slot].is_empty() {
                    "none".into()
                } else {
                    self.threshold_inputs[slot].clone()
                }
            }
        }
    }

    /// Lines of the filter form panel, focused field highlighted.
    pub fn form_lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::with_capacity(FormField::ORDER.len() + 2);
        for field in FormField::ORDER {
            let focused = field == self.focus;
            let marker = if focused { "> " } else { "  " };
            let value_style = if focused {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            lines.push(Line::from(vec![
                Span::raw(marker),
                Span::styled(
                    format!("{:<11}", field.label()),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(self.field_value(field), value_style),
            ]));
        }
        lines.push(Line::from(""));
        if self.dirty {
            lines.push(Line::from(Span::styled(
                "Enter: apply filters",
                Style::default().fg(Color::Magenta),
            )));
        }
        lines
    }
}
