//! Filter form, chart state and the controller that ties them to the dataset.

mod chart;
mod controller;
mod form;

pub(crate) use chart::{ChartHandle, ChartType, Series};
pub(crate) use controller::{DataSource, Preloaded, RenderResult, ViewController};
pub(crate) use form::{parse_threshold, DateChoice, FormState};
