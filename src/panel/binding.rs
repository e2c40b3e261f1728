use std::fmt;

use serde::{Deserialize, Serialize};

/// A value passing between a widget control and a bound field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ControlValue {
    Number(f64),
    Toggle(bool),
    Choice(String),
}

impl ControlValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ControlValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_toggle(&self) -> Option<bool> {
        match self {
            ControlValue::Toggle(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_choice(&self) -> Option<&str> {
        match self {
            ControlValue::Choice(c) => Some(c),
            _ => None,
        }
    }
}

/// What kind of widget a binding renders as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlKind {
    Slider { min: f64, max: f64, step: f64 },
    Toggle,
    Select { options: Vec<String> },
    /// Display-only: refreshed from the field, never written (e.g. frame
    /// counters the simulation mutates on its own).
    Readout,
}

type ReadFn = Box<dyn Fn() -> ControlValue>;
type WriteFn = Box<dyn FnMut(ControlValue)>;

/// A two-way link between a field and one panel control.
///
/// Widget edits go through [`set`](Binding::set) (write-through to the
/// field); [`refresh`](Binding::refresh) pulls the field's current value
/// back into `display` for the widget to show.
pub struct Binding {
    pub field: String,
    pub group: String,
    pub kind: ControlKind,
    pub display: ControlValue,
    read: ReadFn,
    write: Option<WriteFn>,
}

impl Binding {
    pub(crate) fn new(
        group: &str,
        field: &str,
        kind: ControlKind,
        read: ReadFn,
        write: Option<WriteFn>,
    ) -> Self {
        let display = read();
        Self {
            field: field.to_string(),
            group: group.to_string(),
            kind,
            display,
            read,
            write,
        }
    }

    /// Pull the field's current value into the displayed value.
    pub fn refresh(&mut self) {
        self.display = (self.read)();
    }

    /// Write a widget edit through to the field. Slider values are clamped
    /// to their range; select values must name a known option. Returns
    /// whether the edit was accepted (readouts never accept).
    pub fn set(&mut self, value: ControlValue) -> bool {
        let accepted = match (&self.kind, &value) {
            (ControlKind::Slider { min, max, .. }, ControlValue::Number(n)) => {
                Some(ControlValue::Number(n.clamp(*min, *max)))
            }
            (ControlKind::Toggle, ControlValue::Toggle(_)) => Some(value.clone()),
            (ControlKind::Select { options }, ControlValue::Choice(choice))
                if options.iter().any(|option| option == choice) =>
            {
                Some(value.clone())
            }
            _ => None,
        };
        let (Some(value), Some(write)) = (accepted, self.write.as_mut()) else {
            return false;
        };
        write(value.clone());
        self.display = value;
        true
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("field", &self.field)
            .field("group", &self.group)
            .field("kind", &self.kind)
            .field("display", &self.display)
            .finish_non_exhaustive()
    }
}
