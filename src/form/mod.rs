//! Typed input slots built from an interface schema.

use crate::{Error, Result, host::VolumeRef, schema::FieldSpec};

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeSlot {
    pub destination: String,
    /// Host-owned volume currently picked for this slot.
    pub volume: Option<VolumeRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeSlot {
    pub destination: String,
    pub minimum: f64,
    pub maximum: f64,
    value: f64,
}

impl RangeSlot {
    pub fn new(destination: impl Into<String>, minimum: f64, maximum: f64) -> Self {
        Self {
            destination: destination.into(),
            minimum,
            maximum,
            value: minimum + (maximum - minimum) / 2.0,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Sets the value, clamped into `[minimum, maximum]`.
    pub fn set_value(&mut self, value: f64) {
        self.value = value.max(self.minimum).min(self.maximum);
    }

    pub fn value_text(&self) -> String {
        format_decimal(self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormSlot {
    Volume(VolumeSlot),
    Range(RangeSlot),
}

impl FormSlot {
    pub fn destination(&self) -> &str {
        match self {
            Self::Volume(slot) => &slot.destination,
            Self::Range(slot) => &slot.destination,
        }
    }
}

impl From<&FieldSpec> for FormSlot {
    fn from(field: &FieldSpec) -> Self {
        match field {
            FieldSpec::Volume { destination } => Self::Volume(VolumeSlot {
                destination: destination.clone(),
                volume: None,
            }),
            FieldSpec::Slider {
                destination,
                minimum,
                maximum,
            } => Self::Range(RangeSlot::new(destination.clone(), *minimum, *maximum)),
        }
    }
}

/// The live form for the selected service, in schema order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Form {
    slots: Vec<FormSlot>,
}

/// Maps each field to one slot, keeping schema order.
pub fn build_form(schema: &[FieldSpec]) -> Form {
    Form {
        slots: schema.iter().map(FormSlot::from).collect(),
    }
}

impl Form {
    pub fn slots(&self) -> &[FormSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, destination: &str) -> Option<&FormSlot> {
        self.slots.iter().find(|slot| slot.destination() == destination)
    }

    fn slot_mut(&mut self, destination: &str) -> Result<&mut FormSlot> {
        self.slots
            .iter_mut()
            .find(|slot| slot.destination() == destination)
            .ok_or_else(|| Error::schema(format!("no form field named '{}'", destination)))
    }

    pub fn bind_volume(&mut self, destination: &str, volume: VolumeRef) -> Result<()> {
        match self.slot_mut(destination)? {
            FormSlot::Volume(slot) => {
                slot.volume = Some(volume);
                Ok(())
            }
            FormSlot::Range(_) => Err(Error::schema(format!(
                "field '{}' is a slider, not a volume",
                destination
            ))),
        }
    }

    pub fn set_value(&mut self, destination: &str, value: f64) -> Result<()> {
        match self.slot_mut(destination)? {
            FormSlot::Range(slot) => {
                slot.set_value(value);
                Ok(())
            }
            FormSlot::Volume(_) => Err(Error::schema(format!(
                "field '{}' is a volume, not a slider",
                destination
            ))),
        }
    }
}

/// `5.0` for integral values, otherwise the shortest form that parses back
/// to the same number.
pub fn format_decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
