use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::domain::reading::{BatteryField, Reading};
use crate::domain::telemetry::BatteryPlatform;

/// Battery platform backed by plain values. Fields without a value are
/// reported as unsupported.
#[derive(Debug, Default)]
pub struct InMemoryBattery {
    fields: Mutex<HashMap<BatteryField, i32>>,
}

impl InMemoryBattery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reading(reading: Reading) -> Self {
        let battery = Self::new();
        battery.set_reading(reading);
        battery
    }

    pub fn set_reading(&self, reading: Reading) {
        let mut fields = self.fields.lock().unwrap_or_else(PoisonError::into_inner);
        for field in BatteryField::ALL {
            fields.insert(field, reading.field(field));
        }
    }

    pub fn set(&self, field: BatteryField, value: i32) {
        self.fields
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(field, value);
    }

    pub fn mark_unsupported(&self, field: BatteryField) {
        self.fields
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&field);
    }
}

impl BatteryPlatform for InMemoryBattery {
    fn supports(&self, field: BatteryField) -> bool {
        self.fields
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&field)
    }

    fn read(&self, field: BatteryField) -> Option<i32> {
        self.fields
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&field)
            .copied()
    }
}
