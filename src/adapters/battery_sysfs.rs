use std::path::{Path, PathBuf};

use crate::domain::reading::BatteryField;
use crate::domain::telemetry::BatteryPlatform;

// Linux power_supply class attributes, in lookup order per field.
// charge_counter is exposed by Android kernels, charge_now by most laptops.
const LEVEL_FILES: &[&str] = &["capacity"];
const CHARGE_COUNTER_FILES: &[&str] = &["charge_counter", "charge_now"];
const CURRENT_AVG_FILES: &[&str] = &["current_avg"];
const CURRENT_NOW_FILES: &[&str] = &["current_now"];

#[derive(Debug, Clone)]
pub struct SysfsBattery {
    dir: PathBuf,
}

impl SysfsBattery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn attribute_path(&self, field: BatteryField) -> Option<PathBuf> {
        candidates(field)
            .iter()
            .map(|name| self.dir.join(name))
            .find(|path| path.is_file())
    }
}

impl BatteryPlatform for SysfsBattery {
    fn supports(&self, field: BatteryField) -> bool {
        self.attribute_path(field).is_some()
    }

    fn read(&self, field: BatteryField) -> Option<i32> {
        let path = self.attribute_path(field)?;
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(error) => {
                tracing::debug!(path = %path.display(), error = %error, "battery attribute unreadable");
                return None;
            }
        };

        parse_attribute(&raw)
    }
}

fn candidates(field: BatteryField) -> &'static [&'static str] {
    match field {
        BatteryField::LevelPercent => LEVEL_FILES,
        BatteryField::ChargeCounter => CHARGE_COUNTER_FILES,
        BatteryField::CurrentAverage => CURRENT_AVG_FILES,
        BatteryField::CurrentNow => CURRENT_NOW_FILES,
    }
}

fn parse_attribute(raw: &str) -> Option<i32> {
    let value = raw.trim().parse::<i64>().ok()?;
    i32::try_from(value).ok()
}
