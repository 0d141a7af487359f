use std::sync::Arc;

use crate::domain::reading::{BatteryField, Reading, UNSUPPORTED};

/// Host battery API. Capability is queried per field so callers never branch
/// on platform versions.
pub trait BatteryPlatform: Send + Sync + 'static {
    fn supports(&self, field: BatteryField) -> bool;
    fn read(&self, field: BatteryField) -> Option<i32>;
}

/// Produces one [`Reading`] on demand. Must not fail and must not do network
/// I/O; it runs on the scheduler's tick path.
pub trait TelemetrySource: Send + Sync + 'static {
    fn sample(&self) -> Reading;
}

impl<T> TelemetrySource for Arc<T>
where
    T: TelemetrySource + ?Sized,
{
    fn sample(&self) -> Reading {
        (**self).sample()
    }
}

#[derive(Debug, Clone)]
pub struct PlatformTelemetrySource<P> {
    platform: P,
}

impl<P> PlatformTelemetrySource<P>
where
    P: BatteryPlatform,
{
    pub fn new(platform: P) -> Self {
        Self { platform }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    fn read_field(&self, field: BatteryField) -> i32 {
        if !self.platform.supports(field) {
            return UNSUPPORTED;
        }

        match self.platform.read(field) {
            Some(value) => value,
            None => {
                tracing::debug!(field = field.query_key(), "battery field read returned nothing");
                UNSUPPORTED
            }
        }
    }
}

impl<P> TelemetrySource for PlatformTelemetrySource<P>
where
    P: BatteryPlatform,
{
    fn sample(&self) -> Reading {
        Reading::new(
            self.read_field(BatteryField::LevelPercent),
            self.read_field(BatteryField::ChargeCounter),
            self.read_field(BatteryField::CurrentAverage),
            self.read_field(BatteryField::CurrentNow),
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::adapters::battery_memory::InMemoryBattery;
    use crate::domain::reading::{BatteryField, Reading, UNSUPPORTED};

    use super::{BatteryPlatform, PlatformTelemetrySource, TelemetrySource};

    struct SupportedButEmpty;

    impl BatteryPlatform for SupportedButEmpty {
        fn supports(&self, _field: BatteryField) -> bool {
            true
        }

        fn read(&self, _field: BatteryField) -> Option<i32> {
            None
        }
    }

    #[test]
    fn samples_all_supported_fields() {
        let battery = InMemoryBattery::with_reading(Reading::new(80, 3_000_000, -450_000, -500_000));
        let source = PlatformTelemetrySource::new(battery);

        assert_eq!(
            source.sample(),
            Reading::new(80, 3_000_000, -450_000, -500_000)
        );
    }

    #[test]
    fn missing_capability_degrades_single_field_to_sentinel() {
        let battery = InMemoryBattery::with_reading(Reading::new(42, 1_000, -10, -20));
        battery.mark_unsupported(BatteryField::ChargeCounter);
        let source = PlatformTelemetrySource::new(battery);

        let reading = source.sample();

        assert_eq!(reading.charge_counter_micro_ah, UNSUPPORTED);
        assert_eq!(reading.level_percent, 42);
        assert_eq!(reading.avg_current_micro_a, -10);
        assert_eq!(reading.now_current_micro_a, -20);
    }

    #[test]
    fn failed_read_on_supported_field_is_not_an_error() {
        let source = PlatformTelemetrySource::new(SupportedButEmpty);
        assert_eq!(source.sample(), Reading::unsupported());
    }
}
