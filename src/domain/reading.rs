/// Value reported for a field the platform cannot supply.
pub const UNSUPPORTED: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatteryField {
    LevelPercent,
    ChargeCounter,
    CurrentAverage,
    CurrentNow,
}

impl BatteryField {
    pub const ALL: [BatteryField; 4] = [
        BatteryField::LevelPercent,
        BatteryField::ChargeCounter,
        BatteryField::CurrentAverage,
        BatteryField::CurrentNow,
    ];

    /// Query parameter name used on the `/update` request.
    pub fn query_key(self) -> &'static str {
        match self {
            BatteryField::LevelPercent => "battery_level",
            BatteryField::ChargeCounter => "charge_counter",
            BatteryField::CurrentAverage => "current_avg",
            BatteryField::CurrentNow => "current_now",
        }
    }
}

/// One sampled battery telemetry tuple. Any field may be [`UNSUPPORTED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    pub level_percent: i32,
    pub charge_counter_micro_ah: i32,
    pub avg_current_micro_a: i32,
    pub now_current_micro_a: i32,
}

impl Reading {
    pub fn new(
        level_percent: i32,
        charge_counter_micro_ah: i32,
        avg_current_micro_a: i32,
        now_current_micro_a: i32,
    ) -> Self {
        Self {
            level_percent,
            charge_counter_micro_ah,
            avg_current_micro_a,
            now_current_micro_a,
        }
    }

    pub fn unsupported() -> Self {
        Self::new(UNSUPPORTED, UNSUPPORTED, UNSUPPORTED, UNSUPPORTED)
    }

    pub fn field(&self, field: BatteryField) -> i32 {
        match field {
            BatteryField::LevelPercent => self.level_percent,
            BatteryField::ChargeCounter => self.charge_counter_micro_ah,
            BatteryField::CurrentAverage => self.avg_current_micro_a,
            BatteryField::CurrentNow => self.now_current_micro_a,
        }
    }

    pub fn is_supported(&self, field: BatteryField) -> bool {
        self.field(field) != UNSUPPORTED
    }
}
