pub mod api;
pub mod battery_memory;
pub mod battery_sysfs;
pub mod esp_http;
