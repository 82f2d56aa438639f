use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A catalog record describing one laptop.
///
/// Records are plain owned values. The store keeps its own clone and hands
/// out clones, so a caller can never reach stored data through a reference
/// it still holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Record {
    /// Record identifier (a UUID). Empty means "assign one on save".
    #[serde(default)]
    pub id: String,
    /// Manufacturer brand.
    #[serde(default)]
    pub brand: String,
    /// Model name.
    #[serde(default)]
    pub name: String,
    /// Central processor.
    #[serde(default)]
    pub processor: Processor,
    /// Installed memory.
    #[serde(default)]
    pub memory: Memory,
    /// Graphics processors.
    #[serde(default)]
    pub graphics: Vec<Gpu>,
    /// Storage devices.
    #[serde(default)]
    pub storages: Vec<Storage>,
    /// Built-in screen.
    #[serde(default)]
    pub display: Display,
    /// Built-in keyboard.
    #[serde(default)]
    pub keyboard: Keyboard,
    /// Device weight.
    #[serde(default)]
    pub weight: Weight,
    /// Price in US dollars.
    #[serde(default)]
    pub price_usd: f64,
    /// Year the model was released.
    #[serde(default)]
    pub release_year: u32,
    /// Last time the record was modified upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Processor {
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cores: u32,
    #[serde(default)]
    pub threads: u32,
    /// Base clock speed in GHz.
    #[serde(default)]
    pub min_ghz: f64,
    /// Boost clock speed in GHz.
    #[serde(default)]
    pub max_ghz: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Gpu {
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub min_ghz: f64,
    #[serde(default)]
    pub max_ghz: f64,
    #[serde(default)]
    pub memory: Memory,
}

/// Units a [`Memory`] amount can be expressed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum MemoryUnit {
    Bit,
    #[default]
    Byte,
    Kilobyte,
    Megabyte,
    Gigabyte,
    Terabyte,
}

impl MemoryUnit {
    /// Left shift that converts one unit of `self` into bits.
    pub const fn bit_shift(self) -> u32 {
        match self {
            Self::Bit => 0,
            Self::Byte => 3,
            Self::Kilobyte => 13,
            Self::Megabyte => 23,
            Self::Gigabyte => 33,
            Self::Terabyte => 43,
        }
    }
}

/// An amount of memory or storage capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Memory {
    pub value: u64,
    pub unit: MemoryUnit,
}

impl Memory {
    pub const fn new(value: u64, unit: MemoryUnit) -> Self {
        Self { value, unit }
    }

    pub const fn gigabytes(value: u64) -> Self {
        Self::new(value, MemoryUnit::Gigabyte)
    }

    /// Capacity normalized to bits.
    ///
    /// Computed in `u128` so that even `u64::MAX` terabytes compares correctly.
    pub fn to_bits(self) -> u128 {
        u128::from(self.value) << self.unit.bit_shift()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum StorageDriver {
    #[default]
    Unknown,
    Hdd,
    Ssd,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Storage {
    #[serde(default)]
    pub driver: StorageDriver,
    #[serde(default)]
    pub memory: Memory,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Display {
    /// Diagonal size in inches.
    #[serde(default)]
    pub size_inch: f32,
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default)]
    pub multitouch: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum KeyboardLayout {
    #[default]
    Unknown,
    Qwerty,
    Qwertz,
    Azerty,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Keyboard {
    #[serde(default)]
    pub layout: KeyboardLayout,
    #[serde(default)]
    pub backlit: bool,
}

/// Device weight in either metric or imperial units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Weight {
    Kilograms(f64),
    Pounds(f64),
}

impl Default for Weight {
    fn default() -> Self {
        Self::Kilograms(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_units_normalize_to_bits() {
        assert_eq!(Memory::new(1, MemoryUnit::Bit).to_bits(), 1);
        assert_eq!(Memory::new(1, MemoryUnit::Byte).to_bits(), 8);
        assert_eq!(Memory::new(1, MemoryUnit::Kilobyte).to_bits(), 8 * 1024);
        assert_eq!(
            Memory::new(1, MemoryUnit::Gigabyte).to_bits(),
            Memory::new(1024, MemoryUnit::Megabyte).to_bits()
        );
        assert_eq!(
            Memory::new(2, MemoryUnit::Terabyte).to_bits(),
            Memory::new(2048, MemoryUnit::Gigabyte).to_bits()
        );
    }

    #[test]
    fn huge_memory_values_do_not_wrap() {
        let huge = Memory::new(u64::MAX, MemoryUnit::Terabyte);
        let small = Memory::new(1, MemoryUnit::Terabyte);
        assert!(huge.to_bits() > small.to_bits());
    }

    #[test]
    fn record_deserializes_with_missing_fields() {
        let record: Record = serde_json::from_str(r#"{"brand":"Apple","price_usd":1999.0}"#)
            .expect("partial record should deserialize");
        assert!(record.id.is_empty());
        assert_eq!(record.brand, "Apple");
        assert_eq!(record.weight, Weight::Kilograms(0.0));
    }

    #[test]
    fn weight_serializes_externally_tagged() {
        let json = serde_json::to_string(&Weight::Pounds(3.5)).unwrap();
        assert_eq!(json, r#"{"pounds":3.5}"#);
    }
}
