use serde::{Deserialize, Serialize};

use crate::record::{Memory, Record};

/// Search predicate applied to every stored record.
///
/// Every bound is optional; an unset bound does not constrain the result.
///
/// # Example
///
/// ```
/// use vitrine_core::{Filter, Memory};
///
/// let filter = Filter::new()
///     .max_price_usd(2000.0)
///     .min_cpu_cores(4)
///     .min_ram(Memory::gigabytes(8));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Filter {
    /// Inclusive upper bound on `price_usd`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price_usd: Option<f64>,
    /// Minimum processor core count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_cpu_cores: Option<u32>,
    /// Minimum processor base clock in GHz.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_cpu_ghz: Option<f64>,
    /// Minimum installed memory, compared after normalizing units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_ram: Option<Memory>,
}

impl Filter {
    /// Create an empty filter (matches every record).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn max_price_usd(mut self, price: f64) -> Self {
        self.max_price_usd = Some(price);
        self
    }

    #[must_use]
    pub fn min_cpu_cores(mut self, cores: u32) -> Self {
        self.min_cpu_cores = Some(cores);
        self
    }

    #[must_use]
    pub fn min_cpu_ghz(mut self, ghz: f64) -> Self {
        self.min_cpu_ghz = Some(ghz);
        self
    }

    #[must_use]
    pub fn min_ram(mut self, ram: Memory) -> Self {
        self.min_ram = Some(ram);
        self
    }

    /// Reject bounds that can never be meaningfully compared.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(price) = self.max_price_usd
            && (!price.is_finite() || price < 0.0)
        {
            return Err(format!("max_price_usd must be a non-negative number, got {price}"));
        }
        if let Some(ghz) = self.min_cpu_ghz
            && (!ghz.is_finite() || ghz < 0.0)
        {
            return Err(format!("min_cpu_ghz must be a non-negative number, got {ghz}"));
        }
        Ok(())
    }

    /// Whether `record` satisfies every bound of this filter.
    pub fn matches(&self, record: &Record) -> bool {
        if self
            .max_price_usd
            .is_some_and(|max| record.price_usd > max)
        {
            return false;
        }
        if self
            .min_cpu_cores
            .is_some_and(|min| record.processor.cores < min)
        {
            return false;
        }
        if self
            .min_cpu_ghz
            .is_some_and(|min| record.processor.min_ghz < min)
        {
            return false;
        }
        if self
            .min_ram
            .is_some_and(|min| record.memory.to_bits() < min.to_bits())
        {
            return false;
        }
        true
    }
}
