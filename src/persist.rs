use anyhow::Result;

// Wake-to-wake status kept in non-volatile storage. Deep sleep wipes RAM,
// so anything the next wake needs lives here.

const KEY_LOW_BATTERY: &str = "low_bat";

/// Flags that survive deep sleep.
pub trait StatusStore {
    /// Whether the previous wakes already showed the low-battery alert.
    fn low_battery_latched(&mut self) -> Result<bool>;
    fn set_low_battery_latched(&mut self, latched: bool) -> Result<()>;
}

/// Store `desired` only when it differs from the stored value. Flash wear
/// is the constraint, the latch flips a handful of times per charge cycle.
pub fn update_latch(store: &mut dyn StatusStore, desired: bool) -> Result<()> {
    if store.low_battery_latched()? != desired {
        store.set_low_battery_latched(desired)?;
    }
    Ok(())
}

// ── NVS-backed store ────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use espidf::NvsStatusStore;

#[cfg(target_os = "espidf")]
mod espidf {
    use super::{StatusStore, KEY_LOW_BATTERY};
    use anyhow::Result;
    use esp_idf_svc::nvs::{EspNvs, EspNvsPartition, NvsDefault};

    const NAMESPACE: &str = "wx_status";

    pub struct NvsStatusStore {
        nvs: EspNvs<NvsDefault>,
    }

    impl NvsStatusStore {
        pub fn new(partition: EspNvsPartition<NvsDefault>) -> Result<Self> {
            let nvs = EspNvs::new(partition, NAMESPACE, true)?;
            Ok(Self { nvs })
        }
    }

    impl StatusStore for NvsStatusStore {
        fn low_battery_latched(&mut self) -> Result<bool> {
            Ok(self.nvs.get_u8(KEY_LOW_BATTERY)?.unwrap_or(0) != 0)
        }

        fn set_low_battery_latched(&mut self, latched: bool) -> Result<()> {
            self.nvs.set_u8(KEY_LOW_BATTERY, u8::from(latched))?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MemStatusStore {
        latched: bool,
        writes: usize,
    }

    impl StatusStore for MemStatusStore {
        fn low_battery_latched(&mut self) -> Result<bool> {
            Ok(self.latched)
        }

        fn set_low_battery_latched(&mut self, latched: bool) -> Result<()> {
            self.latched = latched;
            self.writes += 1;
            Ok(())
        }
    }

    #[test]
    fn latch_writes_only_on_change() {
        let mut store = MemStatusStore::default();

        update_latch(&mut store, false).unwrap();
        assert_eq!(store.writes, 0);

        update_latch(&mut store, true).unwrap();
        assert_eq!(store.writes, 1);
        assert!(store.latched);

        update_latch(&mut store, true).unwrap();
        assert_eq!(store.writes, 1);

        update_latch(&mut store, false).unwrap();
        assert_eq!(store.writes, 2);
        assert!(!store.latched);
    }
}
