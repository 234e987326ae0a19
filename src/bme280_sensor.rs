use thiserror::Error;

// BME280 registers.
const REG_CHIP_ID: u8 = 0xD0;
const REG_CTRL_HUM: u8 = 0xF2;
const REG_STATUS: u8 = 0xF3;
const REG_CTRL_MEAS: u8 = 0xF4;
const REG_PRESS_MSB: u8 = 0xF7;
const REG_CALIB_00: u8 = 0x88;
const REG_CALIB_H1: u8 = 0xA1;
const REG_CALIB_26: u8 = 0xE1;

const CHIP_ID: u8 = 0x60;

// Humidity x1, then temperature x1 + pressure x1 + forced mode. ctrl_hum
// only latches once ctrl_meas is written after it.
const CTRL_HUM_X1: u8 = 0x01;
const CTRL_MEAS_FORCED_X1: u8 = 0x25;

const STATUS_MEASURING: u8 = 0x08;

// Output registers read these values when a measurement was skipped.
const SKIPPED_20BIT: i32 = 0x8_0000;
const SKIPPED_16BIT: i32 = 0x8000;

/// One indoor measurement.
#[derive(Debug, Clone, Copy)]
pub struct IndoorSample {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("sensor not found")]
    NotFound,
    #[error("sensor read failed")]
    ReadFailed,
}

/// Temperature and humidity trimming coefficients from the two
/// calibration blocks.
#[derive(Debug, Clone, Copy, Default)]
struct Calibration {
    dig_t1: u16,
    dig_t2: i16,
    dig_t3: i16,
    dig_h1: u8,
    dig_h2: i16,
    dig_h3: u8,
    dig_h4: i16,
    dig_h5: i16,
    dig_h6: i8,
}

// Integer compensation per the Bosch datasheet. `t_fine` carries the
// temperature into the humidity formula.

fn compensate_temperature(adc_t: i32, cal: &Calibration) -> (f32, i32) {
    let var1 = (((adc_t >> 3) - ((cal.dig_t1 as i32) << 1)) * (cal.dig_t2 as i32)) >> 11;
    let var2 = (((((adc_t >> 4) - (cal.dig_t1 as i32)) * ((adc_t >> 4) - (cal.dig_t1 as i32)))
        >> 12)
        * (cal.dig_t3 as i32))
        >> 14;
    let t_fine = var1 + var2;
    let temp_c = ((t_fine * 5 + 128) >> 8) as f32 / 100.0;
    (temp_c, t_fine)
}

fn compensate_humidity(adc_h: i32, t_fine: i32, cal: &Calibration) -> f32 {
    // i64 intermediates, the multiplications overflow i32.
    let v = (t_fine - 76800) as i64;
    let x1 = (((adc_h as i64) << 14) - ((cal.dig_h4 as i64) << 20) - (cal.dig_h5 as i64) * v
        + 16384)
        >> 15;
    let x2 = ((((v * (cal.dig_h6 as i64)) >> 10) * (((v * (cal.dig_h3 as i64)) >> 11) + 32768))
        >> 10)
        + 2097152;
    let x2 = (x2 * (cal.dig_h2 as i64) + 8192) >> 14;
    let mut var = x1 * x2;
    var -= (((var >> 15) * (var >> 15)) >> 7) * (cal.dig_h1 as i64) >> 4;
    var = var.clamp(0, 419_430_400);
    (var >> 12) as f32 / 1024.0
}

#[cfg(target_os = "espidf")]
pub use device::Bme280;

#[cfg(target_os = "espidf")]
mod device {
    use super::*;
    use esp_idf_hal::delay::FreeRtos;
    use esp_idf_hal::i2c::I2cDriver;
    use log::{info, warn};

    const ADDR_PRIMARY: u8 = 0x76;
    const ADDR_SECONDARY: u8 = 0x77;
    const I2C_TIMEOUT: u32 = 100;

    pub struct Bme280 {
        addr: u8,
        cal: Calibration,
    }

    impl Bme280 {
        /// Probe both bus addresses for the chip id, then pull the
        /// calibration blocks.
        pub fn probe(i2c: &mut I2cDriver<'_>) -> Result<Self, SensorError> {
            for &addr in &[ADDR_PRIMARY, ADDR_SECONDARY] {
                let mut chip_id = [0u8];
                let found = i2c
                    .write_read(addr, &[REG_CHIP_ID], &mut chip_id, I2C_TIMEOUT)
                    .is_ok()
                    && chip_id[0] == CHIP_ID;
                if !found {
                    continue;
                }
                info!("BME280 found at 0x{:02X}", addr);
                let cal = read_calibration(i2c, addr).map_err(|_| SensorError::ReadFailed)?;
                return Ok(Bme280 { addr, cal });
            }
            warn!("BME280 not found on I2C bus");
            Err(SensorError::NotFound)
        }

        /// Trigger one forced measurement and wait for it to finish. The
        /// chip drops back to sleep mode on its own afterwards.
        pub fn read_forced(&self, i2c: &mut I2cDriver<'_>) -> Result<IndoorSample, SensorError> {
            i2c.write(self.addr, &[REG_CTRL_HUM, CTRL_HUM_X1], I2C_TIMEOUT)
                .map_err(|_| SensorError::ReadFailed)?;
            i2c.write(self.addr, &[REG_CTRL_MEAS, CTRL_MEAS_FORCED_X1], I2C_TIMEOUT)
                .map_err(|_| SensorError::ReadFailed)?;

            // x1 oversampling completes in under 10ms.
            for _ in 0..10 {
                FreeRtos::delay_ms(5);
                let mut status = [0u8];
                i2c.write_read(self.addr, &[REG_STATUS], &mut status, I2C_TIMEOUT)
                    .map_err(|_| SensorError::ReadFailed)?;
                if status[0] & STATUS_MEASURING == 0 {
                    return self.read_out(i2c);
                }
            }
            Err(SensorError::ReadFailed)
        }

        fn read_out(&self, i2c: &mut I2cDriver<'_>) -> Result<IndoorSample, SensorError> {
            let mut raw = [0u8; 8];
            i2c.write_read(self.addr, &[REG_PRESS_MSB], &mut raw, I2C_TIMEOUT)
                .map_err(|_| SensorError::ReadFailed)?;

            let adc_t = ((raw[3] as i32) << 12) | ((raw[4] as i32) << 4) | ((raw[5] as i32) >> 4);
            let adc_h = ((raw[6] as i32) << 8) | (raw[7] as i32);
            if adc_t == SKIPPED_20BIT || adc_h == SKIPPED_16BIT {
                return Err(SensorError::ReadFailed);
            }

            let (temperature_c, t_fine) = compensate_temperature(adc_t, &self.cal);
            let humidity_pct = compensate_humidity(adc_h, t_fine, &self.cal);
            Ok(IndoorSample {
                temperature_c,
                humidity_pct,
            })
        }
    }

    fn read_calibration(
        i2c: &mut I2cDriver<'_>,
        addr: u8,
    ) -> Result<Calibration, esp_idf_sys::EspError> {
        let mut cal1 = [0u8; 6];
        i2c.write_read(addr, &[REG_CALIB_00], &mut cal1, I2C_TIMEOUT)?;

        let mut h1 = [0u8];
        i2c.write_read(addr, &[REG_CALIB_H1], &mut h1, I2C_TIMEOUT)?;

        let mut cal2 = [0u8; 7];
        i2c.write_read(addr, &[REG_CALIB_26], &mut cal2, I2C_TIMEOUT)?;

        Ok(Calibration {
            dig_t1: u16::from_le_bytes([cal1[0], cal1[1]]),
            dig_t2: i16::from_le_bytes([cal1[2], cal1[3]]),
            dig_t3: i16::from_le_bytes([cal1[4], cal1[5]]),
            dig_h1: h1[0],
            dig_h2: i16::from_le_bytes([cal2[0], cal2[1]]),
            dig_h3: cal2[2],
            dig_h4: ((cal2[3] as i16) << 4) | ((cal2[4] as i16) & 0x0F),
            dig_h5: ((cal2[5] as i16) << 4) | ((cal2[4] as i16) >> 4),
            dig_h6: cal2[6] as i8,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trimming values from the Bosch datasheet's worked temperature
    // example.
    fn datasheet_cal() -> Calibration {
        Calibration {
            dig_t1: 27504,
            dig_t2: 26435,
            dig_t3: -1000,
            dig_h1: 75,
            dig_h2: 362,
            dig_h3: 0,
            dig_h4: 315,
            dig_h5: 50,
            dig_h6: 30,
        }
    }

    #[test]
    fn temperature_matches_the_datasheet_example() {
        let (temp_c, t_fine) = compensate_temperature(519_888, &datasheet_cal());
        assert!((temp_c - 25.08).abs() < 0.01, "{}", temp_c);
        assert_eq!(t_fine, 128_422);
    }

    #[test]
    fn humidity_stays_within_physical_bounds() {
        let cal = datasheet_cal();
        let (_, t_fine) = compensate_temperature(519_888, &cal);
        let low = compensate_humidity(0, t_fine, &cal);
        let high = compensate_humidity(0x7FFF, t_fine, &cal);
        assert!((0.0..=100.0).contains(&low));
        assert!((0.0..=100.0).contains(&high));
        assert!(high > low);
    }

    #[test]
    fn humidity_rises_with_the_raw_count() {
        let cal = datasheet_cal();
        let (_, t_fine) = compensate_temperature(519_888, &cal);
        let mid = compensate_humidity(30_000, t_fine, &cal);
        let wetter = compensate_humidity(35_000, t_fine, &cal);
        assert!(wetter > mid);
    }
}
