//! Linux `/dev/i2c-*` transport.
//!
//! On Linux each display's control channel is exposed as an I2C character
//! device. DDC/CI commands go to slave address 0x37; the EDID block lives
//! at 0x50 and supplies a best-effort monitor name. The kernel's i2c-dev
//! layer bounds every transfer, so calls here cannot hang indefinitely.

use crate::errors::DdcError;
use crate::transport::{DdcTransport, DisplayHandle, DisplayInfo};
use i2cdev::core::I2CDevice;
use i2cdev::linux::LinuxI2CDevice;
use std::io;
use std::path::Path;
use tracing::debug;

/// DDC/CI command slave address.
const DDC_ADDR: u16 = 0x37;
/// EDID slave address.
const EDID_ADDR: u16 = 0x50;
/// Base EDID block size.
const EDID_LEN: usize = 128;

/// [`DdcTransport`] over Linux i2c-dev character devices.
///
/// A display handle is the I2C bus number: handle 5 talks to
/// `/dev/i2c-5`. Devices are opened per exchange; the engine's
/// serialization keeps concurrent opens off the same bus.
#[derive(Debug, Default)]
pub struct I2cDevTransport;

impl I2cDevTransport {
    pub fn new() -> Self {
        Self
    }

    fn device_path(handle: DisplayHandle) -> String {
        format!("/dev/i2c-{}", handle.0)
    }

    fn open(&self, handle: DisplayHandle, addr: u16) -> Result<LinuxI2CDevice, DdcError> {
        let path = Self::device_path(handle);
        if !Path::new(&path).exists() {
            return Err(DdcError::InvalidHandle(handle));
        }
        LinuxI2CDevice::new(&path, addr).map_err(|e| DdcError::Transport(to_io_error(e)))
    }
}

impl DdcTransport for I2cDevTransport {
    fn list_displays(&self) -> Result<Vec<DisplayInfo>, DdcError> {
        let entries = std::fs::read_dir("/dev")
            .map_err(|e| DdcError::DiscoveryUnavailable(format!("cannot scan /dev: {}", e)))?;

        let mut buses: Vec<u32> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .and_then(|name| name.strip_prefix("i2c-").map(str::to_owned))
            })
            .filter_map(|suffix| suffix.parse().ok())
            .collect();
        buses.sort_unstable();

        let mut displays = Vec::new();
        for bus in buses {
            let handle = DisplayHandle(bus);
            match read_edid(&Self::device_path(handle)) {
                Ok(edid) => {
                    let name = parse_edid_name(&edid).unwrap_or_default();
                    debug!(%handle, name, "found display");
                    displays.push(DisplayInfo { handle, name });
                }
                Err(e) => {
                    // Buses without a monitor behind them (SMBus, GPU
                    // aux channels) fail the EDID probe; skip them.
                    debug!(%handle, error = %e, "no EDID on bus");
                }
            }
        }
        Ok(displays)
    }

    fn write(&self, handle: DisplayHandle, frame: &[u8]) -> Result<(), DdcError> {
        let mut dev = self.open(handle, DDC_ADDR)?;
        dev.write(frame)
            .map_err(|e| DdcError::Transport(to_io_error(e)))
    }

    fn read(&self, handle: DisplayHandle, len: usize) -> Result<Vec<u8>, DdcError> {
        let mut dev = self.open(handle, DDC_ADDR)?;
        let mut buf = vec![0u8; len];
        dev.read(&mut buf)
            .map_err(|e| DdcError::Transport(to_io_error(e)))?;
        Ok(buf)
    }
}

fn to_io_error(err: i2cdev::linux::LinuxI2CError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

fn read_edid(path: &str) -> Result<Vec<u8>, io::Error> {
    let mut dev = LinuxI2CDevice::new(path, EDID_ADDR).map_err(to_io_error)?;
    // Set the read offset, then pull the base block.
    dev.write(&[0x00]).map_err(to_io_error)?;
    let mut edid = vec![0u8; EDID_LEN];
    dev.read(&mut edid).map_err(to_io_error)?;

    if edid[..2] != [0x00, 0xFF] || edid[7] != 0x00 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "missing EDID header magic",
        ));
    }
    Ok(edid)
}

/// Extract the monitor name from the EDID display descriptors.
///
/// The four 18-byte descriptors start at offset 54; a descriptor tagged
/// 0xFC carries the model name, padded with 0x0A and spaces.
fn parse_edid_name(edid: &[u8]) -> Option<String> {
    for start in [54usize, 72, 90, 108] {
        let descriptor = edid.get(start..start + 18)?;
        if descriptor[..3] == [0, 0, 0] && descriptor[3] == 0xFC {
            let raw = &descriptor[5..18];
            let end = raw.iter().position(|&b| b == 0x0A).unwrap_or(raw.len());
            let name = String::from_utf8_lossy(&raw[..end]).trim().to_string();
            if !name.is_empty() {
                return Some(name);
            }
        }
    }
    None
}
