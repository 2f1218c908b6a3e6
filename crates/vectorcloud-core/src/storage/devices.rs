use std::io::ErrorKind;
use std::path::Path;

use ini::{Ini, ParseOption};

use crate::storage::error::{StorageResult, StorageSystemError};
use crate::storage::records::Device;

const CERT_KEY: &str = "cert";
const IP_KEY: &str = "ip";
const NAME_KEY: &str = "name";
const GUID_KEY: &str = "guid";

/// Read the device configuration file.
///
/// One device per section, keyed by serial, in file order. A missing file
/// yields no devices.
pub fn load_device_config(path: &Path) -> StorageResult<Vec<Device>> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::info!("No device configuration at {}, device set is empty", path.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(StorageSystemError::io(e, "read_device_config", path.to_path_buf())),
    };
    parse_device_config(&data)
}

/// Parse device configuration text.
///
/// Values are kept exactly as written: no escape processing and no quote
/// stripping. Keys match case-insensitively.
pub fn parse_device_config(data: &str) -> StorageResult<Vec<Device>> {
    let verbatim = ParseOption { enabled_escape: false, enabled_quote: false, ..ParseOption::default() };
    let conf = Ini::load_from_str_opt(data, verbatim).map_err(|e| StorageSystemError::DeserializationError {
        format: "ini".to_string(),
        source: Box::new(e),
    })?;

    let mut devices = Vec::new();
    for (section, properties) in conf.iter() {
        // Keys outside any section carry no device
        let Some(serial) = section else { continue };
        if devices.iter().any(|d: &Device| d.serial == serial) {
            return Err(StorageSystemError::DuplicateDevice(serial.to_string()));
        }
        let field = |key: &str| {
            properties.iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(key))
                .map(|(_, value)| value.to_string())
                .ok_or_else(|| StorageSystemError::MissingDeviceKey {
                    section: serial.to_string(),
                    key: key.to_string(),
                })
        };
        devices.push(Device {
            serial: serial.to_string(),
            cert_file: field(CERT_KEY)?,
            ip: field(IP_KEY)?,
            name: field(NAME_KEY)?,
            guid: field(GUID_KEY)?,
        });
    }
    Ok(devices)
}
