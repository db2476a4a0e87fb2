//! VCP (Virtual Control Panel) feature codes and value types.
//!
//! The MCCS specification assigns an 8-bit code to every controllable
//! monitor attribute. This module defines the codes this tool speaks plus
//! the standard input-source selector values for VCP code 0x60.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

/// An 8-bit MCCS feature code identifying one controllable attribute.
///
/// # Examples
///
/// ```
/// use ddc_protocol::vcp::FeatureCode;
///
/// let code = FeatureCode::BRIGHTNESS;
/// assert_eq!(code.raw(), 0x10);
/// assert_eq!(format!("{}", code), "0x10");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureCode(pub u8);

impl FeatureCode {
    /// Luminance (brightness), continuous 0..=max.
    pub const BRIGHTNESS: FeatureCode = FeatureCode(0x10);
    /// Contrast, continuous 0..=max.
    pub const CONTRAST: FeatureCode = FeatureCode(0x12);
    /// Input source selector (non-continuous; max is not meaningful).
    pub const INPUT_SELECT: FeatureCode = FeatureCode(0x60);
    /// Audio speaker volume.
    pub const AUDIO_VOLUME: FeatureCode = FeatureCode(0x62);
    /// MCCS version reported by the display.
    pub const MCCS_VERSION: FeatureCode = FeatureCode(0xDF);

    /// The raw 8-bit code.
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Human-readable name for well-known codes, if any.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::BRIGHTNESS => Some("brightness"),
            Self::CONTRAST => Some("contrast"),
            Self::INPUT_SELECT => Some("input-select"),
            Self::AUDIO_VOLUME => Some("audio-volume"),
            Self::MCCS_VERSION => Some("mccs-version"),
            _ => None,
        }
    }
}

impl fmt::Display for FeatureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

impl From<u8> for FeatureCode {
    fn from(raw: u8) -> Self {
        FeatureCode(raw)
    }
}

/// A VCP feature reading: current setting plus upper bound.
///
/// `maximum` is informational for continuous features. Non-continuous
/// (selector or momentary) features may report 0; callers must not assume
/// `maximum > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VcpValue {
    pub current: u16,
    pub maximum: u16,
}

impl VcpValue {
    pub const fn new(current: u16, maximum: u16) -> Self {
        Self { current, maximum }
    }
}

/// Standard MCCS input-source selector values (VCP code 0x60).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    DisplayPort1,
    DisplayPort2,
    Hdmi1,
    Hdmi2,
    UsbC,
}

impl InputSource {
    /// All selectable sources, in display order.
    pub const ALL: [InputSource; 5] = [
        InputSource::DisplayPort1,
        InputSource::DisplayPort2,
        InputSource::Hdmi1,
        InputSource::Hdmi2,
        InputSource::UsbC,
    ];

    /// The selector value written to VCP code 0x60.
    pub const fn value(self) -> u16 {
        match self {
            InputSource::DisplayPort1 => 0x0F,
            InputSource::DisplayPort2 => 0x10,
            InputSource::Hdmi1 => 0x11,
            InputSource::Hdmi2 => 0x12,
            InputSource::UsbC => 0x1B,
        }
    }

    /// Canonical name as printed by the CLI.
    pub const fn name(self) -> &'static str {
        match self {
            InputSource::DisplayPort1 => "DisplayPort-1",
            InputSource::DisplayPort2 => "DisplayPort-2",
            InputSource::Hdmi1 => "HDMI-1",
            InputSource::Hdmi2 => "HDMI-2",
            InputSource::UsbC => "USB-C",
        }
    }

    /// Parse a user-supplied input name, accepting common aliases
    /// ("hdmi", "dp", "thunderbolt", ...). Case-insensitive.
    pub fn from_name(name: &str) -> Option<InputSource> {
        INPUT_ALIASES.get(name.to_ascii_lowercase().as_str()).copied()
    }

    /// Map a selector value read back from the display to a known source.
    pub fn from_value(value: u16) -> Option<InputSource> {
        Self::ALL.iter().copied().find(|s| s.value() == value)
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static INPUT_ALIASES: Lazy<HashMap<&'static str, InputSource>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("displayport", InputSource::DisplayPort1);
    m.insert("displayport-1", InputSource::DisplayPort1);
    m.insert("dp", InputSource::DisplayPort1);
    m.insert("dp-1", InputSource::DisplayPort1);
    m.insert("displayport-2", InputSource::DisplayPort2);
    m.insert("dp-2", InputSource::DisplayPort2);
    m.insert("hdmi", InputSource::Hdmi1);
    m.insert("hdmi-1", InputSource::Hdmi1);
    m.insert("hdmi-2", InputSource::Hdmi2);
    m.insert("usb-c", InputSource::UsbC);
    m.insert("usbc", InputSource::UsbC);
    m.insert("thunderbolt", InputSource::UsbC);
    m
});
