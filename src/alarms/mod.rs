use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;

use crate::api::types::AlarmValues;

/// The four alarm bit-fields a robot exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AlarmField {
    Fa,
    Fb,
    Fc,
    Fd,
}

pub const ALL_FIELDS: [AlarmField; 4] = [AlarmField::Fa, AlarmField::Fb, AlarmField::Fc, AlarmField::Fd];

impl AlarmField {
    pub fn width(self) -> u8 {
        match self {
            AlarmField::Fa => 27,
            AlarmField::Fb => 11,
            AlarmField::Fc => 31,
            AlarmField::Fd => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AlarmField::Fa => "FA",
            AlarmField::Fb => "FB",
            AlarmField::Fc => "FC",
            AlarmField::Fd => "FD",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "FA" => Some(AlarmField::Fa),
            "FB" => Some(AlarmField::Fb),
            "FC" => Some(AlarmField::Fc),
            "FD" => Some(AlarmField::Fd),
            _ => None,
        }
    }

    /// Mask with every in-width bit set.
    pub fn mask(self) -> u32 {
        (1u32 << self.width()) - 1
    }

    /// The backend publishes no per-bit names, so bits are labelled by position.
    pub fn bit_label(self, bit: u8) -> String {
        format!("{} bit {:02}", self.name(), bit)
    }

    pub fn labels(self) -> Vec<(u8, String)> {
        (0..self.width()).map(|bit| (bit, self.bit_label(bit))).collect()
    }
}

impl fmt::Display for AlarmField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Checked boxes for `value`; bits at or above the field width are ignored.
pub fn unpack_bits(field: AlarmField, value: u32) -> BTreeSet<u8> {
    (0..field.width())
        .filter(|bit| value & (1u32 << bit) != 0)
        .collect()
}

pub fn pack_bits<'a, I>(field: AlarmField, bits: I) -> Result<u32, String>
where
    I: IntoIterator<Item = &'a u8>,
{
    let mut value = 0u32;
    for &bit in bits {
        if bit >= field.width() {
            return Err(format!(
                "bit {bit} is outside {} (valid bits 0-{})",
                field.name(),
                field.width() - 1
            ));
        }
        value |= 1u32 << bit;
    }
    Ok(value)
}

/// Parses a comma-separated bit list such as `0,3,26`. An empty string
/// means no bits.
pub fn parse_bit_list(field: AlarmField, value: &str) -> Result<BTreeSet<u8>, String> {
    let mut out = BTreeSet::new();
    for part in value.split(',') {
        let item = part.trim();
        if item.is_empty() {
            continue;
        }
        let bit: u8 = item
            .parse()
            .map_err(|_| format!("invalid {} bit '{item}'", field.name()))?;
        if bit >= field.width() {
            return Err(format!(
                "bit {bit} is outside {} (valid bits 0-{})",
                field.name(),
                field.width() - 1
            ));
        }
        out.insert(bit);
    }
    Ok(out)
}

/// Checkbox state of all four fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AlarmSet {
    pub fa: BTreeSet<u8>,
    pub fb: BTreeSet<u8>,
    pub fc: BTreeSet<u8>,
    pub fd: BTreeSet<u8>,
}

impl AlarmSet {
    pub fn from_values(values: &AlarmValues) -> Self {
        Self {
            fa: unpack_bits(AlarmField::Fa, values.alarm_fa),
            fb: unpack_bits(AlarmField::Fb, values.alarm_fb),
            fc: unpack_bits(AlarmField::Fc, values.alarm_fc),
            fd: unpack_bits(AlarmField::Fd, values.alarm_fd),
        }
    }

    pub fn bits(&self, field: AlarmField) -> &BTreeSet<u8> {
        match field {
            AlarmField::Fa => &self.fa,
            AlarmField::Fb => &self.fb,
            AlarmField::Fc => &self.fc,
            AlarmField::Fd => &self.fd,
        }
    }

    pub fn bits_mut(&mut self, field: AlarmField) -> &mut BTreeSet<u8> {
        match field {
            AlarmField::Fa => &mut self.fa,
            AlarmField::Fb => &mut self.fb,
            AlarmField::Fc => &mut self.fc,
            AlarmField::Fd => &mut self.fd,
        }
    }

    pub fn to_values(&self) -> Result<AlarmValues, String> {
        Ok(AlarmValues {
            alarm_fa: pack_bits(AlarmField::Fa, &self.fa)?,
            alarm_fb: pack_bits(AlarmField::Fb, &self.fb)?,
            alarm_fc: pack_bits(AlarmField::Fc, &self.fc)?,
            alarm_fd: pack_bits(AlarmField::Fd, &self.fd)?,
        })
    }

    pub fn is_clear(&self) -> bool {
        ALL_FIELDS.iter().all(|f| self.bits(*f).is_empty())
    }

    /// One line per field: `FA: 0, 3` or `FA: -`.
    pub fn summary(&self) -> Vec<String> {
        ALL_FIELDS
            .iter()
            .map(|f| {
                let bits = self.bits(*f);
                if bits.is_empty() {
                    format!("{}: -", f.name())
                } else {
                    format!("{}: {}", f.name(), bits.iter().join(", "))
                }
            })
            .collect()
    }
}

/// Checkbox table for one field, `[x]` marking the bits set in `checked`.
pub fn render_checkboxes(field: AlarmField, checked: &BTreeSet<u8>) -> Vec<String> {
    field
        .labels()
        .into_iter()
        .map(|(bit, label)| {
            let mark = if checked.contains(&bit) { "x" } else { " " };
            format!("[{mark}] {label}")
        })
        .collect()
}
