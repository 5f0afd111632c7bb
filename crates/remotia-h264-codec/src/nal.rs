//! NAL unit framing helpers for Annex B byte streams.

use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NalUnitType {
    Unspecified,
    NonIdrSlice,
    SliceDataA,
    SliceDataB,
    SliceDataC,
    IdrSlice,
    Sei,
    Sps,
    Pps,
    AccessUnitDelimiter,
    EndOfSequence,
    EndOfStream,
    FillerData,
    SpsExtension,
    Prefix,
    SubsetSps,
    Other(u8),
}

impl From<u8> for NalUnitType {
    fn from(value: u8) -> Self {
        match value & 0x1F {
            0 => Self::Unspecified,
            1 => Self::NonIdrSlice,
            2 => Self::SliceDataA,
            3 => Self::SliceDataB,
            4 => Self::SliceDataC,
            5 => Self::IdrSlice,
            6 => Self::Sei,
            7 => Self::Sps,
            8 => Self::Pps,
            9 => Self::AccessUnitDelimiter,
            10 => Self::EndOfSequence,
            11 => Self::EndOfStream,
            12 => Self::FillerData,
            13 => Self::SpsExtension,
            14 => Self::Prefix,
            15 => Self::SubsetSps,
            other => Self::Other(other),
        }
    }
}

impl NalUnitType {
    pub fn is_video(&self) -> bool {
        matches!(
            self,
            Self::NonIdrSlice | Self::SliceDataA | Self::SliceDataB | Self::SliceDataC | Self::IdrSlice
        )
    }
}

/// The one byte header opening every H.264 NAL unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NalHeader {
    pub forbidden_zero_bit: bool,
    pub nal_ref_idc: u8,
    pub nal_unit_type: NalUnitType,
}

impl NalHeader {
    pub fn parse(byte: u8) -> Self {
        Self {
            forbidden_zero_bit: byte >> 7 != 0,
            nal_ref_idc: (byte >> 5) & 0x03,
            nal_unit_type: NalUnitType::from(byte),
        }
    }
}

/// Length of the leading start code (a run of zeros closed by `0x01`), if any.
///
/// The returned length includes the closing `0x01`.
pub fn start_code_len(data: &[u8]) -> Option<usize> {
    let zeros = data.iter().take_while(|byte| **byte == 0).count();

    match data.get(zeros) {
        Some(1) => Some(zeros + 1),
        _ => None,
    }
}

/// Skips a leading access unit delimiter (ITU-T H.264 B.1.1 / 7.3.2.4).
///
/// When the stream opens with a start code followed by an AU delimiter NAL
/// unit, the returned view starts two bytes after the start code: past the
/// NAL header and the `primary_pic_type` byte. Any other input, including a
/// header with the forbidden bit set, is returned untouched.
pub fn strip_au_delimiter(data: &[u8]) -> &[u8] {
    let prefix_len = match start_code_len(data) {
        Some(len) => len,
        None => return data,
    };

    let header = match data.get(prefix_len) {
        Some(byte) => NalHeader::parse(*byte),
        None => return data,
    };

    if header.forbidden_zero_bit {
        return data;
    }

    if header.nal_unit_type != NalUnitType::AccessUnitDelimiter {
        return data;
    }

    debug!("NAL unit AU delimiter: idc: {}", header.nal_ref_idc);

    let start = (prefix_len + 2).min(data.len());
    &data[start..]
}
