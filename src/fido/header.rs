//! FidoNet type 2+ packet header (FSC-0039/FSC-0048), 58 bytes little endian.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::Serialize;

use crate::fido::address::FidoAddress;

/// Size of an encoded [`FidoPacketHeader`].
pub const FIDO_HEADER_SIZE: usize = 58;

/// Length of the password field.
pub const PASSWORD_LEN: usize = 8;

/// FTSC product code meaning "no code assigned".
const PRODUCT_CODE_UNASSIGNED: u8 = 0xfe;

/// Capability word advertising type 2+ support.
const CAPABILITY_TYPE_2PLUS: u16 = 0x0001;

const DEFAULT_BAUD: u16 = 33600;

/// Header at the start of every FidoNet packet file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FidoPacketHeader {
    pub orig_node: u16,
    pub dest_node: u16,
    /// Full year, e.g. 2016.
    pub year: u16,
    /// Month, 0 based.
    pub month: u16,
    pub day: u16,
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
    pub baud: u16,
    /// Always 2.
    pub packet_ver: u16,
    pub orig_net: u16,
    pub dest_net: u16,
    pub product_code_low: u8,
    pub revision_major: u8,
    pub password: [u8; PASSWORD_LEN],
    pub qm_orig_zone: u16,
    pub qm_dest_zone: u16,
    pub aux_net: u16,
    /// Byte swapped copy of `capabilities`.
    pub capabilities_valid: u16,
    pub product_code_high: u8,
    pub revision_minor: u8,
    pub capabilities: u16,
    pub orig_zone: u16,
    pub dest_zone: u16,
    pub orig_point: u16,
    pub dest_point: u16,
    pub product_data: u32,
}

impl FidoPacketHeader {
    /// A type 2+ header from `orig` to `dest` stamped with `created`.
    ///
    /// Passwords longer than eight bytes are cut to fit.
    pub fn new(
        orig: &FidoAddress,
        dest: &FidoAddress,
        created: DateTime<Utc>,
        password: &str,
    ) -> Self {
        let mut pw = [0u8; PASSWORD_LEN];
        let bytes = password.as_bytes();
        let n = bytes.len().min(PASSWORD_LEN);
        pw[..n].copy_from_slice(&bytes[..n]);

        Self {
            orig_node: orig.node,
            dest_node: dest.node,
            year: created.year().clamp(0, i32::from(u16::MAX)) as u16,
            month: created.month0() as u16,
            day: created.day() as u16,
            hour: created.hour() as u16,
            minute: created.minute() as u16,
            second: created.second() as u16,
            baud: DEFAULT_BAUD,
            packet_ver: 2,
            orig_net: orig.net,
            dest_net: dest.net,
            product_code_low: PRODUCT_CODE_UNASSIGNED,
            revision_major: 0,
            password: pw,
            qm_orig_zone: orig.zone,
            qm_dest_zone: dest.zone,
            aux_net: 0,
            capabilities_valid: CAPABILITY_TYPE_2PLUS.swap_bytes(),
            product_code_high: 0,
            revision_minor: 1,
            capabilities: CAPABILITY_TYPE_2PLUS,
            orig_zone: orig.zone,
            dest_zone: dest.zone,
            orig_point: orig.point,
            dest_point: dest.point,
            product_data: 0,
        }
    }

    pub fn orig_address(&self) -> FidoAddress {
        FidoAddress::new(self.orig_zone, self.orig_net, self.orig_node).with_point(self.orig_point)
    }

    pub fn dest_address(&self) -> FidoAddress {
        FidoAddress::new(self.dest_zone, self.dest_net, self.dest_node).with_point(self.dest_point)
    }

    /// Packet password with NUL padding removed.
    pub fn password(&self) -> String {
        let end = self
            .password
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(PASSWORD_LEN);
        String::from_utf8_lossy(&self.password[..end]).into_owned()
    }

    /// Whether the capability word and its swapped copy agree on type 2+.
    pub fn is_type_2plus(&self) -> bool {
        self.capabilities == self.capabilities_valid.swap_bytes()
            && self.capabilities & CAPABILITY_TYPE_2PLUS != 0
    }

    /// Creation time, if the stamped fields form a valid date.
    pub fn created(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month) + 1,
            u32::from(self.day),
        )?
        .and_hms_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second),
        )
    }

    pub fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for value in [
            self.orig_node,
            self.dest_node,
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.baud,
            self.packet_ver,
            self.orig_net,
            self.dest_net,
        ] {
            writer.write_u16::<LittleEndian>(value)?;
        }
        writer.write_u8(self.product_code_low)?;
        writer.write_u8(self.revision_major)?;
        writer.write_all(&self.password)?;
        writer.write_u16::<LittleEndian>(self.qm_orig_zone)?;
        writer.write_u16::<LittleEndian>(self.qm_dest_zone)?;
        writer.write_u16::<LittleEndian>(self.aux_net)?;
        writer.write_u16::<LittleEndian>(self.capabilities_valid)?;
        writer.write_u8(self.product_code_high)?;
        writer.write_u8(self.revision_minor)?;
        for value in [
            self.capabilities,
            self.orig_zone,
            self.dest_zone,
            self.orig_point,
            self.dest_point,
        ] {
            writer.write_u16::<LittleEndian>(value)?;
        }
        writer.write_u32::<LittleEndian>(self.product_data)?;
        Ok(())
    }

    pub fn decode<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut h = Self {
            orig_node: reader.read_u16::<LittleEndian>()?,
            dest_node: reader.read_u16::<LittleEndian>()?,
            year: reader.read_u16::<LittleEndian>()?,
            month: reader.read_u16::<LittleEndian>()?,
            day: reader.read_u16::<LittleEndian>()?,
            hour: reader.read_u16::<LittleEndian>()?,
            minute: reader.read_u16::<LittleEndian>()?,
            second: reader.read_u16::<LittleEndian>()?,
            baud: reader.read_u16::<LittleEndian>()?,
            packet_ver: reader.read_u16::<LittleEndian>()?,
            orig_net: reader.read_u16::<LittleEndian>()?,
            dest_net: reader.read_u16::<LittleEndian>()?,
            product_code_low: reader.read_u8()?,
            revision_major: reader.read_u8()?,
            ..Self::default()
        };
        reader.read_exact(&mut h.password)?;
        h.qm_orig_zone = reader.read_u16::<LittleEndian>()?;
        h.qm_dest_zone = reader.read_u16::<LittleEndian>()?;
        h.aux_net = reader.read_u16::<LittleEndian>()?;
        h.capabilities_valid = reader.read_u16::<LittleEndian>()?;
        h.product_code_high = reader.read_u8()?;
        h.revision_minor = reader.read_u8()?;
        h.capabilities = reader.read_u16::<LittleEndian>()?;
        h.orig_zone = reader.read_u16::<LittleEndian>()?;
        h.dest_zone = reader.read_u16::<LittleEndian>()?;
        h.orig_point = reader.read_u16::<LittleEndian>()?;
        h.dest_point = reader.read_u16::<LittleEndian>()?;
        h.product_data = reader.read_u32::<LittleEndian>()?;
        Ok(h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Cursor;

    fn sample() -> FidoPacketHeader {
        let orig: FidoAddress = "21:2/115.4".parse().unwrap();
        let dest: FidoAddress = "21:1/100".parse().unwrap();
        let created = Utc.with_ymd_and_hms(2016, 12, 25, 10, 30, 15).unwrap();
        FidoPacketHeader::new(&orig, &dest, created, "SECRET")
    }

    #[test]
    fn test_new_header_fields() {
        let h = sample();
        assert_eq!(h.year, 2016);
        assert_eq!(h.month, 11);
        assert_eq!(h.day, 25);
        assert_eq!(h.packet_ver, 2);
        assert_eq!(h.password(), "SECRET");
        assert_eq!(h.orig_address().to_string(), "21:2/115.4");
        assert_eq!(h.dest_address().to_string(), "21:1/100");
        assert!(h.is_type_2plus());
        assert_eq!(
            h.created(),
            NaiveDate::from_ymd_opt(2016, 12, 25).and_then(|d| d.and_hms_opt(10, 30, 15))
        );
    }

    #[test]
    fn test_encoded_layout() {
        let h = sample();
        let mut buf = Vec::new();
        h.encode(&mut buf).unwrap();
        assert_eq!(buf.len(), FIDO_HEADER_SIZE);
        // orig_node
        assert_eq!(&buf[0..2], &115u16.to_le_bytes());
        // packet_ver
        assert_eq!(&buf[18..20], &[2, 0]);
        assert_eq!(&buf[26..32], b"SECRET");
        assert_eq!(&buf[32..34], &[0, 0]);
        // capabilities_valid, capabilities
        assert_eq!(&buf[40..42], &[0x00, 0x01]);
        assert_eq!(&buf[44..46], &[0x01, 0x00]);
        // orig_point
        assert_eq!(&buf[50..52], &[4, 0]);

        let decoded = FidoPacketHeader::decode(&mut Cursor::new(buf)).unwrap();
        assert_eq!(decoded, h);
    }

    #[test]
    fn test_long_password_is_cut() {
        let a = FidoAddress::new(1, 1, 1);
        let h = FidoPacketHeader::new(&a, &a, Utc::now(), "TOOLONGPASSWORD");
        assert_eq!(h.password(), "TOOLONGP");
    }

    #[test]
    fn test_short_input_is_eof() {
        let err = FidoPacketHeader::decode(&mut Cursor::new(vec![0u8; 40])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
