//! Versioned binary encoding of falloff models.
//!
//! The byte stream is a designed contract, not a reflection of in-memory
//! layout: magic, format version, variant tag, then fields in declaration
//! order. Scalars are little-endian IEEE-754 doubles, strings are
//! u32-length-prefixed UTF-8, optional fields carry a presence byte, and
//! efficiency entries are keyed by canonical species notation. Decoding
//! re-runs constructor validation, so a corrupt stream cannot materialize an
//! invalid model.

use crate::arrhenius::ArrheniusRate;
use crate::efficiency::EfficiencyTable;
use crate::error::{KineticsError, KineticsResult};
use crate::falloff::{
    FalloffModel, Lindemann, PressureDependentRate, RangePolicy, ThirdBody, Troe, Validity,
};
use crate::species::Species;

const MAGIC: &[u8; 4] = b"KFLF";
const VERSION: u8 = 1;

const TAG_THIRD_BODY: u8 = 1;
const TAG_LINDEMANN: u8 = 2;
const TAG_TROE: u8 = 3;

/// Serialize a model to the versioned byte stream.
pub fn encode(model: &FalloffModel) -> Vec<u8> {
    let mut buf = Vec::with_capacity(128);
    buf.extend_from_slice(MAGIC);
    buf.push(VERSION);
    match model {
        FalloffModel::ThirdBody(m) => {
            buf.push(TAG_THIRD_BODY);
            put_arrhenius(&mut buf, m.arrhenius_low());
            put_validity(&mut buf, m.validity());
            put_table(&mut buf, m.efficiencies());
            put_str(&mut buf, m.comment());
        }
        FalloffModel::Lindemann(m) => {
            buf.push(TAG_LINDEMANN);
            put_arrhenius(&mut buf, m.arrhenius_low());
            put_arrhenius(&mut buf, m.arrhenius_high());
            put_validity(&mut buf, m.validity());
            put_table(&mut buf, m.efficiencies());
            put_str(&mut buf, m.comment());
        }
        FalloffModel::Troe(m) => {
            buf.push(TAG_TROE);
            put_arrhenius(&mut buf, m.arrhenius_low());
            put_arrhenius(&mut buf, m.arrhenius_high());
            put_f64(&mut buf, m.alpha());
            put_f64(&mut buf, m.t3().value);
            put_f64(&mut buf, m.t1().value);
            put_opt_f64(&mut buf, m.t2().map(|t| t.value));
            put_validity(&mut buf, m.validity());
            put_table(&mut buf, m.efficiencies());
            put_str(&mut buf, m.comment());
        }
    }
    buf
}

/// Reconstruct a model from the versioned byte stream.
pub fn decode(bytes: &[u8]) -> KineticsResult<FalloffModel> {
    let mut reader = Reader::new(bytes);

    let magic = reader.take(4)?;
    if magic != MAGIC {
        return Err(KineticsError::Wire {
            what: "bad magic".to_string(),
        });
    }
    let version = reader.u8()?;
    if version != VERSION {
        return Err(KineticsError::Wire {
            what: format!("unsupported format version {}", version),
        });
    }

    let tag = reader.u8()?;
    let model = match tag {
        TAG_THIRD_BODY => {
            let arrhenius_low = take_arrhenius(&mut reader)?;
            let validity = take_validity(&mut reader)?;
            let efficiencies = take_table(&mut reader)?;
            let comment = reader.string()?;
            FalloffModel::ThirdBody(ThirdBody::from_parts(
                arrhenius_low,
                validity,
                efficiencies,
                comment,
            ))
        }
        TAG_LINDEMANN => {
            let arrhenius_low = take_arrhenius(&mut reader)?;
            let arrhenius_high = take_arrhenius(&mut reader)?;
            let validity = take_validity(&mut reader)?;
            let efficiencies = take_table(&mut reader)?;
            let comment = reader.string()?;
            FalloffModel::Lindemann(Lindemann::from_parts(
                arrhenius_low,
                arrhenius_high,
                validity,
                efficiencies,
                comment,
            ))
        }
        TAG_TROE => {
            let arrhenius_low = take_arrhenius(&mut reader)?;
            let arrhenius_high = take_arrhenius(&mut reader)?;
            let alpha = reader.f64()?;
            let t3 = reader.f64()?;
            let t1 = reader.f64()?;
            let t2 = reader.opt_f64()?;
            let validity = take_validity(&mut reader)?;
            let efficiencies = take_table(&mut reader)?;
            let comment = reader.string()?;
            FalloffModel::Troe(Troe::from_parts(
                arrhenius_low,
                arrhenius_high,
                alpha,
                t3,
                t1,
                t2,
                validity,
                efficiencies,
                comment,
            )?)
        }
        other => {
            return Err(KineticsError::Wire {
                what: format!("unknown model tag {}", other),
            });
        }
    };

    reader.finish()?;
    Ok(model)
}

fn put_f64(buf: &mut Vec<u8>, v: f64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_opt_f64(buf: &mut Vec<u8>, v: Option<f64>) {
    match v {
        Some(v) => {
            buf.push(1);
            put_f64(buf, v);
        }
        None => buf.push(0),
    }
}

fn put_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

fn put_arrhenius(buf: &mut Vec<u8>, rate: &ArrheniusRate) {
    put_f64(buf, rate.a());
    put_f64(buf, rate.n());
    put_f64(buf, rate.ea());
    put_f64(buf, rate.t0());
}

fn put_validity(buf: &mut Vec<u8>, validity: &Validity) {
    put_opt_f64(buf, validity.tmin().map(|t| t.value));
    put_opt_f64(buf, validity.tmax().map(|t| t.value));
    put_opt_f64(buf, validity.pmin().map(|p| p.value));
    put_opt_f64(buf, validity.pmax().map(|p| p.value));
    buf.push(match validity.policy() {
        RangePolicy::Extrapolate => 0,
        RangePolicy::Warn => 1,
        RangePolicy::Reject => 2,
    });
}

fn put_table(buf: &mut Vec<u8>, table: &EfficiencyTable) {
    buf.extend_from_slice(&(table.len() as u32).to_le_bytes());
    for (species, factor) in table.iter() {
        put_str(buf, species.key());
        put_f64(buf, factor);
    }
}

fn take_arrhenius(reader: &mut Reader<'_>) -> KineticsResult<ArrheniusRate> {
    let a = reader.f64()?;
    let n = reader.f64()?;
    let ea = reader.f64()?;
    let t0 = reader.f64()?;
    ArrheniusRate::from_si(a, n, ea, t0)
}

fn take_validity(reader: &mut Reader<'_>) -> KineticsResult<Validity> {
    let tmin = reader.opt_f64()?;
    let tmax = reader.opt_f64()?;
    let pmin = reader.opt_f64()?;
    let pmax = reader.opt_f64()?;
    let policy = match reader.u8()? {
        0 => RangePolicy::Extrapolate,
        1 => RangePolicy::Warn,
        2 => RangePolicy::Reject,
        other => {
            return Err(KineticsError::Wire {
                what: format!("unknown range policy {}", other),
            });
        }
    };
    Validity::from_si(tmin, tmax, pmin, pmax, policy)
}

fn take_table(reader: &mut Reader<'_>) -> KineticsResult<EfficiencyTable> {
    let count = reader.u32()? as usize;
    let mut entries = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        let key = reader.string()?;
        let species = key.parse::<Species>().map_err(|_| KineticsError::Wire {
            what: format!("unknown species key '{}'", key),
        })?;
        let factor = reader.f64()?;
        entries.push((species, factor));
    }
    EfficiencyTable::new(entries)
}

/// Cursor over the input stream; every read is bounds-checked.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> KineticsResult<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or_else(|| KineticsError::Wire {
            what: "length overflow".to_string(),
        })?;
        if end > self.buf.len() {
            return Err(KineticsError::Wire {
                what: format!("unexpected end of stream at byte {}", self.pos),
            });
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> KineticsResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> KineticsResult<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes(bytes.try_into().expect("4 bytes")))
    }

    fn f64(&mut self) -> KineticsResult<f64> {
        let bytes = self.take(8)?;
        Ok(f64::from_le_bytes(bytes.try_into().expect("8 bytes")))
    }

    fn opt_f64(&mut self) -> KineticsResult<Option<f64>> {
        match self.u8()? {
            0 => Ok(None),
            1 => Ok(Some(self.f64()?)),
            other => Err(KineticsError::Wire {
                what: format!("invalid presence flag {}", other),
            }),
        }
    }

    fn string(&mut self) -> KineticsResult<String> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| KineticsError::Wire {
            what: "invalid UTF-8 in string".to_string(),
        })
    }

    fn finish(&self) -> KineticsResult<()> {
        if self.pos != self.buf.len() {
            return Err(KineticsError::Wire {
                what: format!("{} trailing bytes", self.buf.len() - self.pos),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::falloff::tests::{lindemann, third_body, troe};

    #[test]
    fn third_body_roundtrip_is_exact() {
        let model = FalloffModel::from(third_body());
        let bytes = encode(&model);
        let back = decode(&bytes).unwrap();
        assert_eq!(model, back);
    }

    #[test]
    fn lindemann_roundtrip_is_exact() {
        let model = FalloffModel::from(lindemann());
        let back = decode(&encode(&model)).unwrap();
        assert_eq!(model, back);
    }

    #[test]
    fn troe_roundtrip_is_exact() {
        let model = FalloffModel::from(troe());
        let back = decode(&encode(&model)).unwrap();
        assert_eq!(model, back);
    }

    #[test]
    fn roundtrip_preserves_behavior() {
        use kf_core::units::{k, pa};
        let model = FalloffModel::from(troe());
        let back = decode(&encode(&model)).unwrap();
        assert_eq!(
            model.rate_coefficient(k(650.0), pa(2e5)).unwrap(),
            back.rate_coefficient(k(650.0), pa(2e5)).unwrap()
        );
    }

    #[test]
    fn bad_magic_rejected() {
        let mut bytes = encode(&FalloffModel::from(third_body()));
        bytes[0] = b'X';
        assert!(matches!(
            decode(&bytes),
            Err(KineticsError::Wire { what }) if what.contains("magic")
        ));
    }

    #[test]
    fn unsupported_version_rejected() {
        let mut bytes = encode(&FalloffModel::from(third_body()));
        bytes[4] = 99;
        assert!(matches!(
            decode(&bytes),
            Err(KineticsError::Wire { what }) if what.contains("version")
        ));
    }

    #[test]
    fn unknown_tag_rejected() {
        let mut bytes = encode(&FalloffModel::from(third_body()));
        bytes[5] = 42;
        assert!(matches!(
            decode(&bytes),
            Err(KineticsError::Wire { what }) if what.contains("tag")
        ));
    }

    #[test]
    fn truncated_stream_rejected() {
        let bytes = encode(&FalloffModel::from(troe()));
        let truncated = &bytes[..bytes.len() - 5];
        assert!(matches!(
            decode(truncated),
            Err(KineticsError::Wire { .. })
        ));
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = encode(&FalloffModel::from(lindemann()));
        bytes.push(0);
        assert!(matches!(
            decode(&bytes),
            Err(KineticsError::Wire { what }) if what.contains("trailing")
        ));
    }

    #[test]
    fn corrupt_payload_fails_validation() {
        // Zero out T0 of the low-pressure expression (bytes 6..54 are the
        // Arrhenius block; T0 is its fourth field)
        let mut bytes = encode(&FalloffModel::from(third_body()));
        let t0_offset = 6 + 3 * 8;
        bytes[t0_offset..t0_offset + 8].copy_from_slice(&0.0_f64.to_le_bytes());
        assert!(matches!(
            decode(&bytes),
            Err(KineticsError::NonPhysical { .. })
        ));
    }
}
