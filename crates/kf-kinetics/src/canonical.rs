//! Canonical constructor text for falloff models.
//!
//! `to_canonical` renders a model as a constructor invocation whose
//! parameters reproduce the original exactly; `from_canonical` parses that
//! text back into an equal instance by recursive descent — no code is ever
//! executed. Floats are rendered with shortest round-trip formatting, so the
//! text form is lossless. Optional fields at their defaults are omitted.
//!
//! ```text
//! Troe(arrhenius_low=ArrheniusRate(a=2.62e21, n=-4.76, ea=10210, t0=1),
//!      arrhenius_high=ArrheniusRate(a=13900000000, n=-0.534, ea=2243, t0=1),
//!      alpha=0.783, t3=74, t1=2941, t2=6964,
//!      tmin=300, tmax=2000, pmin=1000, pmax=10000000,
//!      efficiencies={"CH4": 3, "CO2": 2}, comment="H + CH3 -> CH4")
//! ```

use crate::arrhenius::ArrheniusRate;
use crate::efficiency::EfficiencyTable;
use crate::error::{KineticsError, KineticsResult};
use crate::falloff::{
    FalloffModel, Lindemann, PressureDependentRate, RangePolicy, ThirdBody, Troe, Validity,
};
use std::fmt::Write as _;

/// Render a model as re-parseable constructor text.
pub fn to_canonical(model: &FalloffModel) -> String {
    let mut out = String::with_capacity(160);
    match model {
        FalloffModel::ThirdBody(m) => {
            out.push_str("ThirdBody(");
            write_arrhenius(&mut out, "arrhenius_low", m.arrhenius_low());
            write_common(&mut out, m.validity(), m.efficiencies(), m.comment());
            out.push(')');
        }
        FalloffModel::Lindemann(m) => {
            out.push_str("Lindemann(");
            write_arrhenius(&mut out, "arrhenius_low", m.arrhenius_low());
            out.push_str(", ");
            write_arrhenius(&mut out, "arrhenius_high", m.arrhenius_high());
            write_common(&mut out, m.validity(), m.efficiencies(), m.comment());
            out.push(')');
        }
        FalloffModel::Troe(m) => {
            out.push_str("Troe(");
            write_arrhenius(&mut out, "arrhenius_low", m.arrhenius_low());
            out.push_str(", ");
            write_arrhenius(&mut out, "arrhenius_high", m.arrhenius_high());
            let _ = write!(out, ", alpha={}", fmt_float(m.alpha()));
            let _ = write!(out, ", t3={}", fmt_float(m.t3().value));
            let _ = write!(out, ", t1={}", fmt_float(m.t1().value));
            if let Some(t2) = m.t2() {
                let _ = write!(out, ", t2={}", fmt_float(t2.value));
            }
            write_common(&mut out, m.validity(), m.efficiencies(), m.comment());
            out.push(')');
        }
    }
    out
}

/// Parse constructor text produced by [`to_canonical`].
pub fn from_canonical(text: &str) -> KineticsResult<FalloffModel> {
    let mut parser = Parser::new(text);
    let value = parser.value()?;
    parser.skip_ws();
    if !parser.at_end() {
        return Err(err("trailing input after constructor"));
    }
    let Value::Call(name, fields) = value else {
        return Err(err("expected a constructor invocation"));
    };
    build_model(&name, fields)
}

/// Shortest representation that parses back to the same f64; plain decimal
/// for human-scale magnitudes, exponent form outside.
fn fmt_float(v: f64) -> String {
    let magnitude = v.abs();
    if v != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        format!("{:e}", v)
    } else {
        format!("{}", v)
    }
}

fn write_arrhenius(out: &mut String, field: &str, rate: &ArrheniusRate) {
    let _ = write!(
        out,
        "{}=ArrheniusRate(a={}, n={}, ea={}, t0={})",
        field,
        fmt_float(rate.a()),
        fmt_float(rate.n()),
        fmt_float(rate.ea()),
        fmt_float(rate.t0()),
    );
}

fn write_common(out: &mut String, validity: &Validity, table: &EfficiencyTable, comment: &str) {
    if let Some(t) = validity.tmin() {
        let _ = write!(out, ", tmin={}", fmt_float(t.value));
    }
    if let Some(t) = validity.tmax() {
        let _ = write!(out, ", tmax={}", fmt_float(t.value));
    }
    if let Some(p) = validity.pmin() {
        let _ = write!(out, ", pmin={}", fmt_float(p.value));
    }
    if let Some(p) = validity.pmax() {
        let _ = write!(out, ", pmax={}", fmt_float(p.value));
    }
    match validity.policy() {
        RangePolicy::Extrapolate => {}
        RangePolicy::Warn => out.push_str(", range_policy=Warn"),
        RangePolicy::Reject => out.push_str(", range_policy=Reject"),
    }
    if !table.is_empty() {
        out.push_str(", efficiencies={");
        for (i, (species, factor)) in table.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "\"{}\": {}", species.key(), fmt_float(factor));
        }
        out.push('}');
    }
    if !comment.is_empty() {
        let _ = write!(out, ", comment=\"{}\"", escape(comment));
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

fn err(what: impl Into<String>) -> KineticsError {
    KineticsError::Canonical { what: what.into() }
}

/// Parsed right-hand side of a `field=value` pair.
#[derive(Debug)]
enum Value {
    Num(f64),
    Str(String),
    Dict(Vec<(String, f64)>),
    Call(String, Vec<(String, Value)>),
    Ident(String),
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src: src.as_bytes(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: u8) -> KineticsResult<()> {
        self.skip_ws();
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(err(format!(
                "expected '{}' at byte {}",
                expected as char, self.pos
            ))),
        }
    }

    fn eat(&mut self, wanted: u8) -> bool {
        self.skip_ws();
        if self.peek() == Some(wanted) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> KineticsResult<String> {
        self.skip_ws();
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'_') {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(err(format!("expected identifier at byte {}", start)));
        }
        Ok(std::str::from_utf8(&self.src[start..self.pos])
            .expect("identifier bytes are ASCII")
            .to_string())
    }

    fn number(&mut self) -> KineticsResult<f64> {
        self.skip_ws();
        let start = self.pos;
        let mut prev = 0u8;
        while let Some(c) = self.peek() {
            let numeric = c.is_ascii_digit()
                || c == b'.'
                || c == b'e'
                || c == b'E'
                || ((c == b'+' || c == b'-')
                    && (self.pos == start || prev == b'e' || prev == b'E'));
            if !numeric {
                break;
            }
            prev = c;
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).expect("numeric bytes");
        text.parse::<f64>()
            .map_err(|_| err(format!("invalid number '{}' at byte {}", text, start)))
    }

    fn string_lit(&mut self) -> KineticsResult<String> {
        self.expect(b'"')?;
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(err("unterminated string")),
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(out);
                }
                Some(b'\\') => {
                    self.pos += 1;
                    let escaped = self.peek().ok_or_else(|| err("unterminated escape"))?;
                    out.push(match escaped {
                        b'"' => '"',
                        b'\\' => '\\',
                        b'n' => '\n',
                        b'r' => '\r',
                        b't' => '\t',
                        other => {
                            return Err(err(format!("unknown escape '\\{}'", other as char)));
                        }
                    });
                    self.pos += 1;
                }
                Some(_) => {
                    // Consume one UTF-8 scalar, not one byte
                    let rest = std::str::from_utf8(&self.src[self.pos..])
                        .map_err(|_| err("invalid UTF-8"))?;
                    let c = rest.chars().next().expect("non-empty");
                    out.push(c);
                    self.pos += c.len_utf8();
                }
            }
        }
    }

    fn dict(&mut self) -> KineticsResult<Vec<(String, f64)>> {
        self.expect(b'{')?;
        let mut entries = Vec::new();
        if self.eat(b'}') {
            return Ok(entries);
        }
        loop {
            let key = self.string_lit()?;
            self.expect(b':')?;
            let value = self.number()?;
            entries.push((key, value));
            if self.eat(b'}') {
                return Ok(entries);
            }
            self.expect(b',')?;
        }
    }

    fn fields(&mut self) -> KineticsResult<Vec<(String, Value)>> {
        self.expect(b'(')?;
        let mut fields = Vec::new();
        if self.eat(b')') {
            return Ok(fields);
        }
        loop {
            let name = self.ident()?;
            self.expect(b'=')?;
            let value = self.value()?;
            fields.push((name, value));
            if self.eat(b')') {
                return Ok(fields);
            }
            self.expect(b',')?;
        }
    }

    fn value(&mut self) -> KineticsResult<Value> {
        self.skip_ws();
        match self.peek() {
            Some(b'"') => Ok(Value::Str(self.string_lit()?)),
            Some(b'{') => Ok(Value::Dict(self.dict()?)),
            Some(c) if c.is_ascii_digit() || c == b'-' || c == b'+' || c == b'.' => {
                Ok(Value::Num(self.number()?))
            }
            Some(c) if c.is_ascii_alphabetic() || c == b'_' => {
                let name = self.ident()?;
                self.skip_ws();
                if self.peek() == Some(b'(') {
                    Ok(Value::Call(name, self.fields()?))
                } else {
                    Ok(Value::Ident(name))
                }
            }
            _ => Err(err(format!("unexpected input at byte {}", self.pos))),
        }
    }
}

/// Ordered field list with take-by-name access; leftover fields are errors.
struct FieldMap {
    fields: Vec<(String, Value)>,
}

impl FieldMap {
    fn new(fields: Vec<(String, Value)>) -> Self {
        Self { fields }
    }

    fn take(&mut self, name: &str) -> Option<Value> {
        let index = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(index).1)
    }

    fn take_num(&mut self, name: &str) -> KineticsResult<Option<f64>> {
        match self.take(name) {
            None => Ok(None),
            Some(Value::Num(v)) => Ok(Some(v)),
            Some(_) => Err(err(format!("field '{}' must be a number", name))),
        }
    }

    fn require_num(&mut self, name: &str) -> KineticsResult<f64> {
        self.take_num(name)?
            .ok_or_else(|| err(format!("missing field '{}'", name)))
    }

    fn finish(self, context: &str) -> KineticsResult<()> {
        if let Some((name, _)) = self.fields.first() {
            return Err(err(format!("unknown field '{}' in {}", name, context)));
        }
        Ok(())
    }
}

fn build_arrhenius(value: Value, field: &str) -> KineticsResult<ArrheniusRate> {
    let Value::Call(name, fields) = value else {
        return Err(err(format!("field '{}' must be an ArrheniusRate(...)", field)));
    };
    if name != "ArrheniusRate" {
        return Err(err(format!("unexpected constructor '{}' for '{}'", name, field)));
    }
    let mut map = FieldMap::new(fields);
    let a = map.require_num("a")?;
    let n = map.require_num("n")?;
    let ea = map.require_num("ea")?;
    let t0 = map.require_num("t0")?;
    map.finish("ArrheniusRate")?;
    ArrheniusRate::from_si(a, n, ea, t0)
}

fn build_common(map: &mut FieldMap) -> KineticsResult<(Validity, EfficiencyTable, String)> {
    let tmin = map.take_num("tmin")?;
    let tmax = map.take_num("tmax")?;
    let pmin = map.take_num("pmin")?;
    let pmax = map.take_num("pmax")?;

    let policy = match map.take("range_policy") {
        None => RangePolicy::Extrapolate,
        Some(Value::Ident(name)) => match name.as_str() {
            "Extrapolate" => RangePolicy::Extrapolate,
            "Warn" => RangePolicy::Warn,
            "Reject" => RangePolicy::Reject,
            other => return Err(err(format!("unknown range policy '{}'", other))),
        },
        Some(_) => return Err(err("field 'range_policy' must be a policy name")),
    };

    let efficiencies = match map.take("efficiencies") {
        None => EfficiencyTable::empty(),
        Some(Value::Dict(entries)) => {
            let notation: Vec<(&str, f64)> = entries
                .iter()
                .map(|(key, factor)| (key.as_str(), *factor))
                .collect();
            EfficiencyTable::from_notation(&notation)?
        }
        Some(_) => return Err(err("field 'efficiencies' must be a {\"key\": value} table")),
    };

    let comment = match map.take("comment") {
        None => String::new(),
        Some(Value::Str(s)) => s,
        Some(_) => return Err(err("field 'comment' must be a string")),
    };

    let validity = Validity::from_si(tmin, tmax, pmin, pmax, policy)?;
    Ok((validity, efficiencies, comment))
}

fn build_model(name: &str, fields: Vec<(String, Value)>) -> KineticsResult<FalloffModel> {
    let mut map = FieldMap::new(fields);
    match name {
        "ThirdBody" => {
            let low = map
                .take("arrhenius_low")
                .ok_or_else(|| err("missing field 'arrhenius_low'"))?;
            let arrhenius_low = build_arrhenius(low, "arrhenius_low")?;
            let (validity, efficiencies, comment) = build_common(&mut map)?;
            map.finish("ThirdBody")?;
            Ok(FalloffModel::ThirdBody(ThirdBody::from_parts(
                arrhenius_low,
                validity,
                efficiencies,
                comment,
            )))
        }
        "Lindemann" => {
            let low = map
                .take("arrhenius_low")
                .ok_or_else(|| err("missing field 'arrhenius_low'"))?;
            let high = map
                .take("arrhenius_high")
                .ok_or_else(|| err("missing field 'arrhenius_high'"))?;
            let arrhenius_low = build_arrhenius(low, "arrhenius_low")?;
            let arrhenius_high = build_arrhenius(high, "arrhenius_high")?;
            let (validity, efficiencies, comment) = build_common(&mut map)?;
            map.finish("Lindemann")?;
            Ok(FalloffModel::Lindemann(Lindemann::from_parts(
                arrhenius_low,
                arrhenius_high,
                validity,
                efficiencies,
                comment,
            )))
        }
        "Troe" => {
            let low = map
                .take("arrhenius_low")
                .ok_or_else(|| err("missing field 'arrhenius_low'"))?;
            let high = map
                .take("arrhenius_high")
                .ok_or_else(|| err("missing field 'arrhenius_high'"))?;
            let arrhenius_low = build_arrhenius(low, "arrhenius_low")?;
            let arrhenius_high = build_arrhenius(high, "arrhenius_high")?;
            let alpha = map.require_num("alpha")?;
            let t3 = map.require_num("t3")?;
            let t1 = map.require_num("t1")?;
            let t2 = map.take_num("t2")?;
            let (validity, efficiencies, comment) = build_common(&mut map)?;
            map.finish("Troe")?;
            Ok(FalloffModel::Troe(Troe::from_parts(
                arrhenius_low,
                arrhenius_high,
                alpha,
                t3,
                t1,
                t2,
                validity,
                efficiencies,
                comment,
            )?))
        }
        other => Err(err(format!("unknown model constructor '{}'", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::falloff::tests::{lindemann, third_body, troe};
    use kf_core::numeric::Tolerances;

    #[test]
    fn third_body_roundtrip() {
        let model = FalloffModel::from(third_body());
        let text = to_canonical(&model);
        let back = from_canonical(&text).unwrap();
        assert_eq!(model, back);
        assert!(model.is_identical_to(&back, Tolerances::default()));
    }

    #[test]
    fn lindemann_roundtrip() {
        let model = FalloffModel::from(lindemann());
        let back = from_canonical(&to_canonical(&model)).unwrap();
        assert_eq!(model, back);
    }

    #[test]
    fn troe_roundtrip() {
        let model = FalloffModel::from(troe());
        let text = to_canonical(&model);
        let back = from_canonical(&text).unwrap();
        assert_eq!(model, back);
    }

    #[test]
    fn rendered_text_shape() {
        let text = to_canonical(&FalloffModel::from(troe()));
        assert!(text.starts_with("Troe(arrhenius_low=ArrheniusRate("));
        assert!(text.contains("alpha=0.783"));
        assert!(text.contains("t2=6964"));
        assert!(text.contains("tmin=300"));
        assert!(text.contains("\"CH4\": 3"));
        assert!(text.contains("comment=\"H + CH3 -> CH4\""));
        // Default policy is omitted
        assert!(!text.contains("range_policy"));
    }

    #[test]
    fn absent_options_are_omitted_and_restored() {
        let model = FalloffModel::ThirdBody(
            ThirdBody::new(
                ArrheniusRate::from_si(2.62e21, -4.76, 10_210.0, 1.0).unwrap(),
                crate::falloff::FalloffOptions::default(),
            )
            .unwrap(),
        );
        let text = to_canonical(&model);
        assert!(!text.contains("tmin"));
        assert!(!text.contains("efficiencies"));
        assert!(!text.contains("comment"));
        let back = from_canonical(&text).unwrap();
        assert_eq!(model, back);
    }

    #[test]
    fn comment_escaping_roundtrips() {
        let options = crate::falloff::FalloffOptions {
            comment: "line one\nline \"two\" \\ tab\t".to_string(),
            ..Default::default()
        };
        let model = FalloffModel::ThirdBody(
            ThirdBody::new(
                ArrheniusRate::from_si(1.0e20, 0.0, 0.0, 1.0).unwrap(),
                options,
            )
            .unwrap(),
        );
        let back = from_canonical(&to_canonical(&model)).unwrap();
        assert_eq!(model, back);
    }

    #[test]
    fn non_default_policy_roundtrips() {
        let options = crate::falloff::FalloffOptions {
            tmin: Some((300.0, "K")),
            tmax: Some((2000.0, "K")),
            range_policy: RangePolicy::Reject,
            ..Default::default()
        };
        let model = FalloffModel::ThirdBody(
            ThirdBody::new(
                ArrheniusRate::from_si(1.0e20, 0.0, 0.0, 1.0).unwrap(),
                options,
            )
            .unwrap(),
        );
        let text = to_canonical(&model);
        assert!(text.contains("range_policy=Reject"));
        let back = from_canonical(&text).unwrap();
        assert_eq!(model, back);
    }

    #[test]
    fn whitespace_is_insignificant() {
        let text = "ThirdBody( arrhenius_low = ArrheniusRate( a = 1e20 , n = 0 , ea = 0 , t0 = 1 ) )";
        let model = from_canonical(text).unwrap();
        match model {
            FalloffModel::ThirdBody(m) => assert_eq!(m.arrhenius_low().a(), 1e20),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn unknown_constructor_rejected() {
        assert!(matches!(
            from_canonical("Chebyshev(a=1)"),
            Err(KineticsError::Canonical { what }) if what.contains("Chebyshev")
        ));
    }

    #[test]
    fn unknown_field_rejected() {
        let text = "ThirdBody(arrhenius_low=ArrheniusRate(a=1e20, n=0, ea=0, t0=1), wobble=3)";
        assert!(matches!(
            from_canonical(text),
            Err(KineticsError::Canonical { what }) if what.contains("wobble")
        ));
    }

    #[test]
    fn missing_required_field_rejected() {
        let text = "Troe(arrhenius_low=ArrheniusRate(a=1e20, n=0, ea=0, t0=1), \
                    arrhenius_high=ArrheniusRate(a=1e10, n=0, ea=0, t0=1), alpha=0.7, t3=74)";
        assert!(matches!(
            from_canonical(text),
            Err(KineticsError::Canonical { what }) if what.contains("t1")
        ));
    }

    #[test]
    fn trailing_garbage_rejected() {
        let mut text = to_canonical(&FalloffModel::from(third_body()));
        text.push_str(" extra");
        assert!(from_canonical(&text).is_err());
    }

    #[test]
    fn parsed_values_are_validated() {
        // Parses fine, but T0 = 0 violates the Arrhenius invariant
        let text = "ThirdBody(arrhenius_low=ArrheniusRate(a=1e20, n=0, ea=0, t0=0))";
        assert!(matches!(
            from_canonical(text),
            Err(KineticsError::NonPhysical { .. })
        ));
    }

    #[test]
    fn float_formatting_roundtrips_extremes() {
        for v in [2.62e21, -4.76, 1e-300, 6.02214076e23, 0.0, 123456.789] {
            let text = fmt_float(v);
            let back: f64 = text.parse().unwrap();
            assert_eq!(v, back, "text was '{}'", text);
        }
    }
}
