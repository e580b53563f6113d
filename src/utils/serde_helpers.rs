use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Int(i64),
    Bool(bool),
    Float(f64),
}

/// Deserialize any TOML scalar (`22555`, `"22555"`, `true`) into its string form,
/// so file values go through the same parsing as command line and env values.
pub fn opt_scalar_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Scalar>::deserialize(d)?;
    Ok(v.map(|s| match s {
        Scalar::Str(s) => s,
        Scalar::Int(i) => i.to_string(),
        Scalar::Bool(b) => b.to_string(),
        Scalar::Float(f) => f.to_string(),
    }))
}

/// Debug stand-in for an optional secret: shows whether it is set, never its value.
pub fn redacted(v: &Option<String>) -> Option<&'static str> {
    v.as_ref().map(|_| "<redacted>")
}
