use anyhow::Result;
use serde::Serialize;
use std::io::Write;

pub type EmitResult = Result<()>;

pub trait Emitter {
    type Item;

    fn emit<W: Write>(&self, item: &Self::Item, writer: &mut W) -> EmitResult;

    fn emit_to_string(&self, item: &Self::Item) -> Result<String> {
        let mut buffer = Vec::new();
        self.emit(item, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

pub struct EmitHelper;

impl EmitHelper {
    /// Writes `key -> {a, b, c}`.
    pub fn write_set_line<W, I, S>(writer: &mut W, key: &str, items: I) -> EmitResult
    where
        W: Write,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let items: Vec<S> = items.into_iter().collect();
        let joined: Vec<&str> = items.iter().map(AsRef::as_ref).collect();
        writeln!(writer, "{} -> {{{}}}", key, joined.join(", "))?;
        Ok(())
    }

    pub fn write_json<W: Write, T: Serialize>(writer: &mut W, value: &T) -> EmitResult {
        serde_json::to_writer_pretty(&mut *writer, value)?;
        writeln!(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_write_set_line() {
        let mut buffer = Vec::new();
        EmitHelper::write_set_line(&mut buffer, "bb1", ["entry.0", "bb2.1"]).unwrap();
        EmitHelper::write_set_line(&mut buffer, "bb2", Vec::<String>::new()).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "bb1 -> {entry.0, bb2.1}\nbb2 -> {}\n"
        );
    }

    #[test]
    fn test_write_json() {
        let mut buffer = Vec::new();
        let value = BTreeMap::from([("entry", vec!["entry"])]);
        EmitHelper::write_json(&mut buffer, &value).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed["entry"][0], "entry");
    }
}
