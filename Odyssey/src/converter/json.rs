//! JSON export of decoded assets

use std::path::Path;

use serde::Serialize;

use crate::error::Result;

/// Pretty-printed JSON for any decoded asset (model, walkmesh, GFF tree,
/// path graph or texture info).
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Write [`to_json`] output to a file
pub fn write_json<T: Serialize + ?Sized, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    std::fs::write(path, to_json(value)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::gff::{GffStruct, GffValue};
    use crate::formats::mdl::{Model, NodeKind};

    #[test]
    fn test_model_json_tags_node_kind() {
        let json = to_json(&Model::new("root")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["root"]["name"], "root");
        assert_eq!(value["root"]["kind"]["type"], "Dummy");
        assert_eq!(value["classification"], "Other");

        let back: Model = serde_json::from_str(&json).unwrap();
        assert!(matches!(back.root.kind, NodeKind::Dummy));
    }

    #[test]
    fn test_gff_json_keeps_field_order() {
        let root = GffStruct::root()
            .with("Z", GffValue::Dword(1))
            .with("A", GffValue::Float(0.5));
        let json = to_json(&root).unwrap();
        assert!(json.find("\"Z\"").unwrap() < json.find("\"A\"").unwrap());
    }
}
