//! Go-to-definition.

use tokio_util::sync::CancellationToken;

use crate::api::{DefinitionLocation, GoToDefinitionResult};
use crate::document::DocumentSnapshot;
use crate::engine::{check_cancelled, EngineResult};

/// Document id reported for locations in the request buffer.
pub const SOURCE_URI: &str = "MyFile.rs";

/// Declaration sites of the symbol at `offset`, in the request buffer only.
pub fn definition(
    doc: &DocumentSnapshot,
    offset: usize,
    cancel: &CancellationToken,
) -> EngineResult<Option<GoToDefinitionResult>> {
    check_cancelled(cancel)?;
    let model = doc.model();
    let Some(symbol) = model.symbol_at(offset) else {
        return Ok(None);
    };
    let declaration = model.find_declaration(&symbol).unwrap_or(symbol);

    let definitions = declaration
        .source_locations()
        .map(|location| {
            let (offset_from, offset_to) = doc.utf16_range(location.span);
            DefinitionLocation {
                uri: SOURCE_URI.to_string(),
                offset_from,
                offset_to,
            }
        })
        .collect();
    Ok(Some(GoToDefinitionResult {
        uri: None,
        definitions,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::tests::snapshot;

    fn at(source: &str, needle: &str) -> usize {
        source.find(needle).unwrap()
    }

    #[test]
    fn use_site_jumps_to_declaration() {
        let source = "fn helper() {}\nfn main() {\n    helper();\n}\n";
        let doc = snapshot(source);
        let result = definition(&doc, at(source, "helper()"), &CancellationToken::new())
            .unwrap()
            .unwrap();
        assert_eq!(result.uri, None);
        assert_eq!(result.definitions.len(), 1);
        let def = &result.definitions[0];
        assert_eq!(def.uri, SOURCE_URI);
        assert_eq!((def.offset_from, def.offset_to), (3, 9));
    }

    #[test]
    fn locals_resolve_to_their_binding() {
        let source = "fn main() {\n    let count = 1;\n    let next = count + 1;\n}\n";
        let doc = snapshot(source);
        let result = definition(&doc, at(source, "count +"), &CancellationToken::new())
            .unwrap()
            .unwrap();
        let start = at(source, "count =");
        assert_eq!(result.definitions[0].offset_from, start);
        assert_eq!(result.definitions[0].offset_to, start + 5);
    }

    #[test]
    fn library_symbols_have_no_source_locations() {
        let source = "fn main() {\n    let v: Vec<i32> = Vec::new();\n}\n";
        let doc = snapshot(source);
        let result = definition(&doc, at(source, "new()"), &CancellationToken::new())
            .unwrap()
            .unwrap();
        assert!(result.definitions.is_empty());
    }

    #[test]
    fn nothing_at_whitespace() {
        let source = "fn main() {\n\n}\n";
        let doc = snapshot(source);
        assert!(definition(&doc, 12, &CancellationToken::new()).unwrap().is_none());
    }
}
