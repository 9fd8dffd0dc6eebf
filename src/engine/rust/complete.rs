//! Completion candidates at a cursor.
//!
//! The text before the cursor decides the candidate set: after `path::` the
//! members of that type or module, after `expr.` the fields and methods of
//! the receiver's type, and otherwise everything in scope plus keywords.
//! The receiver of `.` is read from text rather than the tree, since the
//! buffer is usually mid-edit and does not parse there.

use indexmap::IndexMap;
use lsp_types::CompletionItemKind;

use crate::engine::{CompletionCandidate, SymbolDescriptor, SymbolKind, TypeKind, TypeRef};

use super::index::type_base;
use super::model::{Prefer, RustModel};

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while",
];

/// One link of a textual receiver chain such as `a.b().c`.
#[derive(Debug, PartialEq)]
struct Segment<'a> {
    name: &'a str,
    call: bool,
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

pub fn category(symbol: &SymbolDescriptor) -> CompletionItemKind {
    match &symbol.kind {
        SymbolKind::Method if symbol.receiver.is_some() || symbol.container.is_some() => {
            CompletionItemKind::METHOD
        }
        SymbolKind::Method => CompletionItemKind::FUNCTION,
        SymbolKind::Local | SymbolKind::Parameter => CompletionItemKind::VARIABLE,
        SymbolKind::Field => CompletionItemKind::FIELD,
        SymbolKind::Property => CompletionItemKind::PROPERTY,
        SymbolKind::NamedType(TypeKind::Struct | TypeKind::Union) => CompletionItemKind::STRUCT,
        SymbolKind::NamedType(TypeKind::Enum) => CompletionItemKind::ENUM,
        SymbolKind::NamedType(TypeKind::Trait) => CompletionItemKind::INTERFACE,
        SymbolKind::NamedType(TypeKind::Alias) => CompletionItemKind::CLASS,
        SymbolKind::Other("") => CompletionItemKind::ENUM_MEMBER,
        SymbolKind::Other("const" | "static") => CompletionItemKind::CONSTANT,
        SymbolKind::Other("mod") => CompletionItemKind::MODULE,
        SymbolKind::Other(_) => CompletionItemKind::TEXT,
    }
}

/// Parse the receiver chain ending right before byte `end` (exclusive).
fn receiver_chain(text: &str, end: usize) -> Vec<Segment<'_>> {
    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    let mut i = end;
    loop {
        let mut call = false;
        if i > 0 && bytes[i - 1] == b')' {
            // Skip a balanced argument list.
            let mut depth = 0usize;
            while i > 0 {
                i -= 1;
                match bytes[i] {
                    b')' => depth += 1,
                    b'(' => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
            }
            if depth != 0 {
                return Vec::new();
            }
            call = true;
        }
        let name_end = i;
        while i > 0 && is_ident_byte(bytes[i - 1]) {
            i -= 1;
        }
        if i == name_end {
            return Vec::new();
        }
        segments.push(Segment {
            name: &text[i..name_end],
            call,
        });
        if i > 0 && bytes[i - 1] == b'.' {
            i -= 1;
        } else {
            break;
        }
    }
    segments.reverse();
    segments
}

impl RustModel {
    pub(super) fn complete(&self, offset: usize) -> Vec<CompletionCandidate> {
        let text = &*self.source;
        let mut offset = offset.min(text.len());
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }
        let bytes = text.as_bytes();
        let mut word_start = offset;
        while word_start > 0 && is_ident_byte(bytes[word_start - 1]) {
            word_start -= 1;
        }
        let before = &text[..word_start];

        let symbols: Vec<SymbolDescriptor> = if let Some(path) = before.strip_suffix("::") {
            self.path_members(path, word_start)
        } else if before.ends_with('.') && !before.ends_with("..") {
            self.receiver_members(text, word_start - 1, offset)
        } else {
            return self.scope_candidates(offset);
        };
        finish(symbols.iter().map(candidate).collect())
    }

    fn path_members(&self, path: &str, offset: usize) -> Vec<SymbolDescriptor> {
        let bytes = path.as_bytes();
        let mut start = path.len();
        while start > 0 && is_ident_byte(bytes[start - 1]) {
            start -= 1;
        }
        let name = &path[start..];
        let container = if name == "Self" {
            self.self_type_at(offset)
        } else {
            let known = self.resolve_type_name(name, offset).is_some()
                || self.members(name).next().is_some();
            known.then(|| name.to_string())
        };
        let Some(container) = container else {
            return Vec::new();
        };
        self.members(&container)
            .filter_map(|id| self.symbol_ref(id))
            .map(|s| s.desc.clone())
            .collect()
    }

    fn receiver_members(&self, text: &str, dot: usize, offset: usize) -> Vec<SymbolDescriptor> {
        let chain = receiver_chain(text, dot);
        let Some(ty) = self.chain_type(&chain, offset) else {
            return Vec::new();
        };
        self.members(&type_base(ty.as_str()))
            .filter_map(|id| self.symbol_ref(id))
            .filter(|s| match s.desc.kind {
                SymbolKind::Method => s.desc.receiver.is_some(),
                SymbolKind::Field | SymbolKind::Property => true,
                _ => false,
            })
            .map(|s| s.desc.clone())
            .collect()
    }

    fn chain_type(&self, chain: &[Segment<'_>], offset: usize) -> Option<TypeRef> {
        let (first, rest) = chain.split_first()?;
        let id = self.resolve_name(first.name, offset)?;
        let mut ty = if first.call {
            self.return_type(id)?
        } else {
            self.symbol_type(id, 0)?
        };
        for segment in rest {
            let prefer = if segment.call { Prefer::Method } else { Prefer::Field };
            let member = self.member_named(&type_base(ty.as_str()), segment.name, prefer)?;
            ty = if segment.call {
                self.return_type(member)?
            } else {
                self.symbol_type(member, 0)?
            };
        }
        Some(ty)
    }

    fn scope_candidates(&self, offset: usize) -> Vec<CompletionCandidate> {
        let mut locals: Vec<_> = self.visible_locals(offset).collect();
        // Innermost declarations first so they win the dedupe.
        locals.sort_by_key(|s| std::cmp::Reverse(s.scope.map(|sc| sc.start).unwrap_or(0)));

        let mut candidates: Vec<CompletionCandidate> =
            locals.iter().map(|s| candidate(&s.desc)).collect();
        let globals = self
            .table
            .all_globals()
            .chain(self.library.table.all_globals())
            .filter_map(|id| self.symbol_ref(id));
        candidates.extend(globals.map(|s| candidate(&s.desc)));
        candidates.extend(KEYWORDS.iter().map(|k| CompletionCandidate {
            label: (*k).to_string(),
            category: CompletionItemKind::KEYWORD,
            symbol: None,
        }));
        finish(candidates)
    }
}

fn candidate(symbol: &SymbolDescriptor) -> CompletionCandidate {
    CompletionCandidate {
        label: symbol.name.clone(),
        category: category(symbol),
        symbol: Some(symbol.id),
    }
}

/// First candidate per label, ordered by label ignoring case.
fn finish(candidates: Vec<CompletionCandidate>) -> Vec<CompletionCandidate> {
    let mut unique: IndexMap<String, CompletionCandidate> = IndexMap::new();
    for c in candidates {
        if !c.label.is_empty() {
            unique.entry(c.label.clone()).or_insert(c);
        }
    }
    let mut out: Vec<_> = unique.into_values().collect();
    out.sort_by_key(|c| c.label.to_lowercase());
    out
}

#[cfg(test)]
mod tests {
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::engine::rust::model::tests::compile;

    fn labels(source: &str) -> Vec<(String, CompletionItemKind)> {
        let c = compile(&source.replace('|', ""));
        let offset = source.find('|').unwrap();
        c.model
            .completions(offset, &CancellationToken::new())
            .unwrap()
            .into_iter()
            .map(|c| (c.label, c.category))
            .collect()
    }

    #[test]
    fn receiver_chain_parsing() {
        let text = "a.b(x, (y)).c.";
        let chain = receiver_chain(text, text.len() - 1);
        assert_eq!(
            chain,
            vec![
                Segment { name: "a", call: false },
                Segment { name: "b", call: true },
                Segment { name: "c", call: false },
            ]
        );
        assert!(receiver_chain("(x).", 3).is_empty());
    }

    #[test]
    fn members_after_dot() {
        let source = "struct P { x: i32 }\nimpl P {\n    fn len(&self) -> usize { 0 }\n    fn make() -> P { P { x: 0 } }\n}\nfn main() {\n    let p = P { x: 1 };\n    p.|\n}\n";
        let got = labels(source);
        assert_eq!(
            got,
            vec![
                ("len".to_string(), CompletionItemKind::METHOD),
                ("x".to_string(), CompletionItemKind::FIELD),
            ]
        );
    }

    #[test]
    fn members_after_path() {
        let source = "enum Color { Red, Green }\nfn main() {\n    let c = Color::|;\n}\n";
        let got = labels(source);
        assert_eq!(
            got,
            vec![
                ("Green".to_string(), CompletionItemKind::ENUM_MEMBER),
                ("Red".to_string(), CompletionItemKind::ENUM_MEMBER),
            ]
        );
    }

    #[test]
    fn scope_includes_locals_items_and_keywords() {
        let source = "fn helper() {}\nfn main() {\n    let total = 1;\n    |\n}\n";
        let got = labels(source);
        assert!(got.contains(&("total".to_string(), CompletionItemKind::VARIABLE)));
        assert!(got.contains(&("helper".to_string(), CompletionItemKind::FUNCTION)));
        assert!(got.contains(&("while".to_string(), CompletionItemKind::KEYWORD)));
        assert!(got.contains(&("String".to_string(), CompletionItemKind::STRUCT)));
        let lower: Vec<String> = got.iter().map(|(l, _)| l.to_lowercase()).collect();
        let mut sorted = lower.clone();
        sorted.sort();
        assert_eq!(lower, sorted);
    }

    #[test]
    fn prelude_methods_after_dot() {
        let source = "fn main() {\n    let v: Vec<i32> = Vec::new();\n    v.|\n}\n";
        let got = labels(source);
        assert!(got.contains(&("push".to_string(), CompletionItemKind::METHOD)));
        assert!(!got.iter().any(|(l, _)| l == "new"), "no associated fns after `.`");
    }
}
