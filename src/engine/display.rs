//! Rendering symbols as declarations and signature labels.
//!
//! One render function per [`SymbolKind`] variant plus a fallback.

use std::fmt::Write;

use super::symbols::{Accessibility, SymbolDescriptor, SymbolKind, TypeKind};

/// Declaration text for hover. `None` for symbols with nothing to show.
pub fn render_declaration(symbol: &SymbolDescriptor) -> Option<String> {
    if symbol.name.is_empty() {
        return None;
    }
    let text = match &symbol.kind {
        SymbolKind::Method => render_method(symbol),
        SymbolKind::Local => render_local(symbol),
        SymbolKind::Field => render_member("field", symbol),
        SymbolKind::Property => render_member("property", symbol),
        SymbolKind::NamedType(kind) => render_type(*kind, symbol),
        SymbolKind::Parameter => render_parameter(symbol),
        SymbolKind::Other(keyword) => render_other(keyword, symbol),
    };
    Some(text)
}

/// Minimally qualified signature label: `Container::name(a: T) -> R`.
/// The receiver is not part of the label.
pub fn signature_label(symbol: &SymbolDescriptor) -> String {
    let mut out = qualified_name(symbol, "::");
    out.push_str(&generics(&symbol.type_parameters));
    out.push('(');
    let params: Vec<String> = symbol
        .parameters
        .iter()
        .map(|p| parameter_label(&p.name, p.ty.as_ref().map(|t| t.as_str())))
        .collect();
    out.push_str(&params.join(", "));
    out.push(')');
    if let Some(ret) = &symbol.return_type {
        let _ = write!(out, " -> {ret}");
    }
    out
}

pub fn parameter_label(name: &str, ty: Option<&str>) -> String {
    match ty {
        Some(ty) => format!("{name}: {ty}"),
        None => name.to_string(),
    }
}

pub fn visibility(access: &Accessibility) -> String {
    match access {
        Accessibility::Public => "pub ".to_string(),
        Accessibility::Internal => "pub(crate) ".to_string(),
        Accessibility::Restricted(path) => format!("pub({path}) "),
        Accessibility::Private => String::new(),
    }
}

fn qualified_name(symbol: &SymbolDescriptor, sep: &str) -> String {
    match &symbol.container {
        Some(container) => format!("{container}{sep}{}", symbol.name),
        None => symbol.name.clone(),
    }
}

fn generics(params: &[String]) -> String {
    if params.is_empty() {
        String::new()
    } else {
        format!("<{}>", params.join(", "))
    }
}

fn render_method(symbol: &SymbolDescriptor) -> String {
    let m = &symbol.modifiers;
    let mut out = visibility(&symbol.accessibility);
    if m.is_const {
        out.push_str("const ");
    }
    if m.is_async {
        out.push_str("async ");
    }
    if m.is_unsafe {
        out.push_str("unsafe ");
    }
    out.push_str("fn ");
    out.push_str(&qualified_name(symbol, "::"));
    out.push_str(&generics(&symbol.type_parameters));
    out.push('(');
    let mut params: Vec<String> = symbol.receiver.iter().cloned().collect();
    params.extend(
        symbol
            .parameters
            .iter()
            .map(|p| parameter_label(&p.name, p.ty.as_ref().map(|t| t.as_str()))),
    );
    out.push_str(&params.join(", "));
    out.push(')');
    if let Some(ret) = &symbol.return_type {
        let _ = write!(out, " -> {ret}");
    }
    out
}

fn render_local(symbol: &SymbolDescriptor) -> String {
    let mut out = String::from("let ");
    if !symbol.modifiers.is_readonly {
        out.push_str("mut ");
    }
    out.push_str(&symbol.name);
    if let Some(ty) = &symbol.ty {
        let _ = write!(out, ": {ty}");
    }
    out
}

fn render_member(label: &str, symbol: &SymbolDescriptor) -> String {
    let mut out = format!("({label}) {}", visibility(&symbol.accessibility));
    out.push_str(&qualified_name(symbol, "."));
    if let Some(ty) = &symbol.ty {
        let _ = write!(out, ": {ty}");
    }
    out
}

fn render_type(kind: TypeKind, symbol: &SymbolDescriptor) -> String {
    let keyword = match kind {
        TypeKind::Struct => "struct",
        TypeKind::Enum => "enum",
        TypeKind::Trait => "trait",
        TypeKind::Union => "union",
        TypeKind::Alias => "type",
    };
    let mut out = format!(
        "{}{keyword} {}{}",
        visibility(&symbol.accessibility),
        qualified_name(symbol, "::"),
        generics(&symbol.type_parameters)
    );
    if let (TypeKind::Alias, Some(target)) = (kind, &symbol.ty) {
        let _ = write!(out, " = {target}");
    }
    out
}

fn render_parameter(symbol: &SymbolDescriptor) -> String {
    format!(
        "(parameter) {}",
        parameter_label(&symbol.name, symbol.ty.as_ref().map(|t| t.as_str()))
    )
}

fn render_other(keyword: &str, symbol: &SymbolDescriptor) -> String {
    let mut out = visibility(&symbol.accessibility);
    if !keyword.is_empty() {
        out.push_str(keyword);
        out.push(' ');
    }
    out.push_str(&qualified_name(symbol, "::"));
    if let Some(ty) = &symbol.ty {
        let _ = write!(out, ": {ty}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::symbols::{Modifiers, ParameterInfo, SymbolId, TypeRef};

    fn method() -> SymbolDescriptor {
        SymbolDescriptor {
            id: SymbolId(1),
            name: "dist".into(),
            kind: SymbolKind::Method,
            accessibility: Accessibility::Public,
            modifiers: Modifiers::default(),
            ty: None,
            container: Some("Point".into()),
            type_parameters: vec![],
            receiver: Some("&self".into()),
            parameters: vec![ParameterInfo {
                name: "other".into(),
                ty: Some(TypeRef::new("&Point")),
                default_value: None,
            }],
            return_type: Some(TypeRef::new("f64")),
            locations: vec![],
        }
    }

    #[test]
    fn method_declaration_includes_receiver() {
        let text = render_declaration(&method()).unwrap();
        assert_eq!(text, "pub fn Point::dist(&self, other: &Point) -> f64");
    }

    #[test]
    fn signature_label_omits_receiver() {
        assert_eq!(signature_label(&method()), "Point::dist(other: &Point) -> f64");
    }

    #[test]
    fn locals_show_mutability() {
        let mut sym = method();
        sym.kind = SymbolKind::Local;
        sym.name = "count".into();
        sym.ty = Some(TypeRef::new("i32"));
        assert_eq!(render_declaration(&sym).unwrap(), "let mut count: i32");
        sym.modifiers.is_readonly = true;
        assert_eq!(render_declaration(&sym).unwrap(), "let count: i32");
    }

    #[test]
    fn types_render_with_keyword() {
        let mut sym = method();
        sym.kind = SymbolKind::NamedType(TypeKind::Struct);
        sym.name = "Point".into();
        sym.container = None;
        sym.type_parameters = vec!["T".into()];
        assert_eq!(render_declaration(&sym).unwrap(), "pub struct Point<T>");
    }

    #[test]
    fn nameless_symbols_render_nothing() {
        let mut sym = method();
        sym.name.clear();
        assert!(render_declaration(&sym).is_none());
    }
}
