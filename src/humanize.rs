//! Display names for .NET type names.
//!
//! Audit records carry assembly qualified names such as
//! ``Shop.Messages.Envelope`1[[Shop.Messages.OrderPlaced, Shop.Messages]], Shop.Messages``.
//! Diagrams show `Envelope<OrderPlaced>`.

/// Humanize an assembly qualified type name.
///
/// Drops the assembly qualification, namespace and declaring types, strips
/// generic arity markers and renders generic arguments as `<A, B>`. Array
/// ranks are kept: `System.String[], mscorlib` becomes `String[]`.
pub fn type_name(qualified: &str) -> String {
    let qualified = qualified.trim();
    let head_end = qualified
        .find(|c: char| c == '[' || c == ',')
        .unwrap_or(qualified.len());
    let mut name = short_name(&qualified[..head_end]).to_string();

    let mut rest = &qualified[head_end..];
    if rest.starts_with("[[") {
        if let Some(inner) = outer_group(rest) {
            let args: Vec<String> = bracket_groups(inner).into_iter().map(type_name).collect();
            if !args.is_empty() {
                name.push('<');
                name.push_str(&args.join(", "));
                name.push('>');
            }
            rest = &rest[inner.len() + 2..];
        }
    }
    name.push_str(&array_suffix(rest));

    name
}

/// Leading array rank groups such as `[]`, `[,]` or `[][]`.
fn array_suffix(mut rest: &str) -> String {
    let mut suffix = String::new();
    while rest.starts_with('[') {
        let close = match rest.find(']') {
            Some(close) => close,
            None => break,
        };
        if !rest[1..close].chars().all(|c| c == ',') {
            break;
        }
        suffix.push_str(&rest[..=close]);
        rest = &rest[close + 1..];
    }
    suffix
}

/// `Ns.Outer+Inner`1` -> `Inner`
fn short_name(full: &str) -> &str {
    let after_dot = full.rsplit('.').next().unwrap_or(full);
    let after_plus = after_dot.rsplit('+').next().unwrap_or(after_dot);
    match after_plus.find('`') {
        Some(tick) => &after_plus[..tick],
        None => after_plus,
    }
}

/// Content of the bracket group opening at the start of `s`.
fn outer_group(s: &str) -> Option<&str> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&s[1..i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Contents of the top-level `[...]` groups in `s`.
fn bracket_groups(s: &str) -> Vec<&str> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '[' => {
                if depth == 0 {
                    start = i + 1;
                }
                depth += 1;
            }
            ']' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    groups.push(&s[start..i]);
                }
            }
            _ => {}
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_names() {
        assert_eq!(type_name("Shop.Messages.OrderPlaced, Shop.Messages"), "OrderPlaced");
        assert_eq!(
            type_name("Shop.Messages.OrderPlaced, Shop.Messages, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null"),
            "OrderPlaced"
        );
        assert_eq!(type_name("OrderPlaced"), "OrderPlaced");
        assert_eq!(type_name(""), "");
    }

    #[test]
    fn test_nested_type() {
        assert_eq!(type_name("Shop.OrderSaga+Timeout, Shop"), "Timeout");
    }

    #[test]
    fn test_generic_type() {
        assert_eq!(
            type_name("Shop.Envelope`1[[Shop.Messages.OrderPlaced, Shop.Messages]], Shop"),
            "Envelope<OrderPlaced>"
        );
        assert_eq!(
            type_name("Shop.Pair`2[[System.String, mscorlib],[Shop.Order+Line, Shop]], Shop"),
            "Pair<String, Line>"
        );
    }

    #[test]
    fn test_nested_generic_arguments() {
        assert_eq!(
            type_name("Shop.Outer`1[[Shop.Inner`1[[System.Int32, mscorlib]], Shop]], Shop"),
            "Outer<Inner<Int32>>"
        );
    }

    #[test]
    fn test_array_suffix_is_kept() {
        assert_eq!(type_name("System.String[], mscorlib"), "String[]");
        assert_eq!(type_name("System.Int32[,], mscorlib"), "Int32[,]");
        assert_eq!(type_name("System.Byte[][], mscorlib"), "Byte[][]");
        assert_eq!(
            type_name("Shop.Envelope`1[[System.String[], mscorlib]][], Shop"),
            "Envelope<String[]>[]"
        );
    }

    #[test]
    fn test_unbalanced_brackets_keep_base_name() {
        assert_eq!(type_name("Shop.Broken`1[[System.String, mscorlib"), "Broken");
    }
}
