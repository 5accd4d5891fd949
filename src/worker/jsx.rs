//! JSX lowering for the built-in transpiler.
//!
//! Every outermost JSX element or fragment is replaced in place by nested
//! `React.createElement(type, props, ...children)` calls (the classic
//! runtime). Line breaks that separate children in the source are carried
//! into the argument list, so code after an element and most lines inside
//! it keep their line numbers.

use oxc::ast::ast::{
    JSXAttributeItem, JSXAttributeValue, JSXChild, JSXElement, JSXExpression, JSXFragment,
};
use oxc::ast_visit::Visit;
use oxc::span::{GetSpan, Span};

use super::builtin::{Edit, splice};

/// Collects one edit per outermost JSX node it visits.
pub(super) struct JsxLowering<'s> {
    source: &'s str,
    pub(super) edits: Vec<Edit>,
}

impl<'a> Visit<'a> for JsxLowering<'_> {
    fn visit_jsx_element(&mut self, it: &JSXElement<'a>) {
        let code = self.element(it);
        self.edits.push((it.span.start as usize, it.span.end as usize, code));
    }

    fn visit_jsx_fragment(&mut self, it: &JSXFragment<'a>) {
        let code = self.fragment(it);
        self.edits.push((it.span.start as usize, it.span.end as usize, code));
    }
}

impl<'s> JsxLowering<'s> {
    pub(super) fn new(source: &'s str) -> Self {
        Self {
            source,
            edits: Vec::new(),
        }
    }

    fn slice(&self, span: Span) -> &'s str {
        &self.source[span.start as usize..span.end as usize]
    }

    /// Source of `span` with any JSX found by `walk` lowered.
    fn lowered(&self, span: Span, walk: impl FnOnce(&mut JsxLowering<'s>)) -> String {
        let mut inner = JsxLowering::new(self.source);
        walk(&mut inner);
        splice(
            self.source,
            span.start as usize,
            span.end as usize,
            &inner.edits,
        )
    }

    fn element(&self, el: &JSXElement<'_>) -> String {
        let opening = &el.opening_element;
        let mut out = format!(
            "React.createElement({}, {}",
            self.element_type(opening.name.span()),
            self.props(&opening.attributes)
        );
        pad_breaks(&mut out, breaks(self.slice(opening.span)));
        self.children(&mut out, el.span.start, &el.children);
        out.push(')');
        out
    }

    fn fragment(&self, fragment: &JSXFragment<'_>) -> String {
        let mut out = String::from("React.createElement(React.Fragment, null");
        self.children(&mut out, fragment.span.start, &fragment.children);
        out.push(')');
        out
    }

    /// Append `, child` per rendered child, keeping the source's line breaks.
    fn children(&self, out: &mut String, start: u32, children: &[JSXChild<'_>]) {
        for child in children {
            if let Some(code) = self.child(child) {
                out.push_str(", ");
                out.push_str(&code);
            }
            let consumed = Span::new(start, child.span().end);
            pad_breaks(out, breaks(self.slice(consumed)));
        }
    }

    fn child(&self, child: &JSXChild<'_>) -> Option<String> {
        match child {
            JSXChild::Text(text) => clean_text(text.value.as_str()).map(|t| quote(&t)),
            JSXChild::Element(el) => Some(self.element(el)),
            JSXChild::Fragment(fragment) => Some(self.fragment(fragment)),
            JSXChild::ExpressionContainer(container) => match &container.expression {
                JSXExpression::EmptyExpression(_) => None,
                expr => Some(self.lowered(expr.span(), |v| v.visit_jsx_expression(expr))),
            },
            JSXChild::Spread(spread) => Some(format!(
                "...{}",
                self.lowered(spread.expression.span(), |v| {
                    v.visit_expression(&spread.expression)
                })
            )),
        }
    }

    fn props(&self, attributes: &[JSXAttributeItem<'_>]) -> String {
        if attributes.is_empty() {
            return "null".to_string();
        }
        let props: Vec<String> = attributes
            .iter()
            .map(|item| match item {
                JSXAttributeItem::Attribute(attr) => {
                    let value = match &attr.value {
                        None => "true".to_string(),
                        Some(value) => self.attribute_value(value),
                    };
                    format!("{}: {}", quote(self.slice(attr.name.span())), value)
                }
                JSXAttributeItem::SpreadAttribute(spread) => format!(
                    "...{}",
                    self.lowered(spread.argument.span(), |v| {
                        v.visit_expression(&spread.argument)
                    })
                ),
            })
            .collect();
        format!("{{{}}}", props.join(", "))
    }

    fn attribute_value(&self, value: &JSXAttributeValue<'_>) -> String {
        match value {
            JSXAttributeValue::StringLiteral(lit) => quote(lit.value.as_str()),
            JSXAttributeValue::ExpressionContainer(container) => match &container.expression {
                JSXExpression::EmptyExpression(_) => "undefined".to_string(),
                expr => self.lowered(expr.span(), |v| v.visit_jsx_expression(expr)),
            },
            JSXAttributeValue::Element(el) => self.element(el),
            JSXAttributeValue::Fragment(fragment) => self.fragment(fragment),
        }
    }

    /// Lowercase and namespaced names are host tags; anything else is a
    /// component reference evaluated as an expression.
    fn element_type(&self, span: Span) -> String {
        let name = self.slice(span);
        let member = name.contains('.');
        let host = name.contains(':')
            || name.contains('-')
            || (!member && name.starts_with(|c: char| c.is_ascii_lowercase()));
        if host { quote(name) } else { name.to_string() }
    }
}

/// JSX text with the classic runtime's whitespace rules: lines are trimmed,
/// blank lines dropped, and the remaining lines joined with one space.
fn clean_text(raw: &str) -> Option<String> {
    let lines: Vec<&str> = raw.split('\n').collect();
    let last_non_blank = lines.iter().rposition(|l| !l.trim().is_empty())?;
    let last = lines.len() - 1;

    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        let line = line.replace('\t', " ");
        let mut text = line.as_str();
        if i != 0 {
            text = text.trim_start();
        }
        if i != last {
            text = text.trim_end();
        }
        if text.is_empty() {
            continue;
        }
        out.push_str(text);
        if i != last_non_blank {
            out.push(' ');
        }
    }
    (!out.is_empty()).then_some(out)
}

fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string())
}

fn breaks(text: &str) -> usize {
    text.matches('\n').count()
}

/// Append line breaks until `out` holds `target` of them.
fn pad_breaks(out: &mut String, target: usize) {
    let missing = target.saturating_sub(breaks(out));
    out.extend(std::iter::repeat_n('\n', missing));
}
