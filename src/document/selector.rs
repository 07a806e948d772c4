//! Compound selector matching for [`MemoryDocument`](super::MemoryDocument).
//!
//! Supports `*`, `tag`, `#id`, `.class`, `[attr]` and `[attr="value"]`,
//! combined without whitespace, and comma-separated alternatives.
//! Combinators are not supported and never match.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorPart {
    Any,
    Tag(String),
    Id(String),
    Class(String),
    Attr { name: String, value: Option<String> },
}

pub trait SelectorSubject {
    fn tag(&self) -> &str;
    fn id(&self) -> Option<&str>;
    fn has_class(&self, class: &str) -> bool;
    fn attr(&self, name: &str) -> Option<&str>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Vec<SelectorPart>>,
}

impl Selector {
    pub fn parse(input: &str) -> Option<Self> {
        let alternatives = input
            .split(',')
            .map(parse_compound)
            .collect::<Option<Vec<_>>>()?;
        if alternatives.is_empty() {
            return None;
        }
        Some(Self { alternatives })
    }

    pub fn matches<S: SelectorSubject + ?Sized>(&self, subject: &S) -> bool {
        self.alternatives
            .iter()
            .any(|parts| parts.iter().all(|part| part_matches(part, subject)))
    }
}

fn part_matches<S: SelectorSubject + ?Sized>(part: &SelectorPart, subject: &S) -> bool {
    match part {
        SelectorPart::Any => true,
        SelectorPart::Tag(tag) => subject.tag().eq_ignore_ascii_case(tag),
        SelectorPart::Id(id) => subject.id() == Some(id.as_str()),
        SelectorPart::Class(class) => subject.has_class(class),
        SelectorPart::Attr { name, value } => match (subject.attr(name), value) {
            (Some(_), None) => true,
            (Some(actual), Some(expected)) => actual == expected,
            (None, _) => false,
        },
    }
}

fn is_delimiter(ch: char) -> bool {
    matches!(ch, '#' | '.' | '[')
}

fn parse_compound(input: &str) -> Option<Vec<SelectorPart>> {
    let mut rest = input.trim();
    if rest.is_empty() || rest.contains(char::is_whitespace) && !rest.contains('[') {
        return None;
    }
    let mut parts = Vec::new();
    while let Some(ch) = rest.chars().next() {
        match ch {
            '*' => {
                parts.push(SelectorPart::Any);
                rest = &rest[1..];
            }
            '#' | '.' => {
                let end = rest[1..].find(is_delimiter).map_or(rest.len(), |i| i + 1);
                let name = &rest[1..end];
                if name.is_empty() {
                    return None;
                }
                parts.push(if ch == '#' {
                    SelectorPart::Id(name.to_string())
                } else {
                    SelectorPart::Class(name.to_string())
                });
                rest = &rest[end..];
            }
            '[' => {
                let end = rest.find(']')?;
                let inner = &rest[1..end];
                let (name, value) = match inner.split_once('=') {
                    Some((name, value)) => (
                        name.trim(),
                        Some(value.trim().trim_matches(['"', '\'']).to_string()),
                    ),
                    None => (inner.trim(), None),
                };
                if name.is_empty() {
                    return None;
                }
                parts.push(SelectorPart::Attr {
                    name: name.to_string(),
                    value,
                });
                rest = &rest[end + 1..];
            }
            _ => {
                let end = rest.find(is_delimiter).unwrap_or(rest.len());
                let tag = &rest[..end];
                if tag.contains(char::is_whitespace) {
                    return None;
                }
                parts.push(SelectorPart::Tag(tag.to_ascii_lowercase()));
                rest = &rest[end..];
            }
        }
    }
    Some(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    struct Subject {
        tag: &'static str,
        id: Option<&'static str>,
        classes: Vec<&'static str>,
        attrs: BTreeMap<&'static str, &'static str>,
    }

    impl SelectorSubject for Subject {
        fn tag(&self) -> &str {
            self.tag
        }

        fn id(&self) -> Option<&str> {
            self.id
        }

        fn has_class(&self, class: &str) -> bool {
            self.classes.contains(&class)
        }

        fn attr(&self, name: &str) -> Option<&str> {
            self.attrs.get(name).copied()
        }
    }

    fn card() -> Subject {
        Subject {
            tag: "div",
            id: Some("card"),
            classes: vec!["item", "big"],
            attrs: BTreeMap::from([("dd-draggable", "true"), ("dropzone", "move")]),
        }
    }

    #[test]
    fn compound_selectors_match() {
        let s = card();
        for sel in [
            "div",
            "#card",
            ".item",
            "div.item.big",
            "[dd-draggable]",
            "[dd-draggable=\"true\"]",
            "div#card[dropzone='move']",
            "*",
            "span, .big",
        ] {
            assert!(Selector::parse(sel).unwrap().matches(&s), "{sel}");
        }
    }

    #[test]
    fn mismatches_and_invalid_input() {
        let s = card();
        for sel in ["span", "#other", ".missing", "[dd-draggable=\"false\"]", "[nope]"] {
            assert!(!Selector::parse(sel).unwrap().matches(&s), "{sel}");
        }
        assert!(Selector::parse("").is_none());
        assert!(Selector::parse("#").is_none());
        assert!(Selector::parse("div span").is_none());
        assert!(Selector::parse("[=x]").is_none());
    }
}
